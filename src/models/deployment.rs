// Abstract service definition and its compose rendering

use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to deploy: sub-services plus optional top-level networks/volumes.
/// Accepts YAML or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub services: BTreeMap<String, ServiceDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<BTreeMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub image: Option<String>,
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub healthcheck: Option<HealthCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub test: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,
}

const DEFAULT_RESTART: &str = "unless-stopped";

#[derive(Serialize)]
struct ComposeFile<'a> {
    services: BTreeMap<&'a str, ComposeService<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    networks: Option<&'a BTreeMap<String, serde_yaml::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volumes: Option<&'a BTreeMap<String, serde_yaml::Value>>,
}

#[derive(Serialize)]
struct ComposeService<'a> {
    image: &'a str,
    restart: &'a str,
    #[serde(skip_serializing_if = "is_empty_map")]
    environment: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "is_empty_list")]
    volumes: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    ports: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    depends_on: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    healthcheck: Option<&'a HealthCheck>,
}

fn is_empty_map(m: &&BTreeMap<String, String>) -> bool {
    m.is_empty()
}

fn is_empty_list(v: &&[String]) -> bool {
    v.is_empty()
}

impl DeploymentSpec {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Checks required fields. Must pass before anything touches disk or the runtime.
    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(ServiceError::Config(
                "deployment defines no services".into(),
            ));
        }
        for (name, def) in &self.services {
            match def.image.as_deref() {
                Some(image) if !image.trim().is_empty() => {}
                _ => {
                    return Err(ServiceError::Config(format!(
                        "service '{}' is missing an image",
                        name
                    )));
                }
            }
            if let Some(dep) = def
                .depends_on
                .iter()
                .find(|d| !self.services.contains_key(d.as_str()))
            {
                return Err(ServiceError::Config(format!(
                    "service '{}' depends on undefined service '{}'",
                    name, dep
                )));
            }
            if let Some(hc) = &def.healthcheck
                && hc.test.is_empty()
            {
                return Err(ServiceError::Config(format!(
                    "service '{}' has a healthcheck without a test",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Renders the compose YAML. Validates first.
    pub fn to_compose_yaml(&self) -> Result<String> {
        self.validate()?;
        let services = self
            .services
            .iter()
            .map(|(name, def)| {
                let svc = ComposeService {
                    // validate() guarantees presence
                    image: def.image.as_deref().unwrap_or_default(),
                    restart: def.restart.as_deref().unwrap_or(DEFAULT_RESTART),
                    environment: &def.environment,
                    volumes: &def.volumes,
                    ports: &def.ports,
                    depends_on: &def.depends_on,
                    healthcheck: def.healthcheck.as_ref(),
                };
                (name.as_str(), svc)
            })
            .collect();
        let file = ComposeFile {
            services,
            networks: self.networks.as_ref(),
            volumes: self.volumes.as_ref(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}
