use super::Mount;
use crate::error::{Result, ServiceError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One container as seen by the runtime during a single discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    name: String,
    status: String,
    health: Option<String>,
    image: String,
    started_at: String,
}

impl Container {
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        health: Option<String>,
        image: impl Into<String>,
        started_at: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ServiceError::Config("container name must be non-empty".into()));
        }
        Ok(Self {
            name,
            status: status.into(),
            health: health.filter(|h| !h.is_empty()),
            image: image.into(),
            started_at: started_at.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runtime state string, verbatim ("running", "exited", ...).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Health-check status; `None` when the container defines no health check.
    pub fn health(&self) -> Option<&str> {
        self.health.as_deref()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn started_at(&self) -> &str {
        &self.started_at
    }
}

/// A logical deployment unit: a remote directory, a local config mirror, and
/// whatever containers currently belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    name: String,
    path: String,
    config_path: PathBuf,
    containers: Vec<Container>,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        config_path: impl Into<PathBuf>,
        containers: Vec<Container>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() || name.contains('/') {
            return Err(ServiceError::Config(format!(
                "invalid service name {:?}",
                name
            )));
        }
        Ok(Self {
            name,
            path: path.into(),
            config_path: config_path.into(),
            containers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote directory holding the service's deployment artifacts.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Local config mirror directory.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }
}

/// Everything a structured inspect call tells us about one container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerDetails {
    pub container: Container,
    pub id: String,
    pub mounts: Vec<Mount>,
    pub networks: Vec<String>,
    /// `KEY=VALUE` pairs from the container config, in declaration order.
    pub env: Vec<(String, String)>,
    /// Raw inspect payload as returned by the runtime.
    pub raw: serde_json::Value,
}
