// Structured inspect payload -> ContainerDetails
//
// Both backends funnel through here: the CLI returns the Engine API JSON verbatim,
// and bollard's response types serialize back to the same shape.

use crate::error::{Result, ServiceError};
use crate::models::{Container, ContainerDetails, Mount, MountKind};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectPayload {
    #[serde(default)]
    id: String,
    name: String,
    state: StateSection,
    #[serde(default)]
    config: Option<ConfigSection>,
    #[serde(default)]
    mounts: Option<Vec<MountSection>>,
    #[serde(default)]
    network_settings: Option<NetworkSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateSection {
    #[serde(default)]
    status: String,
    #[serde(default)]
    started_at: String,
    #[serde(default)]
    health: Option<HealthSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthSection {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigSection {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    env: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MountSection {
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSection {
    #[serde(default)]
    networks: Option<BTreeMap<String, serde_json::Value>>,
}

/// Parses `docker inspect` output: a JSON array with one element, or a bare object.
pub fn parse_inspect(value: serde_json::Value) -> Result<ContainerDetails> {
    let raw = match value {
        serde_json::Value::Array(mut items) => {
            if items.is_empty() {
                return Err(ServiceError::Runtime("inspect returned an empty array".into()));
            }
            items.swap_remove(0)
        }
        other => other,
    };
    let payload: InspectPayload =
        serde_json::from_value(raw.clone()).map_err(|e| ServiceError::Parse {
            what: "container inspect payload".into(),
            source: e,
        })?;

    let health = payload
        .state
        .health
        .and_then(|h| h.status)
        .filter(|s| !s.is_empty() && s != "none");
    let (image, env) = match payload.config {
        Some(c) => (c.image.unwrap_or_default(), c.env.unwrap_or_default()),
        None => (String::new(), Vec::new()),
    };
    let container = Container::new(
        payload.name.trim_start_matches('/'),
        payload.state.status,
        health,
        image,
        payload.state.started_at,
    )?;

    let mounts = payload
        .mounts
        .unwrap_or_default()
        .into_iter()
        .map(|m| Mount {
            kind: MountKind::from_docker(&m.kind),
            name: m.name.filter(|n| !n.is_empty()),
            source: m.source,
            destination: m.destination,
        })
        .collect();
    let networks = payload
        .network_settings
        .and_then(|n| n.networks)
        .map(|n| n.into_keys().collect())
        .unwrap_or_default();
    let env = env
        .into_iter()
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (kv, String::new()),
        })
        .collect();

    Ok(ContainerDetails {
        container,
        id: payload.id,
        mounts,
        networks,
        env,
        raw,
    })
}
