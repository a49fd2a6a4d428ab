use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle verbs issued against every container of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
            ControlAction::Restart => "restart",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(ControlAction::Start),
            "stop" => Ok(ControlAction::Stop),
            "restart" => Ok(ControlAction::Restart),
            other => Err(format!("unknown action {:?}", other)),
        }
    }
}

/// Point-in-time resource usage sample for one container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub cpu_percent: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    #[serde(default)]
    pub network_rx_bytes: u64,
    #[serde(default)]
    pub network_tx_bytes: u64,
    #[serde(default)]
    pub block_read_bytes: u64,
    #[serde(default)]
    pub block_write_bytes: u64,
    #[serde(default)]
    pub pids: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatusEntry {
    pub name: String,
    pub id: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
    pub health: Option<String>,
    pub started_at: Option<String>,
    pub inspect: Option<serde_json::Value>,
    pub usage: Option<ResourceUsage>,
    /// Set when inspect or stats failed for this container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContainerStatusEntry {
    pub fn unavailable(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            id: None,
            image: None,
            status: None,
            health: None,
            started_at: None,
            inspect: None,
            usage: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub service: String,
    pub containers: Vec<ContainerStatusEntry>,
    pub logs: String,
}
