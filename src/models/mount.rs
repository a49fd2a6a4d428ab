use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountKind {
    Volume,
    Bind,
    /// tmpfs, npipe, cluster... passed through verbatim.
    #[serde(untagged)]
    Other(String),
}

impl MountKind {
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "volume" => MountKind::Volume,
            "bind" => MountKind::Bind,
            _ => MountKind::Other(s.to_string()),
        }
    }
}

/// A host path or named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub kind: MountKind,
    /// Volume name; only set for named volumes.
    pub name: Option<String>,
    pub source: String,
    pub destination: String,
}

impl Mount {
    /// Name of the named volume backing this mount, if it is one.
    pub fn volume_name(&self) -> Option<&str> {
        match self.kind {
            MountKind::Volume => self.name.as_deref().filter(|n| !n.is_empty()),
            _ => None,
        }
    }
}
