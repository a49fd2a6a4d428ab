use super::Mount;
use serde::Serialize;
use std::collections::BTreeMap;

/// Local-vs-remote state of one config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSyncState {
    pub file: String,
    pub local_exists: bool,
    pub remote_exists: bool,
    /// Both copies exist and are identical after trimming trailing whitespace.
    pub in_sync: bool,
}

impl FileSyncState {
    pub fn compare(file: &str, local: Option<&str>, remote: Option<&str>) -> Self {
        let in_sync = match (local, remote) {
            (Some(l), Some(r)) => l.trim_end() == r.trim_end(),
            _ => false,
        };
        Self {
            file: file.to_string(),
            local_exists: local.is_some(),
            remote_exists: remote.is_some(),
            in_sync,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    pub service: String,
    pub compose: FileSyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<FileSyncState>,
    pub mounts: Vec<Mount>,
    pub networks: Vec<String>,
    /// Non-secret environment of the first container.
    pub env_vars: BTreeMap<String, String>,
}

const SECRET_MARKERS: [&str; 4] = ["PASSWORD", "KEY", "TOKEN", "SECRET"];

/// True when an env var key looks like it holds a credential.
pub fn is_secret_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    SECRET_MARKERS.iter().any(|m| upper.contains(m))
}

/// Drops credential-looking variables entirely rather than masking them.
pub fn redact_env<'a>(
    env: impl IntoIterator<Item = &'a (String, String)>,
) -> BTreeMap<String, String> {
    env.into_iter()
        .filter(|(k, _)| !is_secret_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
