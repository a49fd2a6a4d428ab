// Error taxonomy for service management operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::RestorePhase;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deployment definition is invalid. Raised before any side effect.
    #[error("configuration error: {0}")]
    Config(String),

    /// Referenced backup archive does not exist. Raised before any side effect.
    #[error("backup archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("command failed (exit {}): {command}: {stderr}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("docker api: {0}")]
    Runtime(String),

    #[error("lifecycle action '{action}' failed for service '{service}'")]
    Lifecycle { service: String, action: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("deploy of '{service}' failed: {source}")]
    Deploy {
        service: String,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("backup of '{service}' failed: {source}")]
    Backup {
        service: String,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("restore of '{service}' failed during {phase}: {source}")]
    Restore {
        service: String,
        phase: RestorePhase,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("no restore journal for service '{0}'")]
    NoJournal(String),

    #[error("restore journal for '{0}' has no pre-restore snapshot to roll back to")]
    NoSnapshot(String),
}

impl ServiceError {
    pub(crate) fn deploy(service: &str, source: ServiceError) -> Self {
        ServiceError::Deploy {
            service: service.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn backup(service: &str, source: ServiceError) -> Self {
        ServiceError::Backup {
            service: service.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn restore(service: &str, phase: RestorePhase, source: ServiceError) -> Self {
        ServiceError::Restore {
            service: service.to_string(),
            phase,
            source: Box::new(source),
        }
    }

    /// Blocking task panicked or was cancelled.
    pub(crate) fn join(e: tokio::task::JoinError) -> Self {
        ServiceError::Io(std::io::Error::other(e))
    }
}

impl From<bollard::errors::Error> for ServiceError {
    fn from(e: bollard::errors::Error) -> Self {
        ServiceError::Runtime(e.to_string())
    }
}

impl From<serde_yaml::Error> for ServiceError {
    fn from(e: serde_yaml::Error) -> Self {
        ServiceError::Config(e.to_string())
    }
}
