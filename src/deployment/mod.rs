// Deploy, backup and restore on top of ServiceCore

mod backup;
mod deploy;
mod restore;

pub use backup::{archive_file_name, parse_archive_name};

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::service_core::ServiceCore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ServiceDeployment {
    core: Arc<ServiceCore>,
    backups_dir: PathBuf,
    snapshot_before_restore: bool,
}

impl ServiceDeployment {
    pub fn new(core: Arc<ServiceCore>, config: &AppConfig) -> Self {
        Self {
            core,
            backups_dir: config.paths.backups_dir.clone(),
            snapshot_before_restore: config.restore.snapshot_before_restore,
        }
    }

    pub fn core(&self) -> &ServiceCore {
        &self.core
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }
}

/// Runs blocking filesystem work off the async threads.
pub(crate) async fn blocking<T, F>(f: F) -> crate::error::Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(ServiceError::join)?
        .map_err(ServiceError::from)
}
