use super::{ServiceDeployment, blocking};
use crate::archive;
use crate::error::{Result, ServiceError};
use crate::models::Service;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const ARCHIVE_SUFFIX: &str = ".tar.gz";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `<service>_backup_<YYYYMMDD_HHMMSS>.tar.gz`
pub fn archive_file_name(service: &str, timestamp: &str) -> String {
    format!("{}_backup_{}{}", service, timestamp, ARCHIVE_SUFFIX)
}

/// Splits an archive file name into service name and timestamp.
pub fn parse_archive_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name.strip_suffix(ARCHIVE_SUFFIX)?;
    let (service, timestamp) = stem.rsplit_once("_backup_")?;
    let valid = timestamp.len() == 15
        && timestamp.as_bytes()[8] == b'_'
        && timestamp
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit());
    (!service.is_empty() && valid).then_some((service, timestamp))
}

impl ServiceDeployment {
    /// Archives the config mirror and every named volume of the service's containers.
    ///
    /// The archive only appears in the backups directory once it is complete.
    #[instrument(skip(self, service), fields(operation = "backup_service", service = %service.name()))]
    pub async fn backup_service(&self, service: &Service) -> Result<PathBuf> {
        let path = self
            .backup_inner(service)
            .await
            .map_err(|e| ServiceError::backup(service.name(), e))?;
        info!(archive = %path.display(), "backup complete");
        Ok(path)
    }

    pub(super) async fn backup_inner(&self, service: &Service) -> Result<PathBuf> {
        let work = tempfile::Builder::new()
            .prefix("servicectl-backup-")
            .tempdir()?;
        let config_dst = work.path().join("config");
        let data_dst = work.path().join("data");

        let config_src = service.config_path().to_path_buf();
        let copied = {
            let dst = config_dst.clone();
            blocking(move || {
                if config_src.is_dir() {
                    archive::copy_dir_merge(&config_src, &dst)
                } else {
                    std::fs::create_dir_all(&dst).map(|_| 0)
                }
            })
            .await?
        };
        debug!(files = copied, "config mirror staged");

        let mut seen = BTreeSet::new();
        for container in service.containers() {
            let details = self.core.runtime().inspect_container(container.name()).await?;
            for mount in &details.mounts {
                let Some(volume) = mount.volume_name() else {
                    continue;
                };
                if !seen.insert(volume.to_string()) {
                    continue;
                }
                let stream = self.core.host().tar_dir(&mount.source).await?;
                let size = stream.len();
                let dest = data_dst.join(volume);
                blocking(move || archive::unpack_tar_gz(std::io::Cursor::new(stream), &dest))
                    .await?;
                info!(container = container.name(), volume, bytes = size, "volume staged");
            }
        }

        tokio::fs::create_dir_all(&self.backups_dir).await?;
        let archive_path = self.next_archive_path(service.name()).await;
        let partial = partial_path(&archive_path);

        let mut members: Vec<(&'static str, PathBuf)> = vec![("config", config_dst)];
        if !seen.is_empty() {
            members.push(("data", data_dst));
        }
        let target = partial.clone();
        let packed = blocking(move || {
            let refs: Vec<(&str, &Path)> =
                members.iter().map(|(n, p)| (*n, p.as_path())).collect();
            archive::pack_tar_gz(&target, &refs)
        })
        .await;
        if let Err(e) = packed {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&partial, &archive_path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        work.close()?;
        Ok(archive_path)
    }

    /// Fresh archive path; waits for the next second instead of reusing a name.
    async fn next_archive_path(&self, service: &str) -> PathBuf {
        loop {
            let now = chrono::Local::now();
            let name = archive_file_name(service, &now.format(TIMESTAMP_FORMAT).to_string());
            let path = self.backups_dir.join(name);
            if !path.exists() && !partial_path(&path).exists() {
                return path;
            }
            let wait_ms = 1000 - u64::from(now.timestamp_subsec_millis().min(999));
            tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
        }
    }

    /// Archives of `service` in the backups directory, newest first.
    pub async fn list_backups(&self, service: &str) -> Result<Vec<PathBuf>> {
        let mut found: Vec<(String, PathBuf)> = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.backups_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some((svc, ts)) = parse_archive_name(file_name)
                && svc == service
            {
                found.push((ts.to_string(), entry.path()));
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }
}

fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}
