use super::{ServiceDeployment, blocking};
use crate::archive;
use crate::error::{Result, ServiceError};
use crate::models::{ControlAction, RestoreJournal, RestorePhase, Service};
use crate::service_core::matches_service;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const PHASES: [RestorePhase; 6] = [
    RestorePhase::Stopping,
    RestorePhase::Snapshotting,
    RestorePhase::Extracting,
    RestorePhase::RestoringConfig,
    RestorePhase::RestoringVolumes,
    RestorePhase::Starting,
];

impl ServiceDeployment {
    /// Stops the service, replaces its config mirror and volumes with the
    /// contents of `archive`, and starts it again.
    ///
    /// A missing archive fails with [`ServiceError::ArchiveNotFound`] before the
    /// service is touched. Any later failure leaves the service stopped and a
    /// journal in the backups directory for [`resume_restore`](Self::resume_restore)
    /// or [`rollback_restore`](Self::rollback_restore).
    #[instrument(skip(self, service), fields(operation = "restore_service", service = %service.name()))]
    pub async fn restore_service(&self, service: &Service, archive: &Path) -> Result<()> {
        if !archive.is_file() {
            return Err(ServiceError::ArchiveNotFound(archive.to_path_buf()));
        }
        if let Some(previous) = self.restore_journal(service.name()).await? {
            warn!(
                phase = %previous.phase,
                archive = %previous.archive.display(),
                "discarding journal of an unfinished restore"
            );
        }
        let mut journal = RestoreJournal::new(service.name(), archive.to_path_buf());
        self.run_restore(service, &mut journal, self.snapshot_before_restore)
            .await
    }

    /// Continues a failed restore, skipping phases and volumes already done.
    #[instrument(skip(self, service), fields(operation = "resume_restore", service = %service.name()))]
    pub async fn resume_restore(&self, service: &Service) -> Result<()> {
        let mut journal = self
            .restore_journal(service.name())
            .await?
            .ok_or_else(|| ServiceError::NoJournal(service.name().to_string()))?;
        if !journal.archive.is_file() {
            return Err(ServiceError::ArchiveNotFound(journal.archive.clone()));
        }
        info!(
            failed_phase = ?journal.failed_phase,
            completed = journal.completed.len(),
            "resuming restore"
        );
        journal.reset_failure();
        // A snapshot taken by the first attempt is never retaken.
        let snapshot = self.snapshot_before_restore && journal.snapshot.is_none();
        self.run_restore(service, &mut journal, snapshot).await
    }

    /// Restores the snapshot taken before the last failed restore.
    #[instrument(skip(self, service), fields(operation = "rollback_restore", service = %service.name()))]
    pub async fn rollback_restore(&self, service: &Service) -> Result<()> {
        let journal = self
            .restore_journal(service.name())
            .await?
            .ok_or_else(|| ServiceError::NoJournal(service.name().to_string()))?;
        let snapshot = journal
            .snapshot
            .ok_or_else(|| ServiceError::NoSnapshot(service.name().to_string()))?;
        if !snapshot.is_file() {
            return Err(ServiceError::ArchiveNotFound(snapshot));
        }
        info!(snapshot = %snapshot.display(), "rolling back to pre-restore snapshot");
        let mut journal = RestoreJournal::new(service.name(), snapshot);
        self.run_restore(service, &mut journal, false).await
    }

    /// Journal of the service's unfinished restore, if there is one.
    pub async fn restore_journal(&self, service: &str) -> Result<Option<RestoreJournal>> {
        let path = self.journal_path(service);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let journal = serde_json::from_slice(&raw).map_err(|e| ServiceError::Parse {
            what: format!("restore journal {}", path.display()),
            source: e,
        })?;
        Ok(Some(journal))
    }

    fn journal_path(&self, service: &str) -> PathBuf {
        self.backups_dir.join(format!(".{}_restore.json", service))
    }

    async fn save_journal(&self, journal: &RestoreJournal) -> Result<()> {
        tokio::fs::create_dir_all(&self.backups_dir).await?;
        let json = serde_json::to_vec_pretty(journal).map_err(|e| ServiceError::Parse {
            what: "restore journal".into(),
            source: e,
        })?;
        let path = self.journal_path(&journal.service);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn run_restore(
        &self,
        service: &Service,
        journal: &mut RestoreJournal,
        snapshot: bool,
    ) -> Result<()> {
        let name = service.name();
        let staging = tempfile::Builder::new()
            .prefix("servicectl-restore-")
            .tempdir()
            .map_err(|e| ServiceError::restore(name, journal.phase, e.into()))?;

        for phase in PHASES {
            if skip_phase(phase, journal, snapshot) {
                debug!(%phase, "phase skipped");
                continue;
            }
            journal.begin(phase);
            self.save_journal(journal)
                .await
                .map_err(|e| ServiceError::restore(name, phase, e))?;
            debug!(%phase, "phase started");

            if let Err(e) = self.run_phase(phase, service, journal, staging.path()).await {
                warn!(%phase, error = %e, "restore failed; service left stopped");
                journal.fail(phase, e.to_string());
                if let Err(save) = self.save_journal(journal).await {
                    warn!(error = %save, "could not record failed restore");
                }
                return Err(ServiceError::restore(name, phase, e));
            }
            journal.complete(phase);
        }

        journal.begin(RestorePhase::Done);
        match tokio::fs::remove_file(self.journal_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "could not remove restore journal"),
        }
        info!(archive = %journal.archive.display(), volumes = journal.restored_volumes.len(), "restore complete");
        Ok(())
    }

    async fn run_phase(
        &self,
        phase: RestorePhase,
        service: &Service,
        journal: &mut RestoreJournal,
        staging: &Path,
    ) -> Result<()> {
        match phase {
            RestorePhase::Stopping => {
                tokio::fs::create_dir_all(service.config_path()).await?;
                self.core.host().mkdir_p(service.path()).await?;
                self.lifecycle(service, ControlAction::Stop).await
            }
            RestorePhase::Snapshotting => {
                let path = self.backup_inner(service).await?;
                info!(snapshot = %path.display(), "pre-restore snapshot taken");
                journal.snapshot = Some(path);
                Ok(())
            }
            RestorePhase::Extracting => {
                let archive = journal.archive.clone();
                let dest = staging.to_path_buf();
                blocking(move || archive::unpack_tar_gz_file(&archive, &dest)).await
            }
            RestorePhase::RestoringConfig => {
                let src = staging.join("config");
                let dst = service.config_path().to_path_buf();
                let copied = blocking(move || {
                    if src.is_dir() {
                        archive::copy_dir_merge(&src, &dst)
                    } else {
                        Ok(0)
                    }
                })
                .await?;
                info!(files = copied, "config restored");
                self.push_compose(service, staging).await
            }
            RestorePhase::RestoringVolumes => {
                for (volume, dir) in staged_volumes(&staging.join("data")).await? {
                    if journal.restored_volumes.contains(&volume) {
                        debug!(volume, "volume already restored");
                        continue;
                    }
                    self.restore_volume(&volume, dir).await?;
                    journal.restored_volumes.push(volume);
                    self.save_journal(journal).await?;
                }
                Ok(())
            }
            RestorePhase::Starting => {
                if self.nothing_to_start(service).await {
                    info!("no containers and no compose file; nothing to start");
                    return Ok(());
                }
                self.lifecycle(service, ControlAction::Start).await
            }
            RestorePhase::Idle | RestorePhase::Done | RestorePhase::Failed => Ok(()),
        }
    }

    async fn lifecycle(&self, service: &Service, action: ControlAction) -> Result<()> {
        if self.core.control_service(service.name(), action).await {
            Ok(())
        } else {
            Err(ServiceError::Lifecycle {
                service: service.name().to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Uploads the restored compose file to the service directory so a service
    /// without containers can be brought up from it.
    async fn push_compose(&self, service: &Service, staging: &Path) -> Result<()> {
        let file_name = &self.core.files().compose_file;
        let staged = staging.join("config").join(file_name);
        let compose = match tokio::fs::read_to_string(&staged).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let remote = format!("{}/{}", service.path(), file_name);
        self.core.host().write_file(&remote, &compose).await?;
        debug!(remote = %remote, "compose file restored on host");
        Ok(())
    }

    /// True when the host has neither matching containers nor a compose file for
    /// the service. A failed listing is left to the start itself to report.
    async fn nothing_to_start(&self, service: &Service) -> bool {
        let idle = match self.core.runtime().list_containers().await {
            Ok(names) => !names.iter().any(|n| matches_service(service.name(), n)),
            Err(_) => false,
        };
        idle && self
            .core
            .host()
            .read_file(&self.core.compose_path(service.name()))
            .await
            .is_none()
    }

    /// Recreates `volume` and fills it with the contents of `src`.
    async fn restore_volume(&self, volume: &str, src: PathBuf) -> Result<()> {
        let runtime = self.core.runtime();
        let removed = match runtime.remove_volume(volume).await {
            Ok(()) => true,
            Err(e) => {
                warn!(volume, error = %e, "volume not removed; clearing it in place");
                false
            }
        };
        runtime.create_volume(volume).await?;
        let mountpoint = runtime.volume_mountpoint(volume).await?;
        if !removed {
            self.core.host().clear_dir(&mountpoint).await?;
        }
        let stream = blocking(move || archive::tar_gz_dir_bytes(&src)).await?;
        let size = stream.len();
        self.core.host().untar_into(&mountpoint, stream).await?;
        info!(volume, mountpoint = %mountpoint, bytes = size, "volume restored");
        Ok(())
    }
}

fn skip_phase(phase: RestorePhase, journal: &RestoreJournal, snapshot: bool) -> bool {
    match phase {
        RestorePhase::Snapshotting => !snapshot || journal.snapshot.is_some(),
        // Staging does not survive between attempts; extract again while
        // something still reads from it.
        RestorePhase::Extracting => {
            journal.is_completed(phase)
                && journal.is_completed(RestorePhase::RestoringConfig)
                && journal.is_completed(RestorePhase::RestoringVolumes)
        }
        _ => journal.is_completed(phase),
    }
}

/// `(volume, directory)` for each subdirectory of `data`, sorted by name.
async fn staged_volumes(data: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut volumes = Vec::new();
    let mut entries = match tokio::fs::read_dir(data).await {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(volumes),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => volumes.push((name, entry.path())),
            Err(raw) => warn!(name = ?raw, "skipping volume with non-UTF-8 name"),
        }
    }
    volumes.sort();
    Ok(volumes)
}
