use super::ServiceCore;
use crate::archive;
use crate::models::{ConfigReport, FileSyncState, Service, redact_env};
use tracing::{debug, info, instrument, warn};

impl ServiceCore {
    async fn compare_file(&self, service: &Service, file: &str) -> FileSyncState {
        let local = tokio::fs::read_to_string(service.config_path().join(file))
            .await
            .ok();
        let remote = self
            .host
            .read_file(&format!("{}/{}", service.path(), file))
            .await;
        FileSyncState::compare(file, local.as_deref(), remote.as_deref())
    }

    /// Compares the local mirror with the remote copies and reports the first
    /// container's mounts, networks and non-secret environment.
    #[instrument(skip(self, service), fields(operation = "verify_configs", service = %service.name()))]
    pub async fn verify_configs(&self, service: &Service) -> ConfigReport {
        let compose = self.compare_file(service, &self.files.compose_file).await;

        let proxy = if self.files.proxy_config_file.is_empty() {
            None
        } else {
            let state = self
                .compare_file(service, &self.files.proxy_config_file)
                .await;
            (state.local_exists || state.remote_exists).then_some(state)
        };

        let mut report = ConfigReport {
            service: service.name().to_string(),
            compose,
            proxy,
            mounts: Vec::new(),
            networks: Vec::new(),
            env_vars: Default::default(),
        };

        if let Some(first) = service.containers().first() {
            match self.runtime.inspect_container(first.name()).await {
                Ok(details) => {
                    report.env_vars = redact_env(&details.env);
                    report.mounts = details.mounts;
                    report.networks = details.networks;
                }
                Err(e) => debug!(container = first.name(), error = %e, "inspect failed; runtime section left empty"),
            }
        }
        report
    }

    /// Mirrors the whole remote service directory into the local config path.
    /// Local files that don't exist remotely are kept.
    #[instrument(skip(self, service), fields(operation = "sync_configs", service = %service.name()))]
    pub async fn sync_configs(&self, service: &Service) -> bool {
        let stream = match self.host.tar_dir(service.path()).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "streaming remote service directory failed");
                return false;
            }
        };
        let dest = service.config_path().to_path_buf();
        let bytes = stream.len();
        let result = tokio::task::spawn_blocking(move || {
            archive::unpack_tar_gz(std::io::Cursor::new(stream), &dest)
        })
        .await;
        match result {
            Ok(Ok(())) => {
                info!(bytes, "config mirror updated");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "extracting service directory failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "extract task failed");
                false
            }
        }
    }
}
