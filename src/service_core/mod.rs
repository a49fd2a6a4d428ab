// Service discovery, inspection, lifecycle control and config mirroring

mod config_sync;
mod controller;
mod inspector;
mod registry;

pub use registry::{candidate_service_name, matches_service};

use crate::config::{AppConfig, FilesConfig, PathsConfig, RuntimeBackend};
use crate::error::Result;
use crate::executor::{LocalExecutor, RemoteExecutor, SshExecutor};
use crate::host::RemoteHost;
use crate::models::Service;
use crate::runtime::{CliRuntime, ContainerRuntime, DockerApiRuntime};
use std::path::PathBuf;
use std::sync::Arc;

pub struct ServiceCore {
    runtime: Arc<dyn ContainerRuntime>,
    host: RemoteHost,
    paths: PathsConfig,
    files: FilesConfig,
    log_tail: u32,
}

impl ServiceCore {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        host: RemoteHost,
        config: &AppConfig,
    ) -> Self {
        Self {
            runtime,
            host,
            paths: config.paths.clone(),
            files: config.files.clone(),
            log_tail: config.status.log_tail,
        }
    }

    /// Builds the executor and runtime backend described by `config`.
    pub fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let exec: Arc<dyn RemoteExecutor> = match &config.remote.host {
            Some(host) => Arc::new(SshExecutor::from_config(&config.remote, host)),
            None => Arc::new(LocalExecutor::new()),
        };
        let cli = CliRuntime::new(exec.clone(), &config.runtime.docker_bin);
        let runtime: Arc<dyn ContainerRuntime> = match config.runtime.backend {
            RuntimeBackend::Cli => Arc::new(cli),
            RuntimeBackend::Api => Arc::new(DockerApiRuntime::connect(cli)?),
        };
        tracing::debug!(
            host = config.remote.host.as_deref().unwrap_or("localhost"),
            backend = ?config.runtime.backend,
            "service core connected"
        );
        Ok(Self::new(runtime, RemoteHost::new(exec), config))
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    pub fn host(&self) -> &RemoteHost {
        &self.host
    }

    pub fn files(&self) -> &FilesConfig {
        &self.files
    }

    /// Log lines included in status reports.
    pub fn log_tail(&self) -> u32 {
        self.log_tail
    }

    /// Remote directory of a service.
    pub fn service_dir(&self, name: &str) -> String {
        format!("{}/{}", self.paths.services_root.trim_end_matches('/'), name)
    }

    /// Local config mirror of a service.
    pub fn config_dir(&self, name: &str) -> PathBuf {
        self.paths.config_dir.join(name)
    }

    pub fn compose_path(&self, name: &str) -> String {
        format!("{}/{}", self.service_dir(name), self.files.compose_file)
    }

    /// One service with whatever containers currently match its name.
    pub async fn resolve_service(&self, name: &str) -> Result<Service> {
        let containers = self.find_matching_containers(name).await;
        Service::new(name, self.service_dir(name), self.config_dir(name), containers)
    }
}
