// Docker Engine API backend via bollard

use super::ContainerRuntime;
use super::cli::CliRuntime;
use super::inspect::parse_inspect;
use super::stats::usage_from_api;
use crate::error::{Result, ServiceError};
use crate::models::{ContainerDetails, ControlAction, ResourceUsage};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerSummary, VolumeCreateRequest};
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RemoveVolumeOptions,
    RestartContainerOptions, StartContainerOptions, StatsOptions, StopContainerOptions,
};
use futures_util::StreamExt;

/// Talks to the Engine API directly. Compose has no API, so `compose_up` goes
/// through the docker CLI.
pub struct DockerApiRuntime {
    docker: Docker,
    cli: CliRuntime,
}

impl DockerApiRuntime {
    /// Connects using DOCKER_HOST or the local socket.
    pub fn connect(cli: CliRuntime) -> anyhow::Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker, cli })
    }
}

/// First name of each container, without the leading `/` the Engine API adds.
fn container_names(containers: Vec<ContainerSummary>) -> Vec<String> {
    containers
        .into_iter()
        .filter_map(|c| c.names.and_then(|n| n.into_iter().next()))
        .map(|n| n.trim_start_matches('/').to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Same as `docker volume rm -f`.
fn remove_volume_options() -> RemoveVolumeOptions {
    RemoveVolumeOptions { force: true }
}

fn create_volume_request(name: &str) -> VolumeCreateRequest {
    VolumeCreateRequest {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerRuntime for DockerApiRuntime {
    async fn list_containers(&self) -> Result<Vec<String>> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(container_names(containers))
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails> {
        let response = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;
        let value = serde_json::to_value(&response).map_err(|e| ServiceError::Parse {
            what: "container inspect payload".into(),
            source: e,
        })?;
        parse_inspect(value)
    }

    async fn container_stats(&self, name: &str) -> Result<ResourceUsage> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(name, Some(options));
        match stream.next().await {
            Some(Ok(s)) => usage_from_api(&s).ok_or_else(|| {
                ServiceError::Runtime(format!("stats for '{}' lack cpu sections", name))
            }),
            Some(Err(e)) => Err(e.into()),
            None => Err(ServiceError::Runtime(format!(
                "stats stream for '{}' ended without a sample",
                name
            ))),
        }
    }

    async fn container_logs(&self, name: &str, tail: u32, follow: bool) -> Result<String> {
        let options = LogsOptions {
            follow,
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(name, Some(options));
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            text.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
        }
        Ok(text)
    }

    async fn control_container(&self, name: &str, action: ControlAction) -> Result<()> {
        match action {
            ControlAction::Start => {
                self.docker
                    .start_container(name, None::<StartContainerOptions>)
                    .await?
            }
            ControlAction::Stop => {
                self.docker
                    .stop_container(name, None::<StopContainerOptions>)
                    .await?
            }
            ControlAction::Restart => {
                self.docker
                    .restart_container(name, None::<RestartContainerOptions>)
                    .await?
            }
        }
        Ok(())
    }

    async fn compose_up(&self, compose_file: &str) -> Result<()> {
        self.cli.compose_up(compose_file).await
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.docker
            .remove_volume(name, Some(remove_volume_options()))
            .await?;
        Ok(())
    }

    async fn create_volume(&self, name: &str) -> Result<()> {
        self.docker.create_volume(create_volume_request(name)).await?;
        Ok(())
    }

    async fn volume_mountpoint(&self, name: &str) -> Result<String> {
        let volume = self.docker.inspect_volume(name).await?;
        if volume.mountpoint.is_empty() {
            return Err(ServiceError::Runtime(format!(
                "volume '{}' has no mountpoint",
                name
            )));
        }
        Ok(volume.mountpoint)
    }
}
