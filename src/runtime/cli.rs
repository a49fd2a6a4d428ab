use super::ContainerRuntime;
use super::inspect::parse_inspect;
use super::stats::parse_cli_stats;
use crate::error::{Result, ServiceError};
use crate::executor::{CommandOutput, RemoteExecutor};
use crate::models::{ContainerDetails, ControlAction, ResourceUsage};
use crate::shell::quote;
use async_trait::async_trait;
use std::sync::Arc;

/// Drives the docker CLI through an executor. All docker command strings live here.
#[derive(Clone)]
pub struct CliRuntime {
    exec: Arc<dyn RemoteExecutor>,
    docker: String,
}

impl CliRuntime {
    pub fn new(exec: Arc<dyn RemoteExecutor>, docker_bin: &str) -> Self {
        Self {
            exec,
            docker: docker_bin.to_string(),
        }
    }

    async fn docker(&self, args: &str) -> Result<CommandOutput> {
        let command = format!("{} {}", self.docker, args);
        let out = self.exec.run(&command).await;
        if out.success() {
            Ok(out)
        } else {
            tracing::debug!(command = %command, exit_code = ?out.exit_code, stderr = %out.stderr.trim(), "docker command failed");
            Err(ServiceError::CommandFailed {
                command,
                exit_code: out.exit_code,
                stderr: out.stderr.trim().to_string(),
            })
        }
    }

    fn parse_json(out: &CommandOutput, what: &str) -> Result<serde_json::Value> {
        serde_json::from_slice(&out.stdout).map_err(|e| ServiceError::Parse {
            what: what.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ContainerRuntime for CliRuntime {
    async fn list_containers(&self) -> Result<Vec<String>> {
        let out = self
            .docker(&format!("ps -a --format {}", quote("{{.Names}}")))
            .await?;
        Ok(out
            .stdout_text()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails> {
        let out = self.docker(&format!("inspect {}", quote(name))).await?;
        parse_inspect(Self::parse_json(&out, "container inspect")?)
    }

    async fn container_stats(&self, name: &str) -> Result<ResourceUsage> {
        let out = self
            .docker(&format!(
                "stats --no-stream --format {} {}",
                quote("{{json .}}"),
                quote(name)
            ))
            .await?;
        parse_cli_stats(&out.stdout_text())
    }

    async fn container_logs(&self, name: &str, tail: u32, follow: bool) -> Result<String> {
        let follow = if follow { " -f" } else { "" };
        let out = self
            .docker(&format!("logs --tail {tail}{follow} {} 2>&1", quote(name)))
            .await?;
        Ok(out.stdout_text())
    }

    async fn control_container(&self, name: &str, action: ControlAction) -> Result<()> {
        self.docker(&format!("{} {}", action.as_str(), quote(name)))
            .await?;
        Ok(())
    }

    async fn compose_up(&self, compose_file: &str) -> Result<()> {
        self.docker(&format!("compose -f {} up -d", quote(compose_file)))
            .await?;
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.docker(&format!("volume rm -f {}", quote(name))).await?;
        Ok(())
    }

    async fn create_volume(&self, name: &str) -> Result<()> {
        self.docker(&format!("volume create {}", quote(name)))
            .await?;
        Ok(())
    }

    async fn volume_mountpoint(&self, name: &str) -> Result<String> {
        let out = self
            .docker(&format!("volume inspect {}", quote(name)))
            .await?;
        let value = Self::parse_json(&out, "volume inspect")?;
        let entry = match &value {
            serde_json::Value::Array(items) => items.first(),
            other => Some(other),
        };
        entry
            .and_then(|v| v.get("Mountpoint"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .ok_or_else(|| ServiceError::Runtime(format!("volume '{}' has no mountpoint", name)))
    }
}
