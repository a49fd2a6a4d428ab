use super::{CommandOutput, RemoteExecutor, spawn_captured};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

/// Runs commands through `sh -c` on this machine.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    shell: String,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn run(&self, command: &str) -> CommandOutput {
        tracing::trace!(command, "local exec");
        spawn_captured(self.command(command), None).await
    }

    async fn run_with_input(&self, command: &str, input: Bytes) -> CommandOutput {
        tracing::trace!(command, input_bytes = input.len(), "local exec with stdin");
        spawn_captured(self.command(command), Some(input)).await
    }
}
