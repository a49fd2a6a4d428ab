use super::{CommandOutput, RemoteExecutor, spawn_captured};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

/// Runs commands on a remote host through the system `ssh` client.
///
/// The command string is handed to the remote login shell unchanged, so quoting
/// done by the caller survives the hop.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    destination: String,
    port: u16,
    identity_file: Option<String>,
    options: Vec<String>,
}

impl SshExecutor {
    pub fn new(host: &str, user: Option<&str>, port: u16) -> Self {
        let destination = match user {
            Some(u) if !u.is_empty() => format!("{}@{}", u, host),
            _ => host.to_string(),
        };
        Self {
            destination,
            port,
            identity_file: None,
            options: vec!["BatchMode=yes".to_string()],
        }
    }

    pub fn from_config(remote: &RemoteConfig, host: &str) -> Self {
        let mut exec = Self::new(host, remote.user.as_deref(), remote.port);
        exec.identity_file = remote.identity_file.clone();
        exec.options.extend(remote.ssh_options.iter().cloned());
        exec
    }

    /// Arguments passed to `ssh`, excluding the program name.
    pub fn args(&self, command: &str) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.port.to_string()];
        if let Some(key) = &self.identity_file {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        for opt in &self.options {
            args.push("-o".to_string());
            args.push(opt.clone());
        }
        args.push(self.destination.clone());
        args.push("--".to_string());
        args.push(command.to_string());
        args
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.args(command));
        cmd
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run(&self, command: &str) -> CommandOutput {
        tracing::trace!(host = %self.destination, command, "ssh exec");
        spawn_captured(self.command(command), None).await
    }

    async fn run_with_input(&self, command: &str, input: Bytes) -> CommandOutput {
        tracing::trace!(host = %self.destination, command, input_bytes = input.len(), "ssh exec with stdin");
        spawn_captured(self.command(command), Some(input)).await
    }
}
