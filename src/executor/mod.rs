// Command execution on the managed host (local shell or ssh)

mod local;
mod ssh;

pub use local::LocalExecutor;
pub use ssh::SshExecutor;

use async_trait::async_trait;
use bytes::Bytes;
use std::process::Output;

/// Captured result of one command. Executors never return `Err`; a command that
/// could not be spawned at all has `exit_code == None`.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: Bytes,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Successful output with the given stdout (for scripted executors).
    pub fn ok(stdout: impl Into<Bytes>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Bytes::new(),
            stderr: stderr.into(),
        }
    }

    pub(crate) fn spawn_error(e: std::io::Error) -> Self {
        Self {
            exit_code: None,
            stdout: Bytes::new(),
            stderr: e.to_string(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(o: Output) -> Self {
        Self {
            exit_code: o.status.code(),
            stdout: Bytes::from(o.stdout),
            stderr: String::from_utf8_lossy(&o.stderr).into_owned(),
        }
    }
}

/// Runs shell command strings on the managed host.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn run(&self, command: &str) -> CommandOutput;

    /// Like [`RemoteExecutor::run`] but feeds `input` to the command's stdin.
    async fn run_with_input(&self, command: &str, input: Bytes) -> CommandOutput;
}

/// Spawns `program args...` with piped stdio, optionally writing `input` to stdin.
pub(crate) async fn spawn_captured(
    mut cmd: tokio::process::Command,
    input: Option<Bytes>,
) -> CommandOutput {
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return CommandOutput::spawn_error(e),
    };

    if let Some(data) = input
        && let Some(mut stdin) = child.stdin.take()
    {
        // Write on a separate task so a chatty child can't deadlock on a full stdout pipe.
        let writer = tokio::spawn(async move {
            let res = stdin.write_all(&data).await;
            drop(stdin);
            res
        });
        let out = child.wait_with_output().await;
        if let Ok(Err(e)) = writer.await {
            tracing::debug!(error = %e, "stdin write ended early");
        }
        return match out {
            Ok(o) => o.into(),
            Err(e) => CommandOutput::spawn_error(e),
        };
    }

    match child.wait_with_output().await {
        Ok(o) => o.into(),
        Err(e) => CommandOutput::spawn_error(e),
    }
}
