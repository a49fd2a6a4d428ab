// Filesystem operations on the managed host, expressed as shell commands

use crate::error::{Result, ServiceError};
use crate::executor::{CommandOutput, RemoteExecutor};
use crate::shell::{heredoc_delimiter, quote};
use bytes::Bytes;
use std::sync::Arc;

/// Typed file operations on the host behind an executor.
#[derive(Clone)]
pub struct RemoteHost {
    exec: Arc<dyn RemoteExecutor>,
}

impl RemoteHost {
    pub fn new(exec: Arc<dyn RemoteExecutor>) -> Self {
        Self { exec }
    }

    pub fn executor(&self) -> &Arc<dyn RemoteExecutor> {
        &self.exec
    }

    async fn checked(&self, command: String) -> Result<CommandOutput> {
        let out = self.exec.run(&command).await;
        if out.success() {
            Ok(out)
        } else {
            Err(ServiceError::CommandFailed {
                command,
                exit_code: out.exit_code,
                stderr: out.stderr,
            })
        }
    }

    /// Names of the immediate subdirectories of `root`. Empty when `root` is missing.
    pub async fn list_dirs(&self, root: &str) -> Vec<String> {
        let cmd = format!(
            "find {} -mindepth 1 -maxdepth 1 -type d -printf '%f\\n'",
            quote(root)
        );
        let out = self.exec.run(&cmd).await;
        if !out.success() {
            tracing::debug!(root, stderr = %out.stderr.trim(), "listing service directories failed");
            return Vec::new();
        }
        out.stdout_text()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    pub async fn mkdir_p(&self, path: &str) -> Result<()> {
        self.checked(format!("mkdir -p {}", quote(path))).await?;
        Ok(())
    }

    /// File contents, or `None` when the file can't be read.
    pub async fn read_file(&self, path: &str) -> Option<String> {
        let out = self.exec.run(&format!("cat {}", quote(path))).await;
        out.success().then(|| out.stdout_text())
    }

    /// Writes `content` with a quoted here-doc so no expansion happens.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let delim = heredoc_delimiter(content);
        let newline = if content.ends_with('\n') || content.is_empty() {
            ""
        } else {
            "\n"
        };
        let cmd = format!(
            "cat > {} << '{delim}'\n{content}{newline}{delim}\n",
            quote(path)
        );
        self.checked(cmd).await?;
        Ok(())
    }

    /// Removes everything inside `dir`, keeping `dir` itself. Missing `dir` is fine.
    pub async fn clear_dir(&self, dir: &str) -> Result<()> {
        let q = quote(dir);
        self.checked(format!("[ ! -d {q} ] || find {q} -mindepth 1 -delete"))
            .await?;
        Ok(())
    }

    /// Gzipped tar stream of the contents of `dir`.
    pub async fn tar_dir(&self, dir: &str) -> Result<Bytes> {
        let out = self
            .checked(format!("tar czf - -C {} .", quote(dir)))
            .await?;
        Ok(out.stdout)
    }

    /// Unpacks a gzipped tar stream into `dir`, creating it first.
    pub async fn untar_into(&self, dir: &str, archive: Bytes) -> Result<()> {
        let q = quote(dir);
        let command = format!("mkdir -p {q} && tar xzf - -C {q}");
        let out = self.exec.run_with_input(&command, archive).await;
        if out.success() {
            Ok(())
        } else {
            Err(ServiceError::CommandFailed {
                command,
                exit_code: out.exit_code,
                stderr: out.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LocalExecutor;

    fn local() -> RemoteHost {
        RemoteHost::new(Arc::new(LocalExecutor::new()))
    }

    #[tokio::test]
    async fn write_then_read_preserves_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("compose.yml");
        let path = path.to_str().unwrap();
        let host = local();
        let content = "services:\n  app:\n    image: \"nginx\"\n    command: echo $HOME `id`\nEOL\n";
        host.write_file(path, content).await.unwrap();
        assert_eq!(host.read_file(path).await.as_deref(), Some(content));
    }

    #[tokio::test]
    async fn read_missing_file_is_none() {
        assert!(local().read_file("/nonexistent/servicectl/x").await.is_none());
    }

    #[tokio::test]
    async fn list_dirs_skips_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("web")).unwrap();
        std::fs::create_dir(dir.path().join("db")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let mut dirs = local().list_dirs(dir.path().to_str().unwrap()).await;
        dirs.sort();
        assert_eq!(dirs, vec!["db", "web"]);
    }

    #[tokio::test]
    async fn clear_dir_empties_but_keeps_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/x"), "x").unwrap();
        std::fs::write(dir.path().join("y"), "y").unwrap();
        let host = local();
        host.clear_dir(dir.path().to_str().unwrap()).await.unwrap();
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        host.clear_dir("/nonexistent/servicectl/dir").await.unwrap();
    }

    #[tokio::test]
    async fn tar_stream_round_trips_between_directories() {
        let src = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("nested")).unwrap();
        std::fs::write(src.path().join("nested/a.txt"), "alpha").unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        let target = dst.path().join("out");

        let host = local();
        let stream = host.tar_dir(src.path().to_str().unwrap()).await.unwrap();
        host.untar_into(target.to_str().unwrap(), stream).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(target.join("nested/a.txt")).unwrap(),
            "alpha"
        );
    }
}
