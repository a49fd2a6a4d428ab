// Shared test helpers: a scripted executor and a service core over temp directories

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use servicectl::config::AppConfig;
use servicectl::executor::{CommandOutput, LocalExecutor, RemoteExecutor};
use servicectl::host::RemoteHost;
use servicectl::runtime::CliRuntime;
use servicectl::{ServiceCore, ServiceDeployment};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Docker commands are answered from scripted rules matching whole leading words
/// (latest rule wins); unscripted docker commands fail. Everything else runs in a
/// local shell.
pub struct FakeExecutor {
    local: LocalExecutor,
    rules: Mutex<Vec<(String, CommandOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            local: LocalExecutor::new(),
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn on(&self, prefix: &str, reply: CommandOutput) {
        self.rules
            .lock()
            .unwrap()
            .push((prefix.to_string(), reply));
    }

    pub fn on_ok(&self, prefix: &str, stdout: &str) {
        self.on(prefix, CommandOutput::ok(stdout.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn docker_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("docker "))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn scripted(&self, command: &str) -> Option<CommandOutput> {
        self.calls.lock().unwrap().push(command.to_string());
        let rules = self.rules.lock().unwrap();
        let matches = |p: &str| {
            command == p
                || command
                    .strip_prefix(p)
                    .is_some_and(|rest| rest.starts_with(' '))
        };
        if let Some((_, reply)) = rules.iter().rev().find(|(p, _)| matches(p)) {
            return Some(reply.clone());
        }
        command
            .starts_with("docker ")
            .then(|| CommandOutput::failed(1, format!("unscripted: {}", command)))
    }
}

#[async_trait]
impl RemoteExecutor for FakeExecutor {
    async fn run(&self, command: &str) -> CommandOutput {
        match self.scripted(command) {
            Some(reply) => reply,
            None => self.local.run(command).await,
        }
    }

    async fn run_with_input(&self, command: &str, input: Bytes) -> CommandOutput {
        match self.scripted(command) {
            Some(reply) => reply,
            None => self.local.run_with_input(command, input).await,
        }
    }
}

/// Temp layout: `remote/` stands in for the services root on the host,
/// `config/` is the local mirror and `backups/` holds archives.
pub struct Harness {
    pub root: TempDir,
    pub exec: Arc<FakeExecutor>,
    pub config: AppConfig,
    pub core: Arc<ServiceCore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    pub fn with(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let root = TempDir::new().unwrap();
        let remote = root.path().join("remote");
        std::fs::create_dir_all(&remote).unwrap();

        let mut config = AppConfig::default();
        config.paths.services_root = remote.to_str().unwrap().to_string();
        config.paths.config_dir = root.path().join("config");
        config.paths.backups_dir = root.path().join("backups");
        config.status.log_tail = 10;
        adjust(&mut config);

        let exec = FakeExecutor::new();
        let runtime = Arc::new(CliRuntime::new(exec.clone(), "docker"));
        let core = Arc::new(ServiceCore::new(
            runtime,
            RemoteHost::new(exec.clone()),
            &config,
        ));
        Self {
            root,
            exec,
            config,
            core,
        }
    }

    pub fn deployment(&self) -> ServiceDeployment {
        ServiceDeployment::new(self.core.clone(), &self.config)
    }

    pub fn remote_dir(&self, service: &str) -> PathBuf {
        self.root.path().join("remote").join(service)
    }

    pub fn config_dir(&self, service: &str) -> PathBuf {
        self.root.path().join("config").join(service)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.path().join("backups")
    }

    /// Scratch directory standing in for a volume's data on the host.
    pub fn volume_dir(&self, volume: &str) -> PathBuf {
        let dir = self.root.path().join("volumes").join(volume);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Scripts `docker ps` to list exactly `names`.
    pub fn containers(&self, names: &[&str]) {
        let mut out = names.join("\n");
        out.push('\n');
        self.exec.on_ok("docker ps -a", &out);
    }

    /// Scripts `docker inspect <name>` with a running container.
    pub fn inspect(&self, name: &str, image: &str, mounts: &[VolumeMount<'_>], env: &[&str]) {
        self.exec.on_ok(
            &format!("docker inspect {}", name),
            &inspect_json(name, image, mounts, env),
        );
    }

    /// Scripts the volume commands used by restore, with `mountpoint` as the data dir.
    pub fn volume(&self, volume: &str, mountpoint: &Path) {
        self.exec.on_ok(&format!("docker volume rm -f {}", volume), volume);
        self.exec
            .on_ok(&format!("docker volume create {}", volume), volume);
        self.exec.on_ok(
            &format!("docker volume inspect {}", volume),
            &serde_json::json!([{ "Name": volume, "Mountpoint": mountpoint }]).to_string(),
        );
    }

    pub fn lifecycle_ok(&self) {
        self.exec.on_ok("docker start", "");
        self.exec.on_ok("docker stop", "");
        self.exec.on_ok("docker restart", "");
    }
}

pub struct VolumeMount<'a> {
    pub name: &'a str,
    pub source: &'a Path,
    pub destination: &'a str,
}

pub fn inspect_json(name: &str, image: &str, mounts: &[VolumeMount<'_>], env: &[&str]) -> String {
    let mounts: Vec<serde_json::Value> = mounts
        .iter()
        .map(|m| {
            serde_json::json!({
                "Type": "volume",
                "Name": m.name,
                "Source": m.source,
                "Destination": m.destination,
            })
        })
        .collect();
    serde_json::json!([{
        "Id": format!("{}-id", name),
        "Name": format!("/{}", name),
        "State": {
            "Status": "running",
            "StartedAt": "2026-10-16T09:00:00Z",
            "Health": { "Status": "healthy" }
        },
        "Config": { "Image": image, "Env": env },
        "Mounts": mounts,
        "NetworkSettings": { "Networks": { "proxy": {}, "default": {} } }
    }])
    .to_string()
}

/// Relative path -> contents of every regular file under `dir`.
pub fn snapshot_files(dir: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
                out.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
