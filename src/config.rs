use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
}

/// Managed host. Without `host`, commands run on this machine.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub identity_file: Option<String>,
    /// Extra `-o` options for ssh, e.g. "StrictHostKeyChecking=accept-new".
    #[serde(default)]
    pub ssh_options: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            port: default_ssh_port(),
            identity_file: None,
            ssh_options: Vec::new(),
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Remote directory holding one subdirectory per service.
    #[serde(default = "default_services_root")]
    pub services_root: String,
    /// Directory under `services_root` owned by this tool; never treated as a service.
    #[serde(default = "default_management_dir")]
    pub management_dir: String,
    /// Local config mirror, one subdirectory per service.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    #[serde(default = "default_backups_dir")]
    pub backups_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            services_root: default_services_root(),
            management_dir: default_management_dir(),
            config_dir: default_config_dir(),
            backups_dir: default_backups_dir(),
        }
    }
}

fn default_services_root() -> String {
    "/opt/services".into()
}

fn default_management_dir() -> String {
    "servicectl".into()
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config/services")
}

fn default_backups_dir() -> PathBuf {
    PathBuf::from("backups")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeBackend {
    /// docker CLI through the executor (works over ssh).
    #[default]
    Cli,
    /// Docker Engine API via the local socket / DOCKER_HOST.
    Api,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub backend: RuntimeBackend,
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: RuntimeBackend::default(),
            docker_bin: default_docker_bin(),
        }
    }
}

fn default_docker_bin() -> String {
    "docker".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_compose_file")]
    pub compose_file: String,
    /// Optional reverse-proxy config checked by `verify`.
    #[serde(default = "default_proxy_config_file")]
    pub proxy_config_file: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            compose_file: default_compose_file(),
            proxy_config_file: default_proxy_config_file(),
        }
    }
}

fn default_compose_file() -> String {
    "docker-compose.yml".into()
}

fn default_proxy_config_file() -> String {
    "nginx.conf".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Log lines per container included in `status`.
    #[serde(default = "default_log_tail")]
    pub log_tail: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            log_tail: default_log_tail(),
        }
    }
}

fn default_log_tail() -> u32 {
    50
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreConfig {
    /// Take a backup of the stopped service before overwriting it, enabling rollback.
    #[serde(default)]
    pub snapshot_before_restore: bool,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(std::path::Path::new(&path))
    }

    pub fn load_from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(host) = &self.remote.host {
            anyhow::ensure!(!host.trim().is_empty(), "remote.host must be non-empty when set");
            // bollard only reaches the local daemon, while host file operations go over ssh.
            anyhow::ensure!(
                self.runtime.backend != RuntimeBackend::Api,
                "runtime.backend = \"api\" cannot be combined with remote.host {:?}; use \"cli\"",
                host
            );
        }
        anyhow::ensure!(
            self.remote.port > 0,
            "remote.port must be between 1 and 65535, got {}",
            self.remote.port
        );
        anyhow::ensure!(
            self.paths.services_root.starts_with('/'),
            "paths.services_root must be an absolute path, got {:?}",
            self.paths.services_root
        );
        anyhow::ensure!(
            !self.paths.management_dir.is_empty() && !self.paths.management_dir.contains('/'),
            "paths.management_dir must be a single directory name, got {:?}",
            self.paths.management_dir
        );
        anyhow::ensure!(
            !self.paths.config_dir.as_os_str().is_empty(),
            "paths.config_dir must be non-empty"
        );
        anyhow::ensure!(
            !self.paths.backups_dir.as_os_str().is_empty(),
            "paths.backups_dir must be non-empty"
        );
        anyhow::ensure!(
            !self.runtime.docker_bin.trim().is_empty(),
            "runtime.docker_bin must be non-empty"
        );
        anyhow::ensure!(
            !self.files.compose_file.is_empty() && !self.files.compose_file.contains('/'),
            "files.compose_file must be a file name, got {:?}",
            self.files.compose_file
        );
        anyhow::ensure!(
            !self.files.proxy_config_file.contains('/'),
            "files.proxy_config_file must be a file name, got {:?}",
            self.files.proxy_config_file
        );
        anyhow::ensure!(
            self.status.log_tail > 0,
            "status.log_tail must be > 0, got {}",
            self.status.log_tail
        );
        Ok(())
    }
}
