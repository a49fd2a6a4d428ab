// Container runtime access: docker CLI over an executor, or the Engine API via bollard

mod api;
mod cli;
mod inspect;
mod stats;

pub use api::DockerApiRuntime;
pub use cli::CliRuntime;
pub use inspect::parse_inspect;
pub use stats::{parse_cli_stats, parse_size};

use crate::error::Result;
use crate::models::{ContainerDetails, ControlAction, ResourceUsage};
use async_trait::async_trait;

/// The container operations the service manager relies on.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Names of all containers, running or not.
    async fn list_containers(&self) -> Result<Vec<String>>;

    async fn inspect_container(&self, name: &str) -> Result<ContainerDetails>;

    /// One resource-usage sample.
    async fn container_stats(&self, name: &str) -> Result<ResourceUsage>;

    /// Last `tail` lines of stdout+stderr. With `follow`, blocks until the container exits.
    async fn container_logs(&self, name: &str, tail: u32, follow: bool) -> Result<String>;

    async fn control_container(&self, name: &str, action: ControlAction) -> Result<()>;

    /// Creates and starts the compose project defined by `compose_file` on the host.
    async fn compose_up(&self, compose_file: &str) -> Result<()>;

    /// Force-removes a named volume.
    async fn remove_volume(&self, name: &str) -> Result<()>;

    async fn create_volume(&self, name: &str) -> Result<()>;

    /// Host path backing a named volume.
    async fn volume_mountpoint(&self, name: &str) -> Result<String>;
}
