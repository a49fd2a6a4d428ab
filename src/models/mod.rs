// Domain models

mod deployment;
mod mount;
mod report;
mod restore;
mod service;
mod status;

pub use deployment::{DeploymentSpec, HealthCheck, ServiceDefinition};
pub use mount::{Mount, MountKind};
pub use report::{ConfigReport, FileSyncState, is_secret_key, redact_env};
pub use restore::{RestoreJournal, RestorePhase};
pub use service::{Container, ContainerDetails, Service};
pub use status::{ContainerStatusEntry, ControlAction, ResourceUsage, ServiceStatus};
