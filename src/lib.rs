// Library for the binary and integration tests

pub mod archive;
pub mod config;
pub mod deployment;
pub mod error;
pub mod executor;
pub mod host;
pub mod logging;
pub mod models;
pub mod runtime;
pub mod service_core;
pub mod shell;

pub use deployment::ServiceDeployment;
pub use error::{Result, ServiceError};
pub use service_core::ServiceCore;
