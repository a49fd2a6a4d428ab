use super::ServiceDeployment;
use crate::error::{Result, ServiceError};
use crate::models::{ControlAction, DeploymentSpec, Service};
use std::path::PathBuf;
use tracing::{info, instrument};

impl ServiceDeployment {
    /// Writes a compose file generated from `spec` to the local mirror and the
    /// service directory, then starts the service. Returns the local compose path.
    ///
    /// An invalid spec fails with [`ServiceError::Config`] before anything is
    /// written; later failures come back as [`ServiceError::Deploy`].
    #[instrument(skip(self, service, spec), fields(operation = "deploy_service", service = %service.name()))]
    pub async fn deploy_service(&self, service: &Service, spec: &DeploymentSpec) -> Result<PathBuf> {
        spec.validate()?;
        self.deploy_validated(service, spec)
            .await
            .map_err(|e| ServiceError::deploy(service.name(), e))
    }

    async fn deploy_validated(&self, service: &Service, spec: &DeploymentSpec) -> Result<PathBuf> {
        let compose = spec.to_compose_yaml()?;
        let file_name = &self.core.files().compose_file;

        tokio::fs::create_dir_all(service.config_path()).await?;
        self.core.host().mkdir_p(service.path()).await?;

        let local = service.config_path().join(file_name);
        tokio::fs::write(&local, &compose).await?;
        let remote = format!("{}/{}", service.path(), file_name);
        self.core.host().write_file(&remote, &compose).await?;
        info!(
            local = %local.display(),
            remote = %remote,
            services = spec.services.len(),
            "compose file written"
        );

        if !self
            .core
            .control_service(service.name(), ControlAction::Start)
            .await
        {
            return Err(ServiceError::Lifecycle {
                service: service.name().to_string(),
                action: ControlAction::Start.to_string(),
            });
        }
        info!("service deployed");
        Ok(local)
    }
}
