use super::ServiceCore;
use super::registry::matches_service;
use crate::models::ControlAction;
use tracing::{error, info, instrument, warn};

impl ServiceCore {
    /// Issues `action` against every matching container, in listing order.
    ///
    /// Stops at the first failure and returns false; containers handled before
    /// the failure keep their new state. A service with no containers yet is
    /// brought up from its compose file on start/restart.
    #[instrument(skip(self), fields(operation = "control_service"))]
    pub async fn control_service(&self, service: &str, action: ControlAction) -> bool {
        if service.trim().is_empty() {
            warn!(%action, "refusing lifecycle action for an empty service name");
            return false;
        }
        let names: Vec<String> = match self.runtime.list_containers().await {
            Ok(names) => names
                .into_iter()
                .filter(|n| matches_service(service, n))
                .collect(),
            Err(e) => {
                error!(service, %action, error = %e, "listing containers failed");
                return false;
            }
        };

        if names.is_empty() {
            if action == ControlAction::Stop {
                info!(service, "no containers to stop");
                return true;
            }
            let compose = self.compose_path(service);
            return match self.runtime.compose_up(&compose).await {
                Ok(()) => {
                    info!(service, compose = %compose, "compose project brought up");
                    true
                }
                Err(e) => {
                    warn!(service, compose = %compose, error = %e, "no containers and compose up failed");
                    false
                }
            };
        }

        for name in &names {
            if let Err(e) = self.runtime.control_container(name, action).await {
                error!(service, container = %name, %action, error = %e, "lifecycle action failed");
                return false;
            }
            info!(service, container = %name, %action, "lifecycle action applied");
        }
        true
    }
}
