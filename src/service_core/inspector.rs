use super::ServiceCore;
use super::registry::matches_service;
use crate::models::{Container, ContainerStatusEntry, ServiceStatus};
use tracing::{debug, instrument, warn};

impl ServiceCore {
    /// Container names matching `service`, or empty when listing fails or the
    /// name is blank (a blank name would match every container).
    async fn matching_names(&self, service: &str) -> Vec<String> {
        if service.trim().is_empty() {
            return Vec::new();
        }
        match self.runtime.list_containers().await {
            Ok(names) => names
                .into_iter()
                .filter(|n| matches_service(service, n))
                .collect(),
            Err(e) => {
                warn!(service, error = %e, "listing containers failed");
                Vec::new()
            }
        }
    }

    /// Every container whose name contains `service` (case-insensitive), inspected.
    /// Containers whose inspect fails are left out.
    #[instrument(skip(self), fields(operation = "find_matching_containers"))]
    pub async fn find_matching_containers(&self, service: &str) -> Vec<Container> {
        let mut containers = Vec::new();
        for name in self.matching_names(service).await {
            match self.runtime.inspect_container(&name).await {
                Ok(details) => containers.push(details.container),
                Err(e) => debug!(container = %name, error = %e, "inspect failed; container skipped"),
            }
        }
        containers
    }

    /// Recent logs of every matching container, each under a `=== name ===` header.
    #[instrument(skip(self), fields(operation = "get_logs"))]
    pub async fn get_logs(&self, service: &str, tail: u32, follow: bool) -> String {
        let containers = self.find_matching_containers(service).await;
        if containers.is_empty() {
            return format!("No containers found for service '{}'", service);
        }
        let mut out = String::new();
        for c in &containers {
            out.push_str(&format!("=== {} ===\n", c.name()));
            match self.runtime.container_logs(c.name(), tail, follow).await {
                Ok(text) => {
                    out.push_str(&text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Err(e) => out.push_str(&format!("<failed to read logs: {}>\n", e)),
            }
        }
        out
    }

    /// Inspect payload and a resource sample per container, plus recent logs.
    /// Per-container failures land in that entry's `error`.
    #[instrument(skip(self), fields(operation = "get_service_status"))]
    pub async fn get_service_status(&self, service: &str) -> ServiceStatus {
        let mut entries = Vec::new();
        for name in self.matching_names(service).await {
            let details = match self.runtime.inspect_container(&name).await {
                Ok(d) => d,
                Err(e) => {
                    entries.push(ContainerStatusEntry::unavailable(&name, e.to_string()));
                    continue;
                }
            };
            let (usage, error) = match self.runtime.container_stats(&name).await {
                Ok(u) => (Some(u), None),
                Err(e) => (None, Some(format!("stats: {}", e))),
            };
            let c = &details.container;
            entries.push(ContainerStatusEntry {
                name: c.name().to_string(),
                id: Some(details.id.clone()).filter(|id| !id.is_empty()),
                image: Some(c.image().to_string()),
                status: Some(c.status().to_string()),
                health: c.health().map(String::from),
                started_at: Some(c.started_at().to_string()),
                inspect: Some(details.raw),
                usage,
                error,
            });
        }
        let logs = self.get_logs(service, self.log_tail, false).await;
        ServiceStatus {
            service: service.to_string(),
            containers: entries,
            logs,
        }
    }
}
