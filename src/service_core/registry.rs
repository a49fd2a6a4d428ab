use super::ServiceCore;
use crate::models::{Container, Service};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Service a container name points at by convention: the part before the first `_`.
pub fn candidate_service_name(container: &str) -> &str {
    container.split('_').next().unwrap_or(container)
}

/// Case-insensitive substring match of a service name against a container name.
///
/// This is deliberately loose: `db` also matches `userdb_postgres_1`. Discovery
/// resolves such overlaps; direct lookups by name keep the loose behavior.
pub fn matches_service(service: &str, container: &str) -> bool {
    container.to_lowercase().contains(&service.to_lowercase())
}

/// Picks the owner of a container among the services whose names it contains:
/// directory-backed services first, then the longest (most specific) name.
fn owner_of<'a>(
    container: &str,
    names: &'a BTreeSet<String>,
    dirs: &BTreeSet<String>,
) -> Option<&'a str> {
    let mut candidates: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|s| matches_service(s, container))
        .collect();
    if candidates.len() > 1 {
        debug!(container, ?candidates, "container name matches several services");
    }
    candidates.sort_by_key(|s| (!dirs.contains(*s), std::cmp::Reverse(s.len())));
    candidates.first().copied()
}

impl ServiceCore {
    /// All services: directories under the services root plus prefixes of every
    /// known container, each with the containers attributed to it in this pass.
    #[instrument(skip(self), fields(operation = "discover_services"))]
    pub async fn discover_services(&self) -> Vec<Service> {
        let container_names = match self.runtime.list_containers().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "listing containers failed; discovery uses directories only");
                Vec::new()
            }
        };
        let dirs: BTreeSet<String> = self
            .host
            .list_dirs(&self.paths.services_root)
            .await
            .into_iter()
            .filter(|d| d != &self.paths.management_dir)
            .collect();

        let mut names: BTreeSet<String> = dirs.clone();
        for c in &container_names {
            let candidate = candidate_service_name(c);
            if !candidate.is_empty() {
                names.insert(candidate.to_string());
            }
        }

        let mut owned: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for c in &container_names {
            if let Some(owner) = owner_of(c, &names, &dirs) {
                owned.entry(owner).or_default().push(c.as_str());
            }
        }

        let mut services = Vec::with_capacity(names.len());
        for name in &names {
            let members = owned.remove(name.as_str()).unwrap_or_default();
            // A prefix that lost all its containers to a directory service is just an alias.
            if members.is_empty() && !dirs.contains(name) {
                continue;
            }
            let mut containers: Vec<Container> = Vec::with_capacity(members.len());
            for member in members {
                match self.runtime.inspect_container(member).await {
                    Ok(details) => containers.push(details.container),
                    Err(e) => debug!(container = member, error = %e, "inspect failed; container skipped"),
                }
            }
            match Service::new(
                name.as_str(),
                self.service_dir(name),
                self.config_dir(name),
                containers,
            ) {
                Ok(s) => services.push(s),
                Err(e) => warn!(service = %name, error = %e, "skipping invalid service name"),
            }
        }
        debug!(services = services.len(), "discovery complete");
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candidate_is_prefix_before_underscore() {
        assert_eq!(candidate_service_name("web_app_1"), "web");
        assert_eq!(candidate_service_name("web-container"), "web-container");
        assert_eq!(candidate_service_name("_odd"), "");
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert!(matches_service("Web", "my-WEB-container"));
        assert!(matches_service("db", "userdb_postgres_1"));
        assert!(!matches_service("cache", "web_1"));
    }

    #[test]
    fn most_specific_directory_service_owns_container() {
        let names = set(&["db", "userdb"]);
        let dirs = set(&["db", "userdb"]);
        assert_eq!(owner_of("userdb_postgres_1", &names, &dirs), Some("userdb"));
        assert_eq!(owner_of("db_1", &names, &dirs), Some("db"));
    }

    #[test]
    fn directory_service_beats_container_prefix() {
        let names = set(&["web", "web-container"]);
        let dirs = set(&["web"]);
        assert_eq!(owner_of("web-container", &names, &dirs), Some("web"));
    }

    #[test]
    fn orphan_container_owned_by_its_prefix() {
        let names = set(&["redis", "web"]);
        let dirs = set(&["web"]);
        assert_eq!(owner_of("redis_cache_1", &names, &dirs), Some("redis"));
    }
}
