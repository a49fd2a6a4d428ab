// Discovery, inspection, lifecycle and config mirroring against a scripted docker

mod common;

use common::{Harness, VolumeMount};
use servicectl::executor::CommandOutput;
use servicectl::models::ControlAction;

const STATS_LINE: &str = r#"{"BlockIO":"0B / 0B","CPUPerc":"0.50%","MemUsage":"10MiB / 1GiB","NetIO":"1kB / 2kB","PIDs":"4"}"#;

fn names(services: &[servicectl::models::Service]) -> Vec<&str> {
    services.iter().map(|s| s.name()).collect()
}

#[tokio::test]
async fn test_discovery_merges_directories_and_container_prefixes() {
    let h = Harness::new();
    std::fs::create_dir_all(h.remote_dir("web")).unwrap();
    std::fs::create_dir_all(h.remote_dir("servicectl")).unwrap();
    h.containers(&["web_app_1", "redis_cache_1", "web-container"]);
    h.inspect("web_app_1", "nginx:1.27", &[], &[]);
    h.inspect("redis_cache_1", "redis:7", &[], &[]);
    h.inspect("web-container", "nginx:1.27", &[], &[]);

    let services = h.core.discover_services().await;
    assert_eq!(names(&services), vec!["redis", "web"]);

    let web = &services[1];
    let containers: Vec<&str> = web.containers().iter().map(|c| c.name()).collect();
    assert_eq!(containers, vec!["web_app_1", "web-container"]);
    assert_eq!(web.path(), h.remote_dir("web").to_str().unwrap());
    assert_eq!(web.config_path(), h.config_dir("web"));
    assert_eq!(services[0].containers()[0].image(), "redis:7");
}

#[tokio::test]
async fn test_discovery_skips_containers_that_fail_inspect() {
    let h = Harness::new();
    std::fs::create_dir_all(h.remote_dir("web")).unwrap();
    h.containers(&["web_app_1", "web_worker_1"]);
    h.inspect("web_app_1", "nginx", &[], &[]);

    let services = h.core.discover_services().await;
    assert_eq!(names(&services), vec!["web"]);
    assert_eq!(services[0].containers().len(), 1);
    assert_eq!(services[0].containers()[0].name(), "web_app_1");
}

#[tokio::test]
async fn test_discovery_without_docker_lists_directories() {
    let h = Harness::new();
    std::fs::create_dir_all(h.remote_dir("media")).unwrap();
    std::fs::create_dir_all(h.remote_dir("web")).unwrap();

    let services = h.core.discover_services().await;
    assert_eq!(names(&services), vec!["media", "web"]);
    assert!(services.iter().all(|s| s.containers().is_empty()));
}

#[tokio::test]
async fn test_matching_is_loose_substring() {
    let h = Harness::new();
    h.containers(&["userdb_postgres_1", "DB_backup_1", "web_1"]);
    h.inspect("userdb_postgres_1", "postgres:16", &[], &[]);
    h.inspect("DB_backup_1", "alpine", &[], &[]);

    let found = h.core.find_matching_containers("db").await;
    let found: Vec<&str> = found.iter().map(|c| c.name()).collect();
    assert_eq!(found, vec!["userdb_postgres_1", "DB_backup_1"]);
}

#[tokio::test]
async fn test_logs_placeholder_when_no_containers() {
    let h = Harness::new();
    h.containers(&["web_1"]);
    let logs = h.core.get_logs("ghost", 10, false).await;
    assert_eq!(logs, "No containers found for service 'ghost'");
}

#[tokio::test]
async fn test_logs_have_container_headers() {
    let h = Harness::new();
    h.containers(&["web_app_1", "web_worker_1"]);
    h.inspect("web_app_1", "nginx", &[], &[]);
    h.inspect("web_worker_1", "worker", &[], &[]);
    h.exec.on_ok("docker logs --tail 5 web_app_1", "GET / 200");
    h.exec.on_ok("docker logs --tail 5 web_worker_1", "job done\n");

    let logs = h.core.get_logs("web", 5, false).await;
    assert_eq!(
        logs,
        "=== web_app_1 ===\nGET / 200\n=== web_worker_1 ===\njob done\n"
    );
}

#[tokio::test]
async fn test_control_stops_at_first_failure() {
    let h = Harness::new();
    h.containers(&["web_1", "web_2", "web_3"]);
    h.exec.on_ok("docker stop web_1", "web_1");
    h.exec
        .on("docker stop web_2", CommandOutput::failed(1, "cannot stop"));
    h.exec.on_ok("docker stop web_3", "web_3");

    assert!(!h.core.control_service("web", ControlAction::Stop).await);
    let stops: Vec<String> = h
        .exec
        .docker_calls()
        .into_iter()
        .filter(|c| c.starts_with("docker stop"))
        .collect();
    assert_eq!(stops, vec!["docker stop web_1", "docker stop web_2"]);
}

#[tokio::test]
async fn test_control_applies_action_to_every_container() {
    let h = Harness::new();
    h.containers(&["web_1", "web_2", "db_1"]);
    h.lifecycle_ok();

    assert!(h.core.control_service("web", ControlAction::Restart).await);
    let restarts: Vec<String> = h
        .exec
        .docker_calls()
        .into_iter()
        .filter(|c| c.starts_with("docker restart"))
        .collect();
    assert_eq!(restarts, vec!["docker restart web_1", "docker restart web_2"]);
}

#[tokio::test]
async fn test_start_without_containers_runs_compose_up() {
    let h = Harness::new();
    h.containers(&["db_1"]);
    h.exec.on_ok("docker compose", "");

    assert!(h.core.control_service("web", ControlAction::Start).await);
    let compose = format!(
        "docker compose -f {}/docker-compose.yml up -d",
        h.remote_dir("web").display()
    );
    assert!(h.exec.docker_calls().contains(&compose));
}

#[tokio::test]
async fn test_stop_without_containers_is_noop() {
    let h = Harness::new();
    h.containers(&["db_1"]);
    assert!(h.core.control_service("web", ControlAction::Stop).await);
    assert_eq!(h.exec.docker_calls().len(), 1);
}

#[tokio::test]
async fn test_blank_service_name_matches_nothing() {
    let h = Harness::new();
    h.containers(&["web_1", "db_1"]);
    h.inspect("web_1", "nginx", &[], &[]);
    h.inspect("db_1", "postgres:16", &[], &[]);
    h.lifecycle_ok();

    assert!(!h.core.control_service("", ControlAction::Stop).await);
    assert!(!h.core.control_service("  ", ControlAction::Start).await);
    assert!(h.core.find_matching_containers("").await.is_empty());
    assert!(h.core.get_service_status("").await.containers.is_empty());
    assert!(
        h.exec
            .docker_calls()
            .iter()
            .all(|c| !c.starts_with("docker stop") && !c.starts_with("docker start"))
    );
}

#[tokio::test]
async fn test_control_fails_when_listing_fails() {
    let h = Harness::new();
    h.exec
        .on("docker ps -a", CommandOutput::failed(1, "daemon not running"));
    assert!(!h.core.control_service("web", ControlAction::Start).await);
}

#[tokio::test]
async fn test_status_records_per_container_errors() {
    let h = Harness::new();
    h.containers(&["web_app_1", "web_app_2"]);
    h.inspect("web_app_1", "nginx:1.27", &[], &[]);
    h.exec.on_ok("docker stats", STATS_LINE);
    h.exec.on_ok("docker logs", "ready\n");

    let status = h.core.get_service_status("web").await;
    assert_eq!(status.service, "web");
    assert_eq!(status.containers.len(), 2);

    let ok = &status.containers[0];
    assert_eq!(ok.name, "web_app_1");
    assert_eq!(ok.id.as_deref(), Some("web_app_1-id"));
    assert_eq!(ok.health.as_deref(), Some("healthy"));
    assert_eq!(ok.usage.as_ref().map(|u| u.pids), Some(4));
    assert!(ok.inspect.is_some());
    assert!(ok.error.is_none());

    let broken = &status.containers[1];
    assert_eq!(broken.name, "web_app_2");
    assert!(broken.inspect.is_none());
    assert!(broken.error.is_some());

    assert!(status.logs.contains("=== web_app_1 ==="));
    assert!(h
        .exec
        .docker_calls()
        .contains(&"docker logs --tail 10 web_app_1 2>&1".to_string()));
}

#[tokio::test]
async fn test_verify_reports_sync_state_and_redacts_secrets() {
    let h = Harness::new();
    std::fs::create_dir_all(h.remote_dir("web")).unwrap();
    std::fs::create_dir_all(h.config_dir("web")).unwrap();
    std::fs::write(h.remote_dir("web").join("docker-compose.yml"), "services: {}\n").unwrap();
    std::fs::write(h.config_dir("web").join("docker-compose.yml"), "services: {}").unwrap();
    std::fs::write(h.remote_dir("web").join("nginx.conf"), "server {}").unwrap();

    let data = h.volume_dir("web-data");
    h.containers(&["web-container"]);
    h.inspect(
        "web-container",
        "nginx",
        &[VolumeMount {
            name: "web-data",
            source: &data,
            destination: "/data",
        }],
        &[
            "DB_PASSWORD=hunter2",
            "api_key=abc",
            "Session_Secret=s",
            "GITHUB_TOKEN=t",
            "TZ=UTC",
            "EMPTY",
        ],
    );

    let service = h.core.resolve_service("web").await.unwrap();
    let report = h.core.verify_configs(&service).await;

    assert!(report.compose.local_exists && report.compose.remote_exists);
    assert!(report.compose.in_sync);
    let proxy = report.proxy.expect("proxy present remotely");
    assert!(!proxy.local_exists && proxy.remote_exists && !proxy.in_sync);

    let keys: Vec<&str> = report.env_vars.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["EMPTY", "TZ"]);
    assert_eq!(report.mounts.len(), 1);
    assert_eq!(report.mounts[0].volume_name(), Some("web-data"));
    assert_eq!(report.networks, vec!["default", "proxy"]);
}

#[tokio::test]
async fn test_verify_omits_absent_proxy_config() {
    let h = Harness::new();
    h.containers(&[]);
    let service = h.core.resolve_service("web").await.unwrap();
    let report = h.core.verify_configs(&service).await;
    assert!(report.proxy.is_none());
    assert!(!report.compose.in_sync);
    assert!(report.env_vars.is_empty());
}

#[tokio::test]
async fn test_sync_mirrors_remote_directory_and_keeps_local_extras() {
    let h = Harness::new();
    let remote = h.remote_dir("web");
    std::fs::create_dir_all(remote.join("conf.d")).unwrap();
    std::fs::write(remote.join("docker-compose.yml"), "services: {}\n").unwrap();
    std::fs::write(remote.join("conf.d/site.conf"), "server {}\n").unwrap();
    std::fs::create_dir_all(h.config_dir("web")).unwrap();
    std::fs::write(h.config_dir("web").join("notes.md"), "local only").unwrap();
    h.containers(&[]);

    let service = h.core.resolve_service("web").await.unwrap();
    assert!(h.core.sync_configs(&service).await);
    assert_eq!(
        std::fs::read_to_string(h.config_dir("web").join("conf.d/site.conf")).unwrap(),
        "server {}\n"
    );
    assert!(h.config_dir("web").join("notes.md").exists());
}

#[tokio::test]
async fn test_sync_fails_for_missing_remote_directory() {
    let h = Harness::new();
    h.containers(&[]);
    let service = h.core.resolve_service("ghost").await.unwrap();
    assert!(!h.core.sync_configs(&service).await);
}
