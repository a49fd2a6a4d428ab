use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use servicectl::config::AppConfig;
use servicectl::models::{ControlAction, DeploymentSpec};
use servicectl::{ServiceCore, ServiceDeployment, logging};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "servicectl", version)]
#[command(about = "Manage Docker services on a remote host: status, lifecycle, deploy, backup and restore")]
struct Cli {
    /// Config file; defaults to $CONFIG_FILE or ./config.toml
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List services found on the host
    List,
    /// Containers, resource usage and recent logs of a service
    Status(ServiceArg),
    Logs(LogsArgs),
    Start(ServiceArg),
    Stop(ServiceArg),
    Restart(ServiceArg),
    /// Compare local config mirror with the host
    Verify(ServiceArg),
    /// Pull the service directory from the host into the local mirror
    Sync(ServiceArg),
    /// Generate a compose file from a YAML/JSON definition and start the service
    Deploy(DeployArgs),
    Backup(ServiceArg),
    /// List backup archives, newest first
    Backups(ServiceArg),
    Restore(RestoreArgs),
    /// Continue a failed restore from its journal
    ResumeRestore(ServiceArg),
    /// Restore the snapshot taken before a failed restore
    RollbackRestore(ServiceArg),
}

#[derive(Args)]
struct ServiceArg {
    service: String,
}

#[derive(Args)]
struct LogsArgs {
    service: String,
    #[arg(long, short = 'n')]
    tail: Option<u32>,
    #[arg(long, short)]
    follow: bool,
}

#[derive(Args)]
struct DeployArgs {
    service: String,
    /// Deployment definition (YAML or JSON)
    definition: PathBuf,
}

#[derive(Args)]
struct RestoreArgs {
    service: String,
    archive: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    let core = Arc::new(ServiceCore::connect(&config).context("Failed to connect to host")?);
    let deployment = ServiceDeployment::new(core.clone(), &config);

    run(cli.command, &core, &deployment).await
}

async fn run(command: Commands, core: &ServiceCore, deployment: &ServiceDeployment) -> Result<()> {
    match command {
        Commands::List => print_json(&core.discover_services().await),
        Commands::Status(a) => print_json(&core.get_service_status(&a.service).await),
        Commands::Logs(a) => {
            let tail = a.tail.unwrap_or(core.log_tail());
            print!("{}", core.get_logs(&a.service, tail, a.follow).await);
            Ok(())
        }
        Commands::Start(a) => control(core, &a.service, ControlAction::Start).await,
        Commands::Stop(a) => control(core, &a.service, ControlAction::Stop).await,
        Commands::Restart(a) => control(core, &a.service, ControlAction::Restart).await,
        Commands::Verify(a) => {
            let service = core.resolve_service(&a.service).await?;
            print_json(&core.verify_configs(&service).await)
        }
        Commands::Sync(a) => {
            let service = core.resolve_service(&a.service).await?;
            if !core.sync_configs(&service).await {
                bail!("sync of '{}' failed", a.service);
            }
            Ok(())
        }
        Commands::Deploy(a) => {
            let raw = tokio::fs::read_to_string(&a.definition)
                .await
                .with_context(|| format!("reading {}", a.definition.display()))?;
            let spec = DeploymentSpec::from_yaml_str(&raw)?;
            let service = core.resolve_service(&a.service).await?;
            let compose = deployment
                .deploy_service(&service, &spec)
                .await
                .context("Deploy failed")?;
            println!("{}", compose.display());
            Ok(())
        }
        Commands::Backup(a) => {
            let service = core.resolve_service(&a.service).await?;
            let archive = deployment
                .backup_service(&service)
                .await
                .context("Backup failed")?;
            println!("{}", archive.display());
            Ok(())
        }
        Commands::Backups(a) => print_json(&deployment.list_backups(&a.service).await?),
        Commands::Restore(a) => {
            let service = core.resolve_service(&a.service).await?;
            deployment
                .restore_service(&service, &a.archive)
                .await
                .context("Restore failed")
        }
        Commands::ResumeRestore(a) => {
            let service = core.resolve_service(&a.service).await?;
            deployment
                .resume_restore(&service)
                .await
                .context("Resume failed")
        }
        Commands::RollbackRestore(a) => {
            let service = core.resolve_service(&a.service).await?;
            deployment
                .rollback_restore(&service)
                .await
                .context("Rollback failed")
        }
    }
}

async fn control(core: &ServiceCore, service: &str, action: ControlAction) -> Result<()> {
    if !core.control_service(service, action).await {
        bail!("{} of '{}' failed", action, service);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
