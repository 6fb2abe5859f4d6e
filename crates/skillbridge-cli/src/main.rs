use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use skillbridge_storage::CareerStore;
use skillbridge_sync::{
    maybe_build_scheduler, process_alerts, SourceRegistry, SyncConfig, SyncOrchestrator,
};
use skillbridge_web::AppState;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "skillbridge-cli")]
#[command(about = "SkillBridge sync engine command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one job sync pass and print the summary.
    SyncJobs,
    /// Run one course sync pass and print the summary.
    SyncCourses,
    /// Run one alert-matcher pass over all saved alerts.
    Alerts,
    /// Serve the JSON API.
    Serve,
    /// Run the background scheduler until interrupted.
    Schedule,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|err| anyhow::anyhow!("initializing tracing: {err}"))
}

fn build_orchestrator(
    config: &SyncConfig,
    store: Arc<CareerStore>,
) -> Result<Arc<SyncOrchestrator>> {
    let registry = SourceRegistry::from_workspace_root(&config.workspace_root)?;
    Ok(Arc::new(SyncOrchestrator::new(config, &registry, store)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = SyncConfig::from_env();
    let store = Arc::new(CareerStore::new());

    match cli.command.unwrap_or(Commands::SyncJobs) {
        Commands::SyncJobs => {
            let orchestrator = build_orchestrator(&config, store)?;
            let summary = orchestrator.run_job_sync().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::SyncCourses => {
            let orchestrator = build_orchestrator(&config, store)?;
            let summary = orchestrator.run_course_sync().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Alerts => {
            let notified = process_alerts(&store, Utc::now()).await;
            println!("alert pass complete: notified={notified}");
        }
        Commands::Serve => {
            let orchestrator = build_orchestrator(&config, store.clone())?;
            info!("serving JSON API");
            skillbridge_web::serve_from_env(AppState::new(store, orchestrator)).await?;
        }
        Commands::Schedule => {
            let orchestrator = build_orchestrator(&config, store)?;
            match maybe_build_scheduler(&config, orchestrator).await? {
                Some(sched) => {
                    sched.start().await.context("starting scheduler")?;
                    info!("scheduler running; press Ctrl-C to stop");
                    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
                }
                None => {
                    eprintln!(
                        "scheduler disabled; set SKILLBRIDGE_SCHEDULER_ENABLED=1 to enable"
                    );
                }
            }
        }
    }

    Ok(())
}
