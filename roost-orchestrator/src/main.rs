use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roost_engine::Executor;
use roost_orchestrator::config::Config;
use roost_orchestrator::credentials::CredentialStore;
use roost_orchestrator::db;
use roost_orchestrator::scheduler::TriggerScheduler;
use roost_orchestrator::service::{DeploymentService, RunContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost_orchestrator=info,roost_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Roost Orchestrator...");

    let config = Config::from_env()?;

    tracing::info!(database_url = %config.database_url, "Connecting to database...");

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    tracing::info!("Database ready");

    let scheduler = Arc::new(TriggerScheduler::with_tick_interval(config.tick_interval));
    let executor = Arc::new(Executor::with_interpreter(
        config.timeout_seconds,
        config.interpreter.clone(),
    ));
    let credentials = Arc::new(CredentialStore::new());

    let run_context = Arc::new(RunContext::new(
        pool.clone(),
        executor,
        Arc::clone(&credentials),
        config.base_env.clone(),
    ));
    scheduler.set_callback(run_context.callback());

    let deployments = DeploymentService::new(pool.clone(), Arc::clone(&scheduler));
    let restored = deployments.restore_schedules().await?;
    tracing::info!(triggers_registered = restored, "Schedules restored");

    scheduler.start();
    tracing::info!("Scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    scheduler.shutdown(true).await;
    pool.close().await;

    Ok(())
}
