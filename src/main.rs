use payoff_planner::{
    config::{database, settings},
    core::{context::PlannerContext, events::TracingEventSink},
    errors::Result,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenvy::dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load planner settings
    let planner_settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load planner settings: {}", e))?;
    info!(?planner_settings, "Planner settings loaded.");

    // 4. Connect and make sure the schema exists
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Wire up the engine
    let ctx = PlannerContext::new(db, Arc::new(TracingEventSink), planner_settings);
    info!(
        store_timeout_ms = ctx.settings.store_timeout_ms,
        "Payoff planner ready."
    );

    Ok(())
}
