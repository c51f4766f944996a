use anyhow::Result;
use forgefit::api::routes::create_routes;
use forgefit::config::{run_migrations, AppConfig, DatabaseConfig};
use forgefit::services::{AchievementScheduler, AchievementService};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let db = db_config.create_pool().await?;
    run_migrations(&db).await?;
    info!("Database migrations applied");

    // Periodic recompute keeps time-based achievements current for users
    // who stop logging
    let scheduler = AchievementScheduler::new(
        AchievementService::new(db.clone()),
        config.achievement_recalc_interval_secs,
    );
    scheduler.start().await;

    // Create the application routes
    let app = create_routes(db, &config)?;

    // Start the server
    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("ForgeFit server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
