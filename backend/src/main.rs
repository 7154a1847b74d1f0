//! Main entry point for the ParkingSlot backend.
//!
//! Loads configuration, prepares the database and the mail transport, then
//! serves the Axum application until the process is stopped.

use anyhow::{Context, anyhow};
use parkingslot_api::{
    api::app_router,
    config::Config,
    database::Database,
    services::{email_service::build_sender, user_service::UserService},
    state::AppState,
    utils::sort,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    sort::validate_all().map_err(|e| anyhow!("invalid sort mapping: {}", e))?;

    let db = Database::new(&config)
        .await
        .context("failed to connect to the database")?;
    db.migrate().await.context("failed to run migrations")?;

    let mailer = build_sender(config.email_config())?;

    if let Some(admin) = &config.admin {
        UserService::new(db.pool(), config.auth.bcrypt_cost)
            .ensure_admin(admin)
            .await?;
    }

    let port = config.server_port;
    let state = AppState::new(db.pool().clone(), config, mailer);
    let app = app_router(state);

    let bind_address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!("Starting ParkingSlot server on port {}", port);
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
