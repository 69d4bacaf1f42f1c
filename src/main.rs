use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use nominations_backend::{
    app::create_router,
    app_state::AppState,
    config, db, i18n,
    telemetry::{init_telemetry, TelemetryConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = config::init()?;

    let telemetry = init_telemetry(Some(TelemetryConfig {
        service_name: config.app.name.clone(),
        environment: format!("{:?}", config.app.environment).to_lowercase(),
        ..Default::default()
    }))
    .await
    .context("Failed to initialize telemetry")?;

    let store = db::init_store(&config.database)
        .await
        .context("Failed to initialize storage")?;

    let localizer = i18n::init_i18n(config.app.default_language)
        .context("Failed to load translations")?;

    let state = AppState::new(store, config.clone(), Arc::new(localizer));
    state
        .service
        .audit()
        .resume()
        .await
        .context("Failed to resume audit clock")?;
    let app = create_router(state);

    let addr = config.server_addr();
    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
