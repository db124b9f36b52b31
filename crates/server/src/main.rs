mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use laundryops_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use laundryops_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.telegram_transport_mode",
        transport_mode = if app.telegram_noop { "noop" } else { "long_poll" },
        "telegram transport mode initialized"
    );
    tracing::info!(event_name = "system.server.started", "laundryops-server started");

    // The poll loop runs until its retries are exhausted or the stream closes;
    // Ctrl-C wins either way.
    tokio::select! {
        result = app.runner.start() => result?,
        _ = tokio::signal::ctrl_c() => {}
    }

    tracing::info!(event_name = "system.server.stopping", "laundryops-server stopping");

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.db_pool.close()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            grace_secs = app.config.server.graceful_shutdown_secs,
            "database pool did not drain within the grace period"
        );
    }

    Ok(())
}
