mod bootstrap;
mod health;

use anyhow::Result;

use dockbook_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use dockbook_core::config::LogFormat::*;
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
    // Config first so logging honors the configured level and format.
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
        event_name = "system.server.started",
        device_label = %app.config.chat.device_label,
        "dockbook-server started"
    );

    app.chat_runner.start().await?;

    wait_for_shutdown().await?;
    tracing::info!(event_name = "system.server.stopping", "dockbook-server stopping");

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
