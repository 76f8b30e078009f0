use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use dockbook_agent::{FallbackResponder, HostedLlmClient};
use dockbook_chat::transport::NoopChatTransport;
use dockbook_chat::{ChatRunner, DialogueEngine, DialoguePolicy};
use dockbook_core::admin::AdminBlockService;
use dockbook_core::booking::BookingService;
use dockbook_core::clock::SystemClock;
use dockbook_core::collab::{AdminSecretSource, OccupancyStore, OrderDirectory};
use dockbook_core::config::{AppConfig, ConfigError, LoadOptions};
use dockbook_core::schedule::slots::SlotEngine;
use dockbook_db::{
    connect, migrations, DbPool, SqlOccupancyStore, SqlOrderDirectory, SqlSettingsRepository,
    StaticAdminSecret,
};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_runner: ChatRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let occupancy: Arc<dyn OccupancyStore> = Arc::new(SqlOccupancyStore::new(db_pool.clone()));
    let orders: Arc<dyn OrderDirectory> = Arc::new(SqlOrderDirectory::new(db_pool.clone()));

    // A secret from config or environment wins over the one stored in the
    // settings table.
    let secrets: Arc<dyn AdminSecretSource> = match &config.admin.secret {
        Some(secret) => Arc::new(StaticAdminSecret(Some(secret.clone()))),
        None => Arc::new(SqlSettingsRepository::new(db_pool.clone())),
    };

    let fallback = match &config.llm.api_key {
        Some(_) => match HostedLlmClient::from_config(&config.llm) {
            Ok(client) => FallbackResponder::new(Arc::new(client)),
            Err(error) => {
                tracing::warn!(
                    event_name = "system.bootstrap.llm_disabled",
                    error = %error,
                    "llm client could not be built; free-text questions get the apology"
                );
                FallbackResponder::disabled()
            }
        },
        None => FallbackResponder::disabled(),
    };

    let engine = DialogueEngine::new(
        BookingService::new(orders, occupancy.clone()),
        AdminBlockService::new(occupancy.clone()),
        occupancy,
        secrets,
        fallback,
        SlotEngine::new(config.business_hours(), config.duration_tiers()),
        config.calendar_policy(),
        config.contacts.clone(),
        Arc::new(SystemClock),
        DialoguePolicy::from_config(&config),
    );

    let chat_runner = ChatRunner::new(Arc::new(NoopChatTransport), Arc::new(engine));

    Ok(Application { config, db_pool, chat_runner })
}
