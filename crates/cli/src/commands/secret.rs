use crate::commands::CommandResult;
use dockbook_core::config::{AppConfig, LoadOptions};
use dockbook_db::{connect, migrations, SqlSettingsRepository};

pub fn run(value: &str) -> CommandResult {
    if value.trim().is_empty() {
        return CommandResult::failure(
            "set-admin-secret",
            "invalid_input",
            "the administrator password cannot be blank",
            2,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "set-admin-secret",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "set-admin-secret",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        SqlSettingsRepository::new(pool.clone())
            .set_admin_secret(value)
            .await
            .map_err(|error| ("settings_write", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success("set-admin-secret", "administrator password stored"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("set-admin-secret", error_class, message, exit_code)
        }
    }
}
