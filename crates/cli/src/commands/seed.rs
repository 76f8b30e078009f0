use crate::commands::CommandResult;
use dockbook_core::config::{AppConfig, LoadOptions};
use dockbook_db::{connect, migrations, seed_sample_data};

pub fn run(admin_secret: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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
                "seed",
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

        let seeded = seed_sample_data(&pool, admin_secret)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "seeded {} purchase orders (admin secret {})",
                seeded.purchase_orders,
                if seeded.admin_secret_set { "stored" } else { "left unchanged" }
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
