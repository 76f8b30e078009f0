use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use dockbook_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens the SQLite pool described by `config`. Every connection gets
/// foreign keys and WAL enabled, and the busy timeout follows the
/// configured acquire timeout so lock waits and pool waits give up
/// together.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let acquire_timeout = Duration::from_secs(config.timeout_secs.max(1));
    let busy_timeout_ms = acquire_timeout.as_millis().min(60_000) as u64;

    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {busy_timeout_ms}"))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await
}

#[cfg(test)]
mod tests {
    use dockbook_core::config::DatabaseConfig;

    use super::connect;

    fn memory() -> DatabaseConfig {
        DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1, timeout_secs: 5 }
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let pool = connect(&memory()).await.expect("connect");
        let enabled: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn zero_valued_settings_are_clamped_to_usable_minimums() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 0,
            timeout_secs: 0,
        };

        let pool = connect(&config).await.expect("connect");
        assert!(pool.acquire().await.is_ok());
    }
}
