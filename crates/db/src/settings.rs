use async_trait::async_trait;
use secrecy::SecretString;

use dockbook_core::collab::{AdminSecretSource, StoreError};

use crate::DbPool;

const ADMIN_SECRET_KEY: &str = "admin_secret";

/// Key/value settings table. Currently holds only the administrator
/// secret, mirroring the single stored value the dialogue authenticates
/// against.
pub struct SqlSettingsRepository {
    pool: DbPool,
}

impl SqlSettingsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn set_admin_secret(&self, secret: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(ADMIN_SECRET_KEY)
        .bind(secret)
        .execute(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl AdminSecretSource for SqlSettingsRepository {
    async fn admin_secret(&self) -> Result<Option<SecretString>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM settings WHERE key = ?1",
        )
        .bind(ADMIN_SECRET_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;

        Ok(value.filter(|v| !v.trim().is_empty()).map(SecretString::from))
    }
}
