use async_trait::async_trait;
use sqlx::Row;

use dockbook_core::collab::{OrderDirectory, StoreError};
use dockbook_core::domain::order::PurchaseOrder;

use crate::DbPool;

pub struct SqlOrderDirectory {
    pool: DbPool,
}

impl SqlOrderDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Seeding support; the conversational flows only ever read.
    pub async fn insert(&self, order: &PurchaseOrder) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO purchase_orders (order_ref, confirmation, salesperson, description, \
             cargo_type, agent) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (order_ref) DO NOTHING",
        )
        .bind(&order.order_ref)
        .bind(&order.confirmation)
        .bind(&order.salesperson)
        .bind(&order.description)
        .bind(&order.cargo_type)
        .bind(&order.agent)
        .execute(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl OrderDirectory for SqlOrderDirectory {
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PurchaseOrder>, StoreError> {
        let row = sqlx::query(
            "SELECT order_ref, confirmation, salesperson, description, cargo_type, agent \
             FROM purchase_orders WHERE order_ref = ?1",
        )
        .bind(reference.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;

        row.map(|row| {
            Ok(PurchaseOrder {
                order_ref: row.try_get("order_ref").map_err(decode)?,
                confirmation: row.try_get("confirmation").map_err(decode)?,
                salesperson: row.try_get("salesperson").map_err(decode)?,
                description: row.try_get("description").map_err(decode)?,
                cargo_type: row.try_get("cargo_type").map_err(decode)?,
                agent: row.try_get("agent").map_err(decode)?,
            })
        })
        .transpose()
    }
}

fn decode(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}
