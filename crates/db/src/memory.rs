//! In-memory collaborator implementations for tests and the noop
//! development transport. The occupancy store performs its check and
//! insert under one lock, matching the atomicity the SQL schema provides.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use secrecy::SecretString;
use tokio::sync::Mutex;

use dockbook_core::collab::{AdminSecretSource, OccupancyStore, OrderDirectory, StoreError};
use dockbook_core::domain::booking::Booking;
use dockbook_core::domain::order::PurchaseOrder;

#[derive(Default)]
pub struct InMemoryOccupancyStore {
    rows: Mutex<Vec<Booking>>,
}

#[async_trait]
impl OccupancyStore for InMemoryOccupancyStore {
    async fn occupied_times(&self, date: NaiveDate) -> Result<HashSet<NaiveTime>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|b| b.date == date).map(|b| b.time).collect())
    }

    async fn append(&self, booking: Booking) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|b| b.date == booking.date && b.time == booking.time) {
            return Err(StoreError::SlotTaken { date: booking.date, time: booking.time });
        }
        if !booking.order_ref.is_empty() && rows.iter().any(|b| b.order_ref == booking.order_ref)
        {
            return Err(StoreError::OrderAlreadyBooked { reference: booking.order_ref });
        }
        // Newest record first, matching the SQL store's display ordering.
        rows.insert(0, booking);
        Ok(())
    }

    async fn find_by_order(&self, reference: &str) -> Result<Option<Booking>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|b| !b.order_ref.is_empty() && b.order_ref == reference).cloned())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().take(limit as usize).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryOrderDirectory {
    orders: Mutex<Vec<PurchaseOrder>>,
}

impl InMemoryOrderDirectory {
    pub fn with_orders(orders: Vec<PurchaseOrder>) -> Self {
        Self { orders: Mutex::new(orders) }
    }

    pub async fn insert(&self, order: PurchaseOrder) {
        self.orders.lock().await.push(order);
    }
}

#[async_trait]
impl OrderDirectory for InMemoryOrderDirectory {
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PurchaseOrder>, StoreError> {
        let orders = self.orders.lock().await;
        Ok(orders.iter().find(|o| o.order_ref == reference.trim()).cloned())
    }
}

/// Fixed secret for tests; `None` models the unconfigured case.
pub struct StaticAdminSecret(pub Option<SecretString>);

#[async_trait]
impl AdminSecretSource for StaticAdminSecret {
    async fn admin_secret(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self.0.clone())
    }
}
