//! Collaborator seams. The scheduling core talks to persistence and
//! configuration through these traits; sqlx-backed implementations live in
//! `dockbook-db` and in-memory fakes back the tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::booking::Booking;
use crate::domain::order::PurchaseOrder;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer occupied (date, time) between availability check and
    /// commit. Raised by the store's atomic check-and-insert, never by a
    /// pre-read.
    #[error("slot {date} {time} is already occupied")]
    SlotTaken { date: NaiveDate, time: NaiveTime },
    /// A booking already carries this order reference.
    #[error("order `{reference}` already has a booking")]
    OrderAlreadyBooked { reference: String },
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Holds booked and blocked slots. `append` must be an atomic
/// check-and-insert: the one-occupant-per-slot invariant is enforced here,
/// not by the caller's earlier availability read.
#[async_trait]
pub trait OccupancyStore: Send + Sync {
    async fn occupied_times(&self, date: NaiveDate) -> Result<HashSet<NaiveTime>, StoreError>;

    async fn append(&self, booking: Booking) -> Result<(), StoreError>;

    async fn find_by_order(&self, reference: &str) -> Result<Option<Booking>, StoreError>;

    /// All records, newest insertion first ("insert at top" display order).
    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, StoreError>;
}

/// The purchase-order reference dataset.
#[async_trait]
pub trait OrderDirectory: Send + Sync {
    async fn find_by_reference(&self, reference: &str)
        -> Result<Option<PurchaseOrder>, StoreError>;
}

/// Externally stored administrator secret. `None` (or empty) means the
/// secret was never configured, which authentication treats as fail-closed.
#[async_trait]
pub trait AdminSecretSource: Send + Sync {
    async fn admin_secret(&self) -> Result<Option<SecretString>, StoreError>;
}
