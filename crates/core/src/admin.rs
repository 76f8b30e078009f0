use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use secrecy::{ExposeSecret, SecretString};

use crate::collab::{OccupancyStore, StoreError};
use crate::domain::booking::Booking;
use crate::errors::BookingError;

/// Fails closed: an unset or empty stored secret never authenticates,
/// regardless of what was submitted. Misconfiguration is not "no password
/// required".
pub fn authenticate(submitted: &str, stored: Option<&SecretString>) -> bool {
    match stored {
        Some(secret) if !secret.expose_secret().trim().is_empty() => {
            submitted.trim() == secret.expose_secret().trim()
        }
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRequest {
    pub date: NaiveDate,
    pub times: Vec<NaiveTime>,
    pub reason: String,
    pub admin_name: String,
    pub admin_phone: String,
}

/// What actually happened when committing a block request. A time lost to
/// a concurrent writer is reported rather than failing the whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    pub blocked: Vec<Booking>,
    pub skipped: Vec<NaiveTime>,
}

/// Commits administrative blocks. Each blocked slot is a regular schedule
/// record with empty order and customer fields; the slot engine treats it
/// exactly like a confirmed appointment.
pub struct AdminBlockService {
    store: Arc<dyn OccupancyStore>,
}

impl AdminBlockService {
    pub fn new(store: Arc<dyn OccupancyStore>) -> Self {
        Self { store }
    }

    /// Inserts one record per requested time, deduplicated but in the
    /// administrator's selection order. Times taken by a concurrent writer
    /// end up in `skipped`; backend failures abort.
    pub async fn block_slots(&self, request: BlockRequest) -> Result<BlockOutcome, BookingError> {
        let mut outcome = BlockOutcome::default();
        let mut seen = Vec::new();

        for time in request.times {
            if seen.contains(&time) {
                continue;
            }
            seen.push(time);

            let block = Booking {
                confirmation: String::new(),
                order_ref: String::new(),
                date: request.date,
                time,
                salesperson: String::new(),
                description: String::new(),
                cargo_type: String::new(),
                agent: String::new(),
                phone: request.admin_phone.clone(),
                customer_name: request.admin_name.clone(),
                quantity: 0,
                packaging: None,
                reason: request.reason.clone(),
            };

            match self.store.append(block.clone()).await {
                Ok(()) => outcome.blocked.push(block),
                Err(StoreError::SlotTaken { time, .. }) => outcome.skipped.push(time),
                Err(error) => return Err(error.into()),
            }
        }

        Ok(outcome)
    }
}
