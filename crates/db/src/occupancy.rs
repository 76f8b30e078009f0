use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::Row;

use dockbook_core::collab::{OccupancyStore, StoreError};
use dockbook_core::domain::booking::{Booking, PackagingKind};

use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Schedule table access. Inserts rely on the UNIQUE(slot_date, slot_time)
/// constraint and the partial unique index on order_ref, so the
/// availability a user saw minutes ago never has to be trusted at commit
/// time.
pub struct SqlOccupancyStore {
    pool: DbPool,
}

impl SqlOccupancyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OccupancyStore for SqlOccupancyStore {
    async fn occupied_times(&self, date: NaiveDate) -> Result<HashSet<NaiveTime>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT slot_time FROM schedule WHERE slot_date = ?1",
        )
        .bind(date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut times = HashSet::with_capacity(rows.len());
        for raw in rows {
            times.insert(decode_time(&raw)?);
        }
        Ok(times)
    }

    async fn append(&self, booking: Booking) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO schedule (confirmation, order_ref, slot_date, slot_time, salesperson, \
             description, cargo_type, agent, phone, customer_name, quantity, packaging, reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&booking.confirmation)
        .bind(&booking.order_ref)
        .bind(booking.date.format(DATE_FORMAT).to_string())
        .bind(booking.time.format(TIME_FORMAT).to_string())
        .bind(&booking.salesperson)
        .bind(&booking.description)
        .bind(&booking.cargo_type)
        .bind(&booking.agent)
        .bind(&booking.phone)
        .bind(&booking.customer_name)
        .bind(i64::from(booking.quantity))
        .bind(encode_packaging(booking.packaging))
        .bind(&booking.reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) => {
                // SQLite names the violated columns, not the index: the
                // partial unique index on order_ref reports
                // `UNIQUE constraint failed: schedule.order_ref`.
                let message = db_error.message().to_string();
                if message.contains("schedule.order_ref") {
                    Err(StoreError::OrderAlreadyBooked { reference: booking.order_ref })
                } else if message.contains("schedule.slot_date") {
                    Err(StoreError::SlotTaken { date: booking.date, time: booking.time })
                } else {
                    Err(StoreError::Backend(message))
                }
            }
            Err(error) => Err(backend(error)),
        }
    }

    async fn find_by_order(&self, reference: &str) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query(
            "SELECT confirmation, order_ref, slot_date, slot_time, salesperson, description, \
             cargo_type, agent, phone, customer_name, quantity, packaging, reason \
             FROM schedule WHERE order_ref = ?1 AND order_ref <> '' LIMIT 1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|row| decode_booking(&row)).transpose()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query(
            "SELECT confirmation, order_ref, slot_date, slot_time, salesperson, description, \
             cargo_type, agent, phone, customer_name, quantity, packaging, reason \
             FROM schedule ORDER BY id DESC LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(decode_booking).collect()
    }
}

fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn decode_time(raw: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| StoreError::Backend(format!("malformed slot_time `{raw}`")))
}

fn decode_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| StoreError::Backend(format!("malformed slot_date `{raw}`")))
}

fn encode_packaging(packaging: Option<PackagingKind>) -> &'static str {
    match packaging {
        Some(PackagingKind::Bulk) => "bulk",
        Some(PackagingKind::Bagged) => "bagged",
        Some(PackagingKind::BigBags) => "big_bags",
        None => "",
    }
}

fn decode_packaging(raw: &str) -> Result<Option<PackagingKind>, StoreError> {
    match raw {
        "" => Ok(None),
        "bulk" => Ok(Some(PackagingKind::Bulk)),
        "bagged" => Ok(Some(PackagingKind::Bagged)),
        "big_bags" => Ok(Some(PackagingKind::BigBags)),
        other => Err(StoreError::Backend(format!("malformed packaging `{other}`"))),
    }
}

fn decode_booking(row: &sqlx::sqlite::SqliteRow) -> Result<Booking, StoreError> {
    let quantity: i64 = row.try_get("quantity").map_err(backend)?;
    Ok(Booking {
        confirmation: row.try_get("confirmation").map_err(backend)?,
        order_ref: row.try_get("order_ref").map_err(backend)?,
        date: decode_date(row.try_get::<String, _>("slot_date").map_err(backend)?.as_str())?,
        time: decode_time(row.try_get::<String, _>("slot_time").map_err(backend)?.as_str())?,
        salesperson: row.try_get("salesperson").map_err(backend)?,
        description: row.try_get("description").map_err(backend)?,
        cargo_type: row.try_get("cargo_type").map_err(backend)?,
        agent: row.try_get("agent").map_err(backend)?,
        phone: row.try_get("phone").map_err(backend)?,
        customer_name: row.try_get("customer_name").map_err(backend)?,
        quantity: u32::try_from(quantity.max(0)).unwrap_or(0),
        packaging: decode_packaging(
            row.try_get::<String, _>("packaging").map_err(backend)?.as_str(),
        )?,
        reason: row.try_get("reason").map_err(backend)?,
    })
}
