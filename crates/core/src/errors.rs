use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::collab::StoreError;

/// Failures of the booking and blocking operations that carry meaning for
/// the person on the other end of the conversation. Anything else is an
/// [`ApplicationError`] and gets a generic apology.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("purchase order `{reference}` was not found")]
    OrderNotFound { reference: String },
    #[error("purchase order `{reference}` is already scheduled")]
    OrderAlreadyBooked { reference: String },
    #[error("slot {date} {time} was taken by another writer")]
    SlotTaken { date: NaiveDate, time: NaiveTime },
    #[error("quantity must be a positive number of sacks, got {quantity}")]
    InvalidQuantity { quantity: i64 },
    #[error("store failure: {0}")]
    Store(String),
}

impl From<StoreError> for BookingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::SlotTaken { date, time } => Self::SlotTaken { date, time },
            StoreError::OrderAlreadyBooked { reference } => Self::OrderAlreadyBooked { reference },
            StoreError::Backend(message) => Self::Store(message),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl BookingError {
    /// Whether this failure is a conversational outcome (a reply text of
    /// its own) rather than an infrastructure problem.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::BookingError;
    use crate::collab::StoreError;

    #[test]
    fn store_conflicts_map_to_booking_conflicts() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 3).unwrap();
        let time = NaiveTime::from_hms_opt(8, 15, 0).unwrap();

        let taken = BookingError::from(StoreError::SlotTaken { date, time });
        assert_eq!(taken, BookingError::SlotTaken { date, time });
        assert!(taken.is_user_visible());

        let duplicate =
            BookingError::from(StoreError::OrderAlreadyBooked { reference: "4711".into() });
        assert!(matches!(duplicate, BookingError::OrderAlreadyBooked { ref reference } if reference == "4711"));
    }

    #[test]
    fn backend_failures_are_not_user_visible() {
        let error = BookingError::from(StoreError::Backend("disk full".into()));
        assert!(!error.is_user_visible());
    }
}
