use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// How the cargo arrives at the dock. Presented as menu options 1-3
/// during the booking flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagingKind {
    Bulk,
    Bagged,
    BigBags,
}

impl PackagingKind {
    pub fn from_menu_digit(digit: &str) -> Option<Self> {
        match digit.trim() {
            "1" => Some(Self::Bulk),
            "2" => Some(Self::Bagged),
            "3" => Some(Self::BigBags),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bulk => "Bulk",
            Self::Bagged => "Bagged",
            Self::BigBags => "Big-bags",
        }
    }
}

/// One occupant of the schedule: either a confirmed unloading appointment
/// or an administrative block. The pair (date, time) is unique across all
/// records; the occupancy store enforces that at insert time. Records are
/// never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Confirmation reference inherited from the purchase order. Empty
    /// for administrative blocks.
    pub confirmation: String,
    /// Purchase order reference. Empty for administrative blocks.
    pub order_ref: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub salesperson: String,
    pub description: String,
    pub cargo_type: String,
    pub agent: String,
    pub phone: String,
    pub customer_name: String,
    pub quantity: u32,
    pub packaging: Option<PackagingKind>,
    /// Populated only for administrative blocks.
    pub reason: String,
}

impl Booking {
    pub fn is_block(&self) -> bool {
        self.order_ref.is_empty() && !self.reason.is_empty()
    }
}
