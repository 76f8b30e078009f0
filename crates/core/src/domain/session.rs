use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::booking::PackagingKind;
use crate::domain::order::PurchaseOrder;
use crate::schedule::slots::Period;

/// Where a sender currently is in the scripted dialogue. Each variant
/// carries exactly the draft fields that are meaningful at that point, so
/// abandoning a flow drops the drafts with the variant and no state can
/// hold half-collected data it does not need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    AwaitingOrder,
    AwaitingDate {
        order: PurchaseOrder,
        offered_dates: Vec<NaiveDate>,
    },
    AwaitingPackaging {
        order: PurchaseOrder,
        date: NaiveDate,
    },
    AwaitingQuantity {
        order: PurchaseOrder,
        date: NaiveDate,
        packaging: PackagingKind,
    },
    AwaitingPeriod {
        order: PurchaseOrder,
        date: NaiveDate,
        packaging: PackagingKind,
        quantity: u32,
    },
    AwaitingTime {
        order: PurchaseOrder,
        date: NaiveDate,
        packaging: PackagingKind,
        quantity: u32,
        period: Period,
        offered_times: Vec<NaiveTime>,
    },
    AdminAwaitingPassword {
        attempts: u32,
    },
    AdminAwaitingDate,
    AdminAwaitingSlotSelection {
        date: NaiveDate,
        offered_times: Vec<NaiveTime>,
    },
    AdminAwaitingReason {
        date: NaiveDate,
        times: Vec<NaiveTime>,
    },
}

impl Stage {
    /// States that capture free text rather than a menu selection. Global
    /// reset triggers are suppressed here unless the trigger is the whole
    /// message (configurable). Passwords count: one that merely contains a
    /// trigger word must still be typeable.
    pub fn captures_free_text(&self) -> bool {
        matches!(
            self,
            Self::AwaitingOrder
                | Self::AdminAwaitingPassword { .. }
                | Self::AdminAwaitingReason { .. }
        )
    }
}

/// Per-sender conversational context. Created lazily on first contact,
/// reset to [`Stage::Idle`] on completion, cancellation, or unrecoverable
/// validation failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub stage: Stage,
    pub last_activity: NaiveDateTime,
}

impl Session {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { stage: Stage::Idle, last_activity: now }
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = now;
    }

    /// Idle-timeout policy: a session abandoned mid-flow falls back to
    /// `Idle` once `idle_timeout` has elapsed, bounding how long drafts
    /// are retained. Checked lazily on the next inbound message.
    pub fn is_expired(&self, now: NaiveDateTime, idle_timeout: Duration) -> bool {
        self.stage != Stage::Idle && now - self.last_activity >= idle_timeout
    }
}
