pub mod admin;
pub mod booking;
pub mod clock;
pub mod collab;
pub mod config;
pub mod domain;
pub mod errors;
pub mod schedule;

pub use admin::{authenticate, AdminBlockService, BlockOutcome, BlockRequest};
pub use booking::{BookingRequest, BookingService};
pub use clock::{Clock, FixedClock, SystemClock};
pub use collab::{AdminSecretSource, OccupancyStore, OrderDirectory, StoreError};
pub use domain::booking::{Booking, PackagingKind};
pub use domain::order::PurchaseOrder;
pub use domain::session::{Session, Stage};
pub use errors::{ApplicationError, BookingError};
pub use schedule::calendar::{eligible_dates, CalendarPolicy};
pub use schedule::duration::DurationTiers;
pub use schedule::slots::{BusinessHours, Period, SlotEngine};
