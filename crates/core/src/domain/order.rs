use serde::{Deserialize, Serialize};

/// A purchase-order record from the reference dataset. Matching one of
/// these is the precondition for booking; its commercial fields are copied
/// verbatim onto the confirmed [`Booking`](crate::domain::booking::Booking).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub order_ref: String,
    pub confirmation: String,
    pub salesperson: String,
    pub description: String,
    pub cargo_type: String,
    pub agent: String,
}
