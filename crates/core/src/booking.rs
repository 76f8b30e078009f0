use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::collab::{OccupancyStore, OrderDirectory};
use crate::domain::booking::{Booking, PackagingKind};
use crate::domain::order::PurchaseOrder;
use crate::errors::BookingError;

/// Everything the dialogue collects before committing an appointment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRequest {
    pub order_ref: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub quantity: u32,
    pub packaging: PackagingKind,
    pub phone: String,
    pub customer_name: String,
}

/// Validates an order reference against the reference dataset, prevents
/// double-booking, and commits the appointment through the occupancy
/// store's atomic insert.
pub struct BookingService {
    orders: Arc<dyn OrderDirectory>,
    store: Arc<dyn OccupancyStore>,
}

impl BookingService {
    pub fn new(orders: Arc<dyn OrderDirectory>, store: Arc<dyn OccupancyStore>) -> Self {
        Self { orders, store }
    }

    /// Looks up the purchase order without committing anything. The
    /// dialogue uses this when the order reference is first entered,
    /// before any dates are offered.
    pub async fn check_order(&self, reference: &str) -> Result<PurchaseOrder, BookingError> {
        let reference = reference.trim();
        let Some(order) = self.orders.find_by_reference(reference).await? else {
            return Err(BookingError::OrderNotFound { reference: reference.to_owned() });
        };

        if self.store.find_by_order(reference).await?.is_some() {
            return Err(BookingError::OrderAlreadyBooked { reference: reference.to_owned() });
        }

        Ok(order)
    }

    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        if request.quantity == 0 {
            return Err(BookingError::InvalidQuantity { quantity: 0 });
        }

        // Re-resolve at commit time: the pre-check in `check_order` may be
        // minutes old by now.
        let order = self.check_order(&request.order_ref).await?;

        let booking = Booking {
            confirmation: order.confirmation,
            order_ref: order.order_ref,
            date: request.date,
            time: request.time,
            salesperson: order.salesperson,
            description: order.description,
            cargo_type: order.cargo_type,
            agent: order.agent,
            phone: request.phone,
            customer_name: request.customer_name,
            quantity: request.quantity,
            packaging: Some(request.packaging),
            reason: String::new(),
        };

        // The store rejects a concurrent occupant or duplicate order ref
        // atomically; both surface as conflict errors here.
        self.store.append(booking.clone()).await?;
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use tokio::sync::Mutex;

    use super::{BookingRequest, BookingService};
    use crate::collab::{OccupancyStore, OrderDirectory, StoreError};
    use crate::domain::booking::{Booking, PackagingKind};
    use crate::domain::order::PurchaseOrder;
    use crate::errors::BookingError;

    struct FakeDirectory {
        orders: Vec<PurchaseOrder>,
    }

    #[async_trait]
    impl OrderDirectory for FakeDirectory {
        async fn find_by_reference(
            &self,
            reference: &str,
        ) -> Result<Option<PurchaseOrder>, StoreError> {
            Ok(self.orders.iter().find(|o| o.order_ref == reference).cloned())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<Booking>>,
    }

    #[async_trait]
    impl OccupancyStore for FakeStore {
        async fn occupied_times(
            &self,
            date: NaiveDate,
        ) -> Result<HashSet<NaiveTime>, StoreError> {
            let rows = self.rows.lock().await;
            Ok(rows.iter().filter(|b| b.date == date).map(|b| b.time).collect())
        }

        async fn append(&self, booking: Booking) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().await;
            if rows.iter().any(|b| b.date == booking.date && b.time == booking.time) {
                return Err(StoreError::SlotTaken { date: booking.date, time: booking.time });
            }
            if !booking.order_ref.is_empty()
                && rows.iter().any(|b| b.order_ref == booking.order_ref)
            {
                return Err(StoreError::OrderAlreadyBooked {
                    reference: booking.order_ref.clone(),
                });
            }
            rows.insert(0, booking);
            Ok(())
        }

        async fn find_by_order(&self, reference: &str) -> Result<Option<Booking>, StoreError> {
            let rows = self.rows.lock().await;
            Ok(rows.iter().find(|b| b.order_ref == reference).cloned())
        }

        async fn list_recent(&self, limit: u32) -> Result<Vec<Booking>, StoreError> {
            let rows = self.rows.lock().await;
            Ok(rows.iter().take(limit as usize).cloned().collect())
        }
    }

    fn sample_order() -> PurchaseOrder {
        PurchaseOrder {
            order_ref: "12345".into(),
            confirmation: "C-881".into(),
            salesperson: "J. Fernandes".into(),
            description: "arabica, lot 7".into(),
            cargo_type: "export".into(),
            agent: "Diogo".into(),
        }
    }

    fn request(time_h: u32, time_m: u32) -> BookingRequest {
        BookingRequest {
            order_ref: "12345".into(),
            date: NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
            time: NaiveTime::from_hms_opt(time_h, time_m, 0).unwrap(),
            quantity: 300,
            packaging: PackagingKind::Bagged,
            phone: "(27) 99911-2233".into(),
            customer_name: "Maria".into(),
        }
    }

    fn service_with(orders: Vec<PurchaseOrder>) -> (BookingService, Arc<FakeStore>) {
        let store = Arc::new(FakeStore::default());
        let service =
            BookingService::new(Arc::new(FakeDirectory { orders }), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn unknown_order_is_rejected() {
        let (service, _store) = service_with(vec![]);
        let result = service.check_order("12345").await;
        assert!(matches!(result, Err(BookingError::OrderNotFound { ref reference }) if reference == "12345"));
    }

    #[tokio::test]
    async fn booking_copies_confirmation_linkage_from_the_order() {
        let (service, store) = service_with(vec![sample_order()]);

        let booking = service.create_booking(request(8, 15)).await.expect("booking succeeds");

        assert_eq!(booking.confirmation, "C-881");
        assert_eq!(booking.salesperson, "J. Fernandes");
        assert_eq!(booking.reason, "");
        assert!(!booking.is_block());

        let recent = store.list_recent(10).await.expect("list");
        assert_eq!(recent.first(), Some(&booking));
    }

    #[tokio::test]
    async fn second_booking_for_same_order_conflicts() {
        let (service, _store) = service_with(vec![sample_order()]);

        service.create_booking(request(8, 15)).await.expect("first booking");
        let second = service.create_booking(request(13, 30)).await;

        assert!(matches!(second, Err(BookingError::OrderAlreadyBooked { .. })));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_any_lookup() {
        let (service, _store) = service_with(vec![sample_order()]);
        let mut req = request(8, 15);
        req.quantity = 0;

        assert!(matches!(
            service.create_booking(req).await,
            Err(BookingError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[tokio::test]
    async fn concurrent_commits_for_one_slot_let_exactly_one_through() {
        let mut other = sample_order();
        other.order_ref = "67890".into();
        let (service, _store) = service_with(vec![sample_order(), other]);
        let service = Arc::new(service);

        let mut second_req = request(8, 15);
        second_req.order_ref = "67890".into();

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.create_booking(request(8, 15)).await })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.create_booking(second_req).await })
        };

        let outcomes = [first.await.expect("join"), second.await.expect("join")];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotTaken { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }
}
