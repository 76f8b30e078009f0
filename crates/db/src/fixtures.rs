use dockbook_core::domain::order::PurchaseOrder;

use crate::orders::SqlOrderDirectory;
use crate::settings::SqlSettingsRepository;
use crate::DbPool;

use dockbook_core::collab::StoreError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub purchase_orders: usize,
    pub admin_secret_set: bool,
}

/// Deterministic development dataset: a handful of purchase orders the
/// booking flow can resolve, plus an optional admin secret.
pub async fn seed_sample_data(
    pool: &DbPool,
    admin_secret: Option<&str>,
) -> Result<SeedResult, StoreError> {
    let directory = SqlOrderDirectory::new(pool.clone());
    let orders = sample_orders();
    for order in &orders {
        directory.insert(order).await?;
    }

    let mut admin_secret_set = false;
    if let Some(secret) = admin_secret.filter(|s| !s.trim().is_empty()) {
        SqlSettingsRepository::new(pool.clone()).set_admin_secret(secret).await?;
        admin_secret_set = true;
    }

    Ok(SeedResult { purchase_orders: orders.len(), admin_secret_set })
}

pub fn sample_orders() -> Vec<PurchaseOrder> {
    vec![
        PurchaseOrder {
            order_ref: "10001".into(),
            confirmation: "C-2301".into(),
            salesperson: "Jose Fernandes".into(),
            description: "arabica, fine cup, lot 14".into(),
            cargo_type: "export".into(),
            agent: "Diogo".into(),
        },
        PurchaseOrder {
            order_ref: "10002".into(),
            confirmation: "C-2302".into(),
            salesperson: "Angelita".into(),
            description: "conilon, lot 3".into(),
            cargo_type: "domestic".into(),
            agent: "Gean".into(),
        },
        PurchaseOrder {
            order_ref: "10003".into(),
            confirmation: "C-2303".into(),
            salesperson: "Jose Fernandes".into(),
            description: "arabica, rio minas, lot 9".into(),
            cargo_type: "export".into(),
            agent: "Diogo".into(),
        },
    ]
}
