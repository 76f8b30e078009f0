use chrono::{NaiveDate, NaiveTime};
use secrecy::ExposeSecret;

use dockbook_core::collab::{AdminSecretSource, OccupancyStore, OrderDirectory, StoreError};
use dockbook_core::config::DatabaseConfig;
use dockbook_core::domain::booking::{Booking, PackagingKind};
use dockbook_db::{
    connect, migrations, seed_sample_data, SqlOccupancyStore, SqlOrderDirectory,
    SqlSettingsRepository,
};

async fn pool() -> dockbook_db::DbPool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 30,
    };
    let pool = connect(&config).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    pool
}

fn booking(order_ref: &str, h: u32, m: u32) -> Booking {
    Booking {
        confirmation: "C-1".into(),
        order_ref: order_ref.into(),
        date: NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
        time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        salesperson: "Jose".into(),
        description: "arabica".into(),
        cargo_type: "export".into(),
        agent: "Diogo".into(),
        phone: "(27) 99911-2233".into(),
        customer_name: "Maria".into(),
        quantity: 300,
        packaging: Some(PackagingKind::Bagged),
        reason: String::new(),
    }
}

#[tokio::test]
async fn append_and_read_back_round_trip() {
    let store = SqlOccupancyStore::new(pool().await);
    let record = booking("10001", 8, 15);

    store.append(record.clone()).await.expect("append");

    let found = store.find_by_order("10001").await.expect("find").expect("present");
    assert_eq!(found, record);

    let occupied = store.occupied_times(record.date).await.expect("occupied");
    assert!(occupied.contains(&record.time));
}

#[tokio::test]
async fn second_writer_for_the_same_slot_gets_a_conflict() {
    let store = SqlOccupancyStore::new(pool().await);

    store.append(booking("10001", 8, 15)).await.expect("first append");
    let second = store.append(booking("10002", 8, 15)).await;

    assert!(matches!(second, Err(StoreError::SlotTaken { .. })), "got {second:?}");
}

#[tokio::test]
async fn an_order_reference_can_only_be_scheduled_once() {
    let store = SqlOccupancyStore::new(pool().await);

    store.append(booking("10001", 8, 15)).await.expect("first append");
    let second = store.append(booking("10001", 9, 45)).await;

    assert!(
        matches!(second, Err(StoreError::OrderAlreadyBooked { ref reference }) if reference == "10001"),
        "got {second:?}"
    );
}

#[tokio::test]
async fn blocks_with_empty_order_ref_never_conflict_on_order() {
    let store = SqlOccupancyStore::new(pool().await);

    let mut block = booking("", 8, 15);
    block.reason = "maintenance".into();
    block.packaging = None;
    block.quantity = 0;
    store.append(block.clone()).await.expect("first block");

    let mut second = block.clone();
    second.time = NaiveTime::from_hms_opt(9, 45, 0).unwrap();
    store.append(second).await.expect("second block");

    assert!(store.find_by_order("").await.expect("find").is_none());
}

#[tokio::test]
async fn listing_returns_newest_insertion_first() {
    let store = SqlOccupancyStore::new(pool().await);

    store.append(booking("10001", 8, 15)).await.expect("append");
    store.append(booking("10002", 9, 45)).await.expect("append");

    let recent = store.list_recent(10).await.expect("list");
    assert_eq!(recent[0].order_ref, "10002");
    assert_eq!(recent[1].order_ref, "10001");
}

#[tokio::test]
async fn seed_populates_orders_and_admin_secret() {
    let pool = pool().await;
    let result = seed_sample_data(&pool, Some("9876")).await.expect("seed");
    assert_eq!(result.purchase_orders, 3);
    assert!(result.admin_secret_set);

    let directory = SqlOrderDirectory::new(pool.clone());
    let order = directory.find_by_reference("10001").await.expect("query").expect("seeded");
    assert_eq!(order.confirmation, "C-2301");
    assert!(directory.find_by_reference("99999").await.expect("query").is_none());

    let settings = SqlSettingsRepository::new(pool);
    let secret = settings.admin_secret().await.expect("secret").expect("configured");
    assert_eq!(secret.expose_secret(), "9876");
}

#[tokio::test]
async fn blank_admin_secret_reads_as_unconfigured() {
    let pool = pool().await;
    let settings = SqlSettingsRepository::new(pool);

    assert!(settings.admin_secret().await.expect("query").is_none());
    settings.set_admin_secret("   ").await.expect("set");
    assert!(settings.admin_secret().await.expect("query").is_none());
}
