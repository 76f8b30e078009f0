//! End-to-end dialogue walks against in-memory collaborators.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use secrecy::SecretString;

use dockbook_agent::FallbackResponder;
use dockbook_chat::{menu, DialogueEngine, DialoguePolicy, InboundMessage};
use dockbook_core::admin::AdminBlockService;
use dockbook_core::booking::BookingService;
use dockbook_core::clock::FixedClock;
use dockbook_core::collab::OccupancyStore;
use dockbook_core::config::ContactsConfig;
use dockbook_core::domain::order::PurchaseOrder;
use dockbook_core::schedule::calendar::CalendarPolicy;
use dockbook_core::schedule::slots::SlotEngine;
use dockbook_db::{InMemoryOccupancyStore, InMemoryOrderDirectory, StaticAdminSecret};

// Tuesday morning, well before the 16:30 cutoff. The first offered date is
// this same day; tests that need a clean slot grid pick the second.
fn reference_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 9, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
}

fn sample_order(reference: &str) -> PurchaseOrder {
    PurchaseOrder {
        order_ref: reference.to_string(),
        confirmation: format!("C-{reference}"),
        salesperson: "Jose Fernandes".to_string(),
        description: "Conilon 7/8".to_string(),
        cargo_type: "coffee".to_string(),
        agent: "Riva".to_string(),
    }
}

fn contacts() -> ContactsConfig {
    ContactsConfig {
        quotation: "Jose - (27) 99978-0001".to_string(),
        purchasing: "Diogo - (27) 99858-0002".to_string(),
        finance: "Ana - (27) 99740-0003".to_string(),
        hr: "Paula - (27) 99612-0004".to_string(),
        quality: "Rafael - (27) 99555-0005".to_string(),
    }
}

fn policy() -> DialoguePolicy {
    DialoguePolicy {
        reset_triggers: vec!["hello".to_string(), "hi".to_string(), "menu".to_string()],
        triggers_interrupt_free_text: false,
        admin_max_attempts: 3,
        idle_timeout: chrono::Duration::minutes(30),
    }
}

struct Harness {
    engine: DialogueEngine,
    store: Arc<InMemoryOccupancyStore>,
}

impl Harness {
    fn new(admin_secret: Option<&str>) -> Self {
        let store = Arc::new(InMemoryOccupancyStore::default());
        let occupancy: Arc<dyn OccupancyStore> = store.clone();
        let orders = Arc::new(InMemoryOrderDirectory::with_orders(vec![
            sample_order("10001"),
            sample_order("10002"),
        ]));

        let engine = DialogueEngine::new(
            BookingService::new(orders, occupancy.clone()),
            AdminBlockService::new(occupancy.clone()),
            occupancy,
            Arc::new(StaticAdminSecret(
                admin_secret.map(|s| SecretString::from(s.to_string())),
            )),
            FallbackResponder::disabled(),
            SlotEngine::default(),
            CalendarPolicy::default(),
            contacts(),
            Arc::new(FixedClock(reference_now())),
            policy(),
        );

        Self { engine, store }
    }

    async fn say(&self, sender: &str, text: &str) -> String {
        let message = InboundMessage {
            sender: sender.to_string(),
            display_name: Some("Maria".to_string()),
            text: text.to_string(),
        };
        self.engine.handle_message(&message).await
    }
}

async fn walk_to_time_list(harness: &Harness, sender: &str, reference: &str) -> String {
    assert_eq!(harness.say(sender, "1").await, menu::ASK_ORDER);
    let dates = harness.say(sender, reference).await;
    assert!(dates.contains("02/09/2026"), "offered dates were: {dates}");
    assert_eq!(harness.say(sender, "2").await, menu::ASK_PACKAGING);
    assert_eq!(harness.say(sender, "1").await, menu::ASK_QUANTITY);
    assert_eq!(harness.say(sender, "300").await, menu::ASK_PERIOD);
    harness.say(sender, "1").await
}

#[tokio::test]
async fn full_booking_walk_commits_an_appointment() {
    let harness = Harness::new(None);

    let times = walk_to_time_list(&harness, "5527999110001", "10001").await;
    // 300 sacks take 60 minutes; 10:30 would straddle lunch and must be gone.
    assert!(times.contains("07:30"), "offered times were: {times}");
    assert!(!times.contains("10:30"), "offered times were: {times}");

    let confirmation = harness.say("5527999110001", "1").await;
    assert!(confirmation.contains("Appointment confirmed"), "got: {confirmation}");
    assert!(confirmation.contains("10001"));
    assert!(confirmation.contains("02/09/2026"));

    let booked = harness.store.find_by_order("10001").await.unwrap().unwrap();
    assert_eq!(booked.date, NaiveDate::from_ymd_opt(2026, 9, 2).unwrap());
    assert_eq!(booked.time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    assert_eq!(booked.quantity, 300);
    assert_eq!(booked.customer_name, "Maria");
    assert_eq!(booked.phone, "(27) 99911-0001");
}

#[tokio::test]
async fn unknown_order_cancels_back_to_the_menu() {
    let harness = Harness::new(None);

    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
    assert_eq!(harness.say("sender-a", "99999").await, menu::ORDER_NOT_FOUND);
    // The session is idle again: option 1 starts over.
    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
}

#[tokio::test]
async fn an_order_cannot_be_booked_twice() {
    let harness = Harness::new(None);

    walk_to_time_list(&harness, "sender-a", "10001").await;
    harness.say("sender-a", "1").await;

    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
    assert_eq!(harness.say("sender-a", "10001").await, menu::ORDER_ALREADY_BOOKED);
}

#[tokio::test]
async fn losing_a_slot_race_gets_the_taken_reply() {
    let harness = Harness::new(None);

    // Both visitors are offered the same list for 02/09.
    walk_to_time_list(&harness, "sender-a", "10001").await;
    walk_to_time_list(&harness, "sender-b", "10002").await;

    let winner = harness.say("sender-a", "1").await;
    assert!(winner.contains("Appointment confirmed"), "got: {winner}");

    assert_eq!(harness.say("sender-b", "1").await, menu::SLOT_JUST_TAKEN);
}

#[tokio::test]
async fn invalid_date_choice_cancels_the_flow() {
    let harness = Harness::new(None);

    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
    harness.say("sender-a", "10001").await;
    assert_eq!(harness.say("sender-a", "42").await, menu::INVALID_CHOICE_CANCELLED);
    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
}

#[tokio::test]
async fn invalid_quantity_reprompts_instead_of_cancelling() {
    let harness = Harness::new(None);

    harness.say("sender-a", "1").await;
    harness.say("sender-a", "10001").await;
    harness.say("sender-a", "2").await;
    harness.say("sender-a", "1").await;

    assert_eq!(harness.say("sender-a", "plenty").await, menu::INVALID_QUANTITY);
    assert_eq!(harness.say("sender-a", "0").await, menu::INVALID_QUANTITY);
    assert_eq!(harness.say("sender-a", "300").await, menu::ASK_PERIOD);
}

#[tokio::test]
async fn contact_options_answer_without_leaving_the_menu() {
    let harness = Harness::new(None);

    let reply = harness.say("sender-a", "4").await;
    assert!(reply.contains("Ana"), "got: {reply}");
    assert_eq!(harness.say("sender-a", "7").await, menu::HANDOFF);
    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
}

#[tokio::test]
async fn admin_flow_blocks_selected_slots() {
    let harness = Harness::new(Some("s3cret"));

    assert_eq!(harness.say("admin", "9").await, menu::ASK_ADMIN_PASSWORD);
    assert_eq!(harness.say("admin", "s3cret").await, menu::ASK_BLOCK_DATE);

    let choices = harness.say("admin", "02/09/2026").await;
    assert!(choices.contains("07:30"), "offered block times were: {choices}");

    // Duplicates and out-of-range indices are discarded quietly.
    assert_eq!(harness.say("admin", "1, 2, 2, 99").await, menu::ASK_BLOCK_REASON);

    let summary = harness.say("admin", "dock maintenance").await;
    assert!(summary.contains("Block(s) recorded"), "got: {summary}");
    assert!(summary.contains("dock maintenance"));
    assert!(summary.contains("07:30") && summary.contains("08:15"));

    let date = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
    let occupied = harness.store.occupied_times(date).await.unwrap();
    assert_eq!(occupied.len(), 2);

    let recent = harness.store.list_recent(10).await.unwrap();
    assert!(recent.iter().all(|b| b.is_block()));
    assert!(recent.iter().all(|b| b.reason == "dock maintenance"));
}

#[tokio::test]
async fn blocked_slots_disappear_from_booking_offers() {
    let harness = Harness::new(Some("s3cret"));

    harness.say("admin", "9").await;
    harness.say("admin", "s3cret").await;
    harness.say("admin", "02/09/2026").await;
    harness.say("admin", "1").await;
    harness.say("admin", "crane inspection").await;

    // 07:30 is blocked; a booking walk for the same date no longer offers it.
    let times = walk_to_time_list(&harness, "sender-a", "10001").await;
    assert!(!times.contains("07:30"), "offered times were: {times}");
    assert!(times.contains("08:15"), "offered times were: {times}");
}

#[tokio::test]
async fn wrong_password_three_times_aborts() {
    let harness = Harness::new(Some("s3cret"));

    assert_eq!(harness.say("admin", "9").await, menu::ASK_ADMIN_PASSWORD);
    assert_eq!(harness.say("admin", "nope").await, menu::ADMIN_WRONG_PASSWORD);
    assert_eq!(harness.say("admin", "nope").await, menu::ADMIN_WRONG_PASSWORD);
    assert_eq!(harness.say("admin", "nope").await, menu::ADMIN_TOO_MANY_ATTEMPTS);

    // Back at the menu; a fresh attempt is allowed.
    assert_eq!(harness.say("admin", "9").await, menu::ASK_ADMIN_PASSWORD);
}

#[tokio::test]
async fn unconfigured_admin_secret_aborts_immediately() {
    let harness = Harness::new(None);

    assert_eq!(harness.say("admin", "9").await, menu::ASK_ADMIN_PASSWORD);
    assert_eq!(harness.say("admin", "anything").await, menu::ADMIN_NOT_CONFIGURED);
    assert_eq!(harness.say("admin", "1").await, menu::ASK_ORDER);
}

#[tokio::test]
async fn empty_block_reason_reprompts() {
    let harness = Harness::new(Some("s3cret"));

    harness.say("admin", "9").await;
    harness.say("admin", "s3cret").await;
    harness.say("admin", "02/09/2026").await;
    harness.say("admin", "1").await;

    assert_eq!(harness.say("admin", "   ").await, menu::EMPTY_BLOCK_REASON);
    let summary = harness.say("admin", "forklift service").await;
    assert!(summary.contains("forklift service"), "got: {summary}");
}

#[tokio::test]
async fn trigger_word_resets_a_flow_in_progress() {
    let harness = Harness::new(None);

    harness.say("sender-a", "1").await;
    harness.say("sender-a", "10001").await;
    harness.say("sender-a", "2").await;

    let reply = harness.say("sender-a", "hello again").await;
    assert!(reply.contains("Choose an option"), "got: {reply}");
    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
}

#[tokio::test]
async fn triggers_do_not_interrupt_order_entry_unless_exact() {
    let harness = Harness::new(None);

    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
    // "hi" is embedded in the text, so this is treated as an order lookup.
    assert_eq!(harness.say("sender-a", "hi-10001").await, menu::ORDER_NOT_FOUND);

    assert_eq!(harness.say("sender-a", "1").await, menu::ASK_ORDER);
    // The bare trigger still bails out.
    let reply = harness.say("sender-a", "hi").await;
    assert!(reply.contains("Choose an option"), "got: {reply}");
}
