use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{error, info};

use dockbook_agent::FallbackResponder;
use dockbook_core::admin::{authenticate, AdminBlockService, BlockRequest};
use dockbook_core::booking::{BookingRequest, BookingService};
use dockbook_core::clock::Clock;
use dockbook_core::collab::{AdminSecretSource, OccupancyStore};
use dockbook_core::config::{AppConfig, ContactsConfig};
use dockbook_core::domain::booking::PackagingKind;
use dockbook_core::domain::session::Stage;
use dockbook_core::errors::{ApplicationError, BookingError};
use dockbook_core::schedule::calendar::{eligible_dates, CalendarPolicy};
use dockbook_core::schedule::slots::{Period, SlotEngine};

use crate::menu;
use crate::session::SessionStore;
use crate::transport::{format_phone, InboundMessage};

/// Conversation-level policy knobs, split off from the rest of the config
/// so tests can pin them without a full [`AppConfig`].
#[derive(Clone, Debug)]
pub struct DialoguePolicy {
    pub reset_triggers: Vec<String>,
    /// When false, a trigger word inside a free-text answer (an order
    /// number, a block reason) does not blow the flow away; only a message
    /// that is exactly the trigger does.
    pub triggers_interrupt_free_text: bool,
    pub admin_max_attempts: u32,
    pub idle_timeout: chrono::Duration,
}

impl DialoguePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reset_triggers: config.session.reset_triggers.clone(),
            triggers_interrupt_free_text: config.session.triggers_interrupt_free_text,
            admin_max_attempts: config.session.admin_max_attempts,
            idle_timeout: config.idle_timeout(),
        }
    }
}

/// Whether this message unconditionally resets the conversation to the
/// main menu. Triggers match anywhere in the normalized text, except in
/// free-text-capturing states where only an exact match counts (unless
/// configured otherwise).
pub fn matches_reset_trigger(normalized: &str, stage: &Stage, policy: &DialoguePolicy) -> bool {
    if stage.captures_free_text() && !policy.triggers_interrupt_free_text {
        return policy.reset_triggers.iter().any(|t| normalized == t.as_str());
    }
    policy.reset_triggers.iter().any(|t| normalized.contains(t.as_str()))
}

struct StepOutcome {
    next: Stage,
    reply: String,
}

impl StepOutcome {
    fn stay(stage: Stage, reply: impl Into<String>) -> Self {
        Self { next: stage, reply: reply.into() }
    }

    fn idle(reply: impl Into<String>) -> Self {
        Self { next: Stage::Idle, reply: reply.into() }
    }
}

/// Drives one sender's scripted dialogue. Each inbound message is looked
/// up against the sender's session, handled by the current stage's
/// handler, and answered with exactly one reply.
pub struct DialogueEngine {
    booking: BookingService,
    admin: AdminBlockService,
    occupancy: Arc<dyn OccupancyStore>,
    secrets: Arc<dyn AdminSecretSource>,
    fallback: FallbackResponder,
    sessions: SessionStore,
    slot_engine: SlotEngine,
    calendar: CalendarPolicy,
    contacts: ContactsConfig,
    clock: Arc<dyn Clock>,
    policy: DialoguePolicy,
}

impl DialogueEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        booking: BookingService,
        admin: AdminBlockService,
        occupancy: Arc<dyn OccupancyStore>,
        secrets: Arc<dyn AdminSecretSource>,
        fallback: FallbackResponder,
        slot_engine: SlotEngine,
        calendar: CalendarPolicy,
        contacts: ContactsConfig,
        clock: Arc<dyn Clock>,
        policy: DialoguePolicy,
    ) -> Self {
        Self {
            booking,
            admin,
            occupancy,
            secrets,
            fallback,
            sessions: SessionStore::new(),
            slot_engine,
            calendar,
            contacts,
            clock,
            policy,
        }
    }

    pub async fn handle_message(&self, message: &InboundMessage) -> String {
        let now = self.clock.now();
        let mut session =
            self.sessions.checkout(&message.sender, now, self.policy.idle_timeout).await;
        let normalized = message.text.trim().to_lowercase();

        if matches_reset_trigger(&normalized, &session.stage, &self.policy) {
            session.reset();
            self.sessions.commit(&message.sender, session, now).await;
            return menu::main_menu(message.name());
        }

        let stage = session.stage.clone();
        match self.dispatch(stage, message, &normalized, now).await {
            Ok(outcome) => {
                session.stage = outcome.next;
                self.sessions.commit(&message.sender, session, now).await;
                outcome.reply
            }
            Err(application_error) => {
                error!(
                    event_name = "chat.dialogue.collaborator_failed",
                    sender = %message.sender,
                    error = %application_error,
                    "collaborator failure while handling a message"
                );
                // The session is deliberately left where it was so the
                // sender can retry the same step.
                self.sessions.commit(&message.sender, session, now).await;
                menu::INTERNAL_ERROR.to_string()
            }
        }
    }

    async fn dispatch(
        &self,
        stage: Stage,
        message: &InboundMessage,
        normalized: &str,
        now: NaiveDateTime,
    ) -> Result<StepOutcome, ApplicationError> {
        match stage {
            Stage::Idle => self.handle_idle(message).await,
            Stage::AwaitingOrder => self.handle_order(message, now).await,
            Stage::AwaitingDate { order, offered_dates } => {
                Ok(handle_date_choice(order, offered_dates, normalized))
            }
            Stage::AwaitingPackaging { order, date } => {
                Ok(handle_packaging_choice(order, date, normalized))
            }
            Stage::AwaitingQuantity { order, date, packaging } => {
                Ok(handle_quantity(order, date, packaging, normalized))
            }
            Stage::AwaitingPeriod { order, date, packaging, quantity } => {
                self.handle_period(order, date, packaging, quantity, normalized, now).await
            }
            Stage::AwaitingTime { order, date, packaging, quantity, period, offered_times } => {
                self.handle_time_choice(
                    order,
                    date,
                    packaging,
                    quantity,
                    period,
                    offered_times,
                    message,
                    normalized,
                )
                .await
            }
            Stage::AdminAwaitingPassword { attempts } => {
                self.handle_admin_password(attempts, message).await
            }
            Stage::AdminAwaitingDate => self.handle_admin_date(message, now).await,
            Stage::AdminAwaitingSlotSelection { date, offered_times } => {
                Ok(handle_admin_slot_selection(date, offered_times, message))
            }
            Stage::AdminAwaitingReason { date, times } => {
                self.handle_admin_reason(date, times, message).await
            }
        }
    }

    async fn handle_idle(
        &self,
        message: &InboundMessage,
    ) -> Result<StepOutcome, ApplicationError> {
        let choice = message.text.trim();
        if let Some(contact) = menu::contact_for_option(&self.contacts, choice) {
            return Ok(StepOutcome::idle(contact));
        }

        Ok(match choice {
            "1" => StepOutcome::stay(Stage::AwaitingOrder, menu::ASK_ORDER),
            "7" => StepOutcome::idle(menu::HANDOFF),
            "8" => StepOutcome::idle(menu::main_menu(message.name())),
            "9" => StepOutcome::stay(
                Stage::AdminAwaitingPassword { attempts: 0 },
                menu::ASK_ADMIN_PASSWORD,
            ),
            _ => StepOutcome::idle(self.fallback.answer(&message.text).await),
        })
    }

    async fn handle_order(
        &self,
        message: &InboundMessage,
        now: NaiveDateTime,
    ) -> Result<StepOutcome, ApplicationError> {
        match self.booking.check_order(message.text.trim()).await {
            Ok(order) => {
                let offered_dates = eligible_dates(now, &self.calendar);
                if offered_dates.is_empty() {
                    return Ok(StepOutcome::idle(menu::NO_DATES));
                }
                let reply = menu::date_choices(&offered_dates);
                Ok(StepOutcome::stay(Stage::AwaitingDate { order, offered_dates }, reply))
            }
            Err(BookingError::OrderNotFound { .. }) => {
                Ok(StepOutcome::idle(menu::ORDER_NOT_FOUND))
            }
            Err(BookingError::OrderAlreadyBooked { .. }) => {
                Ok(StepOutcome::idle(menu::ORDER_ALREADY_BOOKED))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn handle_period(
        &self,
        order: dockbook_core::domain::order::PurchaseOrder,
        date: NaiveDate,
        packaging: PackagingKind,
        quantity: u32,
        normalized: &str,
        now: NaiveDateTime,
    ) -> Result<StepOutcome, ApplicationError> {
        let Some(period) = Period::from_menu_digit(normalized) else {
            return Ok(StepOutcome::stay(
                Stage::AwaitingPeriod { order, date, packaging, quantity },
                menu::INVALID_PERIOD,
            ));
        };

        let occupied = self
            .occupancy
            .occupied_times(date)
            .await
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

        let offered_times: Vec<_> = self
            .slot_engine
            .available_slots(date, quantity, &occupied, now)
            .into_iter()
            .filter(|time| period.contains(*time, &self.slot_engine.hours))
            .collect();

        if offered_times.is_empty() {
            return Ok(StepOutcome::idle(menu::NO_SLOTS_IN_PERIOD));
        }

        let reply = menu::time_choices(&offered_times);
        Ok(StepOutcome::stay(
            Stage::AwaitingTime { order, date, packaging, quantity, period, offered_times },
            reply,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_time_choice(
        &self,
        order: dockbook_core::domain::order::PurchaseOrder,
        date: NaiveDate,
        packaging: PackagingKind,
        quantity: u32,
        _period: Period,
        offered_times: Vec<chrono::NaiveTime>,
        message: &InboundMessage,
        normalized: &str,
    ) -> Result<StepOutcome, ApplicationError> {
        let Some(time) = pick_one_based(normalized, &offered_times) else {
            return Ok(StepOutcome::idle(menu::INVALID_CHOICE_CANCELLED));
        };

        let request = BookingRequest {
            order_ref: order.order_ref.clone(),
            date,
            time,
            quantity,
            packaging,
            phone: format_phone(&message.sender),
            customer_name: message.name().to_string(),
        };

        match self.booking.create_booking(request).await {
            Ok(booking) => {
                info!(
                    event_name = "chat.booking.committed",
                    order_ref = %booking.order_ref,
                    date = %booking.date,
                    time = %booking.time,
                    "unloading appointment committed"
                );
                Ok(StepOutcome::idle(menu::booking_summary(&booking)))
            }
            Err(BookingError::SlotTaken { .. }) => Ok(StepOutcome::idle(menu::SLOT_JUST_TAKEN)),
            Err(BookingError::OrderAlreadyBooked { .. }) => {
                Ok(StepOutcome::idle(menu::ORDER_ALREADY_BOOKED))
            }
            Err(BookingError::OrderNotFound { .. }) => {
                Ok(StepOutcome::idle(menu::ORDER_NOT_FOUND))
            }
            Err(BookingError::InvalidQuantity { .. }) => {
                Ok(StepOutcome::idle(menu::INVALID_QUANTITY))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn handle_admin_password(
        &self,
        attempts: u32,
        message: &InboundMessage,
    ) -> Result<StepOutcome, ApplicationError> {
        let stored = self
            .secrets
            .admin_secret()
            .await
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

        // Unset secret: abort immediately rather than inviting retries
        // against a credential that can never match.
        if stored.is_none() {
            return Ok(StepOutcome::idle(menu::ADMIN_NOT_CONFIGURED));
        }

        if authenticate(message.text.trim(), stored.as_ref()) {
            return Ok(StepOutcome::stay(Stage::AdminAwaitingDate, menu::ASK_BLOCK_DATE));
        }

        let attempts = attempts + 1;
        if attempts >= self.policy.admin_max_attempts {
            return Ok(StepOutcome::idle(menu::ADMIN_TOO_MANY_ATTEMPTS));
        }
        Ok(StepOutcome::stay(
            Stage::AdminAwaitingPassword { attempts },
            menu::ADMIN_WRONG_PASSWORD,
        ))
    }

    async fn handle_admin_date(
        &self,
        message: &InboundMessage,
        now: NaiveDateTime,
    ) -> Result<StepOutcome, ApplicationError> {
        let Ok(date) = NaiveDate::parse_from_str(message.text.trim(), "%d/%m/%Y") else {
            return Ok(StepOutcome::stay(Stage::AdminAwaitingDate, menu::INVALID_BLOCK_DATE));
        };

        let occupied = self
            .occupancy
            .occupied_times(date)
            .await
            .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

        let offered_times = self.slot_engine.grid_slots(date, &occupied, now);
        if offered_times.is_empty() {
            return Ok(StepOutcome::idle(menu::NO_SLOTS_TO_BLOCK));
        }

        let reply = menu::block_time_choices(&offered_times);
        Ok(StepOutcome::stay(
            Stage::AdminAwaitingSlotSelection { date, offered_times },
            reply,
        ))
    }

    async fn handle_admin_reason(
        &self,
        date: NaiveDate,
        times: Vec<chrono::NaiveTime>,
        message: &InboundMessage,
    ) -> Result<StepOutcome, ApplicationError> {
        let reason = message.text.trim();
        if reason.is_empty() {
            return Ok(StepOutcome::stay(
                Stage::AdminAwaitingReason { date, times },
                menu::EMPTY_BLOCK_REASON,
            ));
        }

        let outcome = self
            .admin
            .block_slots(BlockRequest {
                date,
                times,
                reason: reason.to_string(),
                admin_name: message.name().to_string(),
                admin_phone: format_phone(&message.sender),
            })
            .await
            .map_err(ApplicationError::from)?;

        info!(
            event_name = "chat.block.committed",
            date = %date,
            blocked = outcome.blocked.len(),
            skipped = outcome.skipped.len(),
            "administrative block committed"
        );

        let blocked_times: Vec<_> = outcome.blocked.iter().map(|b| b.time).collect();
        Ok(StepOutcome::idle(menu::block_summary(
            date,
            &blocked_times,
            &outcome.skipped,
            reason,
        )))
    }

}

fn handle_date_choice(
    order: dockbook_core::domain::order::PurchaseOrder,
    offered_dates: Vec<NaiveDate>,
    normalized: &str,
) -> StepOutcome {
    let Some(date) = pick_one_based(normalized, &offered_dates) else {
        return StepOutcome::idle(menu::INVALID_CHOICE_CANCELLED);
    };
    StepOutcome::stay(Stage::AwaitingPackaging { order, date }, menu::ASK_PACKAGING)
}

fn handle_packaging_choice(
    order: dockbook_core::domain::order::PurchaseOrder,
    date: NaiveDate,
    normalized: &str,
) -> StepOutcome {
    let Some(packaging) = PackagingKind::from_menu_digit(normalized) else {
        return StepOutcome::stay(
            Stage::AwaitingPackaging { order, date },
            menu::INVALID_PACKAGING,
        );
    };
    StepOutcome::stay(Stage::AwaitingQuantity { order, date, packaging }, menu::ASK_QUANTITY)
}

fn handle_quantity(
    order: dockbook_core::domain::order::PurchaseOrder,
    date: NaiveDate,
    packaging: PackagingKind,
    normalized: &str,
) -> StepOutcome {
    match normalized.parse::<u32>() {
        Ok(quantity) if quantity > 0 => StepOutcome::stay(
            Stage::AwaitingPeriod { order, date, packaging, quantity },
            menu::ASK_PERIOD,
        ),
        _ => StepOutcome::stay(
            Stage::AwaitingQuantity { order, date, packaging },
            menu::INVALID_QUANTITY,
        ),
    }
}

fn handle_admin_slot_selection(
    date: NaiveDate,
    offered_times: Vec<chrono::NaiveTime>,
    message: &InboundMessage,
) -> StepOutcome {
    let mut selected = Vec::new();
    for part in message.text.split(',') {
        let Ok(index) = part.trim().parse::<usize>() else { continue };
        if index == 0 || index > offered_times.len() {
            continue;
        }
        let time = offered_times[index - 1];
        if !selected.contains(&time) {
            selected.push(time);
        }
    }

    if selected.is_empty() {
        return StepOutcome::stay(
            Stage::AdminAwaitingSlotSelection { date, offered_times },
            menu::INVALID_SLOT_SELECTION,
        );
    }

    StepOutcome::stay(
        Stage::AdminAwaitingReason { date, times: selected },
        menu::ASK_BLOCK_REASON,
    )
}

/// Resolves a 1-based menu selection against the list that was offered.
fn pick_one_based<T: Copy>(input: &str, offered: &[T]) -> Option<T> {
    let index = input.trim().parse::<usize>().ok()?;
    if index == 0 || index > offered.len() {
        return None;
    }
    Some(offered[index - 1])
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{matches_reset_trigger, pick_one_based, DialoguePolicy};
    use dockbook_core::domain::session::Stage;

    fn policy() -> DialoguePolicy {
        DialoguePolicy {
            reset_triggers: vec!["hello".into(), "menu".into()],
            triggers_interrupt_free_text: false,
            admin_max_attempts: 3,
            idle_timeout: Duration::minutes(30),
        }
    }

    #[test]
    fn triggers_match_anywhere_in_menu_states() {
        let policy = policy();
        assert!(matches_reset_trigger("hello there", &Stage::Idle, &policy));
        assert!(matches_reset_trigger("back to the menu please", &Stage::AdminAwaitingDate, &policy));
        assert!(!matches_reset_trigger("2", &Stage::Idle, &policy));
    }

    #[test]
    fn triggers_inside_free_text_need_an_exact_match() {
        let policy = policy();
        let reason = Stage::AdminAwaitingReason {
            date: chrono::NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            times: vec![],
        };

        // "hello" buried in a reason does not cancel the flow.
        assert!(!matches_reset_trigger("crane says hello, broken again", &reason, &policy));
        // The bare word still does.
        assert!(matches_reset_trigger("menu", &reason, &policy));
    }

    #[test]
    fn passwords_containing_trigger_words_are_not_resets() {
        let policy = policy();
        let password_entry = Stage::AdminAwaitingPassword { attempts: 0 };

        assert!(!matches_reset_trigger("hippocampus42", &password_entry, &policy));
        assert!(matches_reset_trigger("menu", &password_entry, &policy));
    }

    #[test]
    fn free_text_interruption_can_be_turned_back_on() {
        let mut policy = policy();
        policy.triggers_interrupt_free_text = true;

        assert!(matches_reset_trigger(
            "the menu board fell over",
            &Stage::AwaitingOrder,
            &policy
        ));
    }

    #[test]
    fn one_based_picks() {
        let offered = [10, 20, 30];
        assert_eq!(pick_one_based("1", &offered), Some(10));
        assert_eq!(pick_one_based(" 3 ", &offered), Some(30));
        assert_eq!(pick_one_based("0", &offered), None);
        assert_eq!(pick_one_based("4", &offered), None);
        assert_eq!(pick_one_based("first", &offered), None);
    }
}
