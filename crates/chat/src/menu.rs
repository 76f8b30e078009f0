//! Reply text rendering. All user-visible strings live here so the
//! dialogue logic stays free of formatting concerns.

use chrono::{NaiveDate, NaiveTime};

use dockbook_core::config::ContactsConfig;
use dockbook_core::domain::booking::{Booking, PackagingKind};

pub const DATE_DISPLAY: &str = "%d/%m/%Y";
pub const TIME_DISPLAY: &str = "%H:%M";

pub fn main_menu(name: &str) -> String {
    format!(
        "Hello {name}, welcome to the Kaffee Exp. e Imp. dock desk.\n\n\
         Choose an option:\n\n\
         1. Schedule an unloading appointment\n\
         2. Coffee quotation\n\
         3. Commercial\n\
         4. Finance\n\
         5. HR\n\
         6. Quality department\n\
         7. Talk to a person\n\
         8. Back to this menu\n\
         9. Schedule maintenance (administrators only)\n\n\
         Reply with the matching number."
    )
}

pub fn contact_reply(detail: &str) -> String {
    format!("Contact: {detail}")
}

pub fn contact_for_option(contacts: &ContactsConfig, digit: &str) -> Option<String> {
    let detail = match digit {
        "2" => &contacts.quotation,
        "3" => &contacts.purchasing,
        "4" => &contacts.finance,
        "5" => &contacts.hr,
        "6" => &contacts.quality,
        _ => return None,
    };
    Some(contact_reply(detail))
}

pub const HANDOFF: &str = "Putting you through to a person. One moment.";
pub const ASK_ORDER: &str = "Please send the purchase ORDER number.";
pub const ORDER_NOT_FOUND: &str = "ORDER not found.";
pub const ORDER_ALREADY_BOOKED: &str =
    "This ORDER already has an unloading appointment. Get in touch if you need to change \
     the date or time.";
pub const ASK_PACKAGING: &str =
    "How does the load arrive?\n\n1. Bulk\n2. Bagged\n3. Big-bags";
pub const INVALID_PACKAGING: &str = "Invalid option. Reply 1, 2 or 3.";
pub const ASK_QUANTITY: &str = "How many sacks in total?";
pub const INVALID_QUANTITY: &str = "Invalid quantity. Reply with a number.";
pub const ASK_PERIOD: &str = "Which period?\n\n1. Morning\n2. Afternoon";
pub const INVALID_PERIOD: &str = "Invalid option. Reply 1 or 2.";
pub const NO_SLOTS_IN_PERIOD: &str = "No times are available in that period.";
pub const NO_DATES: &str = "No dates are open for scheduling right now.";
pub const INVALID_CHOICE_CANCELLED: &str = "Invalid option. Scheduling cancelled.";
pub const SLOT_JUST_TAKEN: &str =
    "That time was taken a moment ago. Start again and pick another one.";
pub const ASK_ADMIN_PASSWORD: &str = "Enter the administrator password:";
pub const ADMIN_NOT_CONFIGURED: &str =
    "No administrator password is configured. Contact the system owner.";
pub const ADMIN_WRONG_PASSWORD: &str =
    "Wrong password. Try again, or type \"menu\" to go back.";
pub const ADMIN_TOO_MANY_ATTEMPTS: &str = "Too many attempts. Back to the main menu.";
pub const ASK_BLOCK_DATE: &str =
    "Password accepted.\n\nEnter the date to block (DD/MM/YYYY):";
pub const INVALID_BLOCK_DATE: &str = "Invalid date. Use the DD/MM/YYYY format.";
pub const NO_SLOTS_TO_BLOCK: &str = "No free times to block on that date.";
pub const INVALID_SLOT_SELECTION: &str =
    "No valid option in that list. Send the time numbers again, or type \"menu\" to cancel.";
pub const ASK_BLOCK_REASON: &str = "Now enter the reason for the block (free text):";
pub const EMPTY_BLOCK_REASON: &str = "The reason cannot be empty. Enter the reason for the block:";
pub const INTERNAL_ERROR: &str = "Something went wrong on our side. Please try again shortly.";

pub fn date_choices(dates: &[NaiveDate]) -> String {
    let lines = numbered(dates.iter().map(|d| d.format(DATE_DISPLAY).to_string()));
    format!("Pick a date for the appointment:\n\n{lines}")
}

pub fn time_choices(times: &[NaiveTime]) -> String {
    let lines = numbered(times.iter().map(|t| t.format(TIME_DISPLAY).to_string()));
    format!("Pick a time:\n\n{lines}")
}

pub fn block_time_choices(times: &[NaiveTime]) -> String {
    let lines = numbered(times.iter().map(|t| t.format(TIME_DISPLAY).to_string()));
    format!(
        "Choose the times to block. You can pick several, separated by commas.\n\n\
         {lines}\n\nExample: 1,2,3"
    )
}

pub fn booking_summary(booking: &Booking) -> String {
    let packaging =
        booking.packaging.as_ref().map(PackagingKind::label).unwrap_or("Not informed");
    let salesperson = if booking.salesperson.is_empty() {
        "Not informed"
    } else {
        booking.salesperson.as_str()
    };
    format!(
        "Appointment confirmed!\n\nSummary:\n\
         - Order: {}\n\
         - Date: {}\n\
         - Time: {}\n\
         - Quantity: {} sacks\n\
         - Packaging: {}\n\
         - Salesperson: {}",
        booking.order_ref,
        booking.date.format(DATE_DISPLAY),
        booking.time.format(TIME_DISPLAY),
        booking.quantity,
        packaging,
        salesperson,
    )
}

pub fn block_summary(
    date: NaiveDate,
    blocked: &[NaiveTime],
    skipped: &[NaiveTime],
    reason: &str,
) -> String {
    let blocked_list = join_times(blocked);
    let mut summary = format!(
        "Block(s) recorded.\n\nDate: {}\nTimes: {}\nReason: {}",
        date.format(DATE_DISPLAY),
        blocked_list,
        reason,
    );
    if !skipped.is_empty() {
        summary.push_str(&format!(
            "\n\nAlready taken in the meantime (not blocked): {}",
            join_times(skipped)
        ));
    }
    summary
}

fn numbered(items: impl Iterator<Item = String>) -> String {
    items
        .enumerate()
        .map(|(index, item)| format!("{}. {item}", index + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_times(times: &[NaiveTime]) -> String {
    times.iter().map(|t| t.format(TIME_DISPLAY).to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{block_summary, date_choices, time_choices};

    #[test]
    fn choices_are_one_based_and_display_formatted() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2026, 9, 3).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
        ];
        let rendered = date_choices(&dates);
        assert!(rendered.contains("1. 03/09/2026"));
        assert!(rendered.contains("2. 04/09/2026"));

        let times = vec![NaiveTime::from_hms_opt(8, 15, 0).unwrap()];
        assert!(time_choices(&times).contains("1. 08:15"));
    }

    #[test]
    fn block_summary_reports_skipped_times_separately() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 4).unwrap();
        let blocked = vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap()];
        let skipped = vec![NaiveTime::from_hms_opt(9, 45, 0).unwrap()];

        let with_skips = block_summary(date, &blocked, &skipped, "maintenance");
        assert!(with_skips.contains("09:00"));
        assert!(with_skips.contains("not blocked"));
        assert!(with_skips.contains("09:45"));

        let clean = block_summary(date, &blocked, &[], "maintenance");
        assert!(!clean.contains("not blocked"));
    }
}
