use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Which calendar days may be offered for scheduling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarPolicy {
    /// Fixed-date holidays as (day, month) pairs, matched in any year.
    pub holidays: Vec<(u32, u32)>,
    /// How many eligible dates to offer.
    pub count: usize,
    /// How many calendar days to scan before giving up; the result may be
    /// shorter than `count` when the window is exhausted.
    pub lookahead_days: u32,
    /// Past this time of day, "today" is no longer offered.
    pub cutoff: NaiveTime,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self {
            holidays: vec![
                (1, 1),
                (21, 4),
                (1, 5),
                (7, 9),
                (12, 10),
                (2, 11),
                (15, 11),
                (25, 12),
            ],
            count: 7,
            lookahead_days: 15,
            cutoff: NaiveTime::from_hms_opt(16, 30, 0).expect("valid cutoff"),
        }
    }
}

impl CalendarPolicy {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&(date.day(), date.month()))
    }
}

/// Walks forward from today (or tomorrow once the same-day cutoff has
/// passed) and collects business days: weekends and holidays are skipped,
/// chronological order is preserved, and no date appears twice.
///
/// The cutoff comparison is `now.time() >= cutoff` for every hour of the
/// day, not only within the cutoff hour.
pub fn eligible_dates(now: NaiveDateTime, policy: &CalendarPolicy) -> Vec<NaiveDate> {
    let base = if now.time() >= policy.cutoff {
        now.date().checked_add_days(Days::new(1)).unwrap_or_else(|| now.date())
    } else {
        now.date()
    };

    let mut dates = Vec::with_capacity(policy.count);
    let mut offset = 0u32;

    while dates.len() < policy.count && offset < policy.lookahead_days {
        let Some(date) = base.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        offset += 1;

        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        if policy.is_holiday(date) {
            continue;
        }
        dates.push(date);
    }

    dates
}
