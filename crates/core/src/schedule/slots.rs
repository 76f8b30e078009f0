use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::schedule::duration::DurationTiers;

/// Dock operating hours and the slot cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub cadence_minutes: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: hm(7, 30),
            close: hm(16, 30),
            lunch_start: hm(11, 0),
            lunch_end: hm(12, 0),
            cadence_minutes: 45,
        }
    }
}

/// Half-day choice offered during the booking flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
}

impl Period {
    pub fn from_menu_digit(digit: &str) -> Option<Self> {
        match digit.trim() {
            "1" => Some(Self::Morning),
            "2" => Some(Self::Afternoon),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }

    /// Morning is strictly before lunch start; afternoon is at or after
    /// lunch end. Nothing starts inside the lunch window anyway.
    pub fn contains(&self, time: NaiveTime, hours: &BusinessHours) -> bool {
        match self {
            Self::Morning => time < hours.lunch_start,
            Self::Afternoon => time >= hours.lunch_end,
        }
    }
}

/// Derives the candidate start times for a date on demand. Availability is
/// recomputed per request because the appointment length varies with the
/// requested quantity; a fixed slot grid cannot express that.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotEngine {
    pub hours: BusinessHours,
    pub tiers: DurationTiers,
}

impl SlotEngine {
    pub fn new(hours: BusinessHours, tiers: DurationTiers) -> Self {
        Self { hours, tiers }
    }

    /// Candidate start times for `date`, ascending, no duplicates.
    ///
    /// A candidate `t` survives when all of these hold:
    /// - `t` does not start inside the lunch window (the walk jumps from
    ///   lunch start straight to lunch end),
    /// - the appointment `[t, t + duration)` does not straddle lunch start,
    /// - `t` is not in `occupied`,
    /// - the appointment ends at or before closing,
    /// - when `date` is today, `t` is strictly after `now`.
    pub fn available_slots(
        &self,
        date: NaiveDate,
        quantity: u32,
        occupied: &HashSet<NaiveTime>,
        now: NaiveDateTime,
    ) -> Vec<NaiveTime> {
        let duration = self.tiers.unload_minutes(quantity);
        let is_today = date == now.date();

        let open = minutes_of(self.hours.open);
        let close = minutes_of(self.hours.close);
        let lunch_start = minutes_of(self.hours.lunch_start);
        let lunch_end = minutes_of(self.hours.lunch_end);
        let cadence = self.hours.cadence_minutes.max(1);

        let mut slots = Vec::new();
        let mut cursor = open;

        while cursor <= close {
            if cursor >= lunch_start && cursor < lunch_end {
                cursor = lunch_end;
                continue;
            }

            let end = cursor + duration;
            let straddles_lunch = cursor < lunch_start && end > lunch_start;
            let fits_hours = end <= close;

            if let Some(time) = time_from_minutes(cursor) {
                let in_the_past = is_today && time <= now.time();
                if fits_hours && !straddles_lunch && !in_the_past && !occupied.contains(&time) {
                    slots.push(time);
                }
            }

            cursor += cadence;
        }

        slots
    }

    /// The full 45-minute-grid view used by the admin flow: slots for the
    /// smallest duration tier, ignoring the half-day split.
    pub fn grid_slots(
        &self,
        date: NaiveDate,
        occupied: &HashSet<NaiveTime>,
        now: NaiveDateTime,
    ) -> Vec<NaiveTime> {
        self.available_slots(date, self.tiers.smallest_tier_quantity(), occupied, now)
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid business hour")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use super::{hm, BusinessHours, Period, SlotEngine};

    fn engine() -> SlotEngine {
        SlotEngine::default()
    }

    fn far_future_now() -> chrono::NaiveDateTime {
        // A reference instant on a different day than any test date, so no
        // same-day filtering kicks in unless a test wants it.
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap().and_hms_opt(6, 0, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 2).unwrap()
    }

    #[test]
    fn no_slot_starts_during_lunch_or_ends_after_close() {
        let slots = engine().available_slots(date(), 100, &HashSet::new(), far_future_now());

        assert!(!slots.is_empty());
        for slot in &slots {
            assert!(*slot < hm(11, 0) || *slot >= hm(12, 0), "slot {slot} starts during lunch");
            assert!(*slot <= hm(15, 45), "45-minute job starting {slot} ends after close");
        }
        // 45-minute jobs may end exactly at close: 15:45 + 45 = 16:30.
        assert!(slots.contains(&hm(15, 45)));
        assert!(!slots.contains(&hm(16, 30)));
    }

    #[test]
    fn lunch_straddle_scenario_from_duration_tier_two() {
        // quantity 300 -> 60 minutes. On the default grid 10:30 + 60 would
        // straddle lunch and is dropped.
        let slots = engine().available_slots(date(), 300, &HashSet::new(), far_future_now());
        assert!(!slots.contains(&hm(10, 30)));

        // A 07:00 open puts 10:00 on the grid; 10:00 + 60 ends exactly at
        // lunch start and is kept, while 10:45 + 60 straddles and is not.
        let early = SlotEngine {
            hours: BusinessHours { open: hm(7, 0), ..BusinessHours::default() },
            ..SlotEngine::default()
        };
        let slots = early.available_slots(date(), 300, &HashSet::new(), far_future_now());
        assert!(slots.contains(&hm(10, 0)));
        assert!(!slots.contains(&hm(10, 45)));
    }

    #[test]
    fn occupied_times_are_excluded() {
        let mut occupied = HashSet::new();
        occupied.insert(hm(7, 30));
        occupied.insert(hm(13, 30));

        let slots = engine().available_slots(date(), 100, &occupied, far_future_now());

        assert!(!slots.contains(&hm(7, 30)));
        assert!(!slots.contains(&hm(13, 30)));
        assert!(slots.contains(&hm(8, 15)));
    }

    #[test]
    fn same_day_slots_already_started_are_dropped() {
        let now = date().and_hms_opt(9, 0, 0).unwrap();
        let slots = engine().available_slots(date(), 100, &HashSet::new(), now);

        assert!(!slots.contains(&hm(7, 30)));
        assert!(!slots.contains(&hm(9, 0)));
        assert!(slots.contains(&hm(9, 45)));
    }

    #[test]
    fn slots_are_ascending_and_unique() {
        let slots = engine().available_slots(date(), 700, &HashSet::new(), far_future_now());

        let mut sorted = slots.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(slots, sorted);
    }

    #[test]
    fn large_loads_lose_late_afternoon_starts() {
        // 120-minute jobs cannot start after 14:30 (14:30 + 120 = 16:30).
        let slots = engine().available_slots(date(), 700, &HashSet::new(), far_future_now());

        assert!(slots.contains(&hm(12, 45)));
        assert!(!slots.contains(&hm(15, 0)));
        assert!(!slots.contains(&hm(15, 45)));
    }

    #[test]
    fn period_split_matches_lunch_boundaries() {
        let hours = BusinessHours::default();
        assert!(Period::Morning.contains(hm(10, 15), &hours));
        assert!(!Period::Morning.contains(hm(12, 0), &hours));
        assert!(Period::Afternoon.contains(hm(12, 0), &hours));
        assert!(!Period::Afternoon.contains(hm(10, 15), &hours));

        assert_eq!(Period::from_menu_digit("1"), Some(Period::Morning));
        assert_eq!(Period::from_menu_digit("2"), Some(Period::Afternoon));
        assert_eq!(Period::from_menu_digit("3"), None);
    }

    #[test]
    fn grid_slots_use_smallest_tier() {
        let grid = engine().grid_slots(date(), &HashSet::new(), far_future_now());
        let small = engine().available_slots(date(), 250, &HashSet::new(), far_future_now());
        assert_eq!(grid, small);
    }
}
