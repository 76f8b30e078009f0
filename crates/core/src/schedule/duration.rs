use serde::{Deserialize, Serialize};

/// Maps the requested load size (sacks) to an appointment duration in
/// minutes. Pure lookup; quantity validation happens upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTiers {
    pub small_max: u32,
    pub medium_max: u32,
    pub small_minutes: u32,
    pub medium_minutes: u32,
    pub large_minutes: u32,
}

impl Default for DurationTiers {
    fn default() -> Self {
        Self {
            small_max: 250,
            medium_max: 500,
            small_minutes: 45,
            medium_minutes: 60,
            large_minutes: 120,
        }
    }
}

impl DurationTiers {
    pub fn unload_minutes(&self, quantity: u32) -> u32 {
        if quantity <= self.small_max {
            self.small_minutes
        } else if quantity <= self.medium_max {
            self.medium_minutes
        } else {
            self.large_minutes
        }
    }

    /// The largest quantity that still fits the shortest tier. Used by the
    /// admin flow to enumerate the full slot grid.
    pub fn smallest_tier_quantity(&self) -> u32 {
        self.small_max
    }
}

#[cfg(test)]
mod tests {
    use super::DurationTiers;

    #[test]
    fn tier_boundaries() {
        let tiers = DurationTiers::default();
        assert_eq!(tiers.unload_minutes(1), 45);
        assert_eq!(tiers.unload_minutes(250), 45);
        assert_eq!(tiers.unload_minutes(251), 60);
        assert_eq!(tiers.unload_minutes(500), 60);
        assert_eq!(tiers.unload_minutes(501), 120);
        assert_eq!(tiers.unload_minutes(10_000), 120);
    }
}
