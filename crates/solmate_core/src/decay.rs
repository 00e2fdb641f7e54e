//! Time-derived creature stats.
//!
//! Health and happiness are never stored. Each is a linear function of the
//! time elapsed since its virtual clock (`last_fed_at` / `last_pet_at`):
//!
//! ```text
//! value = clamp(0, 100, 100 - hours_elapsed * rate)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use solmate_data::Creature;

pub const MAX_STAT: f64 = 100.0;
pub const MIN_STAT: f64 = 0.0;
pub const HEALTH_DECAY_PER_HOUR: f64 = 4.0;
pub const HAPPINESS_DECAY_PER_HOUR: f64 = 2.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Health,
    Happiness,
}

impl Stat {
    #[must_use]
    pub fn decay_per_hour(self) -> f64 {
        match self {
            Self::Health => HEALTH_DECAY_PER_HOUR,
            Self::Happiness => HAPPINESS_DECAY_PER_HOUR,
        }
    }

    /// Hours for the stat to fall from full to zero.
    #[must_use]
    pub fn hours_to_deplete(self) -> f64 {
        MAX_STAT / self.decay_per_hour()
    }

    /// The creature's virtual clock driving this stat.
    #[must_use]
    pub fn timestamp(self, creature: &Creature) -> DateTime<Utc> {
        match self {
            Self::Health => creature.last_fed_at,
            Self::Happiness => creature.last_pet_at,
        }
    }
}

/// Fractional hours between `since` and `now`. Future timestamps count as zero.
#[must_use]
pub fn hours_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - since).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_HOUR
}

#[must_use]
pub fn value_after_hours(stat: Stat, hours: f64) -> f64 {
    (MAX_STAT - hours * stat.decay_per_hour()).clamp(MIN_STAT, MAX_STAT)
}

#[must_use]
pub fn stat_value(stat: Stat, last_event: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    value_after_hours(stat, hours_between(last_event, now))
}

/// Oldest feed time at which a creature still has health left at `now`.
#[must_use]
pub fn alive_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let millis = (Stat::Health.hours_to_deplete() * MILLIS_PER_HOUR) as i64;
    now - Duration::milliseconds(millis)
}

/// Unrounded stats at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub health: f64,
    pub happiness: f64,
}

impl DerivedStats {
    #[must_use]
    pub fn of(creature: &Creature, now: DateTime<Utc>) -> Self {
        Self {
            health: stat_value(Stat::Health, creature.last_fed_at, now),
            happiness: stat_value(Stat::Happiness, creature.last_pet_at, now),
        }
    }

    /// Integer view for API responses.
    #[must_use]
    pub fn rounded(&self) -> (u8, u8) {
        (self.health.round() as u8, self.happiness.round() as u8)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > MIN_STAT
    }
}
