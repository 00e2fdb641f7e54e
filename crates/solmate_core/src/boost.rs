//! Feed and pet boosts.
//!
//! A boost raises a derived stat by moving its virtual clock backwards: the
//! new timestamp is the one at which an untouched creature would show the
//! boosted value right now. The decay trajectory afterwards is identical to a
//! creature that was simply left at the boosted value.

use crate::decay::{stat_value, Stat, MAX_STAT};
use crate::leveling::{grant_xp, XpGrant, XP_FOR_FEED, XP_FOR_PET};
use chrono::{DateTime, Duration, Utc};
use solmate_data::Creature;

pub const BOOST_AMOUNT: f64 = 10.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Timestamp that yields `value` for `stat` when evaluated at `now`.
///
/// `value` is clamped to the stat range, so 100 maps to `now` and 0 maps to
/// the full depletion time before `now`.
#[must_use]
pub fn timestamp_for_value(stat: Stat, value: f64, now: DateTime<Utc>) -> DateTime<Utc> {
    let value = value.clamp(0.0, MAX_STAT);
    let hours = (MAX_STAT - value) / stat.decay_per_hour();
    now - Duration::milliseconds((hours * MILLIS_PER_HOUR).round() as i64)
}

/// New virtual clock for `stat` after one boost.
#[must_use]
pub fn boosted_timestamp(stat: Stat, last_event: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let current = stat_value(stat, last_event, now);
    let boosted = (current + BOOST_AMOUNT).min(MAX_STAT);
    timestamp_for_value(stat, boosted, now)
}

/// Applies a full feed action: clock, counter and XP reward.
pub fn feed(creature: &mut Creature, now: DateTime<Utc>) -> XpGrant {
    creature.last_fed_at = boosted_timestamp(Stat::Health, creature.last_fed_at, now);
    creature.times_fed = creature.times_fed.saturating_add(1);
    creature.updated_at = now;
    grant_xp(creature, XP_FOR_FEED)
}

/// Applies a full pet action: clock, counter and XP reward.
pub fn pet(creature: &mut Creature, now: DateTime<Utc>) -> XpGrant {
    creature.last_pet_at = boosted_timestamp(Stat::Happiness, creature.last_pet_at, now);
    creature.times_petted = creature.times_petted.saturating_add(1);
    creature.updated_at = now;
    grant_xp(creature, XP_FOR_PET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::DerivedStats;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_boost_at_full_resets_to_now() {
        let t = now();
        assert_eq!(boosted_timestamp(Stat::Health, t, t), t);
        let future = t + Duration::hours(1);
        assert_eq!(boosted_timestamp(Stat::Health, future, t), t);
    }

    #[test]
    fn test_feed_from_fifty_gives_sixty() {
        let t = now();
        let half = timestamp_for_value(Stat::Health, 50.0, t);
        assert_eq!(stat_value(Stat::Health, half, t), 50.0);

        let fed = boosted_timestamp(Stat::Health, half, t);
        let value = stat_value(Stat::Health, fed, t);
        assert!((value - 60.0).abs() < 1e-6, "got {value}");
    }

    #[test]
    fn test_pet_from_zero_gives_ten() {
        let t = now();
        let long_ago = t - Duration::days(10);
        let petted = boosted_timestamp(Stat::Happiness, long_ago, t);
        assert_eq!(petted, t - Duration::hours(45));
        assert!((stat_value(Stat::Happiness, petted, t) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_boost_caps_at_full() {
        let t = now();
        let ninety_five = timestamp_for_value(Stat::Health, 95.0, t);
        assert_eq!(boosted_timestamp(Stat::Health, ninety_five, t), t);
    }

    #[test]
    fn test_feed_applies_counter_and_xp_together() {
        let t = now();
        let mut c = Creature::new("pk", "Rex", "dragon", t - Duration::hours(5));
        let grant = feed(&mut c, t);
        assert_eq!(c.times_fed, 1);
        assert_eq!(c.xp, XP_FOR_FEED);
        assert_eq!(grant.amount, XP_FOR_FEED);
        assert_eq!(c.updated_at, t);
        let stats = DerivedStats::of(&c, t);
        assert!((stats.health - 90.0).abs() < 1e-6);
        assert_eq!(c.last_pet_at, t - Duration::hours(5));
    }

    #[test]
    fn test_pet_leaves_health_clock_alone() {
        let t = now();
        let mut c = Creature::new("pk", "Rex", "dragon", t - Duration::hours(5));
        pet(&mut c, t);
        assert_eq!(c.times_petted, 1);
        assert_eq!(c.last_fed_at, t - Duration::hours(5));
        let stats = DerivedStats::of(&c, t);
        assert!((stats.happiness - 100.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_boost_never_exceeds_full(hours_ago in 0i64..200, repeats in 1usize..20) {
            let t = now();
            let mut last = t - Duration::hours(hours_ago);
            for _ in 0..repeats {
                last = boosted_timestamp(Stat::Health, last, t);
            }
            prop_assert!(last <= t);
            prop_assert!(stat_value(Stat::Health, last, t) <= MAX_STAT);
        }

        #[test]
        fn prop_boost_adds_ten_below_cap(value in 0.0f64..90.0) {
            let t = now();
            let last = timestamp_for_value(Stat::Happiness, value, t);
            let before = stat_value(Stat::Happiness, last, t);
            let after = stat_value(Stat::Happiness, boosted_timestamp(Stat::Happiness, last, t), t);
            prop_assert!((after - before - BOOST_AMOUNT).abs() < 1e-3);
        }
    }
}
