//! Waste flag: set by a periodic dice roll, cleared by the owner.

use crate::leveling::{grant_xp, XpGrant, XP_FOR_CLEAN};
use chrono::{DateTime, Utc};
use rand::Rng;
use solmate_data::Creature;

/// One Bernoulli trial for a creature that is currently clean.
pub fn roll_waste<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.gen_bool(probability)
}

/// Clears waste and rewards the owner. Returns `None` if there was nothing
/// to clean; the creature is left untouched in that case.
pub fn clean(creature: &mut Creature, now: DateTime<Utc>) -> Option<XpGrant> {
    if !creature.has_waste {
        return None;
    }
    creature.has_waste = false;
    creature.times_cleaned = creature.times_cleaned.saturating_add(1);
    creature.updated_at = now;
    Some(grant_xp(creature, XP_FOR_CLEAN))
}
