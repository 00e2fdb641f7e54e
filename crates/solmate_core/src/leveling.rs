//! Experience and level progression.
//!
//! Level is a cached projection of cumulative XP along a power-law curve:
//! reaching level `L` costs `floor(BASE * (L - 1)^EXPONENT)` total XP. The
//! inverse used to derive a level from XP is the closed form of the same curve
//! without the floor, so it can lag the forward table by one level at
//! non-exact boundaries. Both are kept exactly as written.

use serde::{Deserialize, Serialize};
use solmate_data::Creature;

pub const LEVEL_FORMULA_BASE: f64 = 100.0;
pub const LEVEL_FORMULA_EXPONENT: f64 = 1.5;

pub const XP_FOR_FEED: u64 = 10;
pub const XP_FOR_PET: u64 = 10;
pub const XP_FOR_CLEAN: u64 = 5;
pub const XP_PER_RUN_SCORE: f64 = 0.5;

/// Total XP needed to reach `level`.
#[must_use]
pub fn xp_required_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    (LEVEL_FORMULA_BASE * f64::from(level - 1).powf(LEVEL_FORMULA_EXPONENT)).floor() as u64
}

#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    let xp = xp as f64;
    if xp < LEVEL_FORMULA_BASE {
        return 1;
    }
    (xp / LEVEL_FORMULA_BASE)
        .powf(1.0 / LEVEL_FORMULA_EXPONENT)
        .floor() as u32
        + 1
}

/// Smallest XP total whose derived level is at least `level`.
///
/// Equals `xp_required_for_level` where the two formulas agree and sits a
/// few points above it where the floored table lags the closed-form inverse.
#[must_use]
pub fn min_xp_for_level(level: u32) -> u64 {
    let mut xp = xp_required_for_level(level);
    while level_for_xp(xp) < level {
        xp += 1;
    }
    xp
}

/// XP awarded for a run-game score.
#[must_use]
pub fn run_score_xp(score: u64) -> u64 {
    (score as f64 * XP_PER_RUN_SCORE).floor() as u64
}

/// Outcome of applying an XP delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpGrant {
    pub amount: u64,
    pub xp: u64,
    pub previous_level: u32,
    pub level: u32,
}

impl XpGrant {
    #[must_use]
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Adds `amount` XP and re-derives the level in place.
///
/// Level never moves backwards through a grant, even if a stored level was
/// set above the curve by an admin override.
pub fn grant_xp(creature: &mut Creature, amount: u64) -> XpGrant {
    let previous_level = creature.level;
    if amount == 0 {
        return XpGrant {
            amount,
            xp: creature.xp,
            previous_level,
            level: previous_level,
        };
    }

    let new_xp = creature.xp.saturating_add(amount);
    let new_level = level_for_xp(new_xp);
    creature.xp = new_xp;
    if new_level > previous_level {
        creature.level = new_level;
        tracing::info!(
            pubkey = %creature.pubkey,
            name = %creature.name,
            from = previous_level,
            to = new_level,
            "Solmate leveled up"
        );
    }

    XpGrant {
        amount,
        xp: creature.xp,
        previous_level,
        level: creature.level,
    }
}

/// XP bounds around the current level, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub xp_for_current_level: u64,
    pub xp_for_next_level: u64,
    pub xp_to_next_level: u64,
}

impl LevelProgress {
    #[must_use]
    pub fn of(level: u32, xp: u64) -> Self {
        let next = xp_required_for_level(level.saturating_add(1));
        Self {
            xp_for_current_level: xp_required_for_level(level),
            xp_for_next_level: next,
            xp_to_next_level: next.saturating_sub(xp),
        }
    }
}
