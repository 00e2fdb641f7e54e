use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted pet, one per owning wallet.
///
/// `last_fed_at` and `last_pet_at` are virtual clocks: health and happiness
/// are derived from the time elapsed since them and are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    pub pubkey: String,
    pub name: String,
    pub animal: String,
    pub level: u32,
    pub xp: u64,
    pub high_score: u64,
    pub last_fed_at: DateTime<Utc>,
    pub last_pet_at: DateTime<Utc>,
    pub has_waste: bool,
    pub selected_background: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub times_cleaned: u64,
    pub times_petted: u64,
    pub times_fed: u64,
}

impl Creature {
    /// A freshly registered creature: level 1, full stats, no waste.
    pub fn new(
        pubkey: impl Into<String>,
        name: impl Into<String>,
        animal: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            pubkey: pubkey.into(),
            name: name.into(),
            animal: animal.into(),
            level: 1,
            xp: 0,
            high_score: 0,
            last_fed_at: now,
            last_pet_at: now,
            has_waste: false,
            selected_background: None,
            created_at: now,
            updated_at: now,
            times_cleaned: 0,
            times_petted: 0,
            times_fed: 0,
        }
    }
}

/// One decoration on the 3x3 habitat grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationPlacement {
    pub row: u8,
    pub col: u8,
    pub name: String,
    pub url: String,
}

/// A cosmetic unlock owned by a creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAsset {
    pub asset_id: String,
    pub purchase_signature: Option<String>,
    pub unlocked_at: DateTime<Utc>,
}
