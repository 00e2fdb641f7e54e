//! # Solmate Data
//!
//! Plain data records shared by the engine, the store and the HTTP layer.

pub mod data;

pub use data::asset::{AssetKind, ManifestEntry, UnlockRequirement};
pub use data::creature::{Creature, DecorationPlacement, UnlockedAsset};
pub use data::leaderboard::{LeaderboardEntry, LeaderboardMetric};
