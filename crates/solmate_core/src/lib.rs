//! # Solmate Core
//!
//! The decay and progression engine behind the Solmate virtual pet.
//!
//! Everything here is deterministic given an explicit `now`:
//! - **Decay**: health and happiness derived from virtual clocks
//! - **Boost**: feed/pet by back-dating those clocks
//! - **Leveling**: power-law XP curve and level-up detection
//! - **Hygiene**: waste rolls and cleaning rewards
//! - **Unlocks**: cosmetic entitlement rules
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use solmate_core::boost;
//! use solmate_core::decay::DerivedStats;
//! use solmate_data::Creature;
//!
//! let born = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! let mut pet = Creature::new("wallet", "Rex", "dragon", born);
//!
//! let now = born + Duration::hours(5);
//! assert_eq!(DerivedStats::of(&pet, now).health, 80.0);
//!
//! boost::feed(&mut pet, now);
//! assert_eq!(DerivedStats::of(&pet, now).health, 90.0);
//! ```

/// Feed and pet boosts by clock back-dating
pub mod boost;
/// Wallet activity and payment verification collaborators
pub mod chain;
/// Injectable time source
pub mod clock;
/// Configuration management for server, store and jobs
pub mod config;
/// Time-derived health and happiness
pub mod decay;
/// Waste rolls and cleaning
pub mod hygiene;
/// XP curve and level-ups
pub mod leveling;
/// Tracing subscriber setup
pub mod logging;
/// Cosmetic entitlement checks
pub mod unlock;

pub use clock::{Clock, FixedClock, SystemClock};
pub use decay::{DerivedStats, Stat};
pub use leveling::{LevelProgress, XpGrant};
pub use logging::init_logging;
pub use unlock::Entitlements;
