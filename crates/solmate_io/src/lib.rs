//! # Solmate IO
//!
//! Persistence layer for the Solmate backend.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - The `CreatureStore` contract and its SQLite implementation
//! - Read access to the cosmetic asset manifests

/// Error types and result aliases for store operations
pub mod error;
/// Asset manifests and decoration grid naming
pub mod manifest;
/// Creature, decoration, unlock and leaderboard persistence
pub mod store;

pub use error::{Result, StoreError};
pub use manifest::{decoration_slot, AssetCatalog, GRID_SIZE};
pub use store::{CreatureStore, PurchaseRecord, SqliteStore};
