use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardMetric {
    /// Best run-game score, highest first.
    HighScore,
    /// Time since registration among creatures still alive, oldest first.
    Survival,
}

/// A creature's position on a leaderboard. Ranks are dense and start at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub pubkey: String,
    pub name: String,
    pub animal: String,
    pub level: u32,
    pub high_score: u64,
    pub created_at: DateTime<Utc>,
}
