pub mod asset;
pub mod creature;
pub mod leaderboard;
