//! Configuration management for the Solmate backend.
//!
//! Maps to a `config.toml` file. Every section has defaults, so a missing
//! file or a partial file is valid.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Environment variables `PORT`, `DATABASE_PATH`, `SOLANA_RPC_URL`,
//!    `RECIPIENT_PUBLIC_KEY`
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [database]
//! path = "./solmate.db"
//!
//! [jobs]
//! waste_probability = 0.2
//! waste_interval_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./solmate.db"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Root holding `decorations/manifest.json` and `background/manifest.json`.
    pub dir: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./assets"),
        }
    }
}

/// Periodic background jobs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
    pub waste_interval_secs: u64,
    /// Chance per roll that a clean creature produces waste.
    pub waste_probability: f64,
    /// How often the activity job checks for unpaid days. Shorter periods
    /// only notice a new UTC midnight sooner.
    pub xp_interval_secs: u64,
    pub xp_per_onchain_tx: u64,
    pub max_tx_to_check: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            waste_interval_secs: 3600,
            waste_probability: 0.2,
            xp_interval_secs: 86_400,
            xp_per_onchain_tx: 5,
            max_tx_to_check: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint. On-chain activity XP is disabled without it.
    pub rpc_url: Option<String>,
    pub recipient_pubkey: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub assets: AssetConfig,
    pub jobs: JobsConfig,
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.server.port > 0, "Server port must be positive");
        anyhow::ensure!(
            !self.database.path.as_os_str().is_empty(),
            "Database path must not be empty"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.jobs.waste_probability),
            "Waste probability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.jobs.waste_interval_secs > 0,
            "Waste interval must be positive"
        );
        anyhow::ensure!(
            self.jobs.xp_interval_secs > 0,
            "XP interval must be positive"
        );
        anyhow::ensure!(
            self.jobs.max_tx_to_check > 0 && self.jobs.max_tx_to_check <= 1000,
            "Max transactions to check must be in [1, 1000]"
        );
        if let Some(url) = &self.chain.rpc_url {
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "RPC URL must be http(s)"
            );
        }
        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when it does not exist, then
    /// applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(url) = get("SOLANA_RPC_URL") {
            self.chain.rpc_url = Some(url);
        }
        if let Some(key) = get("RECIPIENT_PUBLIC_KEY") {
            self.chain.recipient_pubkey = Some(key);
        }
    }

    /// Stable hash of the gameplay-affecting settings, logged at startup.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.jobs).as_bytes());
        hasher.update(format!("{:?}", self.chain).as_bytes());
        hex::encode(hasher.finalize())
    }
}
