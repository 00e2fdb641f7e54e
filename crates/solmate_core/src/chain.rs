//! Blockchain collaborators: wallet activity lookups and payment checks.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Counts a wallet's transactions inside a time window.
#[async_trait]
pub trait ActivityProvider: Send + Sync {
    async fn transaction_count(
        &self,
        pubkey: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32>;
}

/// One entry of a `getSignaturesForAddress` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// Signatures whose block time falls in `[start, end)`. Unknown block times
/// are skipped.
#[must_use]
pub fn count_in_window(signatures: &[SignatureInfo], start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let (start, end) = (start.timestamp(), end.timestamp());
    signatures
        .iter()
        .filter_map(|s| s.block_time)
        .filter(|t| *t >= start && *t < end)
        .count() as u32
}

/// JSON-RPC client for a Solana node.
pub struct SolanaRpcProvider {
    client: reqwest::Client,
    url: String,
    limit: usize,
}

impl SolanaRpcProvider {
    #[must_use]
    pub fn new(url: impl Into<String>, limit: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            limit,
        }
    }

    async fn signatures_for_address(&self, pubkey: &str) -> Result<Vec<SignatureInfo>> {
        const MAX_RETRIES: u32 = 3;
        const INITIAL_BACKOFF_MS: u64 = 500;
        const REQUEST_TIMEOUT_SECS: u64 = 15;

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSignaturesForAddress",
            "params": [pubkey, { "limit": self.limit }],
        });

        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..MAX_RETRIES {
            let response = self
                .client
                .post(&self.url)
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: RpcResponse<Vec<SignatureInfo>> = resp.json().await?;
                        if let Some(err) = parsed.error {
                            return Err(anyhow::anyhow!(
                                "RPC error {}: {}",
                                err.code,
                                err.message
                            ));
                        }
                        return Ok(parsed.result.unwrap_or_default());
                    }

                    let is_transient = status.is_server_error() || status == 429;
                    if !is_transient || attempt == MAX_RETRIES - 1 {
                        return Err(anyhow::anyhow!("RPC node returned error: {}", status));
                    }
                    last_error = Some(anyhow::anyhow!("RPC node returned error: {}", status));
                }
                Err(e) => {
                    let is_transient = e.is_timeout() || e.is_connect();
                    if !is_transient || attempt == MAX_RETRIES - 1 {
                        return Err(anyhow::anyhow!("RPC request failed: {}", e));
                    }
                    last_error = Some(anyhow::anyhow!("RPC request failed: {}", e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown RPC error")))
    }
}

#[async_trait]
impl ActivityProvider for SolanaRpcProvider {
    async fn transaction_count(
        &self,
        pubkey: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32> {
        if pubkey.is_empty() {
            return Err(anyhow::anyhow!("Public key cannot be empty"));
        }
        let signatures = self.signatures_for_address(pubkey).await?;
        Ok(count_in_window(&signatures, start, end))
    }
}

/// A claimed payment for a paid asset.
#[derive(Debug, Clone)]
pub struct PaymentClaim {
    pub signature: String,
    pub payer: String,
    pub asset_id: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCheck {
    Confirmed,
    Rejected(String),
}

/// Confirms that a transaction really paid for an asset.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, claim: &PaymentClaim) -> Result<PaymentCheck>;
}

/// Accepts every claim. Replay protection still applies downstream.
pub struct TrustingVerifier;

#[async_trait]
impl PaymentVerifier for TrustingVerifier {
    async fn verify(&self, claim: &PaymentClaim) -> Result<PaymentCheck> {
        tracing::warn!(
            signature = %claim.signature,
            asset_id = %claim.asset_id,
            price = claim.price,
            "Payment accepted without on-chain verification"
        );
        Ok(PaymentCheck::Confirmed)
    }
}
