//! Application configuration loaded from environment variables.
//!
//! Required: `PROGRAM_ID`, `SELECTOR`
//! Optional: `RPC_URL`, `WS_URL`, `AUTHORITY_KEYPAIR_PATH`, `CLUSTER`,
//!           `HTTP_PORT`, `CRANK_PHASE`, `CRANK_TARGET`, `BATCH_SIZE`,
//!           `FINISH_ELIGIBILITY`, `POLL_INTERVAL_MS`, `MAX_RETRIES`,
//!           `INITIAL_RETRY_DELAY_MS`, `PRIORITY_FEE_MICRO_LAMPORTS`

use anyhow::{Context, Result, bail, ensure};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, read_keypair_file};
use std::str::FromStr;
use std::sync::Arc;

use crate::snapshot::Phase;

/// Largest batch the program accepts per instruction.
pub const MAX_BATCH_SIZE: u32 = 250;

/// Application configuration for the selector crank.
#[derive(Clone)]
pub struct AppConfig {
    /// Solana JSON-RPC endpoint (HTTP).
    pub rpc_url: String,
    /// Solana PubSub endpoint (WebSocket) for log subscriptions.
    pub ws_url: String,
    /// Selector authority; signs and pays for draw batches.
    pub authority_keypair: Arc<Keypair>,
    /// The deployed ticket selector program ID.
    pub program_id: Pubkey,
    /// The selector account to crank and audit.
    pub selector: Pubkey,
    /// Cluster name for explorer URLs.
    pub cluster: String,
    /// HTTP server port.
    pub http_port: u16,
    /// Phase to draw; `None` runs the listener and auditor only.
    pub crank_phase: Option<Phase>,
    /// Stop once the phase holds this many winners (default: the phase cap).
    pub crank_target: Option<u32>,
    /// Winners per transaction.
    pub batch_size: u32,
    /// Finalize the eligibility phase once its target is reached.
    pub finish_eligibility: bool,
    /// Delay between crank iterations in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum retry attempts per transaction.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Priority fee in micro-lamports per compute unit.
    pub priority_fee_micro_lamports: u64,
}

/// Parse a `CRANK_PHASE` value.
pub fn parse_phase(value: &str) -> Result<Option<Phase>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "" => Ok(None),
        "eligibility" | "kyc" => Ok(Some(Phase::Eligibility)),
        "allow-list" | "allowlist" | "wl" => Ok(Some(Phase::AllowList)),
        "reserve" => Ok(Some(Phase::Reserve)),
        other => bail!("unknown CRANK_PHASE: {other}"),
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn required_pubkey(name: &str) -> Result<Pubkey> {
    let value = std::env::var(name).with_context(|| format!("{name} env var must be set"))?;
    Pubkey::from_str(&value).with_context(|| format!("invalid {name}: {value}"))
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".into());
        let ws_url = std::env::var("WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:8900".into());

        let keypair_path = std::env::var("AUTHORITY_KEYPAIR_PATH")
            .unwrap_or_else(|_| "~/.config/solana/id.json".into());
        let keypair_path = shellexpand::tilde(&keypair_path).to_string();
        let authority_keypair = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to read keypair from {keypair_path}"))?;

        let program_id = required_pubkey("PROGRAM_ID")?;
        let selector = required_pubkey("SELECTOR")?;

        let cluster = std::env::var("CLUSTER").unwrap_or_else(|_| "devnet".into());

        let crank_phase = parse_phase(&std::env::var("CRANK_PHASE").unwrap_or_default())?;
        let crank_target = std::env::var("CRANK_TARGET")
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("invalid CRANK_TARGET")?;

        let batch_size = env_or("BATCH_SIZE", 100u32);
        ensure!(
            (1..=MAX_BATCH_SIZE).contains(&batch_size),
            "BATCH_SIZE must be in 1..={MAX_BATCH_SIZE}, got {batch_size}"
        );

        let finish_eligibility = std::env::var("FINISH_ELIGIBILITY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            rpc_url,
            ws_url,
            authority_keypair: Arc::new(authority_keypair),
            program_id,
            selector,
            cluster,
            http_port: env_or("HTTP_PORT", 8080),
            crank_phase,
            crank_target,
            batch_size,
            finish_eligibility,
            poll_interval_ms: env_or("POLL_INTERVAL_MS", 2_000),
            max_retries: env_or("MAX_RETRIES", 5),
            initial_retry_delay_ms: env_or("INITIAL_RETRY_DELAY_MS", 500),
            priority_fee_micro_lamports: env_or("PRIORITY_FEE_MICRO_LAMPORTS", 0),
        })
    }

    /// Return the Solscan explorer URL for a given transaction signature.
    pub fn explorer_url(&self, signature: &str) -> String {
        match self.cluster.as_str() {
            "mainnet-beta" => format!("https://solscan.io/tx/{signature}"),
            cluster => format!("https://solscan.io/tx/{signature}?cluster={cluster}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crank_phase_names() {
        assert_eq!(parse_phase("").unwrap(), None);
        assert_eq!(parse_phase("none").unwrap(), None);
        assert_eq!(parse_phase("Eligibility").unwrap(), Some(Phase::Eligibility));
        assert_eq!(parse_phase("allow-list").unwrap(), Some(Phase::AllowList));
        assert_eq!(parse_phase(" reserve ").unwrap(), Some(Phase::Reserve));
        assert!(parse_phase("public").is_err());
    }
}
