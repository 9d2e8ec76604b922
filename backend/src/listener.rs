//! On-chain event listener for the ticket selector program.
//!
//! Subscribes to program log events via WebSocket, parses the selector's
//! `SeedDelivered` and `WinnerSelected` Anchor events in real-time, and
//! auto-reconnects on disconnection. Events of other selectors are dropped.

use base64::Engine;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::snapshot::Phase;

/// Parsed `SeedDelivered` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDeliveredEvent {
    pub selector: Pubkey,
    pub request_id: u64,
    pub seed: [u8; 32],
}

/// Parsed `WinnerSelected` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerSelectedEvent {
    pub selector: Pubkey,
    pub phase: Phase,
    pub position: u32,
    pub index: u32,
    pub draw_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    SeedDelivered(SeedDeliveredEvent),
    WinnerSelected(WinnerSelectedEvent),
}

impl SelectorEvent {
    pub fn selector(&self) -> &Pubkey {
        match self {
            SelectorEvent::SeedDelivered(event) => &event.selector,
            SelectorEvent::WinnerSelected(event) => &event.selector,
        }
    }
}

/// Compute the Anchor event discriminator: `sha256("event:<Name>")[..8]`.
fn event_discriminator(event_name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(format!("event:{event_name}"));
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Delay before reconnecting to the WebSocket after a disconnect or error.
const WS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Event discriminators, computed once per listener.
struct Discriminators {
    seed_delivered: [u8; 8],
    winner_selected: [u8; 8],
}

impl Discriminators {
    fn new() -> Self {
        Self {
            seed_delivered: event_discriminator("SeedDelivered"),
            winner_selected: event_discriminator("WinnerSelected"),
        }
    }
}

/// Subscribe to program logs and forward the configured selector's events.
/// Automatically reconnects on disconnection.
pub async fn listen_for_events(config: AppConfig, tx: mpsc::Sender<SelectorEvent>) {
    let discriminators = Discriminators::new();

    loop {
        info!(url = %config.ws_url, "Connecting to WebSocket");

        match PubsubClient::new(&config.ws_url).await {
            Ok(pubsub) => {
                info!("WebSocket connected");

                let filter =
                    RpcTransactionLogsFilter::Mentions(vec![config.selector.to_string()]);
                let logs_config = RpcTransactionLogsConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                };

                match pubsub.logs_subscribe(filter, logs_config).await {
                    Ok((mut stream, _unsub)) => {
                        use futures_util::StreamExt;
                        while let Some(log_result) = stream.next().await {
                            if log_result.value.err.is_some() {
                                continue;
                            }
                            let events = parse_log_lines(
                                &log_result.value.logs,
                                &discriminators,
                                &config.selector,
                            );
                            for event in events {
                                if tx.send(event).await.is_err() {
                                    error!("Channel closed, stopping listener");
                                    return;
                                }
                            }
                        }
                        warn!("WebSocket stream ended, reconnecting");
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to subscribe to logs");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to WebSocket");
            }
        }

        info!(delay = ?WS_RECONNECT_DELAY, "Reconnecting");
        tokio::time::sleep(WS_RECONNECT_DELAY).await;
    }
}

/// Decode the `Program data:` entries of one transaction's logs.
///
/// Anchor emits events as base64-encoded `Program data:` log entries. Entries
/// with an unknown discriminator or for another selector are skipped.
fn parse_log_lines(
    logs: &[String],
    discriminators: &Discriminators,
    selector: &Pubkey,
) -> Vec<SelectorEvent> {
    let mut events = Vec::new();
    for log_line in logs {
        let Some(data_str) = log_line.strip_prefix("Program data: ") else {
            continue;
        };

        let decoded = match base64::engine::general_purpose::STANDARD.decode(data_str.trim()) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "Failed to decode base64 log data");
                continue;
            }
        };
        if decoded.len() < 8 {
            continue;
        }

        let (disc, body) = decoded.split_at(8);
        let event = if disc == discriminators.winner_selected {
            parse_winner_selected(body).map(SelectorEvent::WinnerSelected)
        } else if disc == discriminators.seed_delivered {
            parse_seed_delivered(body).map(SelectorEvent::SeedDelivered)
        } else {
            continue;
        };

        match event {
            Some(event) if event.selector() == selector => events.push(event),
            Some(_) => {}
            None => warn!("Failed to parse selector event payload"),
        }
    }
    events
}

/// Layout: `selector (32) + request_id (8) + seed (32) = 72 bytes`.
fn parse_seed_delivered(data: &[u8]) -> Option<SeedDeliveredEvent> {
    if data.len() < 72 {
        return None;
    }

    let selector = Pubkey::try_from(&data[0..32]).ok()?;
    let request_id = u64::from_le_bytes(data[32..40].try_into().ok()?);
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&data[40..72]);

    Some(SeedDeliveredEvent {
        selector,
        request_id,
        seed,
    })
}

/// Layout: `selector (32) + phase (1) + position (4) + index (4) +
/// draw_counter (8) = 49 bytes`.
fn parse_winner_selected(data: &[u8]) -> Option<WinnerSelectedEvent> {
    if data.len() < 49 {
        return None;
    }

    let selector = Pubkey::try_from(&data[0..32]).ok()?;
    let phase = Phase::from_u8(data[32])?;
    let position = u32::from_le_bytes(data[33..37].try_into().ok()?);
    let index = u32::from_le_bytes(data[37..41].try_into().ok()?);
    let draw_counter = u64::from_le_bytes(data[41..49].try_into().ok()?);

    Some(WinnerSelectedEvent {
        selector,
        phase,
        position,
        index,
        draw_counter,
    })
}
