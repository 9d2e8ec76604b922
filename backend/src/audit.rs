//! Independent replay of the selector's draws.
//!
//! Recomputes every winner from the delivered seed with its own sampling
//! code and compares the result with what the program stored or emitted:
//!
//! ```text
//! word(seed, counter) = SHA256(seed || counter.to_le_bytes())
//! r                   = uint256_be(word) mod remaining
//! ```
//!
//! Eligibility draws come from `[0, tickets_count)`, allow-list and reserve
//! draws from one shared `[0, kyc_count)` pool, and the counter runs across
//! all three phases in that order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::crank::fetch_snapshot;
use crate::listener::{SelectorEvent, WinnerSelectedEvent};
use crate::metrics::Metrics;
use crate::snapshot::{Phase, SelectorSnapshot};

fn word(seed: &[u8; 32], counter: u64) -> [u8; 32] {
    let hash = Sha256::new()
        .chain_update(seed)
        .chain_update(counter.to_le_bytes())
        .finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// `uint256_be(word) mod bound`, reduced 32 bits at a time.
fn reduce(word: &[u8; 32], bound: u32) -> u32 {
    let bound = u64::from(bound);
    word.chunks_exact(4).fold(0u64, |rem, chunk| {
        let limb = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        ((rem << 32) | u64::from(limb)) % bound
    }) as u32
}

/// Sampling without replacement over `[0, size)`.
#[derive(Debug, Clone)]
struct ReplayPool {
    size: u32,
    drawn: u32,
    moved: HashMap<u32, u32>,
}

impl ReplayPool {
    fn new(size: u32) -> Self {
        Self {
            size,
            drawn: 0,
            moved: HashMap::new(),
        }
    }

    fn next(&mut self, seed: &[u8; 32], counter: u64) -> Option<u32> {
        let remaining = self.size.checked_sub(self.drawn).filter(|r| *r > 0)?;
        let pick = reduce(&word(seed, counter), remaining);
        let last = remaining - 1;

        let chosen = *self.moved.get(&pick).unwrap_or(&pick);
        let tail = self.moved.remove(&last).unwrap_or(last);
        if pick != last {
            if tail == pick {
                self.moved.remove(&pick);
            } else {
                self.moved.insert(pick, tail);
            }
        }
        self.drawn += 1;
        Some(chosen)
    }
}

/// A stored or emitted winner that does not match the replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub phase: Phase,
    pub position: u32,
    pub expected: Option<u32>,
    pub actual: u32,
}

/// Result of checking a live `WinnerSelected` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Verified,
    /// The position was already covered by an earlier check.
    AlreadySeen,
    /// The event is ahead of the auditor's view; rebuild from a fresh snapshot.
    NeedsResync,
    Mismatch(Mismatch),
}

/// Replay state mirroring one selector.
#[derive(Debug, Clone)]
pub struct Auditor {
    seed: [u8; 32],
    counter: u64,
    ticket_pool: ReplayPool,
    kyc_pool: Option<ReplayPool>,
    positions: HashMap<Phase, u32>,
}

impl Auditor {
    /// Replay the whole stored history of `snapshot`.
    ///
    /// Returns `None` while the seed has not been delivered.
    pub fn from_snapshot(snapshot: &SelectorSnapshot) -> Option<(Self, Vec<Mismatch>)> {
        if !snapshot.seed_ready {
            return None;
        }

        let mut auditor = Self {
            seed: snapshot.seed,
            counter: 0,
            ticket_pool: ReplayPool::new(snapshot.tickets_count),
            kyc_pool: None,
            positions: HashMap::new(),
        };
        if !snapshot.allow_list_winners.is_empty() {
            auditor.kyc_pool = Some(ReplayPool::new(snapshot.kyc_count));
        }

        let mut mismatches = Vec::new();
        for phase in Phase::ALL {
            for (position, actual) in snapshot.winners(phase).iter().enumerate() {
                let expected = auditor.advance(phase);
                if expected != Some(*actual) {
                    mismatches.push(Mismatch {
                        phase,
                        position: position as u32,
                        expected,
                        actual: *actual,
                    });
                }
            }
        }
        Some((auditor, mismatches))
    }

    /// Counter value the next draw will use.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn position(&self, phase: Phase) -> u32 {
        self.positions.get(&phase).copied().unwrap_or(0)
    }

    fn advance(&mut self, phase: Phase) -> Option<u32> {
        let pool = match phase {
            Phase::Eligibility => &mut self.ticket_pool,
            Phase::AllowList | Phase::Reserve => self.kyc_pool.as_mut()?,
        };
        let index = pool.next(&self.seed, self.counter);
        self.counter += 1;
        *self.positions.entry(phase).or_default() += 1;
        index
    }

    /// Check one live event against the replay.
    pub fn check(&mut self, event: &WinnerSelectedEvent) -> AuditOutcome {
        let next = self.position(event.phase);
        if event.position < next {
            return AuditOutcome::AlreadySeen;
        }
        if event.position > next
            || event.draw_counter != self.counter
            || (event.phase != Phase::Eligibility && self.kyc_pool.is_none())
        {
            return AuditOutcome::NeedsResync;
        }

        let expected = self.advance(event.phase);
        if expected == Some(event.index) {
            AuditOutcome::Verified
        } else {
            AuditOutcome::Mismatch(Mismatch {
                phase: event.phase,
                position: event.position,
                expected,
                actual: event.index,
            })
        }
    }
}

/// Rebuild the auditor from the current account and log every mismatch of
/// the stored history.
async fn rebuild(rpc_client: &RpcClient, config: &AppConfig, metrics: &Metrics) -> Option<Auditor> {
    let snapshot = match fetch_snapshot(rpc_client, &config.selector).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to read selector for audit");
            return None;
        }
    };
    let Some((auditor, mismatches)) = Auditor::from_snapshot(&snapshot) else {
        info!("Seed not delivered yet, nothing to audit");
        return None;
    };

    let total: u64 = Phase::ALL
        .iter()
        .map(|phase| snapshot.winners(*phase).len() as u64)
        .sum();
    for mismatch in &mismatches {
        error!(
            phase = ?mismatch.phase,
            position = mismatch.position,
            expected = ?mismatch.expected,
            actual = mismatch.actual,
            "Stored winner does not match replay"
        );
    }
    metrics.reset_audit(total - mismatches.len() as u64, mismatches.len() as u64);
    info!(
        winners = total,
        mismatches = mismatches.len(),
        draw_counter = auditor.counter(),
        "Replayed stored history"
    );
    Some(auditor)
}

/// Verify the stored history on startup, then every live event.
pub async fn run_auditor(
    config: AppConfig,
    mut rx: mpsc::Receiver<SelectorEvent>,
    metrics: Arc<Metrics>,
) {
    let rpc_client = RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    );
    let mut auditor = rebuild(&rpc_client, &config, &metrics).await;

    while let Some(event) = rx.recv().await {
        let event = match event {
            SelectorEvent::SeedDelivered(seed) => {
                info!(request_id = seed.request_id, "Seed delivered");
                auditor = rebuild(&rpc_client, &config, &metrics).await;
                continue;
            }
            SelectorEvent::WinnerSelected(event) => event,
        };
        metrics.record_event();

        let outcome = match auditor.as_mut() {
            Some(current) => current.check(&event),
            None => AuditOutcome::NeedsResync,
        };
        match outcome {
            AuditOutcome::Verified => metrics.record_verified(1),
            AuditOutcome::AlreadySeen => {}
            AuditOutcome::NeedsResync => {
                metrics.record_resync();
                warn!(
                    phase = ?event.phase,
                    position = event.position,
                    "Event ahead of replay, resyncing"
                );
                auditor = rebuild(&rpc_client, &config, &metrics).await;
            }
            AuditOutcome::Mismatch(mismatch) => {
                metrics.record_mismatches(1);
                error!(
                    phase = ?mismatch.phase,
                    position = mismatch.position,
                    expected = ?mismatch.expected,
                    actual = mismatch.actual,
                    "Emitted winner does not match replay"
                );
            }
        }
    }

    info!("Event channel closed, stopping auditor");
}

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;
    use crate::snapshot::tests::sample;

    /// `1500100900` as a big-endian 256-bit seed.
    fn test_seed() -> [u8; 32] {
        let mut seed = [0u8; 32];
        seed[28..].copy_from_slice(&1_500_100_900u32.to_be_bytes());
        seed
    }

    fn draw_all(size: u32, seed: &[u8; 32], count: u64) -> Vec<u32> {
        let mut pool = ReplayPool::new(size);
        (0..count).map(|c| pool.next(seed, c).unwrap()).collect()
    }

    #[test]
    fn known_answer_vectors() {
        let seed = test_seed();
        assert_eq!(
            word(&seed, 0)[..8],
            [0xb4, 0x1b, 0xa0, 0x71, 0x3d, 0x3f, 0x1e, 0xe4]
        );
        assert_eq!(reduce(&word(&seed, 0), 6000), 3390);
        assert_eq!(reduce(&word(&seed, 1), 6000), 4082);
        assert_eq!(reduce(&word(&seed, 2), 6000), 702);

        assert_eq!(
            draw_all(6000, &seed, 8),
            vec![3390, 1461, 4038, 2010, 3389, 221, 3425, 2333]
        );
        assert_eq!(draw_all(10, &seed, 10), vec![0, 5, 6, 4, 8, 1, 3, 7, 9, 2]);
        assert_eq!(draw_all(5, &[7u8; 32], 5), vec![2, 0, 1, 4, 3]);
    }

    #[test]
    fn exhausted_pool_yields_nothing() {
        let mut pool = ReplayPool::new(1);
        assert_eq!(pool.next(&test_seed(), 0), Some(0));
        assert_eq!(pool.next(&test_seed(), 1), None);
        assert_eq!(ReplayPool::new(0).next(&test_seed(), 0), None);
    }

    fn seeded_snapshot() -> SelectorSnapshot {
        let mut snapshot = sample();
        snapshot.seed = test_seed();
        snapshot
    }

    #[test]
    fn stored_history_verifies() {
        let mut snapshot = seeded_snapshot();
        snapshot.eligibility_winners = vec![3390, 1461, 4038, 2010, 3389];

        let (auditor, mismatches) = Auditor::from_snapshot(&snapshot).unwrap();
        assert!(mismatches.is_empty());
        assert_eq!(auditor.counter(), 5);
        assert_eq!(auditor.position(Phase::Eligibility), 5);
    }

    #[test]
    fn tampered_history_is_reported() {
        let mut snapshot = seeded_snapshot();
        snapshot.eligibility_winners = vec![3390, 1461, 17];

        let (_, mismatches) = Auditor::from_snapshot(&snapshot).unwrap();
        assert_eq!(
            mismatches,
            vec![Mismatch {
                phase: Phase::Eligibility,
                position: 2,
                expected: Some(4038),
                actual: 17,
            }]
        );
    }

    #[test]
    fn unseeded_selector_is_not_audited() {
        let mut snapshot = seeded_snapshot();
        snapshot.seed_ready = false;
        assert!(Auditor::from_snapshot(&snapshot).is_none());
    }

    #[test]
    fn live_events_follow_the_replay() {
        let mut snapshot = seeded_snapshot();
        snapshot.eligibility_winners = vec![3390];
        let (mut auditor, _) = Auditor::from_snapshot(&snapshot).unwrap();

        let event = |position, index, draw_counter| WinnerSelectedEvent {
            selector: Pubkey::new_from_array([9; 32]),
            phase: Phase::Eligibility,
            position,
            index,
            draw_counter,
        };

        assert_eq!(auditor.check(&event(0, 3390, 0)), AuditOutcome::AlreadySeen);
        assert_eq!(auditor.check(&event(1, 1461, 1)), AuditOutcome::Verified);
        assert_eq!(auditor.check(&event(3, 2010, 3)), AuditOutcome::NeedsResync);
        assert_eq!(
            auditor.check(&event(2, 9, 2)),
            AuditOutcome::Mismatch(Mismatch {
                phase: Phase::Eligibility,
                position: 2,
                expected: Some(4038),
                actual: 9,
            })
        );
    }

    #[test]
    fn kyc_pool_opens_with_the_first_allow_list_draw() {
        let mut snapshot = seeded_snapshot();
        snapshot.eligibility_winners = vec![3390];
        let (mut auditor, _) = Auditor::from_snapshot(&snapshot).unwrap();

        let allow_list = WinnerSelectedEvent {
            selector: Pubkey::new_from_array([9; 32]),
            phase: Phase::AllowList,
            position: 0,
            index: 0,
            draw_counter: 1,
        };
        assert_eq!(auditor.check(&allow_list), AuditOutcome::NeedsResync);
    }
}
