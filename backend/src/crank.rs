//! Batch crank: drives one phase of a selector to its target, one bounded
//! draw batch per transaction.
//!
//! Each iteration re-reads the selector account, plans the next step from
//! the snapshot and submits at most one transaction:
//! 1. (Optional) A `set_compute_unit_price` instruction for priority fees.
//! 2. The phase's `select_*_winners(batch_size)` instruction, or
//!    `finish_eligibility_selection` once the eligibility target is reached.
//!
//! Batches are all-or-nothing on-chain, so a failed or dropped transaction is
//! simply re-planned from the next snapshot.

use anyhow::{Context, Result};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::snapshot::{Phase, SelectorSnapshot};

/// Anchor custom error codes of the selector program (`6000 + variant`).
const SELECTOR_ERROR_FIRST: u32 = 6000;
const SELECTOR_ERROR_LAST: u32 = 6021;

const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");
const COMPUTE_BUDGET_ID: Pubkey =
    Pubkey::from_str_const("ComputeBudget111111111111111111111111111111");

/// What the crank should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrankStep {
    Draw { phase: Phase, batch_size: u32 },
    FinishEligibility,
    /// Not drawable yet; poll again later.
    Wait(&'static str),
    /// Target reached or phase closed; nothing left to do.
    Done(&'static str),
}

/// Progress reported by `/status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrankStatus {
    pub phase: Option<Phase>,
    pub drawn: u32,
    pub target: u32,
    pub state: String,
    pub last_signature: Option<String>,
}

/// Compute the Anchor instruction discriminator: `sha256("global:<name>")[..8]`.
fn instruction_discriminator(name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(format!("global:{name}"));
    let hash = hasher.finalize();
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// Winners the phase should end up with: the target, bounded by the cap.
pub fn phase_goal(snapshot: &SelectorSnapshot, phase: Phase, target: Option<u32>) -> u32 {
    let cap = snapshot.winner_cap(phase);
    target.map_or(cap, |target| target.min(cap))
}

/// Decide the next step for `phase` from the current account state.
pub fn plan_next_batch(
    snapshot: &SelectorSnapshot,
    phase: Phase,
    target: Option<u32>,
    batch_size: u32,
    finish_eligibility: bool,
) -> CrankStep {
    if !snapshot.supports(phase) {
        return CrankStep::Done("phase not supported by this selector");
    }
    if !snapshot.seed_ready {
        return CrankStep::Wait("seed not delivered");
    }

    match phase {
        Phase::Eligibility => {
            if snapshot.eligibility_finished {
                return CrankStep::Done("eligibility finished");
            }
        }
        Phase::AllowList => {
            if !snapshot.eligibility_finished {
                return CrankStep::Wait("eligibility not finished");
            }
            if !snapshot.allow_list_configured() {
                return CrankStep::Wait("allow-list not configured");
            }
            if snapshot.wl_limit > snapshot.kyc_count {
                return CrankStep::Done("allow-list limit exceeds KYC count");
            }
        }
        Phase::Reserve => {
            if !snapshot.allow_list_reached_limit
                || snapshot.drawn(Phase::AllowList) != snapshot.wl_limit
            {
                return CrankStep::Wait("allow-list not full");
            }
        }
    }

    let goal = phase_goal(snapshot, phase, target);
    let drawn = snapshot.drawn(phase);
    if drawn >= goal {
        if phase == Phase::Eligibility && finish_eligibility && drawn > 0 {
            return CrankStep::FinishEligibility;
        }
        return CrankStep::Done("target reached");
    }

    CrankStep::Draw {
        phase,
        batch_size: batch_size.min(goal - drawn),
    }
}

/// Check if an error string carries a selector error, which no retry fixes.
fn is_non_retryable(err_str: &str) -> bool {
    (SELECTOR_ERROR_FIRST..=SELECTOR_ERROR_LAST)
        .any(|code| err_str.contains(&format!("custom program error: 0x{code:x}")))
        || err_str.contains("AccountNotInitialized")
        || err_str.contains("ConstraintSeeds")
}

/// Fetch and decode the selector account.
pub async fn fetch_snapshot(rpc_client: &RpcClient, selector: &Pubkey) -> Result<SelectorSnapshot> {
    let data = rpc_client
        .get_account_data(selector)
        .await
        .with_context(|| format!("failed to fetch selector account {selector}"))?;
    SelectorSnapshot::decode(&data)
}

/// Main crank loop. Returns once the configured phase is done.
pub async fn run_crank(
    config: AppConfig,
    phase: Phase,
    metrics: Arc<Metrics>,
    status: Arc<RwLock<CrankStatus>>,
) {
    let rpc_client = RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    );
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    status.write().await.phase = Some(phase);

    loop {
        let snapshot = match fetch_snapshot(&rpc_client, &config.selector).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to read selector");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        let step = plan_next_batch(
            &snapshot,
            phase,
            config.crank_target,
            config.batch_size,
            config.finish_eligibility,
        );
        {
            let mut status = status.write().await;
            status.drawn = snapshot.drawn(phase);
            status.target = phase_goal(&snapshot, phase, config.crank_target);
            status.state = format!("{step:?}");
        }

        let (instruction, winners) = match step {
            CrankStep::Done(reason) => {
                info!(?phase, drawn = snapshot.drawn(phase), reason, "Crank finished");
                return;
            }
            CrankStep::Wait(reason) => {
                info!(?phase, reason, "Waiting");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
            CrankStep::Draw { phase, batch_size } => {
                info!(
                    ?phase,
                    batch_size,
                    drawn = snapshot.drawn(phase),
                    draw_counter = snapshot.draw_counter,
                    "Submitting draw batch"
                );
                (
                    build_select_instruction(
                        &config.program_id,
                        &config.authority_keypair.pubkey(),
                        &config.selector,
                        phase,
                        batch_size,
                    ),
                    batch_size,
                )
            }
            CrankStep::FinishEligibility => {
                info!(
                    winners = snapshot.drawn(Phase::Eligibility),
                    "Finishing eligibility selection"
                );
                (
                    build_finish_instruction(
                        &config.program_id,
                        &config.authority_keypair.pubkey(),
                        &config.selector,
                    ),
                    0,
                )
            }
        };

        let start = Instant::now();
        match submit(&rpc_client, &config, instruction).await {
            Ok(sig) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                if winners > 0 {
                    metrics.record_batch(winners, latency_ms);
                }
                info!(
                    signature = %sig,
                    winners,
                    latency_ms,
                    explorer = %config.explorer_url(&sig),
                    "Transaction confirmed"
                );
                status.write().await.last_signature = Some(sig);
            }
            Err(e) => {
                let err_str = format!("{e:#}");
                if is_non_retryable(&err_str) {
                    metrics.record_rejection();
                    warn!(reason = %err_str, "Rejected by the program, re-planning");
                } else {
                    metrics.record_failure();
                    error!(error = %err_str, "Failed to submit");
                }
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// Prepend the priority fee instruction when configured and submit.
#[instrument(skip_all)]
async fn submit(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instruction: Instruction,
) -> Result<String> {
    let mut instructions = Vec::with_capacity(2);
    if config.priority_fee_micro_lamports > 0 {
        instructions.push(build_set_compute_unit_price_instruction(
            config.priority_fee_micro_lamports,
        ));
    }
    instructions.push(instruction);
    send_with_retries(rpc_client, config, &instructions).await
}

/// Send a transaction with exponential backoff on BlockhashNotFound.
async fn send_with_retries(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instructions: &[Instruction],
) -> Result<String> {
    let mut retry_delay = Duration::from_millis(config.initial_retry_delay_ms);

    for attempt in 0..config.max_retries {
        let blockhash = rpc_client
            .get_latest_blockhash()
            .await
            .context("failed to fetch latest blockhash")?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&config.authority_keypair.pubkey()),
            &[config.authority_keypair.as_ref()],
            blockhash,
        );

        match rpc_client.send_and_confirm_transaction(&tx).await {
            Ok(sig) => return Ok(sig.to_string()),
            Err(e) if e.to_string().contains("BlockhashNotFound") && attempt + 1 < config.max_retries => {
                warn!(
                    attempt = attempt + 1,
                    delay = ?retry_delay,
                    "BlockhashNotFound, retrying"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = retry_delay.saturating_mul(2).min(Duration::from_secs(60));
            }
            Err(e) => return Err(e).context("send_and_confirm_transaction failed"),
        }
    }

    anyhow::bail!("max retries ({}) exceeded", config.max_retries)
}

/// Build a `SetComputeUnitPrice` instruction.
fn build_set_compute_unit_price_instruction(micro_lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(3u8);
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    Instruction {
        program_id: COMPUTE_BUDGET_ID,
        accounts: vec![],
        data,
    }
}

/// Build the phase's `select_*_winners(batch_size)` instruction.
fn build_select_instruction(
    program_id: &Pubkey,
    authority: &Pubkey,
    selector: &Pubkey,
    phase: Phase,
    batch_size: u32,
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 4);
    data.extend_from_slice(&instruction_discriminator(phase.select_instruction()));
    data.extend_from_slice(&batch_size.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),                   // authority (signer, realloc payer)
            AccountMeta::new(*selector, false),                   // selector PDA
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false), // system program
        ],
        data,
    }
}

/// Build the `finish_eligibility_selection` instruction.
fn build_finish_instruction(program_id: &Pubkey, authority: &Pubkey, selector: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(*selector, false),
        ],
        data: instruction_discriminator("finish_eligibility_selection").to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::sample;

    fn eligibility_done(mut snapshot: SelectorSnapshot) -> SelectorSnapshot {
        snapshot.eligibility_finished = true;
        snapshot.kyc_count = 350;
        snapshot.wl_limit = 200;
        snapshot.kyc_list_link = "https://docs.example.org/kyc.csv".into();
        snapshot.kyc_list_hash = "c0ffee".into();
        snapshot
    }

    #[test]
    fn batches_shrink_toward_the_target() {
        let snapshot = sample(); // 3 of 6000 drawn
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, Some(500), 100, false),
            CrankStep::Draw {
                phase: Phase::Eligibility,
                batch_size: 100
            }
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, Some(50), 100, false),
            CrankStep::Draw {
                phase: Phase::Eligibility,
                batch_size: 47
            }
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, Some(3), 100, false),
            CrankStep::Done("target reached")
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, Some(3), 100, true),
            CrankStep::FinishEligibility
        );
    }

    #[test]
    fn target_is_bounded_by_the_cap() {
        let mut snapshot = sample();
        snapshot.tickets_count = 10;
        assert_eq!(phase_goal(&snapshot, Phase::Eligibility, Some(500)), 10);
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, None, 100, false),
            CrankStep::Draw {
                phase: Phase::Eligibility,
                batch_size: 7
            }
        );
    }

    #[test]
    fn later_phases_wait_for_their_preconditions() {
        let mut snapshot = sample();
        snapshot.seed_ready = false;
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, None, 100, false),
            CrankStep::Wait("seed not delivered")
        );

        let snapshot = sample();
        assert_eq!(
            plan_next_batch(&snapshot, Phase::AllowList, None, 100, false),
            CrankStep::Wait("eligibility not finished")
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Reserve, None, 100, false),
            CrankStep::Wait("allow-list not full")
        );

        let snapshot = eligibility_done(sample());
        assert_eq!(
            plan_next_batch(&snapshot, Phase::Eligibility, None, 100, true),
            CrankStep::Done("eligibility finished")
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::AllowList, None, 250, false),
            CrankStep::Draw {
                phase: Phase::AllowList,
                batch_size: 200
            }
        );
    }

    #[test]
    fn reserve_runs_after_a_full_allow_list() {
        let mut snapshot = eligibility_done(sample());
        snapshot.allow_list_winners = (0..200).collect();
        snapshot.allow_list_reached_limit = true;
        snapshot.reserve_winners = (200..300).collect();

        assert_eq!(
            plan_next_batch(&snapshot, Phase::Reserve, None, 100, false),
            CrankStep::Draw {
                phase: Phase::Reserve,
                batch_size: 50
            }
        );
        assert_eq!(
            plan_next_batch(&snapshot, Phase::AllowList, None, 100, false),
            CrankStep::Done("target reached")
        );
    }

    #[test]
    fn single_round_selectors_have_no_allow_list() {
        let mut snapshot = sample();
        snapshot.mode = crate::snapshot::SelectorMode::SingleRound;
        assert_eq!(
            plan_next_batch(&snapshot, Phase::AllowList, None, 100, false),
            CrankStep::Done("phase not supported by this selector")
        );
    }

    #[test]
    fn selector_errors_are_not_retried() {
        assert!(is_non_retryable(
            "RPC response error -32002: Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1776"
        ));
        assert!(is_non_retryable("custom program error: 0x1784"));
        assert!(is_non_retryable("custom program error: 0x1785"));
        assert!(!is_non_retryable("custom program error: 0x1786"));
        assert!(!is_non_retryable("BlockhashNotFound"));
    }

    #[test]
    fn select_instruction_layout() {
        let program = Pubkey::new_from_array([1; 32]);
        let authority = Pubkey::new_from_array([2; 32]);
        let selector = Pubkey::new_from_array([3; 32]);
        let ix = build_select_instruction(&program, &authority, &selector, Phase::Reserve, 77);

        assert_eq!(ix.data[..8], instruction_discriminator("select_reserve_winners"));
        assert_eq!(ix.data[8..], 77u32.to_le_bytes());
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, selector);
        assert_eq!(ix.accounts[2].pubkey, SYSTEM_PROGRAM_ID);
    }
}
