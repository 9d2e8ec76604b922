use anchor_lang::prelude::*;

pub mod config;
pub mod constants;
pub mod draw;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod phase;
pub mod pool;
pub mod randomness;
pub mod results;
pub mod state;

#[cfg(test)]
mod test_utils;

use instructions::*;
use state::{Phase, SelectorMode};

declare_id!("96SY253S5m6sBCGPmP2tQxFpXqZprcXogvszb8TCfGcB");

/// Verifiable winner selection for ticketed sales.
///
/// A selector draws unique winners from index pools that are never
/// materialized: a ticket pool for the eligibility phase and a KYC pool shared
/// by the allow-list and reserve phases. Every draw derives from one oracle
/// seed and a shared counter, so anyone can replay the whole history from the
/// [`events::SeedDelivered`] event and the published configuration.
///
/// ## Lifecycle (`Whitelist` mode)
///
/// 1. **Configure**: ticket count, participants list link and hash.
/// 2. **Seed**: `request_seed`, answered by the oracle with
///    `fulfill_random_words`.
/// 3. **Eligibility**: `select_eligibility_winners` in batches, then
///    `finish_eligibility_selection`.
/// 4. **Allow-list**: KYC count, allow-list limit, KYC list link and hash,
///    then `select_allow_list_winners` until the limit is reached.
/// 5. **Reserve**: `select_reserve_winners` from the KYC entries left over.
///
/// `SingleRound` selectors stop after step 3.
///
/// Settings of a phase lock with its first draw. Winner lists are append-only
/// and live in the account data behind the header, see [`crate::ledger`].
#[program]
pub mod ticket_selector {
    use super::*;

    /// Create a selector PDA owned by the signer.
    pub fn initialize_selector(
        ctx: Context<InitializeSelector>,
        selector_id: u64,
        mode: SelectorMode,
        oracle: Pubkey,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, selector_id, mode, oracle)
    }

    /// Size of the eligibility ticket pool. Locked by the first eligibility draw.
    pub fn set_tickets_count(ctx: Context<ManageSelector>, count: u32) -> Result<()> {
        instructions::configure::update_tickets_count(ctx, count)
    }

    /// Where the participants list is published. Locked by the first eligibility draw.
    pub fn set_participants_list_link(ctx: Context<ManageSelector>, link: String) -> Result<()> {
        instructions::configure::update_participants_list_link(ctx, link)
    }

    /// Digest of the participants list. Locked by the first eligibility draw.
    pub fn set_participants_list_hash(ctx: Context<ManageSelector>, hash: String) -> Result<()> {
        instructions::configure::update_participants_list_hash(ctx, hash)
    }

    /// Size of the KYC pool. Locked by the first allow-list draw.
    pub fn set_kyc_count(ctx: Context<ManageSelector>, count: u32) -> Result<()> {
        instructions::configure::update_kyc_count(ctx, count)
    }

    /// Hard limit of allow-list winners. Locked by the first allow-list draw.
    pub fn set_wl_limit(ctx: Context<ManageSelector>, limit: u32) -> Result<()> {
        instructions::configure::update_wl_limit(ctx, limit)
    }

    /// Where the KYC list is published. Locked by the first allow-list draw.
    pub fn set_kyc_list_link(ctx: Context<ManageSelector>, link: String) -> Result<()> {
        instructions::configure::update_kyc_list_link(ctx, link)
    }

    /// Digest of the KYC list. Locked by the first allow-list draw.
    pub fn set_kyc_list_hash(ctx: Context<ManageSelector>, hash: String) -> Result<()> {
        instructions::configure::update_kyc_list_hash(ctx, hash)
    }

    /// Replace the oracle allowed to deliver the seed.
    ///
    /// Rejected once the seed has been delivered.
    pub fn set_oracle(ctx: Context<ManageSelector>, oracle: Pubkey) -> Result<()> {
        instructions::configure::update_oracle(ctx, oracle)
    }

    /// Issue a seed request and emit [`events::SeedRequested`].
    pub fn request_seed(ctx: Context<ManageSelector>) -> Result<()> {
        instructions::request_seed::handler(ctx)
    }

    /// Oracle callback. The first word becomes the selector's seed.
    pub fn fulfill_random_words(
        ctx: Context<FulfillRandomWords>,
        request_id: u64,
        random_words: Vec<[u8; 32]>,
    ) -> Result<()> {
        instructions::fulfill_random_words::handler(ctx, request_id, random_words)
    }

    /// Draw a batch of eligibility winners from the ticket pool.
    pub fn select_eligibility_winners(ctx: Context<SelectWinners>, batch_size: u32) -> Result<()> {
        instructions::select_winners::handler(ctx, Phase::Eligibility, batch_size)
    }

    /// Close the eligibility phase. Requires at least one winner.
    pub fn finish_eligibility_selection(ctx: Context<ManageSelector>) -> Result<()> {
        instructions::finish_eligibility::handler(ctx)
    }

    /// Draw a batch of allow-list winners from the KYC pool.
    pub fn select_allow_list_winners(ctx: Context<SelectWinners>, batch_size: u32) -> Result<()> {
        instructions::select_winners::handler(ctx, Phase::AllowList, batch_size)
    }

    /// Draw a batch of reserve winners from what the allow-list left in the
    /// KYC pool. Requires a full allow-list.
    pub fn select_reserve_winners(ctx: Context<SelectWinners>, batch_size: u32) -> Result<()> {
        instructions::select_winners::handler(ctx, Phase::Reserve, batch_size)
    }

    /// Whole winner list of a phase. Lists over 255 entries must be paged.
    pub fn get_winners(ctx: Context<ReadWinners>, phase: Phase) -> Result<Vec<u32>> {
        instructions::read_winners::get_all(ctx, phase)
    }

    /// Winners `start..=end` of a phase.
    pub fn get_winners_in_range(
        ctx: Context<ReadWinners>,
        phase: Phase,
        start: u32,
        end: u32,
    ) -> Result<Vec<u32>> {
        instructions::read_winners::get_range(ctx, phase, start, end)
    }
}
