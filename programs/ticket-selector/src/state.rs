use anchor_lang::prelude::*;

use crate::constants::{DRAW_GROWTH, MAX_BATCH_SIZE, MAX_HASH_LEN, MAX_LINK_LEN, SWAP_LEN, WINNER_LEN};

/// Which lifecycle a selector runs.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub enum SelectorMode {
    /// Eligibility draw, then allow-list draw up to a hard limit, then reserve.
    #[default]
    Whitelist,
    /// A single winner list (contest or public sale draws).
    SingleRound,
}

/// Draw stage. Each phase owns one winner list.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum Phase {
    /// Initial draw over the full ticket pool ("KYC" phase).
    Eligibility,
    /// Final draw over the KYC-confirmed pool, bounded by `wl_limit`.
    AllowList,
    /// Alternates drawn from the KYC pool left after the allow-list.
    Reserve,
}

/// Derived, never stored: where a phase stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Nothing drawn; configuration is still mutable.
    Configuring,
    /// At least one draw happened; configuration is locked.
    Selecting,
    /// No further draws accepted.
    Finished,
}

/// Draw parameters and published list metadata.
///
/// Eligibility fields are locked by the first eligibility draw, allow-list
/// fields by the first allow-list draw.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct SelectorConfig {
    /// Size of the eligibility ticket pool.
    pub tickets_count: u32,
    /// Where the ordered participants list is published.
    #[max_len(MAX_LINK_LEN)]
    pub participants_list_link: String,
    /// Digest of the participants list.
    #[max_len(MAX_HASH_LEN)]
    pub participants_list_hash: String,
    /// Size of the KYC-confirmed pool the allow-list and reserve draw from.
    pub kyc_count: u32,
    /// Hard limit of allow-list winners.
    pub wl_limit: u32,
    /// Where the ordered KYC list is published.
    #[max_len(MAX_LINK_LEN)]
    pub kyc_list_link: String,
    /// Digest of the KYC list.
    #[max_len(MAX_HASH_LEN)]
    pub kyc_list_hash: String,
}

/// One-way phase markers. Set exactly once, never cleared.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct PhaseFlags {
    pub eligibility_finished: bool,
    pub allow_list_reached_limit: bool,
}

/// Randomness port state.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct SeedState {
    /// Id of the latest request; `0` before the first request.
    pub request_id: u64,
    /// A request was issued.
    pub requested: bool,
    /// The oracle delivered `value`; it is immutable from now on.
    pub ready: bool,
    /// The delivered 256-bit seed.
    pub value: [u8; 32],
    /// Number of draws consumed so far, across all phases.
    pub draw_counter: u64,
}

/// Header part of a [`crate::pool::VirtualPool`]; its swap entries live in
/// the ledger.
///
/// `size == 0` means the pool was not opened yet; it is opened by the first
/// draw with the size configured at that moment.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct PoolState {
    pub size: u32,
    pub drawn: u32,
    /// Entries of this pool in the ledger swap table.
    pub swap_count: u32,
}

/// Winner list lengths, one per phase.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct WinnerCounts {
    pub eligibility: u32,
    pub allow_list: u32,
    pub reserve: u32,
}

impl WinnerCounts {
    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Eligibility => self.eligibility,
            Phase::AllowList => self.allow_list,
            Phase::Reserve => self.reserve,
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut u32 {
        match phase {
            Phase::Eligibility => &mut self.eligibility,
            Phase::AllowList => &mut self.allow_list,
            Phase::Reserve => &mut self.reserve,
        }
    }

    pub fn total(&self) -> usize {
        self.eligibility as usize + self.allow_list as usize + self.reserve as usize
    }
}

/// A winner selection instance: configuration, randomness and bookkeeping.
///
/// Seeds: `["selector", authority, selector_id.to_le_bytes()]`
///
/// The Borsh header below has a fixed maximum size. Winner lists and the
/// active pool's swap table follow it at [`LEDGER_OFFSET`] (see
/// [`crate::ledger`]). Every draw batch grows the account by at most
/// `batch * DRAW_GROWTH` bytes via `realloc`.
#[account]
#[derive(InitSpace, Default)]
pub struct Selector {
    /// Key allowed to configure, request the seed and draw.
    pub authority: Pubkey,
    /// Key allowed to deliver the seed (oracle or coordinator config PDA).
    pub oracle: Pubkey,
    /// Caller-chosen id, part of the PDA seeds.
    pub selector_id: u64,
    pub mode: SelectorMode,
    pub config: SelectorConfig,
    pub flags: PhaseFlags,
    pub seed: SeedState,
    /// Pool of ticket indices `[0, tickets_count)`.
    pub ticket_pool: PoolState,
    /// Pool of KYC list indices `[0, kyc_count)`, shared by allow-list and reserve.
    pub kyc_pool: PoolState,
    pub winner_counts: WinnerCounts,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
}

/// Start of the ledger in the account data: discriminator plus the largest
/// possible header.
pub const LEDGER_OFFSET: usize = 8 + Selector::INIT_SPACE;

impl Selector {
    /// Swap entries currently stored in the ledger. At most one pool has any.
    pub fn swap_count(&self) -> usize {
        self.ticket_pool.swap_count as usize + self.kyc_pool.swap_count as usize
    }

    /// Ledger bytes in use.
    pub fn ledger_len(&self) -> usize {
        self.winner_counts.total() * WINNER_LEN + self.swap_count() * SWAP_LEN
    }

    /// Ledger size that is guaranteed to hold the state after drawing
    /// `batch_size` more winners. Oversized batches are clamped; the draw
    /// rejects them anyway.
    pub fn ledger_len_after_batch(&self, batch_size: u32) -> usize {
        self.ledger_len() + batch_size.min(MAX_BATCH_SIZE) as usize * DRAW_GROWTH
    }

    /// Account size in use, discriminator included.
    pub fn space(&self) -> usize {
        LEDGER_OFFSET + self.ledger_len()
    }

    /// Account size for the `realloc` ahead of a `batch_size` draw.
    pub fn space_after_batch(&self, batch_size: u32) -> usize {
        LEDGER_OFFSET + self.ledger_len_after_batch(batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_has_a_fixed_size() {
        // Off-chain decoders locate the ledger with this constant.
        assert_eq!(Selector::INIT_SPACE, 958);
        assert_eq!(LEDGER_OFFSET, 966);

        let mut selector = Selector::default();
        selector.config.participants_list_link = "x".repeat(MAX_LINK_LEN);
        selector.config.participants_list_hash = "y".repeat(MAX_HASH_LEN);
        selector.config.kyc_list_link = "x".repeat(MAX_LINK_LEN);
        selector.config.kyc_list_hash = "y".repeat(MAX_HASH_LEN);
        let mut data = Vec::new();
        selector.try_serialize(&mut data).unwrap();
        assert_eq!(data.len(), LEDGER_OFFSET);
    }

    #[test]
    fn space_tracks_ledger_content() {
        let mut selector = Selector::default();
        assert_eq!(selector.space(), LEDGER_OFFSET);

        selector.winner_counts.eligibility = 3;
        selector.ticket_pool.swap_count = 1;
        assert_eq!(selector.ledger_len(), 3 * 4 + 8);
        assert_eq!(selector.space(), LEDGER_OFFSET + 20);
    }

    #[test]
    fn growth_is_clamped_to_max_batch() {
        let selector = Selector::default();
        assert_eq!(
            selector.space_after_batch(u32::MAX),
            selector.space_after_batch(MAX_BATCH_SIZE)
        );
        assert_eq!(
            selector.space_after_batch(10),
            selector.space() + 10 * DRAW_GROWTH
        );
    }
}
