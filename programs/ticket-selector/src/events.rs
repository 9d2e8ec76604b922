use std::io::Write;

use anchor_lang::prelude::*;
use anchor_lang::Event;

use crate::constants::MAX_LOGGED_EVENT_LEN;
use crate::state::{Phase, SelectorMode};

/// Write `event` as `emit!` does, without a heap buffer.
///
/// Used for per-draw events, which a batch logs up to `MAX_BATCH_SIZE` times.
pub fn log_event<E: Event>(event: &E) -> Result<()> {
    let mut buf = [0u8; MAX_LOGGED_EVENT_LEN];
    let len = encode_event(event, &mut buf)?;
    anchor_lang::solana_program::log::sol_log_data(&[&buf[..len]]);
    Ok(())
}

/// Discriminator followed by the Borsh body. Returns the encoded length.
fn encode_event<E: Event>(event: &E, buf: &mut [u8]) -> Result<usize> {
    let capacity = buf.len();
    let mut cursor = buf;
    cursor.write_all(E::DISCRIMINATOR)?;
    event.serialize(&mut cursor)?;
    Ok(capacity - cursor.len())
}

/// Emitted once when a selector account is created.
#[event]
pub struct SelectorInitialized {
    pub selector: Pubkey,
    pub authority: Pubkey,
    pub oracle: Pubkey,
    pub selector_id: u64,
    pub mode: SelectorMode,
}

/// Emitted when the authority asks the oracle for a seed.
///
/// The oracle answers with `fulfill_random_words(request_id, words)`.
#[event]
pub struct SeedRequested {
    pub selector: Pubkey,
    pub request_id: u64,
    pub request_slot: u64,
}

/// Emitted when the oracle delivers the seed. All draws derive from it.
#[event]
pub struct SeedDelivered {
    pub selector: Pubkey,
    pub request_id: u64,
    pub seed: [u8; 32],
}

/// Emitted once per individual draw, in draw order.
///
/// `position` is the winner's offset in the phase list and `draw_counter` the
/// counter mixed with the seed to produce it, so every winner can be
/// recomputed off-chain.
#[event]
pub struct WinnerSelected {
    pub selector: Pubkey,
    pub phase: Phase,
    pub position: u32,
    pub index: u32,
    pub draw_counter: u64,
}

/// Emitted when the eligibility phase is finalized.
#[event]
pub struct EligibilityFinished {
    pub selector: Pubkey,
    pub winners: u32,
}

/// Emitted by the batch that brings the allow-list to its limit.
#[event]
pub struct AllowListFilled {
    pub selector: Pubkey,
    pub winners: u32,
}

/// Emitted by the batch that exhausts the reserve capacity.
#[event]
pub struct ReserveFilled {
    pub selector: Pubkey,
    pub winners: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_events_match_emit_encoding() {
        let event = WinnerSelected {
            selector: Pubkey::new_unique(),
            phase: Phase::Reserve,
            position: 7,
            index: 4242,
            draw_counter: 19,
        };
        let mut buf = [0u8; MAX_LOGGED_EVENT_LEN];
        let len = encode_event(&event, &mut buf).unwrap();
        assert_eq!(buf[..len], event.data()[..]);
        log_event(&event).unwrap();
    }

    #[test]
    fn oversized_events_fail() {
        let event = SeedDelivered {
            selector: Pubkey::new_unique(),
            request_id: 1,
            seed: [9u8; 32],
        };
        let mut buf = [0u8; 40];
        assert!(encode_event(&event, &mut buf).is_err());
    }
}
