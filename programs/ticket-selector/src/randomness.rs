//! Randomness port and per-draw value derivation.
//!
//! The oracle delivers a single 256-bit seed. Every draw consumes one value
//! derived from it:
//!
//! ```text
//! word(seed, counter) = SHA256(seed || counter.to_le_bytes())
//! r                   = uint256_be(word) mod remaining
//! ```
//!
//! The counter is shared by all phases, so the whole draw history can be
//! replayed from the seed alone.

use anchor_lang::prelude::*;
use sha2::{Digest, Sha256};

use crate::errors::SelectorError;
use crate::state::SeedState;

/// Derive the 32-byte random word for draw number `counter`.
pub fn derive_word(seed: &[u8; 32], counter: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(counter.to_le_bytes());
    let hash = hasher.finalize();
    let mut word = [0u8; 32];
    word.copy_from_slice(&hash);
    word
}

/// Reduce a word, read as a big-endian 256-bit integer, modulo `bound`.
///
/// Computes the exact remainder of the full 256-bit value so results match
/// any big-integer implementation. `bound` must be non-zero.
pub fn uniform_below(word: &[u8; 32], bound: u32) -> u32 {
    debug_assert!(bound > 0);
    let bound = bound as u64;
    let rem = word
        .iter()
        .fold(0u64, |acc, byte| ((acc << 8) | *byte as u64) % bound);
    rem as u32
}

impl SeedState {
    /// Issue a seed request and return its id.
    ///
    /// Re-requesting while the previous request is still pending supersedes
    /// it; a late answer to the old id is rejected.
    pub fn request(&mut self) -> Result<u64> {
        require!(!self.ready, SelectorError::SeedAlreadyDelivered);
        self.request_id = self
            .request_id
            .checked_add(1)
            .ok_or(SelectorError::CounterOverflow)?;
        self.requested = true;
        Ok(self.request_id)
    }

    /// Accept the oracle's answer for `request_id`.
    pub fn deliver(&mut self, request_id: u64, value: [u8; 32]) -> Result<()> {
        require!(!self.ready, SelectorError::SeedAlreadyDelivered);
        require!(self.requested, SelectorError::SeedNotRequested);
        require!(
            request_id == self.request_id,
            SelectorError::UnknownSeedRequest
        );
        self.value = value;
        self.ready = true;
        Ok(())
    }

    /// The delivered seed, or `SeedNotReady`.
    pub fn ready_value(&self) -> Result<[u8; 32]> {
        require!(self.ready, SelectorError::SeedNotReady);
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_selector_error, TEST_SEED};

    #[test]
    fn known_answer_words() {
        // SHA256(seed || 0u64 LE) for the 1500100900 test seed.
        let word = derive_word(&TEST_SEED, 0);
        assert_eq!(
            word[..8],
            [0xb4, 0x1b, 0xa0, 0x71, 0x3d, 0x3f, 0x1e, 0xe4]
        );
        assert_eq!(uniform_below(&word, 6000), 3390);
        assert_eq!(uniform_below(&derive_word(&TEST_SEED, 1), 6000), 4082);
        assert_eq!(uniform_below(&derive_word(&TEST_SEED, 2), 6000), 702);
    }

    #[test]
    fn words_differ_per_counter() {
        assert_ne!(derive_word(&TEST_SEED, 0), derive_word(&TEST_SEED, 1));
        assert_eq!(derive_word(&TEST_SEED, 7), derive_word(&TEST_SEED, 7));
    }

    #[test]
    fn uniform_below_edges() {
        assert_eq!(uniform_below(&[0xFF; 32], 1), 0);
        assert_eq!(uniform_below(&[0u8; 32], 17), 0);
        let mut small = [0u8; 32];
        small[31] = 41;
        assert_eq!(uniform_below(&small, 10), 1);
        assert!(uniform_below(&[0xFF; 32], u32::MAX) < u32::MAX);
    }

    #[test]
    fn request_then_deliver() {
        let mut seed = SeedState::default();
        assert_selector_error(seed.ready_value(), SelectorError::SeedNotReady);
        assert_selector_error(
            seed.deliver(1, TEST_SEED),
            SelectorError::SeedNotRequested,
        );

        assert_eq!(seed.request().unwrap(), 1);
        assert_selector_error(
            seed.deliver(2, TEST_SEED),
            SelectorError::UnknownSeedRequest,
        );
        seed.deliver(1, TEST_SEED).unwrap();
        assert_eq!(seed.ready_value().unwrap(), TEST_SEED);

        assert_selector_error(seed.request(), SelectorError::SeedAlreadyDelivered);
        assert_selector_error(
            seed.deliver(1, [9u8; 32]),
            SelectorError::SeedAlreadyDelivered,
        );
        assert_eq!(seed.value, TEST_SEED);
    }

    #[test]
    fn re_request_supersedes_pending() {
        let mut seed = SeedState::default();
        assert_eq!(seed.request().unwrap(), 1);
        assert_eq!(seed.request().unwrap(), 2);
        assert_selector_error(
            seed.deliver(1, TEST_SEED),
            SelectorError::UnknownSeedRequest,
        );
        seed.deliver(2, TEST_SEED).unwrap();
        assert!(seed.ready);
    }
}
