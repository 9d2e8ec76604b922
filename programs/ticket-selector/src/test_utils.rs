use anchor_lang::prelude::*;

use crate::draw::DrawnWinner;
use crate::errors::SelectorError;
use crate::state::{Phase, Selector, SelectorMode};

/// `1500100900` as a big-endian 256-bit seed.
pub const TEST_SEED: [u8; 32] = {
    let mut seed = [0u8; 32];
    seed[28] = 0x59;
    seed[29] = 0x69;
    seed[30] = 0xb9;
    seed[31] = 0x24;
    seed
};

pub fn assert_selector_error<T: std::fmt::Debug>(result: Result<T>, expected: SelectorError) {
    let expected: anchor_lang::error::Error = expected.into();
    match result {
        Ok(value) => panic!("expected {expected:?}, got Ok({value:?})"),
        Err(err) => assert_eq!(err, expected),
    }
}

/// A selector whose seed is already delivered.
pub fn seeded_selector(mode: SelectorMode) -> Selector {
    let mut selector = Selector {
        mode,
        ..Selector::default()
    };
    let request_id = selector.seed.request().unwrap();
    selector.seed.deliver(request_id, TEST_SEED).unwrap();
    selector
}

/// Ledger bytes holding `winners` back to back.
pub fn ledger_of(winners: &[u32]) -> Vec<u8> {
    winners.iter().flat_map(|index| index.to_le_bytes()).collect()
}

/// A selector with its ledger, grown ahead of every batch like the
/// `select_*_winners` accounts do.
pub struct SelectorFixture {
    pub selector: Selector,
    pub ledger: Vec<u8>,
}

impl SelectorFixture {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            ledger: Vec::new(),
        }
    }

    pub fn draw(&mut self, phase: Phase, batch_size: u32) -> Result<Vec<DrawnWinner>> {
        self.ledger
            .resize(self.selector.ledger_len_after_batch(batch_size), 0);
        let batch = self.selector.draw_batch(phase, batch_size, &mut self.ledger)?;
        let drawn = self.selector.batch_winners(&batch, &self.ledger)?.collect();
        self.ledger.truncate(self.selector.ledger_len());
        Ok(drawn)
    }

    pub fn winners(&self, phase: Phase) -> Vec<u32> {
        self.selector
            .winners(phase, &self.ledger)
            .unwrap()
            .to_vec()
    }
}
