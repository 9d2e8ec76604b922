//! Batch draw controller: one bounded, all-or-nothing batch per call.
//!
//! Winners are written straight into the ledger behind the header. Before the
//! first draw the active swap table is moved up by `batch_size` winner slots,
//! which leaves room for the batch's winners and its worst-case swap entries.
//! Heap use per batch does not depend on how many winners were drawn before.

use anchor_lang::prelude::*;

use crate::constants::{SWAP_LEN, WINNER_LEN};
use crate::errors::SelectorError;
use crate::ledger::write_u32;
use crate::pool::VirtualPool;
use crate::state::{Phase, PoolState, Selector};

/// One draw of a batch, in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawnWinner {
    pub phase: Phase,
    /// Offset of the winner in the phase list.
    pub position: u32,
    /// Drawn pool index (ticket index, or KYC list index).
    pub index: u32,
    /// Counter mixed with the seed for this draw.
    pub draw_counter: u64,
}

/// A committed batch. Its winners are read back with
/// [`Selector::batch_winners`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawnBatch {
    pub phase: Phase,
    pub first_position: u32,
    pub first_counter: u64,
    pub count: u32,
}

impl Selector {
    fn pool_state(&self, phase: Phase) -> PoolState {
        match phase {
            Phase::Eligibility => self.ticket_pool,
            Phase::AllowList | Phase::Reserve => self.kyc_pool,
        }
    }

    fn pool_state_mut(&mut self, phase: Phase) -> &mut PoolState {
        match phase {
            Phase::Eligibility => &mut self.ticket_pool,
            Phase::AllowList | Phase::Reserve => &mut self.kyc_pool,
        }
    }

    /// State of the pool backing `phase`, sized from the configuration on
    /// first use.
    fn opened_pool_state(&self, phase: Phase) -> PoolState {
        let state = self.pool_state(phase);
        if state.size != 0 {
            return state;
        }
        let size = match phase {
            Phase::Eligibility => self.config.tickets_count,
            Phase::AllowList | Phase::Reserve => self.config.kyc_count,
        };
        PoolState {
            size,
            ..PoolState::default()
        }
    }

    /// Draw exactly `batch_size` winners for `phase` or nothing at all.
    ///
    /// `ledger` is the account data from [`crate::state::LEDGER_OFFSET`]
    /// on and must hold at least
    /// [`ledger_len_after_batch`](Selector::ledger_len_after_batch) bytes.
    /// Every check runs before the first byte is written.
    pub fn draw_batch(
        &mut self,
        phase: Phase,
        batch_size: u32,
        ledger: &mut [u8],
    ) -> Result<DrawnBatch> {
        self.ensure_can_draw(phase, batch_size)?;

        let seed = self.seed.ready_value()?;
        let first_counter = self.seed.draw_counter;
        first_counter
            .checked_add(u64::from(batch_size))
            .ok_or(SelectorError::CounterOverflow)?;

        let mut state = self.opened_pool_state(phase);
        require!(
            state.size - state.drawn >= batch_size,
            SelectorError::CapacityExceeded
        );

        let batch = batch_size as usize;
        let winners_end = self.swap_table_offset();
        let kept = state.swap_count as usize * SWAP_LEN;
        let swaps_start = winners_end + batch * WINNER_LEN;
        let swaps_len = kept + batch * SWAP_LEN;
        require!(
            ledger.len() >= swaps_start + swaps_len,
            SelectorError::LedgerTooSmall
        );

        ledger.copy_within(winners_end..winners_end + kept, swaps_start);
        let (head, tail) = ledger.split_at_mut(swaps_start);
        let mut pool = VirtualPool::load(&state, &mut tail[..swaps_len])?;

        let mut counter = first_counter;
        for offset in 0..batch {
            let (index, next_counter) = pool.draw(&seed, counter)?;
            write_u32(head, winners_end + offset * WINNER_LEN, index);
            counter = next_counter;
        }
        pool.store(&mut state);

        let first_position = self.winner_count(phase);
        *self.pool_state_mut(phase) = state;
        if phase != Phase::Eligibility {
            // The ticket pool's entries were overwritten by this batch.
            self.ticket_pool.swap_count = 0;
        }
        *self.winner_counts.get_mut(phase) += batch_size;
        self.seed.draw_counter = counter;

        if phase == Phase::AllowList && self.winner_counts.allow_list == self.config.wl_limit {
            self.flags.allow_list_reached_limit = true;
        }

        Ok(DrawnBatch {
            phase,
            first_position,
            first_counter,
            count: batch_size,
        })
    }

    /// Winners of a committed `batch`, read from `ledger`.
    pub fn batch_winners<'a>(
        &self,
        batch: &DrawnBatch,
        ledger: &'a [u8],
    ) -> Result<impl Iterator<Item = DrawnWinner> + 'a> {
        let DrawnBatch {
            phase,
            first_position,
            first_counter,
            count,
        } = *batch;
        let start = first_position as usize;
        let entries = self
            .winners(phase, ledger)?
            .slice(start, start + count as usize)
            .ok_or(SelectorError::LedgerTooSmall)?;

        Ok(entries
            .iter()
            .zip(0u32..)
            .map(move |(index, offset)| DrawnWinner {
                phase,
                position: first_position + offset,
                index,
                draw_counter: first_counter + u64::from(offset),
            }))
    }

    /// Winners still drawable in `phase` before it hits its cap.
    pub fn remaining_capacity(&self, phase: Phase) -> u32 {
        self.winner_cap(phase)
            .saturating_sub(self.winner_count(phase))
    }
}
