//! Sampling without replacement over `[0, size)` without materializing it.
//!
//! Partial Fisher–Yates over a sparse swap table: the live range is
//! `[0, size - drawn)`, a position without an entry holds its own index.
//! Each draw picks `r` in the live range, emits `value(r)` and moves the value
//! at the shrinking boundary into the hole. At most one entry is written and
//! one removed per draw, and every entry stays inside the live range.
//!
//! The table is a sorted run of ledger bytes: lookups are binary searches and
//! an insert shifts the tail of the run in place.

use anchor_lang::prelude::*;

use crate::errors::SelectorError;
use crate::ledger::SwapTable;
use crate::randomness::{derive_word, uniform_below};
use crate::state::PoolState;

#[derive(Debug)]
pub struct VirtualPool<'a> {
    size: u32,
    drawn: u32,
    swaps: SwapTable<'a>,
}

impl<'a> VirtualPool<'a> {
    /// Fresh pool over `[0, size)`; `swap_bytes` is the table's capacity.
    pub fn new(size: u32, swap_bytes: &'a mut [u8]) -> Self {
        Self {
            size,
            drawn: 0,
            swaps: SwapTable::empty(swap_bytes),
        }
    }

    /// Pool described by `state`, its swap entries at the start of `swap_bytes`.
    pub fn load(state: &PoolState, swap_bytes: &'a mut [u8]) -> Result<Self> {
        Ok(Self {
            size: state.size,
            drawn: state.drawn,
            swaps: SwapTable::new(swap_bytes, state.swap_count as usize)?,
        })
    }

    pub fn store(&self, state: &mut PoolState) {
        state.size = self.size;
        state.drawn = self.drawn;
        state.swap_count = self.swaps.len() as u32;
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn drawn(&self) -> u32 {
        self.drawn
    }

    pub fn remaining(&self) -> u32 {
        self.size - self.drawn
    }

    pub fn swap_count(&self) -> usize {
        self.swaps.len()
    }

    fn value_at(&self, position: u32) -> u32 {
        self.swaps.get(position).unwrap_or(position)
    }

    /// Draw one index using the value derived from `(seed, counter)`.
    ///
    /// Returns the winning index and the next counter. Fails before touching
    /// the table if the pool is empty, the counter is spent or the table has
    /// no room for one more entry.
    pub fn draw(&mut self, seed: &[u8; 32], counter: u64) -> Result<(u32, u64)> {
        let remaining = self.remaining();
        require!(remaining > 0, SelectorError::CapacityExceeded);
        let next_counter = counter
            .checked_add(1)
            .ok_or(SelectorError::CounterOverflow)?;
        require!(
            self.swaps.len() < self.swaps.capacity(),
            SelectorError::LedgerTooSmall
        );

        let r = uniform_below(&derive_word(seed, counter), remaining);
        let last = remaining - 1;

        let winner = self.value_at(r);
        let tail = self.value_at(last);
        // `last` leaves the live range.
        self.swaps.remove(last);
        if r != last {
            if tail == r {
                self.swaps.remove(r);
            } else {
                self.swaps.insert(r, tail)?;
            }
        }
        self.drawn += 1;

        Ok((winner, next_counter))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::constants::SWAP_LEN;
    use crate::test_utils::{assert_selector_error, TEST_SEED};

    fn draw_all(pool: &mut VirtualPool<'_>, seed: &[u8; 32], count: u32) -> Vec<u32> {
        let mut counter = 0;
        (0..count)
            .map(|_| {
                let (index, next) = pool.draw(seed, counter).unwrap();
                counter = next;
                index
            })
            .collect()
    }

    fn table_bytes(entries: u32) -> Vec<u8> {
        vec![0u8; entries as usize * SWAP_LEN]
    }

    #[test]
    fn known_answer_sequence() {
        let mut bytes = table_bytes(8);
        let mut pool = VirtualPool::new(6000, &mut bytes);
        assert_eq!(
            draw_all(&mut pool, &TEST_SEED, 8),
            vec![3390, 1461, 4038, 2010, 3389, 221, 3425, 2333]
        );

        let mut bytes = table_bytes(10);
        let mut small = VirtualPool::new(10, &mut bytes);
        assert_eq!(
            draw_all(&mut small, &TEST_SEED, 10),
            vec![0, 5, 6, 4, 8, 1, 3, 7, 9, 2]
        );
        assert_eq!(small.swap_count(), 0);

        let mut bytes = table_bytes(5);
        let mut tiny = VirtualPool::new(5, &mut bytes);
        assert_eq!(draw_all(&mut tiny, &[7u8; 32], 5), vec![2, 0, 1, 4, 3]);
    }

    #[test]
    fn exhausted_pool_rejects_draws() {
        let mut bytes = table_bytes(3);
        let mut pool = VirtualPool::new(2, &mut bytes);
        draw_all(&mut pool, &TEST_SEED, 2);
        assert_eq!(pool.remaining(), 0);
        assert_selector_error(pool.draw(&TEST_SEED, 2), SelectorError::CapacityExceeded);
    }

    #[test]
    fn empty_pool_always_fails() {
        let mut pool = VirtualPool::new(0, &mut []);
        assert_selector_error(pool.draw(&TEST_SEED, 0), SelectorError::CapacityExceeded);
        assert_eq!(pool.drawn(), 0);
    }

    #[test]
    fn counter_overflow_is_rejected() {
        let mut bytes = table_bytes(1);
        let mut pool = VirtualPool::new(3, &mut bytes);
        assert_selector_error(
            pool.draw(&TEST_SEED, u64::MAX),
            SelectorError::CounterOverflow,
        );
        assert_eq!(pool.remaining(), 3);
    }

    #[test]
    fn full_table_is_rejected_before_drawing() {
        let mut pool = VirtualPool::new(3, &mut []);
        assert_selector_error(pool.draw(&TEST_SEED, 0), SelectorError::LedgerTooSmall);
        assert_eq!(pool.remaining(), 3);
    }

    #[test]
    fn store_and_load_resume_the_same_sequence() {
        let mut bytes = table_bytes(40);
        let mut uninterrupted = VirtualPool::new(500, &mut bytes);
        let expected = draw_all(&mut uninterrupted, &TEST_SEED, 40);

        let mut bytes = table_bytes(40);
        let mut state = PoolState::default();
        let mut counter = 0;
        let mut got = Vec::new();
        for _ in 0..4 {
            let mut pool = if state.size == 0 {
                VirtualPool::new(500, &mut bytes)
            } else {
                VirtualPool::load(&state, &mut bytes).unwrap()
            };
            for _ in 0..10 {
                let (index, next) = pool.draw(&TEST_SEED, counter).unwrap();
                got.push(index);
                counter = next;
            }
            pool.store(&mut state);
        }

        assert_eq!(got, expected);
        assert_eq!(state.drawn, 40);
        let table = SwapTable::new(&mut bytes, state.swap_count as usize).unwrap();
        let positions: Vec<u32> = table.entries().map(|(position, _)| position).collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(positions.iter().all(|position| *position < 460));
    }

    proptest! {
        #[test]
        fn draws_are_unique_and_in_range(
            (size, count) in (1u32..400).prop_flat_map(|size| (Just(size), 0..=size)),
            seed in any::<[u8; 32]>(),
        ) {
            let mut bytes = table_bytes(count);
            let mut pool = VirtualPool::new(size, &mut bytes);
            let drawn = draw_all(&mut pool, &seed, count);

            let unique: HashSet<u32> = drawn.iter().copied().collect();
            prop_assert_eq!(unique.len(), count as usize);
            prop_assert!(drawn.iter().all(|index| *index < size));
            prop_assert!(pool.swap_count() <= count as usize);
            prop_assert_eq!(pool.remaining(), size - count);
        }

        #[test]
        fn full_draw_is_a_permutation(size in 1u32..200, seed in any::<[u8; 32]>()) {
            let mut bytes = table_bytes(size);
            let mut pool = VirtualPool::new(size, &mut bytes);
            let mut drawn = draw_all(&mut pool, &seed, size);
            drawn.sort_unstable();
            prop_assert_eq!(drawn, (0..size).collect::<Vec<_>>());
        }
    }
}
