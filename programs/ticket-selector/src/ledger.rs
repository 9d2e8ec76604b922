//! Raw region behind the `Selector` header, at [`LEDGER_OFFSET`].
//!
//! ```text
//! | eligibility | allow-list | reserve | swap table                      |
//! | u32 LE per winner, in draw order   | (position, value) u32 LE pairs, |
//! |                                    | sorted by position              |
//! ```
//!
//! Phases draw strictly one after another, so only the last non-empty winner
//! list ever grows. The swap table belongs to the pool being drawn; the
//! ticket pool's table is dropped when the KYC pool opens. Reads and writes
//! work in place: nothing here allocates.
//!
//! [`LEDGER_OFFSET`]: crate::state::LEDGER_OFFSET

use std::cmp::Ordering;

use anchor_lang::prelude::*;

use crate::constants::{SWAP_LEN, WINNER_LEN};
use crate::errors::SelectorError;
use crate::state::{Phase, Selector};

pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

pub fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Borrowed view of one winner list.
#[derive(Clone, Copy, Debug)]
pub struct WinnerList<'a> {
    bytes: &'a [u8],
}

impl<'a> WinnerList<'a> {
    /// `bytes` must hold whole entries.
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len() % WINNER_LEN, 0);
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / WINNER_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<u32> {
        (position < self.len()).then(|| read_u32(self.bytes, position * WINNER_LEN))
    }

    /// Entries `start..end`, or `None` if out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<WinnerList<'a>> {
        let bytes = self
            .bytes
            .get(start * WINNER_LEN..end.checked_mul(WINNER_LEN)?)?;
        Some(WinnerList { bytes })
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        self.bytes
            .chunks_exact(WINNER_LEN)
            .map(|entry| read_u32(entry, 0))
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Sorted `position -> value` table over account bytes.
///
/// `bytes` holds `len` entries followed by free capacity.
#[derive(Debug)]
pub struct SwapTable<'a> {
    bytes: &'a mut [u8],
    len: usize,
}

impl<'a> SwapTable<'a> {
    pub fn empty(bytes: &'a mut [u8]) -> Self {
        Self { bytes, len: 0 }
    }

    pub fn new(bytes: &'a mut [u8], len: usize) -> Result<Self> {
        require!(
            len.saturating_mul(SWAP_LEN) <= bytes.len(),
            SelectorError::LedgerTooSmall
        );
        Ok(Self { bytes, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len() / SWAP_LEN
    }

    fn position_at(&self, slot: usize) -> u32 {
        read_u32(self.bytes, slot * SWAP_LEN)
    }

    fn value_at(&self, slot: usize) -> u32 {
        read_u32(self.bytes, slot * SWAP_LEN + 4)
    }

    fn write(&mut self, slot: usize, position: u32, value: u32) {
        write_u32(self.bytes, slot * SWAP_LEN, position);
        write_u32(self.bytes, slot * SWAP_LEN + 4, value);
    }

    /// Slot of `position`, or where it would be inserted.
    fn search(&self, position: u32) -> std::result::Result<usize, usize> {
        let (mut low, mut high) = (0, self.len);
        while low < high {
            let mid = low + (high - low) / 2;
            match self.position_at(mid).cmp(&position) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }

    pub fn get(&self, position: u32) -> Option<u32> {
        self.search(position).ok().map(|slot| self.value_at(slot))
    }

    /// Insert or overwrite the entry for `position`.
    pub fn insert(&mut self, position: u32, value: u32) -> Result<()> {
        match self.search(position) {
            Ok(slot) => self.write(slot, position, value),
            Err(slot) => {
                require!(self.len < self.capacity(), SelectorError::LedgerTooSmall);
                self.bytes
                    .copy_within(slot * SWAP_LEN..self.len * SWAP_LEN, (slot + 1) * SWAP_LEN);
                self.write(slot, position, value);
                self.len += 1;
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, position: u32) {
        if let Ok(slot) = self.search(position) {
            self.bytes
                .copy_within((slot + 1) * SWAP_LEN..self.len * SWAP_LEN, slot * SWAP_LEN);
            self.len -= 1;
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.len).map(|slot| (self.position_at(slot), self.value_at(slot)))
    }
}

impl Selector {
    /// Byte offset of the winner list of `phase` in the ledger.
    fn list_offset(&self, phase: Phase) -> usize {
        let counts = &self.winner_counts;
        let before = match phase {
            Phase::Eligibility => 0,
            Phase::AllowList => counts.eligibility as usize,
            Phase::Reserve => counts.eligibility as usize + counts.allow_list as usize,
        };
        before * WINNER_LEN
    }

    /// Byte offset of the swap table in the ledger.
    pub fn swap_table_offset(&self) -> usize {
        self.winner_counts.total() * WINNER_LEN
    }

    pub fn winner_count(&self, phase: Phase) -> u32 {
        self.winner_counts.get(phase)
    }

    /// Winner list of `phase`, read from `ledger`.
    pub fn winners<'a>(&self, phase: Phase, ledger: &'a [u8]) -> Result<WinnerList<'a>> {
        let start = self.list_offset(phase);
        let end = start + self.winner_count(phase) as usize * WINNER_LEN;
        let bytes = ledger
            .get(start..end)
            .ok_or(SelectorError::LedgerTooSmall)?;
        Ok(WinnerList::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_selector_error, ledger_of};

    #[test]
    fn winner_lists_follow_each_other() {
        let mut selector = Selector::default();
        selector.winner_counts.eligibility = 3;
        selector.winner_counts.allow_list = 2;
        selector.winner_counts.reserve = 1;
        let ledger = ledger_of(&[10, 11, 12, 20, 21, 30]);

        assert_eq!(selector.winners(Phase::Eligibility, &ledger).unwrap().to_vec(), vec![10, 11, 12]);
        assert_eq!(selector.winners(Phase::AllowList, &ledger).unwrap().to_vec(), vec![20, 21]);
        assert_eq!(selector.winners(Phase::Reserve, &ledger).unwrap().to_vec(), vec![30]);
        assert_eq!(selector.swap_table_offset(), 24);

        assert_selector_error(
            selector.winners(Phase::Reserve, &ledger[..20]),
            SelectorError::LedgerTooSmall,
        );
    }

    #[test]
    fn winner_list_slices() {
        let bytes = ledger_of(&[5, 6, 7, 8]);
        let list = WinnerList::new(&bytes);
        assert_eq!(list.len(), 4);
        assert_eq!(list.get(3), Some(8));
        assert_eq!(list.get(4), None);
        assert_eq!(list.slice(1, 3).unwrap().to_vec(), vec![6, 7]);
        assert!(list.slice(2, 5).is_none());
        assert!(list.slice(3, 3).unwrap().is_empty());
    }

    #[test]
    fn swap_table_stays_sorted() {
        let mut bytes = vec![0u8; 4 * SWAP_LEN];
        let mut table = SwapTable::new(&mut bytes, 0).unwrap();

        table.insert(40, 1).unwrap();
        table.insert(10, 2).unwrap();
        table.insert(25, 3).unwrap();
        table.insert(10, 4).unwrap();
        assert_eq!(table.entries().collect::<Vec<_>>(), vec![(10, 4), (25, 3), (40, 1)]);
        assert_eq!(table.get(25), Some(3));
        assert_eq!(table.get(26), None);

        table.remove(25);
        table.remove(99);
        assert_eq!(table.entries().collect::<Vec<_>>(), vec![(10, 4), (40, 1)]);

        table.insert(30, 5).unwrap();
        table.insert(31, 6).unwrap();
        assert_eq!(table.len(), 4);
        assert_selector_error(table.insert(32, 7), SelectorError::LedgerTooSmall);
        table.insert(31, 8).unwrap();
        assert_eq!(table.get(31), Some(8));
    }

    #[test]
    fn swap_table_rejects_short_buffers() {
        let mut bytes = vec![0u8; SWAP_LEN];
        assert_selector_error(SwapTable::new(&mut bytes, 2), SelectorError::LedgerTooSmall);
    }
}
