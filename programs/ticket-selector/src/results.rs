//! Winner lists: append-only, read in full or by inclusive range.

use anchor_lang::prelude::*;

use crate::constants::MAX_RETURN_WINNERS;
use crate::errors::SelectorError;
use crate::ledger::WinnerList;
use crate::state::{Phase, Selector};

/// Entries `start..=end` of `winners`. Fails unless `start <= end < winners.len()`.
pub fn winners_in_range(winners: WinnerList<'_>, start: u32, end: u32) -> Result<WinnerList<'_>> {
    let (start, end) = (start as usize, end as usize);
    require!(
        start <= end && end < winners.len(),
        SelectorError::IncorrectRange
    );
    winners
        .slice(start, end + 1)
        .ok_or_else(|| SelectorError::IncorrectRange.into())
}

/// Copy `winners` out if it fits instruction return data.
fn returnable(winners: WinnerList<'_>) -> Result<Vec<u32>> {
    require!(
        winners.len() <= MAX_RETURN_WINNERS,
        SelectorError::ReturnDataTooLarge
    );
    Ok(winners.to_vec())
}

impl Selector {
    /// Full winner list of `phase`, sized for instruction return data.
    pub fn returnable_winners(&self, phase: Phase, ledger: &[u8]) -> Result<Vec<u32>> {
        self.ensure_supported(phase)?;
        returnable(self.winners(phase, ledger)?)
    }

    /// Inclusive range of the winner list of `phase`, sized for return data.
    pub fn returnable_winners_in_range(
        &self,
        phase: Phase,
        ledger: &[u8],
        start: u32,
        end: u32,
    ) -> Result<Vec<u32>> {
        self.ensure_supported(phase)?;
        returnable(winners_in_range(self.winners(phase, ledger)?, start, end)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SelectorMode;
    use crate::test_utils::{assert_selector_error, ledger_of};

    #[test]
    fn inclusive_ranges() {
        let bytes = ledger_of(&[10, 20, 30, 40]);
        let winners = WinnerList::new(&bytes);
        assert_eq!(winners_in_range(winners, 0, 0).unwrap().to_vec(), vec![10]);
        assert_eq!(winners_in_range(winners, 1, 3).unwrap().to_vec(), vec![20, 30, 40]);
        assert_eq!(winners_in_range(winners, 3, 3).unwrap().to_vec(), vec![40]);
    }

    #[test]
    fn bad_ranges_are_rejected() {
        let bytes = ledger_of(&[10, 20, 30, 40]);
        let winners = WinnerList::new(&bytes);
        assert_selector_error(winners_in_range(winners, 2, 1), SelectorError::IncorrectRange);
        assert_selector_error(winners_in_range(winners, 0, 4), SelectorError::IncorrectRange);
        assert_selector_error(
            winners_in_range(WinnerList::new(&[]), 0, 0),
            SelectorError::IncorrectRange,
        );
        assert_selector_error(
            winners_in_range(winners, u32::MAX, u32::MAX),
            SelectorError::IncorrectRange,
        );
    }

    #[test]
    fn oversized_lists_need_ranges() {
        let mut selector = Selector::default();
        selector.winner_counts.eligibility = 300;
        let ledger = ledger_of(&(0..300).collect::<Vec<_>>());

        assert_selector_error(
            selector.returnable_winners(Phase::Eligibility, &ledger),
            SelectorError::ReturnDataTooLarge,
        );
        let page = selector
            .returnable_winners_in_range(Phase::Eligibility, &ledger, 0, 254)
            .unwrap();
        assert_eq!(page.len(), MAX_RETURN_WINNERS);
        assert_eq!(page[254], 254);
        assert_eq!(
            selector.returnable_winners(Phase::Reserve, &ledger).unwrap(),
            Vec::<u32>::new()
        );
    }

    #[test]
    fn single_round_hides_other_lists() {
        let selector = Selector {
            mode: SelectorMode::SingleRound,
            ..Selector::default()
        };
        assert_selector_error(
            selector.returnable_winners(Phase::AllowList, &[]),
            SelectorError::UnsupportedPhase,
        );
    }
}
