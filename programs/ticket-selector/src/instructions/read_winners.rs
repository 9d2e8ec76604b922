use anchor_lang::prelude::*;

use crate::constants::SELECTOR_SEED;
use crate::errors::SelectorError;
use crate::state::{Phase, Selector, LEDGER_OFFSET};

/// Read-only view of a selector's winner lists.
#[derive(Accounts)]
pub struct ReadWinners<'info> {
    #[account(
        seeds = [SELECTOR_SEED, selector.authority.as_ref(), selector.selector_id.to_le_bytes().as_ref()],
        bump = selector.bump,
    )]
    pub selector: Account<'info, Selector>,
}

pub fn get_all(ctx: Context<ReadWinners>, phase: Phase) -> Result<Vec<u32>> {
    let selector = &ctx.accounts.selector;
    let info = selector.to_account_info();
    let data = info.try_borrow_data()?;
    let ledger = data
        .get(LEDGER_OFFSET..)
        .ok_or(SelectorError::LedgerTooSmall)?;
    let winners = selector.returnable_winners(phase, ledger)?;
    Ok(winners)
}

pub fn get_range(ctx: Context<ReadWinners>, phase: Phase, start: u32, end: u32) -> Result<Vec<u32>> {
    let selector = &ctx.accounts.selector;
    let info = selector.to_account_info();
    let data = info.try_borrow_data()?;
    let ledger = data
        .get(LEDGER_OFFSET..)
        .ok_or(SelectorError::LedgerTooSmall)?;
    let winners = selector.returnable_winners_in_range(phase, ledger, start, end)?;
    Ok(winners)
}
