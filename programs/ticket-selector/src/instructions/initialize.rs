use anchor_lang::prelude::*;

use crate::constants::SELECTOR_SEED;
use crate::errors::SelectorError;
use crate::events::SelectorInitialized;
use crate::state::{Selector, SelectorMode, LEDGER_OFFSET};

/// Accounts required to create a selector.
#[derive(Accounts)]
#[instruction(selector_id: u64)]
pub struct InitializeSelector<'info> {
    /// Future authority of the selector; pays for the account.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Selector PDA. Seeds: `["selector", authority, selector_id.to_le_bytes()]`.
    #[account(
        init,
        payer = authority,
        space = LEDGER_OFFSET,
        seeds = [SELECTOR_SEED, authority.key().as_ref(), selector_id.to_le_bytes().as_ref()],
        bump,
    )]
    pub selector: Account<'info, Selector>,

    pub system_program: Program<'info, System>,
}

/// Create an empty selector in the `Configuring` state for every phase.
pub fn handler(
    ctx: Context<InitializeSelector>,
    selector_id: u64,
    mode: SelectorMode,
    oracle: Pubkey,
) -> Result<()> {
    require!(
        oracle != Pubkey::default(),
        SelectorError::ZeroAddressNotAllowed
    );

    let selector = &mut ctx.accounts.selector;
    selector.authority = ctx.accounts.authority.key();
    selector.oracle = oracle;
    selector.selector_id = selector_id;
    selector.mode = mode;
    selector.bump = ctx.bumps.selector;

    emit!(SelectorInitialized {
        selector: selector.key(),
        authority: selector.authority,
        oracle,
        selector_id,
        mode,
    });

    msg!("Selector {} initialized, mode={:?}", selector_id, mode);
    Ok(())
}
