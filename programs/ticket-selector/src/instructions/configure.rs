use anchor_lang::prelude::*;

use crate::constants::SELECTOR_SEED;
use crate::errors::SelectorError;
use crate::state::Selector;

/// Accounts for every authority-only instruction that does not resize the
/// selector.
#[derive(Accounts)]
pub struct ManageSelector<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [SELECTOR_SEED, selector.authority.as_ref(), selector.selector_id.to_le_bytes().as_ref()],
        bump = selector.bump,
        constraint = selector.authority == authority.key() @ SelectorError::Unauthorized,
    )]
    pub selector: Account<'info, Selector>,
}

pub fn update_tickets_count(ctx: Context<ManageSelector>, count: u32) -> Result<()> {
    ctx.accounts.selector.set_tickets_count(count)?;
    msg!("tickets_count={}", count);
    Ok(())
}

pub fn update_participants_list_link(ctx: Context<ManageSelector>, link: String) -> Result<()> {
    ctx.accounts.selector.set_participants_list_link(link)
}

pub fn update_participants_list_hash(ctx: Context<ManageSelector>, hash: String) -> Result<()> {
    ctx.accounts.selector.set_participants_list_hash(hash)
}

pub fn update_kyc_count(ctx: Context<ManageSelector>, count: u32) -> Result<()> {
    ctx.accounts.selector.set_kyc_count(count)?;
    msg!("kyc_count={}", count);
    Ok(())
}

pub fn update_wl_limit(ctx: Context<ManageSelector>, limit: u32) -> Result<()> {
    ctx.accounts.selector.set_wl_limit(limit)?;
    msg!("wl_limit={}", limit);
    Ok(())
}

pub fn update_kyc_list_link(ctx: Context<ManageSelector>, link: String) -> Result<()> {
    ctx.accounts.selector.set_kyc_list_link(link)
}

pub fn update_kyc_list_hash(ctx: Context<ManageSelector>, hash: String) -> Result<()> {
    ctx.accounts.selector.set_kyc_list_hash(hash)
}

pub fn update_oracle(ctx: Context<ManageSelector>, oracle: Pubkey) -> Result<()> {
    ctx.accounts.selector.set_oracle(oracle)?;
    msg!("oracle={}", oracle);
    Ok(())
}
