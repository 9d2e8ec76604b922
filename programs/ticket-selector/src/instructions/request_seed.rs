use anchor_lang::prelude::*;

use crate::events::SeedRequested;
use crate::instructions::configure::ManageSelector;

/// Ask the oracle for the selector's seed.
///
/// The oracle watches for [`SeedRequested`] and answers with
/// `fulfill_random_words`.
pub fn handler(ctx: Context<ManageSelector>) -> Result<()> {
    let selector = &mut ctx.accounts.selector;
    let request_id = selector.seed.request()?;
    let request_slot = Clock::get()?.slot;

    emit!(SeedRequested {
        selector: selector.key(),
        request_id,
        request_slot,
    });

    msg!("Seed requested, request_id={}", request_id);
    Ok(())
}
