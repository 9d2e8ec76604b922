use anchor_lang::prelude::*;

use crate::events::EligibilityFinished;
use crate::instructions::configure::ManageSelector;

/// Close the eligibility phase; unlocks the allow-list draw.
pub fn handler(ctx: Context<ManageSelector>) -> Result<()> {
    let selector = &mut ctx.accounts.selector;
    let winners = selector.finish_eligibility()?;

    emit!(EligibilityFinished {
        selector: selector.key(),
        winners,
    });

    msg!("Eligibility selection finished with {} winners", winners);
    Ok(())
}
