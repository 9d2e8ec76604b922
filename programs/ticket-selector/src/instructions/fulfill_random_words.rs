use anchor_lang::prelude::*;

use crate::constants::SELECTOR_SEED;
use crate::errors::SelectorError;
use crate::events::SeedDelivered;
use crate::state::Selector;

/// Accounts for the oracle's answer.
///
/// Shaped like a coordinator consumer callback: the signer comes first, the
/// consumer's own accounts follow.
#[derive(Accounts)]
pub struct FulfillRandomWords<'info> {
    /// Must match `selector.oracle` (an oracle key or a coordinator config PDA).
    pub oracle: Signer<'info>,

    #[account(
        mut,
        seeds = [SELECTOR_SEED, selector.authority.as_ref(), selector.selector_id.to_le_bytes().as_ref()],
        bump = selector.bump,
        constraint = selector.oracle == oracle.key() @ SelectorError::Unauthorized,
    )]
    pub selector: Account<'info, Selector>,
}

/// Store the first random word as the selector's seed.
pub fn handler(
    ctx: Context<FulfillRandomWords>,
    request_id: u64,
    random_words: Vec<[u8; 32]>,
) -> Result<()> {
    let seed = *random_words
        .first()
        .ok_or(SelectorError::EmptyRandomness)?;

    let selector = &mut ctx.accounts.selector;
    selector.seed.deliver(request_id, seed)?;

    emit!(SeedDelivered {
        selector: selector.key(),
        request_id,
        seed,
    });

    msg!("Seed delivered, request_id={}", request_id);
    Ok(())
}
