use anchor_lang::prelude::*;

use crate::constants::SELECTOR_SEED;
use crate::errors::SelectorError;
use crate::events::{log_event, AllowListFilled, ReserveFilled, WinnerSelected};
use crate::state::{Phase, PhaseStatus, Selector, LEDGER_OFFSET};

/// Accounts for a draw batch in any phase.
///
/// The selector is grown up front by the worst case of the batch; the
/// authority pays the extra rent.
#[derive(Accounts)]
#[instruction(batch_size: u32)]
pub struct SelectWinners<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [SELECTOR_SEED, selector.authority.as_ref(), selector.selector_id.to_le_bytes().as_ref()],
        bump = selector.bump,
        constraint = selector.authority == authority.key() @ SelectorError::Unauthorized,
        realloc = selector.space_after_batch(batch_size),
        realloc::payer = authority,
        realloc::zero = false,
    )]
    pub selector: Account<'info, Selector>,

    pub system_program: Program<'info, System>,
}

/// Draw `batch_size` winners for `phase`, all or nothing.
///
/// Winners go to the ledger behind the header; only the header is written
/// back by the `Account` wrapper on exit.
pub fn handler(ctx: Context<SelectWinners>, phase: Phase, batch_size: u32) -> Result<()> {
    let selector = &mut ctx.accounts.selector;
    let selector_key = selector.key();
    let info = selector.to_account_info();
    let mut data = info.try_borrow_mut_data()?;
    let ledger = data
        .get_mut(LEDGER_OFFSET..)
        .ok_or(SelectorError::LedgerTooSmall)?;

    let batch = selector.draw_batch(phase, batch_size, ledger)?;

    for winner in selector.batch_winners(&batch, ledger)? {
        log_event(&WinnerSelected {
            selector: selector_key,
            phase: winner.phase,
            position: winner.position,
            index: winner.index,
            draw_counter: winner.draw_counter,
        })?;
    }

    let total = selector.winner_count(phase);
    if selector.phase_status(phase) == PhaseStatus::Finished {
        match phase {
            Phase::AllowList => emit!(AllowListFilled {
                selector: selector_key,
                winners: total,
            }),
            Phase::Reserve => emit!(ReserveFilled {
                selector: selector_key,
                winners: total,
            }),
            Phase::Eligibility => {}
        }
    }

    msg!(
        "Selected {} {:?} winners ({} total, draw_counter={})",
        batch.count,
        phase,
        total,
        selector.seed.draw_counter
    );
    Ok(())
}
