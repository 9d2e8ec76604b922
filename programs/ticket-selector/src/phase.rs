//! Phase lifecycle: `Configuring -> Selecting -> Finished`, per phase.
//!
//! Status is derived from winner counts and [`PhaseFlags`] on every call, so
//! it can only move forward as long as counts only grow and flags are
//! never cleared.
//!
//! [`PhaseFlags`]: crate::state::PhaseFlags

use anchor_lang::prelude::*;

use crate::constants::MAX_BATCH_SIZE;
use crate::errors::SelectorError;
use crate::state::{Phase, PhaseStatus, Selector, SelectorMode};

impl Selector {
    pub fn supports(&self, phase: Phase) -> bool {
        match self.mode {
            SelectorMode::Whitelist => true,
            SelectorMode::SingleRound => phase == Phase::Eligibility,
        }
    }

    pub fn ensure_supported(&self, phase: Phase) -> Result<()> {
        require!(self.supports(phase), SelectorError::UnsupportedPhase);
        Ok(())
    }

    /// Maximum number of winners the phase may ever hold.
    pub fn winner_cap(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Eligibility => self.config.tickets_count,
            Phase::AllowList => self.config.wl_limit,
            Phase::Reserve => self.config.kyc_count.saturating_sub(self.config.wl_limit),
        }
    }

    pub fn phase_status(&self, phase: Phase) -> PhaseStatus {
        let drawn = self.winner_count(phase);
        let finished = match phase {
            Phase::Eligibility => self.flags.eligibility_finished,
            Phase::AllowList => self.flags.allow_list_reached_limit,
            Phase::Reserve => drawn > 0 && drawn == self.winner_cap(phase),
        };
        if finished {
            PhaseStatus::Finished
        } else if drawn > 0 {
            PhaseStatus::Selecting
        } else {
            PhaseStatus::Configuring
        }
    }

    /// Settings of `phase` may only change before its first draw.
    ///
    /// Reserve has no settings of its own; it is bound by the allow-list's.
    pub fn ensure_configurable(&self, phase: Phase) -> Result<()> {
        self.ensure_supported(phase)?;
        require!(
            self.phase_status(phase) == PhaseStatus::Configuring,
            SelectorError::ConfigLocked
        );
        Ok(())
    }

    /// All four allow-list settings carry a non-default value.
    pub fn allow_list_configured(&self) -> bool {
        let config = &self.config;
        config.kyc_count > 0
            && config.wl_limit > 0
            && !config.kyc_list_link.is_empty()
            && !config.kyc_list_hash.is_empty()
    }

    /// Every precondition of a `batch_size` draw in `phase`. Checked before
    /// anything is mutated, so a failing batch leaves no trace.
    pub fn ensure_can_draw(&self, phase: Phase, batch_size: u32) -> Result<()> {
        self.ensure_supported(phase)?;
        require!(self.seed.ready, SelectorError::SeedNotReady);

        match phase {
            Phase::Eligibility => {
                require!(
                    !self.flags.eligibility_finished,
                    SelectorError::PhaseExhausted
                );
            }
            Phase::AllowList => {
                require!(
                    self.flags.eligibility_finished,
                    SelectorError::EligibilityNotFinished
                );
                require!(
                    self.allow_list_configured(),
                    SelectorError::AllowListStepsMissing
                );
                require!(
                    self.config.wl_limit <= self.config.kyc_count,
                    SelectorError::InvalidConfig
                );
            }
            Phase::Reserve => {
                require!(
                    self.flags.allow_list_reached_limit
                        && self.winner_counts.allow_list == self.config.wl_limit,
                    SelectorError::CapacityNotReached
                );
            }
        }

        require!(
            batch_size > 0 && batch_size <= MAX_BATCH_SIZE,
            SelectorError::InvalidBatchSize
        );

        let total = self
            .winner_count(phase)
            .checked_add(batch_size)
            .ok_or(SelectorError::CounterOverflow)?;
        require!(
            total <= self.winner_cap(phase),
            SelectorError::CapacityExceeded
        );
        Ok(())
    }

    /// Close the eligibility phase. Returns the final winner count.
    pub fn finish_eligibility(&mut self) -> Result<u32> {
        require!(
            !self.flags.eligibility_finished,
            SelectorError::PhaseExhausted
        );
        require!(
            self.winner_counts.eligibility > 0,
            SelectorError::NothingDrawn
        );
        self.flags.eligibility_finished = true;
        Ok(self.winner_counts.eligibility)
    }
}
