//! Configuration setters, each gated by the lock of the phase that owns the
//! setting.

use anchor_lang::prelude::*;

use crate::constants::{MAX_HASH_LEN, MAX_LINK_LEN};
use crate::errors::SelectorError;
use crate::state::{Phase, Selector};

fn bounded(value: String, max_len: usize) -> Result<String> {
    require!(value.len() <= max_len, SelectorError::ValueTooLong);
    Ok(value)
}

impl Selector {
    pub fn set_tickets_count(&mut self, count: u32) -> Result<()> {
        self.ensure_configurable(Phase::Eligibility)?;
        self.config.tickets_count = count;
        Ok(())
    }

    pub fn set_participants_list_link(&mut self, link: String) -> Result<()> {
        self.ensure_configurable(Phase::Eligibility)?;
        self.config.participants_list_link = bounded(link, MAX_LINK_LEN)?;
        Ok(())
    }

    pub fn set_participants_list_hash(&mut self, hash: String) -> Result<()> {
        self.ensure_configurable(Phase::Eligibility)?;
        self.config.participants_list_hash = bounded(hash, MAX_HASH_LEN)?;
        Ok(())
    }

    pub fn set_kyc_count(&mut self, count: u32) -> Result<()> {
        self.ensure_configurable(Phase::AllowList)?;
        self.config.kyc_count = count;
        Ok(())
    }

    pub fn set_wl_limit(&mut self, limit: u32) -> Result<()> {
        self.ensure_configurable(Phase::AllowList)?;
        self.config.wl_limit = limit;
        Ok(())
    }

    pub fn set_kyc_list_link(&mut self, link: String) -> Result<()> {
        self.ensure_configurable(Phase::AllowList)?;
        self.config.kyc_list_link = bounded(link, MAX_LINK_LEN)?;
        Ok(())
    }

    pub fn set_kyc_list_hash(&mut self, hash: String) -> Result<()> {
        self.ensure_configurable(Phase::AllowList)?;
        self.config.kyc_list_hash = bounded(hash, MAX_HASH_LEN)?;
        Ok(())
    }

    /// Replace the oracle key. Allowed until the seed has been delivered.
    pub fn set_oracle(&mut self, oracle: Pubkey) -> Result<()> {
        require!(oracle != Pubkey::default(), SelectorError::ZeroAddressNotAllowed);
        require!(!self.seed.ready, SelectorError::SeedAlreadyDelivered);
        self.oracle = oracle;
        Ok(())
    }
}
