use anchor_lang::prelude::*;

/// Error codes for the ticket selector program.
///
/// Anchor encodes these as `6000 + variant index` in on-chain error responses.
/// The off-chain crank relies on this ordering; append new variants at the end.
#[error_code]
pub enum SelectorError {
    /// Signer is neither the selector authority nor its oracle.
    #[msg("Unauthorized")]
    Unauthorized,
    /// A public key argument was the zero address.
    #[msg("Zero address not allowed")]
    ZeroAddressNotAllowed,
    /// The phase owning this setting has already drawn winners.
    #[msg("Selection performed, configuration is locked")]
    ConfigLocked,
    /// `start > end` or `end` is past the last winner.
    #[msg("Incorrect range")]
    IncorrectRange,
    /// Allow-list draws require the eligibility phase to be finished.
    #[msg("Eligibility selection not finished")]
    EligibilityNotFinished,
    /// One of KYC count, allow-list limit, KYC list link or hash is unset.
    #[msg("Not all allow-list steps performed")]
    AllowListStepsMissing,
    /// The batch would push the phase past its cap; nothing was drawn.
    #[msg("No more winners")]
    CapacityExceeded,
    /// Reserve draws require the allow-list to be exactly full.
    #[msg("Select more allow-list winners")]
    CapacityNotReached,
    /// The phase has been finalized.
    #[msg("No more draws in this phase")]
    PhaseExhausted,
    /// Finalizing a phase that has not drawn anything.
    #[msg("Nothing drawn yet")]
    NothingDrawn,
    /// Draws were attempted before the oracle delivered the seed.
    #[msg("Seed not ready")]
    SeedNotReady,
    /// The oracle answered but no seed request is pending.
    #[msg("Seed not requested")]
    SeedNotRequested,
    /// The seed is already set and can no longer change.
    #[msg("Seed already delivered")]
    SeedAlreadyDelivered,
    /// The delivered request id does not match the pending request.
    #[msg("Unknown seed request")]
    UnknownSeedRequest,
    /// The oracle callback carried no random words.
    #[msg("Empty randomness")]
    EmptyRandomness,
    /// Batch size is zero or above `MAX_BATCH_SIZE`.
    #[msg("Invalid batch size")]
    InvalidBatchSize,
    /// Allow-list limit is larger than the KYC count.
    #[msg("Allow-list limit exceeds KYC count")]
    InvalidConfig,
    /// The selector mode has no such phase.
    #[msg("Phase not supported by this selector")]
    UnsupportedPhase,
    /// Link or hash text is longer than the account reserves.
    #[msg("Value too long")]
    ValueTooLong,
    /// The list does not fit into return data; use a ranged read.
    #[msg("Too many winners for a single read")]
    ReturnDataTooLarge,
    /// A draw counter or list length would overflow.
    #[msg("Counter overflow")]
    CounterOverflow,
    /// The account holds fewer ledger bytes than the header describes or the
    /// batch needs.
    #[msg("Selector account too small")]
    LedgerTooSmall,
}
