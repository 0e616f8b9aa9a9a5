use anchor_lang::prelude::*;

/// Custom error codes for the timelock program.
#[error_code]
pub enum TimelockError {
    #[msg("Unauthorized: registry authority signature required")]
    UnauthorizedAuthority,

    #[msg("Invalid configuration")]
    InvalidConfig,

    #[msg("Invalid basis points (must be <= 10000)")]
    InvalidBps,

    #[msg("Holder name is empty or too long")]
    NameTooLong,

    #[msg("Holder list is full")]
    TooManyHolders,

    #[msg("A holder with this name already exists")]
    DuplicateHolderName,

    #[msg("Too many tranches for one holder")]
    TooManyTranches,

    #[msg("Total supply does not match the mint supply")]
    SupplyMismatch,

    #[msg("Holder pool would push allocations above total supply")]
    AllocationExceedsSupply,

    #[msg("Holder pools do not sum to total supply")]
    AllocationSumMismatch,

    #[msg("Tranche shares do not sum to 10000 bps of the locked remainder")]
    TrancheSharesMismatch,

    #[msg("Tranche per-period release does not reconcile to its locked total")]
    TrancheDoesNotReconcile,

    #[msg("Timelocks must be created in tranche order")]
    TrancheOutOfOrder,

    #[msg("Holder not found")]
    HolderNotFound,

    #[msg("Timelock schedule not found")]
    TimelockNotFound,

    #[msg("Registry is sealed")]
    RegistrySealed,

    #[msg("Registry is not sealed")]
    RegistryNotSealed,

    #[msg("Upfront amount was already released")]
    UpfrontAlreadyReleased,

    #[msg("Not every planned timelock has been funded")]
    TimelocksNotFunded,

    #[msg("Invalid token mint")]
    InvalidTokenMint,

    #[msg("Invalid token account")]
    InvalidTokenAccount,

    #[msg("Ledger transfer failed")]
    LedgerTransferFailed,

    #[msg("Timelock pool balance diverged from its paid amount")]
    PoolBalanceDiverged,

    #[msg("Math overflow")]
    MathOverflow,
}

#[cfg(test)]
pub(crate) fn assert_error<T: std::fmt::Debug>(res: Result<T>, want: TimelockError) {
    match res {
        Err(anchor_lang::error::Error::AnchorError(e)) => {
            assert_eq!(e.error_code_number, u32::from(want), "{}", e.error_msg)
        }
        other => panic!("expected `{want}`, got {other:?}"),
    }
}
