use thiserror::Error;

/// Failure modes of the transfer core.
///
/// Every variant except `Database` is reported to the caller with no side
/// effects; a failed request never leaves a partial transfer, ledger entry
/// or balance behind.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("account not found")]
    NotFound,

    #[error("payee not found")]
    PayeeNotFound,

    #[error("payee is disabled")]
    PayeeDisabled,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("source and destination accounts must be different")]
    SameAccount,

    #[error("account is not active")]
    AccountNotActive,

    #[error("currency must be a 3-letter code")]
    InvalidCurrency,

    #[error("currency must match both accounts")]
    CurrencyMismatch,

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("idempotency key must be 1-128 characters of A-Za-z0-9._:-")]
    InvalidIdempotencyKey,

    // Conflict messages are deliberately vague: a key held by another user
    // must not reveal whose it is.
    #[error("idempotency key was already used with a different request")]
    ConflictingReplay,

    #[error("idempotency key was already used")]
    KeyAlreadyUsed,

    #[error("invalid cursor")]
    InvalidCursor,
}
