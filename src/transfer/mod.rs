//! Transfer core
//!
//! Moves money between two accounts exactly once per client-supplied
//! request, under concurrent access, with a balanced double-entry record.
//!
//! # Pipeline
//!
//! ```text
//! START → RESOLVE_PAYEE → CHECK_IDEMPOTENCY → LOCK_ACCOUNTS → VALIDATE → WRITE → DONE
//! ```
//!
//! Any step short-circuits to a terminal failure that persists nothing;
//! the COMPLETED happy path is the only state ever observed externally.
//!
//! # Safety invariants
//!
//! 1. **One atomic unit**: transfer row, both ledger legs, both balance
//!    updates and the audit fact commit or roll back together
//! 2. **Ordered locking**: account row locks are always acquired in
//!    ascending id order, so overlapping transfers cannot deadlock
//! 3. **At most one effect per key**: the global uniqueness constraint on
//!    the idempotency key plus per-actor scoping guarantee a replayed or
//!    racing request resolves to the one committed transfer

pub mod engine;
pub mod error;
pub mod guard;
pub mod history;
pub mod idempotency;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use engine::TransferEngine;
pub use error::TransferError;
pub use guard::{AccountLedgerGuard, LockedPair};
pub use history::{Cursor, HistoryPaginator, TransferPage};
pub use idempotency::{IdempotencyResolver, Resolution};
pub use types::{
    CreateTransfer, Direction, IdempotencyKey, RequestFingerprint, TransferRow, TransferStatus,
    TransferView,
};
