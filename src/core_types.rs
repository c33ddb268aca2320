//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.
//!
//! All ids are `i64` because they map directly onto Postgres `BIGSERIAL`
//! primary keys; monetary amounts are `i64` minor units (cents), never
//! floating point.

/// User ID - primary key of the `users` table.
pub type UserId = i64;

/// Account ID - primary key of the `accounts` table.
///
/// # Constraints:
/// - **Immutable**: assigned once by the database, never reused
/// - **Totally ordered**: lock acquisition sorts account ids ascending,
///   which gives every concurrent transfer the same global lock order
pub type AccountId = i64;

/// Transfer ID - primary key of the `transfers` table.
pub type TransferId = i64;

/// Ledger entry ID - primary key of the `ledger_entries` table.
pub type LedgerEntryId = i64;

/// Payee ID - primary key of the `payees` table.
pub type PayeeId = i64;

/// Monetary amount in integer minor units (cents).
///
/// Signed so balance deltas can be expressed directly; persisted amounts
/// are always positive.
pub type Cents = i64;
