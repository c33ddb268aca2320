//! bankline - digital banking transfer core
//!
//! Moves money between accounts exactly once per client request, under
//! concurrent access, with a complete double-entry audit record.
//!
//! # Modules
//!
//! - [`core_types`] - Core type aliases (UserId, AccountId, Cents, ...)
//! - [`account`] - Users, accounts, the row-lock primitive, balance updates
//! - [`ledger`] - Append-only double-entry store
//! - [`transfer`] - The core: engine, idempotency, lock guard, history
//! - [`payee`] - Payee directory and destination resolution
//! - [`audit`] - Transaction-scoped audit facts
//! - [`user_auth`] - Registration, login, JWT verification
//! - [`gateway`] - Thin axum HTTP surface
//! - [`config`] / [`logging`] - YAML config and tracing setup

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod audit;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod payee;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{Account, AccountRepository, Database, UserRepository};
pub use core_types::{AccountId, Cents, LedgerEntryId, PayeeId, TransferId, UserId};
pub use ledger::{LedgerDirection, LedgerEntry, LedgerStore};
pub use payee::{Payee, PayeeDirectory, PayeeError};
pub use transfer::{
    CreateTransfer, Direction, HistoryPaginator, IdempotencyKey, TransferEngine, TransferError,
    TransferPage, TransferView,
};
pub use user_auth::UserAuthService;
