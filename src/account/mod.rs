//! Account management module
//!
//! PostgreSQL-based storage for users and their bank accounts. Balances are
//! mutated exclusively by the transfer engine; everything here is plain
//! create/read plumbing plus the row-lock primitive the engine builds on.

pub mod db;
pub mod models;
pub mod repository;

// Re-export commonly used types
pub use db::Database;
pub use models::{Account, AccountStatus, AccountType, User};
pub use repository::{AccountRepository, UserRepository};
