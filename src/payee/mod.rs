//! Payee directory
//!
//! Each user keeps a private list of payees (other registered users they
//! can send to). The transfer engine consumes this module through
//! [`PayeeDirectory::resolve_destination`]; the rest is account-book CRUD.

pub mod models;
pub mod service;

pub use models::{Payee, PayeeDestination, PayeeStatus};
pub use service::{PayeeDirectory, PayeeError};
