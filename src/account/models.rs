//! Data models for users and bank accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::core_types::{AccountId, Cents, UserId};

/// Account status, stored as TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Frozen,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Frozen => "FROZEN",
            AccountStatus::Closed => "CLOSED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "FROZEN" => Ok(AccountStatus::Frozen),
            "CLOSED" => Ok(AccountStatus::Closed),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

/// Account type, stored as TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Chequing,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Chequing => "CHEQUING",
            AccountType::Savings => "SAVINGS",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHEQUING" => Ok(AccountType::Chequing),
            "SAVINGS" => Ok(AccountType::Savings),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// A user's bank account.
///
/// `balance_cents` is the sum of all signed ledger entries for the account
/// and is never negative after a committed debit.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub account_type: AccountType,
    pub currency: String,
    pub balance_cents: Cents,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registered user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_status_roundtrip() {
        for s in [AccountStatus::Active, AccountStatus::Frozen, AccountStatus::Closed] {
            assert_eq!(s.as_str().parse::<AccountStatus>(), Ok(s));
        }
        assert!("active".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn test_account_type_roundtrip() {
        assert_eq!("CHEQUING".parse::<AccountType>(), Ok(AccountType::Chequing));
        assert_eq!("SAVINGS".parse::<AccountType>(), Ok(AccountType::Savings));
        assert!("TFSA".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_only_active_accounts_transact() {
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Frozen.is_active());
        assert!(!AccountStatus::Closed.is_active());
    }
}
