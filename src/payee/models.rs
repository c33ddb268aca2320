//! Payee data models

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::core_types::{AccountId, PayeeId, UserId};

/// Payee status, stored as TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayeeStatus {
    Active,
    Disabled,
}

impl PayeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayeeStatus::Active => "ACTIVE",
            PayeeStatus::Disabled => "DISABLED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PayeeStatus::Active)
    }
}

impl FromStr for PayeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(PayeeStatus::Active),
            "DISABLED" => Ok(PayeeStatus::Disabled),
            other => Err(format!("unknown payee status: {}", other)),
        }
    }
}

/// One entry in a user's payee list
#[derive(Debug, Clone, Serialize)]
pub struct Payee {
    pub id: PayeeId,
    pub owner_user_id: UserId,
    pub payee_user_id: UserId,
    pub payee_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: PayeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payee reference resolved to a concrete destination for a transfer
#[derive(Debug, Clone)]
pub struct PayeeDestination {
    pub payee_id: PayeeId,
    pub account_id: AccountId,
    pub owner_user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payee_status_roundtrip() {
        assert_eq!("ACTIVE".parse::<PayeeStatus>(), Ok(PayeeStatus::Active));
        assert_eq!("DISABLED".parse::<PayeeStatus>(), Ok(PayeeStatus::Disabled));
        assert!("PENDING".parse::<PayeeStatus>().is_err());
    }
}
