//! Gateway request/response types

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::Account;
use crate::core_types::{AccountId, Cents, PayeeId};
use crate::transfer::TransferView;

// ============================================================================
// Response envelope
// ============================================================================

/// Uniform API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    pub code: i32,
    /// Response message
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Accounts
// ============================================================================

/// Account as exposed to its owner
#[derive(Debug, Serialize)]
pub struct AccountData {
    pub id: AccountId,
    pub account_type: String,
    pub currency: String,
    pub balance_cents: Cents,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountData {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            account_type: a.account_type.as_str().to_string(),
            currency: a.currency,
            balance_cents: a.balance_cents,
            status: a.status.as_str().to_string(),
            created_at: a.created_at,
        }
    }
}

// ============================================================================
// Payees
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayeeRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub label: Option<String>,
}

// ============================================================================
// Transfers
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransferRequest {
    pub from_account_id: AccountId,
    pub payee_id: PayeeId,
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount_cents: Cents,
    #[validate(length(min = 3, max = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// One page of transfer history
#[derive(Debug, Serialize)]
pub struct TransferPageData {
    pub items: Vec<TransferView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
