//! Transfer core types
//!
//! Request/response shapes for the engine, the joined row it reads back
//! from storage, and the validated idempotency key.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::fmt;
use std::str::FromStr;

use super::error::TransferError;
use crate::core_types::{AccountId, Cents, PayeeId, TransferId, UserId};

/// Transfer status, stored as TEXT.
///
/// The engine only ever persists `Completed`; `Initiated` exists for a
/// future multi-step settlement path and is never written today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Initiated,
    Completed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Initiated => "INITIATED",
            TransferStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATED" => Ok(TransferStatus::Initiated),
            "COMPLETED" => Ok(TransferStatus::Completed),
            other => Err(format!("unknown transfer status: {}", other)),
        }
    }
}

/// Client-supplied idempotency key, validated before any side effect.
///
/// Opaque to the core: 1-128 characters of `[A-Za-z0-9._:-]` (UUIDs and
/// other client-generated tokens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn parse(raw: &str) -> Result<Self, TransferError> {
        let key = raw.trim();

        if key.is_empty() || key.len() > 128 {
            return Err(TransferError::InvalidIdempotencyKey);
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'))
        {
            return Err(TransferError::InvalidIdempotencyKey);
        }

        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a requested currency code.
///
/// Falls back to the source account's home currency when absent, then
/// uppercases and requires exactly 3 ASCII letters.
pub fn normalize_currency(
    requested: Option<&str>,
    home_currency: &str,
) -> Result<String, TransferError> {
    let raw = match requested {
        Some(c) if !c.trim().is_empty() => c.trim(),
        _ => home_currency,
    };

    let currency = raw.to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(TransferError::InvalidCurrency);
    }

    Ok(currency)
}

/// Transfer intent as it enters the engine.
///
/// The destination is still a payee reference; resolution to an account
/// happens inside the engine.
#[derive(Debug, Clone)]
pub struct CreateTransfer {
    pub from_account_id: AccountId,
    pub payee_id: PayeeId,
    pub amount_cents: Cents,
    pub currency: Option<String>,
}

/// The semantically meaningful subset of a request, used to decide whether
/// a replayed idempotency key matches its original request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFingerprint {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount_cents: Cents,
    pub currency: String,
}

impl RequestFingerprint {
    /// Compare against the persisted transfer a key resolved to
    pub fn matches(&self, row: &TransferRow) -> bool {
        self.from_account_id == row.from_account_id
            && self.to_account_id == row.to_account_id
            && self.amount_cents == row.amount_cents
            && self.currency.eq_ignore_ascii_case(&row.currency)
    }
}

/// Which side of a transfer the requesting actor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Sent,
    Received,
    Unknown,
}

/// A transfer row joined with both account owners.
///
/// This is the shape every read path (replay, post-commit fetch, history
/// pages) shares; the owner ids drive actor scoping and the emails feed
/// the counterparty field of the view.
#[derive(Debug, Clone)]
pub struct TransferRow {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount_cents: Cents,
    pub currency: String,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub from_email: String,
    pub to_email: String,
}

pub(crate) const TRANSFER_ROW_SELECT: &str = r#"
    SELECT t.id, t.from_account_id, t.to_account_id, t.amount_cents, t.currency,
           t.status, t.created_at,
           sa.user_id AS from_user_id, da.user_id AS to_user_id,
           su.email AS from_email, du.email AS to_email
    FROM transfers t
    JOIN accounts sa ON sa.id = t.from_account_id
    JOIN accounts da ON da.id = t.to_account_id
    JOIN users su ON su.id = sa.user_id
    JOIN users du ON du.id = da.user_id
"#;

impl TransferRow {
    pub async fn fetch_by_id(
        pool: &PgPool,
        id: TransferId,
    ) -> Result<Option<TransferRow>, sqlx::Error> {
        let row = sqlx::query(&format!("{TRANSFER_ROW_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(row_to_transfer).transpose()
    }

    /// Global lookup by idempotency key; actor scoping is the resolver's job
    pub async fn fetch_by_key(
        pool: &PgPool,
        idempotency_key: &str,
    ) -> Result<Option<TransferRow>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "{TRANSFER_ROW_SELECT} WHERE t.idempotency_key = $1"
        ))
        .bind(idempotency_key)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(row_to_transfer).transpose()
    }

    /// Project this row for the given actor
    pub fn view_for(&self, actor_id: UserId) -> TransferView {
        let (direction, counterparty_email) = if actor_id == self.from_user_id {
            (Direction::Sent, Some(self.to_email.clone()))
        } else if actor_id == self.to_user_id {
            (Direction::Received, Some(self.from_email.clone()))
        } else {
            (Direction::Unknown, None)
        };

        TransferView {
            id: self.id,
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            amount_cents: self.amount_cents,
            currency: self.currency.clone(),
            status: self.status,
            created_at: self.created_at,
            direction,
            counterparty_email,
        }
    }
}

/// Convert a joined database row to a TransferRow
pub(crate) fn row_to_transfer(row: &PgRow) -> Result<TransferRow, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: "status".into(),
        source: e.into(),
    })?;

    Ok(TransferRow {
        id: row.try_get("id")?,
        from_account_id: row.try_get("from_account_id")?,
        to_account_id: row.try_get("to_account_id")?,
        amount_cents: row.try_get("amount_cents")?,
        currency: row.try_get("currency")?,
        status,
        created_at: row.try_get("created_at")?,
        from_user_id: row.try_get("from_user_id")?,
        to_user_id: row.try_get("to_user_id")?,
        from_email: row.try_get("from_email")?,
        to_email: row.try_get("to_email")?,
    })
}

/// Transfer as returned to the requesting actor
#[derive(Debug, Clone, Serialize)]
pub struct TransferView {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount_cents: Cents,
    pub currency: String,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> TransferRow {
        TransferRow {
            id: 42,
            from_account_id: 1,
            to_account_id: 2,
            amount_cents: 1_500,
            currency: "CAD".to_string(),
            status: TransferStatus::Completed,
            created_at: Utc::now(),
            from_user_id: 10,
            to_user_id: 20,
            from_email: "alice@example.com".to_string(),
            to_email: "bob@example.com".to_string(),
        }
    }

    #[test]
    fn test_idempotency_key_valid() {
        assert!(IdempotencyKey::parse("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(IdempotencyKey::parse("client.retry_1:attempt-2").is_ok());
        assert!(IdempotencyKey::parse("k").is_ok());
        assert!(IdempotencyKey::parse(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_idempotency_key_rejected() {
        assert!(IdempotencyKey::parse("").is_err());
        assert!(IdempotencyKey::parse("   ").is_err());
        assert!(IdempotencyKey::parse(&"a".repeat(129)).is_err());
        assert!(IdempotencyKey::parse("has space").is_err());
        assert!(IdempotencyKey::parse("emoji🔥").is_err());
        assert!(IdempotencyKey::parse("slash/").is_err());
    }

    #[test]
    fn test_idempotency_key_trims_whitespace() {
        let key = IdempotencyKey::parse("  abc-123  ").unwrap();
        assert_eq!(key.as_str(), "abc-123");
    }

    #[test]
    fn test_normalize_currency_defaults_to_home() {
        assert_eq!(normalize_currency(None, "CAD").unwrap(), "CAD");
        assert_eq!(normalize_currency(Some(""), "CAD").unwrap(), "CAD");
        assert_eq!(normalize_currency(Some("  "), "usd").unwrap(), "USD");
    }

    #[test]
    fn test_normalize_currency_uppercases() {
        assert_eq!(normalize_currency(Some("usd"), "CAD").unwrap(), "USD");
        assert_eq!(normalize_currency(Some(" eur "), "CAD").unwrap(), "EUR");
    }

    #[test]
    fn test_normalize_currency_rejects_bad_codes() {
        assert!(matches!(
            normalize_currency(Some("CADX"), "CAD"),
            Err(TransferError::InvalidCurrency)
        ));
        assert!(matches!(
            normalize_currency(Some("C4"), "CAD"),
            Err(TransferError::InvalidCurrency)
        ));
        assert!(matches!(
            normalize_currency(Some("12$"), "CAD"),
            Err(TransferError::InvalidCurrency)
        ));
    }

    #[test]
    fn test_fingerprint_matches_same_request() {
        let row = sample_row();
        let fp = RequestFingerprint {
            from_account_id: 1,
            to_account_id: 2,
            amount_cents: 1_500,
            currency: "cad".to_string(),
        };
        assert!(fp.matches(&row));
    }

    #[test]
    fn test_fingerprint_rejects_changed_amount() {
        let row = sample_row();
        let fp = RequestFingerprint {
            from_account_id: 1,
            to_account_id: 2,
            amount_cents: 1_600,
            currency: "CAD".to_string(),
        };
        assert!(!fp.matches(&row));
    }

    #[test]
    fn test_view_direction_per_actor() {
        let row = sample_row();

        let sent = row.view_for(10);
        assert_eq!(sent.direction, Direction::Sent);
        assert_eq!(sent.counterparty_email.as_deref(), Some("bob@example.com"));

        let received = row.view_for(20);
        assert_eq!(received.direction, Direction::Received);
        assert_eq!(
            received.counterparty_email.as_deref(),
            Some("alice@example.com")
        );

        let outsider = row.view_for(99);
        assert_eq!(outsider.direction, Direction::Unknown);
        assert!(outsider.counterparty_email.is_none());
    }
}
