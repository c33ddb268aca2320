//! Ledger - double-entry audit record
//!
//! Every committed transfer is recorded as one DEBIT on the source account
//! and one CREDIT on the destination, written in the same transaction as
//! the balance updates. Entries are append-only and never mutated.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::str::FromStr;

use crate::core_types::{AccountId, Cents, LedgerEntryId, TransferId};

/// Direction of a ledger entry, stored as TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDirection {
    Debit,
    Credit,
}

impl LedgerDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerDirection::Debit => "DEBIT",
            LedgerDirection::Credit => "CREDIT",
        }
    }

    /// Sign of this entry when summing an account's history
    pub fn sign(&self) -> Cents {
        match self {
            LedgerDirection::Debit => -1,
            LedgerDirection::Credit => 1,
        }
    }
}

impl FromStr for LedgerDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(LedgerDirection::Debit),
            "CREDIT" => Ok(LedgerDirection::Credit),
            other => Err(format!("unknown ledger direction: {}", other)),
        }
    }
}

/// One leg of a balanced movement.
///
/// `transfer_id` is NULL only for non-transfer movements (external
/// deposits), which are written by a separate collaborator.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub transfer_id: Option<TransferId>,
    pub account_id: AccountId,
    pub direction: LedgerDirection,
    pub amount_cents: Cents,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only store over `ledger_entries`
pub struct LedgerStore;

impl LedgerStore {
    /// Write the balanced DEBIT/CREDIT pair for a transfer.
    ///
    /// Must run on the transaction that holds both account locks.
    pub async fn append_double_entry(
        conn: &mut PgConnection,
        transfer_id: TransferId,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount_cents: Cents,
        currency: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO ledger_entries (transfer_id, account_id, direction, amount_cents, currency)
               VALUES ($1, $2, 'DEBIT', $4, $5),
                      ($1, $3, 'CREDIT', $4, $5)"#,
        )
        .bind(transfer_id)
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount_cents)
        .bind(currency)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Both legs of a transfer, debit first
    pub async fn entries_for_transfer(
        pool: &PgPool,
        transfer_id: TransferId,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT id, transfer_id, account_id, direction, amount_cents, currency, created_at
               FROM ledger_entries
               WHERE transfer_id = $1
               ORDER BY id ASC"#,
        )
        .bind(transfer_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Signed sum of all entries for an account (credits minus debits).
    ///
    /// For a consistent store this equals the account's balance.
    pub async fn signed_sum_for_account(
        pool: &PgPool,
        account_id: AccountId,
    ) -> Result<Cents, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT COALESCE(SUM(
                   CASE direction WHEN 'CREDIT' THEN amount_cents ELSE -amount_cents END
               ), 0)::BIGINT AS signed_sum
               FROM ledger_entries
               WHERE account_id = $1"#,
        )
        .bind(account_id)
        .fetch_one(pool)
        .await?;

        Ok(row.get("signed_sum"))
    }
}

/// Convert a database row to a LedgerEntry
fn row_to_entry(row: &PgRow) -> Result<LedgerEntry, sqlx::Error> {
    let direction: String = row.try_get("direction")?;
    let direction = direction
        .parse()
        .map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "direction".into(),
            source: e.into(),
        })?;

    Ok(LedgerEntry {
        id: row.try_get("id")?,
        transfer_id: row.try_get("transfer_id")?,
        account_id: row.try_get("account_id")?,
        direction,
        amount_cents: row.try_get("amount_cents")?,
        currency: row.try_get("currency")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_roundtrip() {
        assert_eq!("DEBIT".parse::<LedgerDirection>(), Ok(LedgerDirection::Debit));
        assert_eq!("CREDIT".parse::<LedgerDirection>(), Ok(LedgerDirection::Credit));
        assert!("credit".parse::<LedgerDirection>().is_err());
    }

    #[test]
    fn test_direction_signs_balance() {
        // A balanced pair must sum to zero for equal amounts.
        let amount = 2_500;
        let sum = LedgerDirection::Debit.sign() * amount + LedgerDirection::Credit.sign() * amount;
        assert_eq!(sum, 0);
    }
}
