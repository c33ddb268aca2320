//! Payee directory operations

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;

use super::models::{Payee, PayeeDestination, PayeeStatus};
use crate::account::AccountRepository;
use crate::audit::AuditRecorder;
use crate::core_types::{PayeeId, UserId};

#[derive(Debug, Error)]
pub enum PayeeError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("payee not found")]
    NotFound,

    #[error("payee is disabled")]
    Disabled,

    #[error("payee account not found")]
    DestinationAccountNotFound,

    #[error("payee email not found")]
    EmailNotFound,

    #[error("cannot add yourself as payee")]
    SelfPayee,

    #[error("payee already exists")]
    AlreadyExists,
}

const PAYEE_COLUMNS: &str =
    "id, owner_user_id, payee_user_id, payee_email, label, status, created_at, updated_at";

pub struct PayeeDirectory;

impl PayeeDirectory {
    /// Resolve a payee reference to a destination account for a transfer.
    ///
    /// The payee row must belong to the actor and be ACTIVE; the
    /// destination is the payee owner's ACTIVE CHEQUING account in the
    /// requested currency.
    pub async fn resolve_destination(
        pool: &PgPool,
        actor_id: UserId,
        payee_id: PayeeId,
        currency: &str,
    ) -> Result<PayeeDestination, PayeeError> {
        let payee = Self::get_owned(pool, actor_id, payee_id)
            .await?
            .ok_or(PayeeError::NotFound)?;

        if !payee.status.is_active() {
            return Err(PayeeError::Disabled);
        }

        let account_id =
            AccountRepository::find_destination_chequing(pool, payee.payee_user_id, currency)
                .await?
                .ok_or(PayeeError::DestinationAccountNotFound)?;

        Ok(PayeeDestination {
            payee_id: payee.id,
            account_id,
            owner_user_id: payee.payee_user_id,
        })
    }

    /// Add a payee by the target user's email.
    ///
    /// Re-adding a DISABLED payee re-enables it instead of duplicating the
    /// row; a concurrent duplicate insert surfaces as `AlreadyExists`.
    pub async fn add_payee(
        pool: &PgPool,
        owner_id: UserId,
        email: &str,
        label: Option<&str>,
    ) -> Result<Payee, PayeeError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(PayeeError::EmailNotFound);
        }

        let payee_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(pool)
            .await?
            .ok_or(PayeeError::EmailNotFound)?;
        let payee_user_id: UserId = payee_user.get("id");

        if payee_user_id == owner_id {
            return Err(PayeeError::SelfPayee);
        }

        let label = label.map(str::trim).filter(|l| !l.is_empty());

        let mut tx = pool.begin().await?;

        let existing = sqlx::query(&format!(
            "SELECT {PAYEE_COLUMNS} FROM payees
             WHERE owner_user_id = $1 AND payee_user_id = $2
             FOR UPDATE"
        ))
        .bind(owner_id)
        .bind(payee_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            let payee = row_to_payee(&row)?;
            if payee.status.is_active() {
                return Err(PayeeError::AlreadyExists);
            }

            let row = sqlx::query(&format!(
                "UPDATE payees
                 SET status = 'ACTIVE', label = COALESCE($3, label), updated_at = NOW()
                 WHERE id = $1 AND owner_user_id = $2
                 RETURNING {PAYEE_COLUMNS}"
            ))
            .bind(payee.id)
            .bind(owner_id)
            .bind(label)
            .fetch_one(&mut *tx)
            .await?;
            let payee = row_to_payee(&row)?;

            AuditRecorder::record(
                &mut *tx,
                Some(owner_id),
                "PAYEE_ENABLE",
                "payee",
                &payee.id.to_string(),
                &format!(
                    "payee_email={}, payee_user_id={}",
                    payee.payee_email, payee.payee_user_id
                ),
            )
            .await?;

            tx.commit().await?;
            return Ok(payee);
        }

        let inserted = sqlx::query(&format!(
            "INSERT INTO payees (owner_user_id, payee_user_id, payee_email, label)
             VALUES ($1, $2, $3, $4)
             RETURNING {PAYEE_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(payee_user_id)
        .bind(&email)
        .bind(label)
        .fetch_one(&mut *tx)
        .await;

        let payee = match inserted {
            Ok(row) => row_to_payee(&row)?,
            Err(e) if is_unique_violation(&e) => return Err(PayeeError::AlreadyExists),
            Err(e) => return Err(e.into()),
        };

        AuditRecorder::record(
            &mut *tx,
            Some(owner_id),
            "PAYEE_ADD",
            "payee",
            &payee.id.to_string(),
            &format!(
                "payee_email={}, payee_user_id={}",
                payee.payee_email, payee.payee_user_id
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(payee)
    }

    /// All of a user's payees, most recently added first
    pub async fn list_payees(pool: &PgPool, owner_id: UserId) -> Result<Vec<Payee>, PayeeError> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYEE_COLUMNS} FROM payees
             WHERE owner_user_id = $1
             ORDER BY id DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .iter()
            .map(row_to_payee)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Disable a payee. Rows are never deleted so transfer history keeps
    /// resolving.
    pub async fn disable_payee(
        pool: &PgPool,
        owner_id: UserId,
        payee_id: PayeeId,
    ) -> Result<Payee, PayeeError> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE payees
             SET status = 'DISABLED', updated_at = NOW()
             WHERE id = $1 AND owner_user_id = $2
             RETURNING {PAYEE_COLUMNS}"
        ))
        .bind(payee_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PayeeError::NotFound)?;
        let payee = row_to_payee(&row)?;

        AuditRecorder::record(
            &mut *tx,
            Some(owner_id),
            "PAYEE_DISABLE",
            "payee",
            &payee.id.to_string(),
            &format!(
                "payee_email={}, payee_user_id={}",
                payee.payee_email, payee.payee_user_id
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(payee)
    }

    async fn get_owned(
        pool: &PgPool,
        owner_id: UserId,
        payee_id: PayeeId,
    ) -> Result<Option<Payee>, PayeeError> {
        let row = sqlx::query(&format!(
            "SELECT {PAYEE_COLUMNS} FROM payees
             WHERE id = $1 AND owner_user_id = $2"
        ))
        .bind(payee_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(row_to_payee).transpose()?)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Convert a database row to a Payee
fn row_to_payee(row: &PgRow) -> Result<Payee, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status: PayeeStatus = status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: "status".into(),
        source: e.into(),
    })?;

    Ok(Payee {
        id: row.try_get("id")?,
        owner_user_id: row.try_get("owner_user_id")?,
        payee_user_id: row.try_get("payee_user_id")?,
        payee_email: row.try_get("payee_email")?,
        label: row.try_get("label")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
