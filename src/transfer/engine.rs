//! Transfer engine
//!
//! Orchestrates one transfer request end to end: idempotency resolution,
//! payee destination resolution, ordered account locking, invariant
//! checks, the double-entry ledger write, both balance updates and the
//! audit fact - all inside a single transaction. A failure at any step
//! rolls the whole unit back; the only externally observable state is a
//! COMPLETED transfer.

use sqlx::{PgConnection, PgPool, Row};

use super::error::TransferError;
use super::guard::AccountLedgerGuard;
use super::history::{HistoryPaginator, TransferPage};
use super::idempotency::{IdempotencyResolver, Resolution};
use super::types::{
    CreateTransfer, IdempotencyKey, RequestFingerprint, TransferRow, TransferView,
    normalize_currency,
};
use crate::account::AccountRepository;
use crate::audit::AuditRecorder;
use crate::core_types::{AccountId, Cents, TransferId, UserId};
use crate::ledger::LedgerStore;
use crate::payee::{PayeeDirectory, PayeeError};

#[derive(Clone)]
pub struct TransferEngine {
    pool: PgPool,
}

impl TransferEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Execute one transfer request exactly once.
    ///
    /// A replayed idempotency key returns the original outcome without
    /// taking locks or writing anything; two simultaneous identical
    /// requests resolve to a single transfer row via the storage-level
    /// uniqueness constraint and the resolver's race path.
    pub async fn create_transfer(
        &self,
        actor_id: UserId,
        idempotency_key: &str,
        req: CreateTransfer,
    ) -> Result<TransferView, TransferError> {
        // Key and amount are rejected before any side effect.
        let key = IdempotencyKey::parse(idempotency_key)?;
        if req.amount_cents <= 0 {
            return Err(TransferError::InvalidAmount);
        }

        // Unlocked read to establish ownership and the home currency; the
        // guard re-checks both under lock.
        let source = AccountRepository::get_owned(&self.pool, req.from_account_id, actor_id)
            .await?
            .ok_or(TransferError::NotFound)?;

        let currency = normalize_currency(req.currency.as_deref(), &source.currency)?;

        let destination =
            PayeeDirectory::resolve_destination(&self.pool, actor_id, req.payee_id, &currency)
                .await
                .map_err(map_payee_error)?;

        if req.from_account_id == destination.account_id {
            return Err(TransferError::SameAccount);
        }

        let fingerprint = RequestFingerprint {
            from_account_id: req.from_account_id,
            to_account_id: destination.account_id,
            amount_cents: req.amount_cents,
            currency: currency.clone(),
        };

        if let Resolution::Replay(existing) =
            IdempotencyResolver::resolve(&self.pool, actor_id, key.as_str(), &fingerprint).await?
        {
            return Ok(existing.view_for(actor_id));
        }

        // Everything below is one atomic unit: locks, transfer row, both
        // ledger legs, both balance updates and the audit fact.
        let mut tx = self.pool.begin().await?;

        let locked = AccountLedgerGuard::lock_and_validate(
            &mut *tx,
            actor_id,
            destination.owner_user_id,
            req.from_account_id,
            destination.account_id,
            req.amount_cents,
            &currency,
        )
        .await?;

        let transfer_id = match insert_completed(
            &mut *tx,
            locked.source.id,
            locked.destination.id,
            req.amount_cents,
            &currency,
            key.as_str(),
        )
        .await
        {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                // A concurrent request with the same key won the insert.
                tx.rollback().await?;
                let winner = IdempotencyResolver::recover_after_conflict(
                    &self.pool,
                    actor_id,
                    key.as_str(),
                    &fingerprint,
                    e,
                )
                .await?;
                return Ok(winner.view_for(actor_id));
            }
            Err(e) => return Err(e.into()),
        };

        LedgerStore::append_double_entry(
            &mut *tx,
            transfer_id,
            locked.source.id,
            locked.destination.id,
            req.amount_cents,
            &currency,
        )
        .await?;

        AccountRepository::apply_balance_delta(&mut *tx, locked.source.id, -req.amount_cents)
            .await?;
        AccountRepository::apply_balance_delta(&mut *tx, locked.destination.id, req.amount_cents)
            .await?;

        AuditRecorder::record(
            &mut *tx,
            Some(actor_id),
            "TRANSFER_CREATE",
            "transfer",
            &transfer_id.to_string(),
            &format!(
                "from={}, payee_id={}, to={}, amount_cents={}, currency={}",
                locked.source.id,
                destination.payee_id,
                locked.destination.id,
                req.amount_cents,
                currency
            ),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id = transfer_id,
            from_account_id = locked.source.id,
            to_account_id = locked.destination.id,
            amount_cents = req.amount_cents,
            currency = %currency,
            "transfer completed"
        );

        let row = TransferRow::fetch_by_id(&self.pool, transfer_id)
            .await?
            .ok_or(TransferError::Database(sqlx::Error::RowNotFound))?;

        Ok(row.view_for(actor_id))
    }

    /// Cursor-paginated history for the actor (read path, no locks)
    pub async fn list_transfers(
        &self,
        actor_id: UserId,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<TransferPage, TransferError> {
        HistoryPaginator::list(&self.pool, actor_id, limit, cursor).await
    }
}

/// Insert the transfer row in its terminal state.
///
/// COMPLETED is written directly: invariant violations abort before this
/// point, so no INITIATED row is ever durably visible.
async fn insert_completed(
    conn: &mut PgConnection,
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount_cents: Cents,
    currency: &str,
    idempotency_key: &str,
) -> Result<TransferId, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO transfers
               (from_account_id, to_account_id, amount_cents, currency, status, idempotency_key)
           VALUES ($1, $2, $3, $4, 'COMPLETED', $5)
           RETURNING id"#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(amount_cents)
    .bind(currency)
    .bind(idempotency_key)
    .fetch_one(conn)
    .await?;

    Ok(row.get("id"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn map_payee_error(e: PayeeError) -> TransferError {
    match e {
        PayeeError::Database(e) => TransferError::Database(e),
        PayeeError::NotFound => TransferError::PayeeNotFound,
        PayeeError::Disabled => TransferError::PayeeDisabled,
        // The payee has no account able to receive this currency; to the
        // caller that is the same as the account not existing.
        PayeeError::DestinationAccountNotFound => TransferError::NotFound,
        PayeeError::EmailNotFound | PayeeError::SelfPayee | PayeeError::AlreadyExists => {
            TransferError::PayeeNotFound
        }
    }
}
