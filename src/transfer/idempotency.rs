//! Idempotency resolution
//!
//! Maps a (client key, actor) pair to at most one committed transfer.
//! The `transfers.idempotency_key` uniqueness constraint is global; the
//! actor scoping below is application logic and runs on every lookup, so
//! two users may pick the same key without colliding while a replaying
//! user always sees their original outcome.

use sqlx::PgPool;

use super::error::TransferError;
use super::types::{RequestFingerprint, TransferRow};
use crate::core_types::UserId;

/// Outcome of resolving an idempotency key before the write path runs
#[derive(Debug)]
pub enum Resolution {
    /// Key unused: proceed to create the transfer
    Fresh,
    /// Key already committed by this actor with the same request: return
    /// the existing transfer, take no locks, write nothing
    Replay(TransferRow),
}

pub struct IdempotencyResolver;

impl IdempotencyResolver {
    /// Resolve a key for an actor against the incoming request fingerprint.
    ///
    /// Errors:
    /// - `ConflictingReplay` - same actor, same key, different request
    /// - `KeyAlreadyUsed` - key belongs to another actor (message stays
    ///   generic so the other actor's existence is not revealed)
    pub async fn resolve(
        pool: &PgPool,
        actor_id: UserId,
        idempotency_key: &str,
        fingerprint: &RequestFingerprint,
    ) -> Result<Resolution, TransferError> {
        let Some(existing) = TransferRow::fetch_by_key(pool, idempotency_key).await? else {
            return Ok(Resolution::Fresh);
        };

        if existing.from_user_id != actor_id {
            return Err(TransferError::KeyAlreadyUsed);
        }

        if !fingerprint.matches(&existing) {
            return Err(TransferError::ConflictingReplay);
        }

        tracing::info!(
            transfer_id = existing.id,
            idempotency_key = idempotency_key,
            "idempotent replay, returning existing transfer"
        );

        Ok(Resolution::Replay(existing))
    }

    /// Race path: a concurrent request won the insert between our check and
    /// our write. Re-resolve by the same rules; the original storage error
    /// is only surfaced when the key is genuinely gone (the winner rolled
    /// back), which closes the check-then-insert window without holding a
    /// lock across the whole request.
    pub async fn recover_after_conflict(
        pool: &PgPool,
        actor_id: UserId,
        idempotency_key: &str,
        fingerprint: &RequestFingerprint,
        origin: sqlx::Error,
    ) -> Result<TransferRow, TransferError> {
        match Self::resolve(pool, actor_id, idempotency_key, fingerprint).await? {
            Resolution::Replay(row) => {
                tracing::info!(
                    transfer_id = row.id,
                    idempotency_key = idempotency_key,
                    "lost idempotency race, resolved to winner's transfer"
                );
                Ok(row)
            }
            Resolution::Fresh => Err(TransferError::Database(origin)),
        }
    }
}
