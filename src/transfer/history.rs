//! Transfer history pagination
//!
//! Reverse-chronological pages over a user's transfers with an opaque
//! cursor. Ordering is strictly descending on (created_at, id); the id
//! tie-break makes the order total, so pages never duplicate or skip rows
//! even when several transfers share a timestamp.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::error::TransferError;
use super::types::{TRANSFER_ROW_SELECT, TransferView, row_to_transfer};
use crate::core_types::{TransferId, UserId};

/// Position in the (created_at, id) descending order.
///
/// Encoded as URL-safe base64 of `createdAtEpochMillis:id`. The
/// `transfers.created_at` column stores millisecond precision, so the
/// encoding round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: TransferId,
}

impl Cursor {
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    /// Decode an opaque cursor; any malformed input is the caller's bad
    /// request (`InvalidCursor`), never a server error.
    pub fn decode(token: &str) -> Result<Self, TransferError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| TransferError::InvalidCursor)?;
        let raw = String::from_utf8(bytes).map_err(|_| TransferError::InvalidCursor)?;

        let (millis, id) = raw.split_once(':').ok_or(TransferError::InvalidCursor)?;
        let millis: i64 = millis.parse().map_err(|_| TransferError::InvalidCursor)?;
        let id: TransferId = id.parse().map_err(|_| TransferError::InvalidCursor)?;

        let created_at =
            DateTime::from_timestamp_millis(millis).ok_or(TransferError::InvalidCursor)?;

        Ok(Self { created_at, id })
    }
}

/// One page of a user's transfer history
#[derive(Debug)]
pub struct TransferPage {
    pub items: Vec<TransferView>,
    pub next_cursor: Option<String>,
}

pub struct HistoryPaginator;

impl HistoryPaginator {
    pub const MIN_PAGE_SIZE: i64 = 1;
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Fetch one page of transfers where the actor owns either side.
    ///
    /// Fetches size+1 rows; the extra row only signals that another page
    /// exists and becomes the next cursor's anchor after truncation.
    pub async fn list(
        pool: &PgPool,
        actor_id: UserId,
        limit: i64,
        cursor: Option<&str>,
    ) -> Result<TransferPage, TransferError> {
        let size = limit.clamp(Self::MIN_PAGE_SIZE, Self::MAX_PAGE_SIZE);

        let rows = match cursor {
            None => {
                sqlx::query(&format!(
                    "{TRANSFER_ROW_SELECT}
                     WHERE (sa.user_id = $1 OR da.user_id = $1)
                     ORDER BY t.created_at DESC, t.id DESC
                     LIMIT $2"
                ))
                .bind(actor_id)
                .bind(size + 1)
                .fetch_all(pool)
                .await?
            }
            Some(token) => {
                let before = Cursor::decode(token)?;
                sqlx::query(&format!(
                    "{TRANSFER_ROW_SELECT}
                     WHERE (sa.user_id = $1 OR da.user_id = $1)
                       AND (t.created_at < $2 OR (t.created_at = $2 AND t.id < $3))
                     ORDER BY t.created_at DESC, t.id DESC
                     LIMIT $4"
                ))
                .bind(actor_id)
                .bind(before.created_at)
                .bind(before.id)
                .bind(size + 1)
                .fetch_all(pool)
                .await?
            }
        };

        let mut transfers = rows
            .iter()
            .map(row_to_transfer)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if transfers.len() as i64 > size {
            transfers.truncate(size as usize);
            transfers.last().map(|last| {
                Cursor {
                    created_at: last.created_at,
                    id: last.id,
                }
                .encode()
            })
        } else {
            None
        };

        let items = transfers
            .into_iter()
            .map(|row| row.view_for(actor_id))
            .collect();

        Ok(TransferPage { items, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let cursor = Cursor {
            created_at: DateTime::from_timestamp_millis(1_722_470_400_123).unwrap(),
            id: 987,
        };
        let token = cursor.encode();
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_cursor_is_opaque_url_safe() {
        let token = Cursor {
            created_at: Utc::now(),
            id: 1,
        }
        .encode();
        assert!(!token.contains(':'));
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_cursor_decode_rejects_garbage() {
        assert!(matches!(
            Cursor::decode("not base64 !!!"),
            Err(TransferError::InvalidCursor)
        ));

        // valid base64, wrong payload shape
        let no_colon = URL_SAFE_NO_PAD.encode(b"17224704001234");
        assert!(matches!(
            Cursor::decode(&no_colon),
            Err(TransferError::InvalidCursor)
        ));

        let non_numeric = URL_SAFE_NO_PAD.encode(b"abc:def");
        assert!(matches!(
            Cursor::decode(&non_numeric),
            Err(TransferError::InvalidCursor)
        ));

        let out_of_range = URL_SAFE_NO_PAD.encode(format!("{}:1", i64::MAX).as_bytes());
        assert!(matches!(
            Cursor::decode(&out_of_range),
            Err(TransferError::InvalidCursor)
        ));
    }

    #[test]
    fn test_cursor_millis_precision_survives() {
        // The tie-break anchor must come back bit-identical: equality on
        // created_at is part of the page predicate.
        let cursor = Cursor {
            created_at: DateTime::from_timestamp_millis(1_700_000_000_001).unwrap(),
            id: 5,
        };
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.created_at.timestamp_millis(), 1_700_000_000_001);
    }
}
