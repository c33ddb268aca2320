//! Repository layer for user and account rows

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use super::models::{Account, User};
use crate::core_types::{AccountId, Cents, UserId};

const ACCOUNT_COLUMNS: &str =
    "id, user_id, account_type, currency, balance_cents, status, created_at, updated_at";

/// User repository for CRUD operations
pub struct UserRepository;

impl UserRepository {
    /// Get user by ID
    pub async fn get_by_id(pool: &PgPool, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
        let row: Option<User> = sqlx::query_as(
            r#"SELECT id, email, password_hash, role, created_at
               FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Get user by email (emails are stored lowercased)
    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<User> = sqlx::query_as(
            r#"SELECT id, email, password_hash, role, created_at
               FROM users WHERE email = LOWER($1)"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Create a new user, returning its id
    pub async fn create(
        conn: &mut PgConnection,
        email: &str,
        password_hash: &str,
    ) -> Result<UserId, sqlx::Error> {
        let row = sqlx::query(
            r#"INSERT INTO users (email, password_hash, role)
               VALUES (LOWER($1), $2, 'USER')
               RETURNING id"#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(conn)
        .await?;

        Ok(row.get("id"))
    }
}

/// Account repository: reads for the API surface, row locks and balance
/// updates for the transfer engine.
pub struct AccountRepository;

impl AccountRepository {
    /// All accounts belonging to a user, oldest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<Account>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// An account only if it belongs to the given user.
    ///
    /// Foreign accounts come back as `None`, indistinguishable from rows
    /// that do not exist.
    pub async fn get_owned(
        pool: &PgPool,
        id: AccountId,
        user_id: UserId,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// The payee owner's ACTIVE CHEQUING account in the given currency
    pub async fn find_destination_chequing(
        pool: &PgPool,
        user_id: UserId,
        currency: &str,
    ) -> Result<Option<AccountId>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT id FROM accounts
               WHERE user_id = $1
                 AND account_type = 'CHEQUING'
                 AND currency = UPPER($2)
                 AND status = 'ACTIVE'"#,
        )
        .bind(user_id)
        .bind(currency)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

    /// Acquire an exclusive row lock on one account.
    ///
    /// Callers locking more than one account must invoke this in ascending
    /// id order; the lock is held until the transaction ends.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: AccountId,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Apply a signed balance delta to a locked account row
    pub async fn apply_balance_delta(
        conn: &mut PgConnection,
        id: AccountId,
        delta_cents: Cents,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE accounts
               SET balance_cents = balance_cents + $2, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(delta_cents)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Open a new account
    pub async fn create(
        conn: &mut PgConnection,
        user_id: UserId,
        account_type: &str,
        currency: &str,
    ) -> Result<Account, sqlx::Error> {
        let row = sqlx::query(&format!(
            "INSERT INTO accounts (user_id, account_type, currency)
             VALUES ($1, $2, UPPER($3))
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(account_type)
        .bind(currency)
        .fetch_one(conn)
        .await?;

        row_to_account(&row)
    }
}

/// Convert a database row to an Account
fn row_to_account(row: &PgRow) -> Result<Account, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: "status".into(),
        source: e.into(),
    })?;

    let account_type: String = row.try_get("account_type")?;
    let account_type = account_type
        .parse()
        .map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "account_type".into(),
            source: e.into(),
        })?;

    Ok(Account {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_type,
        currency: row.try_get("currency")?,
        balance_cents: row.try_get("balance_cents")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
