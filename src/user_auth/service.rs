use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::account::{AccountRepository, UserRepository};
use crate::core_types::{AccountId, UserId};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email is required")]
    EmailRequired,

    #[error("password must be at least 8 characters")]
    WeakPassword,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("token error: {0}")]
    Token(String),

    #[error("internal auth error: {0}")]
    Internal(String),
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

impl Claims {
    /// The authenticated actor id carried by this token
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResult {
    pub user_id: UserId,
    pub email: String,
    pub account_id: AccountId,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
    pub expires_in_seconds: i64,
}

pub struct UserAuthService {
    db: PgPool,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl UserAuthService {
    pub fn new(db: PgPool, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            db,
            jwt_secret,
            token_ttl_hours,
        }
    }

    /// Register a new user and open their default CHEQUING CAD account
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisterResult, AuthError> {
        let email = normalize_email(email)?;

        if password.len() < 8 {
            return Err(AuthError::WeakPassword);
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("hashing failed: {}", e)))?
            .to_string();

        let mut tx = self.db.begin().await?;

        let user_id = match UserRepository::create(&mut *tx, &email, &password_hash).await {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        let account = AccountRepository::create(&mut *tx, user_id, "CHEQUING", "CAD").await?;

        tx.commit().await?;

        tracing::info!(user_id = user_id, account_id = account.id, "user registered");

        Ok(RegisterResult {
            user_id,
            email,
            account_id: account.id,
        })
    }

    /// Login and issue a JWT
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let email = normalize_email(email)?;

        let user = UserRepository::get_by_email(&self.db, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed_hash =
            PasswordHash::new(&user.password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::hours(self.token_ttl_hours))
            .ok_or_else(|| AuthError::Internal("invalid expiry".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: user.id.to_string(),
            exp: expiration as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(e.to_string()))?;

        Ok(LoginResult {
            token,
            user_id: user.id,
            email: user.email,
            expires_in_seconds: self.token_ttl_hours * 3600,
        })
    }

    /// Verify a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        Ok(token_data.claims)
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AuthError::EmailRequired);
    }
    Ok(normalized)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(matches!(normalize_email("   "), Err(AuthError::EmailRequired)));
    }

    #[test]
    fn test_claims_user_id() {
        let claims = Claims {
            sub: "42".to_string(),
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.user_id(), Some(42));

        let bad = Claims {
            sub: "not-a-number".to_string(),
            exp: 0,
            iat: 0,
        };
        assert_eq!(bad.user_id(), None);
    }
}
