//! Audit trail
//!
//! Writes structured audit facts into `audit_log`. Callers mutating state
//! must pass their open transaction so the audit row commits or rolls back
//! together with the change it describes.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::core_types::UserId;

/// Audit sink over the `audit_log` table
pub struct AuditRecorder;

impl AuditRecorder {
    /// Record one audit fact inside the caller's transaction
    pub async fn record(
        conn: &mut PgConnection,
        actor_user_id: Option<UserId>,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        details: &str,
    ) -> Result<(), sqlx::Error> {
        let correlation_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO audit_log (actor_user_id, action, entity_type, entity_id, details, correlation_id)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(actor_user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(details)
        .bind(&correlation_id)
        .execute(conn)
        .await?;

        tracing::debug!(
            action = action,
            entity_type = entity_type,
            entity_id = entity_id,
            correlation_id = %correlation_id,
            "audit fact recorded"
        );

        Ok(())
    }
}
