use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// One audit trail record. `user_id` is the acting account when known;
/// system-initiated actions leave it empty.
#[derive(Debug)]
pub struct AuditEntry<'a> {
    pub user_id: Option<Uuid>,
    pub action: &'a str,
    pub resource: &'a str,
    pub metadata: Value,
}

impl AuditEntry<'_> {
    /// Persist the entry. Callers treat a failure as non-fatal and log
    /// a warning; an audit miss never fails the request.
    pub async fn record(self, pool: &DbPool) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (id, user_id, action, resource, metadata)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(self.user_id)
        .bind(self.action)
        .bind(self.resource)
        .bind(self.metadata)
        .execute(pool)
        .await?;

        tracing::debug!(action = self.action, resource = self.resource, "audit recorded");
        Ok(())
    }
}
