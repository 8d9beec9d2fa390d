use serde_json::Value;
use uuid::Uuid;

use crate::store::{AuditEntry, DocumentStore};

/// Records an admin action. Failures are logged and swallowed; auditing never
/// fails the request it describes.
pub async fn log_audit(
    store: &dyn DocumentStore,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    let entry = AuditEntry {
        user_id,
        action: action.to_string(),
        resource: resource.map(str::to_string),
        metadata,
    };
    if let Err(err) = store.record_audit(entry).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
