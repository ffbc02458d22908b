//! Append-only audit log
//!
//! One record per mutating operation, written in the same atomic batch as
//! the mutation itself. Keys are UUIDv7, so the audit column family scans
//! in time order. Records are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Acting user
    pub actor_id: Option<Uuid>,

    /// Action name, e.g. `affiliate.enroll`
    pub action: String,

    /// Resource type, e.g. `affiliate`, `order`
    pub resource_type: String,

    /// Resource ID
    pub resource_id: Option<Uuid>,

    /// State before the mutation (JSON)
    pub old_values: Option<serde_json::Value>,

    /// State after the mutation (JSON)
    pub new_values: Option<serde_json::Value>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a record for an action on a resource
    pub fn new(
        actor_id: Option<Uuid>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id,
            old_values: None,
            new_values: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the before-state
    pub fn with_old_values(mut self, values: serde_json::Value) -> Self {
        self.old_values = Some(values);
        self
    }

    /// Attach the after-state
    pub fn with_new_values(mut self, values: serde_json::Value) -> Self {
        self.new_values = Some(values);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_builder() {
        let actor = Uuid::new_v4();
        let resource = Uuid::new_v4();
        let record = AuditRecord::new(Some(actor), "order.confirm_payment", "order", Some(resource))
            .with_old_values(json!({"status": "pending_payment"}))
            .with_new_values(json!({"status": "paid"}));

        assert_eq!(record.action, "order.confirm_payment");
        assert_eq!(record.old_values.unwrap()["status"], "pending_payment");
        assert_eq!(record.new_values.unwrap()["status"], "paid");
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let a = AuditRecord::new(None, "a", "x", None);
        let b = AuditRecord::new(None, "b", "x", None);
        assert!(a.id.as_bytes() < b.id.as_bytes());
    }
}
