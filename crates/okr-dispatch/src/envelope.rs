//! Uniform result envelope
//!
//! Every dispatch outcome, success or failure, is normalized into a
//! [`ResultEnvelope`] so callers can branch on `success` without knowing
//! which handler ran.

use crate::error::ErrorKind;
use crate::types::{EntityId, EntityType, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one dispatched intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Whether the intent was carried out
    pub success: bool,
    /// Sentence surfaced to the end user
    pub message: String,
    /// Collaborator DTO, `null` on failure
    pub payload: Value,
    /// Affected entity family
    pub entity_type: Option<EntityType>,
    /// Affected entity
    pub entity_id: Option<EntityId>,
    /// Operation performed
    pub operation: Option<Operation>,
    /// Failure classification, `None` on success
    pub error_kind: Option<ErrorKind>,
}

impl ResultEnvelope {
    /// Build a success envelope
    ///
    /// A payload that fails to serialize degrades to `null`.
    pub fn ok<P: Serialize + ?Sized>(
        payload: &P,
        entity_type: EntityType,
        entity_id: Option<EntityId>,
        operation: Operation,
        message: impl Into<String>,
    ) -> Self {
        let payload = serde_json::to_value(payload).unwrap_or_else(|err| {
            tracing::warn!(%err, entity_type = %entity_type, "payload not serializable");
            Value::Null
        });
        Self {
            success: true,
            message: message.into(),
            payload,
            entity_type: Some(entity_type),
            entity_id,
            operation: Some(operation),
            error_kind: None,
        }
    }

    /// Build a failure envelope
    #[must_use]
    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: Value::Null,
            entity_type: None,
            entity_id: None,
            operation: None,
            error_kind: Some(kind),
        }
    }

    /// Failure asking the user for more information
    #[inline]
    #[must_use]
    pub fn guidance(message: impl Into<String>) -> Self {
        Self::fail(ErrorKind::Guidance, message)
    }

    /// Failure for an intent no handler claims
    #[inline]
    #[must_use]
    pub fn unrouted(intent: &str) -> Self {
        Self::fail(
            ErrorKind::Unrouted,
            format!("I don't know how to handle the '{intent}' intent."),
        )
    }

    /// Attach the entity family and operation a failure relates to
    #[inline]
    #[must_use]
    pub fn about(mut self, entity_type: EntityType, operation: Operation) -> Self {
        self.entity_type = Some(entity_type);
        self.operation = Some(operation);
        self
    }

    /// Check for success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Serialize)]
    struct Dto {
        id: &'static str,
    }

    #[test]
    fn ok_carries_everything() {
        let env = ResultEnvelope::ok(
            &Dto { id: "t1" },
            EntityType::KeyResultTask,
            Some(EntityId::new("t1")),
            Operation::Create,
            "Created task.",
        );
        assert!(env.is_success());
        assert_eq!(env.payload, json!({"id": "t1"}));
        assert_eq!(env.error_kind, None);
    }

    #[test]
    fn fail_has_no_payload() {
        let env = ResultEnvelope::fail(ErrorKind::NotFound, "nope");
        assert!(!env.success);
        assert_eq!(env.payload, Value::Null);
        assert_eq!(env.entity_type, None);
        assert_eq!(env.error_kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn unrouted_mentions_intent() {
        let env = ResultEnvelope::unrouted("NotARealIntent");
        assert!(env.message.contains("NotARealIntent"));
        assert_eq!(env.error_kind, Some(ErrorKind::Unrouted));
    }

    #[test]
    fn serializes_camel_case() {
        let env = ResultEnvelope::ok(
            &Dto { id: "t1" },
            EntityType::KeyResultTask,
            Some(EntityId::new("t1")),
            Operation::Create,
            "ok",
        );
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "message": "ok",
                "payload": {"id": "t1"},
                "entityType": "KeyResultTask",
                "entityId": "t1",
                "operation": "Create",
                "errorKind": null,
            })
        );
    }
}
