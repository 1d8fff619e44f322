//! Operation definition and builder.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OperationError;

/// Operation categories.
///
/// The kind is the debounce coalescing key: at most one debounce timer is
/// live per kind, and rapid same-kind submissions collapse to the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Explicit user-initiated save.
    Save,
    /// Periodic background save.
    Autosave,
    /// Publish the current document.
    Publish,
    /// Save as draft.
    DraftSave,
}

pub(crate) type Action =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<(), OperationError>> + Send>;
pub(crate) type SuccessCallback = Box<dyn FnOnce() + Send>;
pub(crate) type ErrorCallback = Box<dyn FnOnce(&OperationError) + Send>;

/// A unit of queued asynchronous work.
pub struct Operation {
    /// Unique operation ID.
    pub id: Uuid,
    /// Coalescing category.
    pub kind: OperationKind,
    /// Execution priority; higher runs earlier.
    pub priority: i32,
    /// Submission time (informational).
    pub created_at: DateTime<Utc>,
    pub(crate) action: Action,
    pub(crate) on_success: Option<SuccessCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl Operation {
    /// Create a new operation with a fresh ID and priority 0.
    pub fn new<F, Fut>(kind: OperationKind, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority: 0,
            created_at: Utc::now(),
            action: Box::new(move || Box::pin(action())),
            on_success: None,
            on_error: None,
        }
    }

    /// Set the execution priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set a callback invoked after the action succeeds.
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Set a callback invoked with the failure after the action fails.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&OperationError) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_new() {
        let op = Operation::new(OperationKind::Autosave, || async { Ok(()) });
        assert_eq!(op.kind, OperationKind::Autosave);
        assert_eq!(op.priority, 0);
        assert!(op.on_success.is_none());
        assert!(op.on_error.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let first = Operation::new(OperationKind::Save, || async { Ok(()) });
        let second = Operation::new(OperationKind::Save, || async { Ok(()) });
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_builder() {
        let op = Operation::new(OperationKind::Publish, || async { Ok(()) })
            .with_priority(5)
            .on_success(|| {})
            .on_error(|_| {});
        assert_eq!(op.priority, 5);
        assert!(op.on_success.is_some());
        assert!(op.on_error.is_some());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&OperationKind::DraftSave).unwrap(),
            "\"draft_save\""
        );
        assert_eq!(
            serde_json::from_str::<OperationKind>("\"autosave\"").unwrap(),
            OperationKind::Autosave
        );
    }
}
