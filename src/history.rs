//! Bounded operation error history.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::OperationError;

/// A recorded operation failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// ID of the failed operation.
    pub operation_id: Uuid,
    /// The failure reported by the action.
    pub error: OperationError,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Bounded error history, most recent first.
#[derive(Debug)]
pub(crate) struct ErrorLog {
    entries: VecDeque<ErrorRecord>,
    cap: usize,
}

impl ErrorLog {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap,
        }
    }

    /// Prepend a record, evicting the oldest entries past the cap.
    pub(crate) fn record(&mut self, operation_id: Uuid, error: OperationError) {
        self.entries.push_front(ErrorRecord {
            operation_id,
            error,
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.cap {
            self.entries.pop_back();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<ErrorRecord> {
        self.entries.iter().cloned().collect()
    }
}
