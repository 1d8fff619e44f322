//! # opqueue
//!
//! Debounced, priority-ordered serial operation queue for editor save
//! pipelines.
//!
//! ## Features
//!
//! - Per-kind debounce coalescing (only the last rapid same-kind submission survives)
//! - Stable priority ordering with FIFO tie-breaking
//! - Strictly serial execution (no two actions ever overlap)
//! - Bounded, most-recent-first error history
//! - Cooperative cancellation and force-flush

pub mod config;
pub mod error;
pub mod history;
pub mod operation;
pub mod queue;

pub use config::QueueConfig;
pub use error::OperationError;
pub use history::ErrorRecord;
pub use operation::{Operation, OperationKind};
pub use queue::OperationQueue;
