//! Debounced, priority-ordered serial operation queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::OperationError;
use crate::history::{ErrorLog, ErrorRecord};
use crate::operation::{Operation, OperationKind};

/// A debounce timer waiting to move an operation into `pending`.
///
/// `seq` guards against a superseded timer firing late: a timer only
/// enqueues its operation if its sequence number still matches the entry
/// in the map.
struct DebounceEntry {
    seq: u64,
    operation: Operation,
    handle: AbortHandle,
}

struct QueueState {
    /// Operations awaiting execution, descending priority, FIFO ties.
    pending: VecDeque<Operation>,
    /// Re-entrancy guard: at most one processing loop runs at a time.
    processing: bool,
    /// ID of the most recently succeeded operation.
    last_completed: Option<Uuid>,
    /// Bounded failure history.
    errors: ErrorLog,
}

struct QueueInner {
    config: QueueConfig,
    state: Mutex<QueueState>,
    timers: Mutex<HashMap<OperationKind, DebounceEntry>>,
    timer_seq: AtomicU64,
    idle: Notify,
}

/// Serial executor for debounced, priority-ordered operations.
///
/// Operations are submitted faster than they can safely run; the queue
/// collapses redundant same-kind submissions, orders the rest by priority,
/// and executes them strictly one at a time. Failures are contained: they
/// are reported via the per-operation `on_error` callback and the bounded
/// error history, never to the submitter, and never stop the loop.
///
/// Each queue owns its state; concurrent instances share nothing. Cloning
/// yields another handle to the same queue.
///
/// Must be used from within a tokio runtime: debounce timers and the
/// processing loop are spawned tasks.
#[derive(Clone)]
pub struct OperationQueue {
    inner: Arc<QueueInner>,
}

impl OperationQueue {
    /// Create a new queue.
    pub fn new(config: QueueConfig) -> Self {
        let max_error_history = config.max_error_history;
        Self {
            inner: Arc::new(QueueInner {
                config,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    processing: false,
                    last_completed: None,
                    errors: ErrorLog::new(max_error_history),
                }),
                timers: Mutex::new(HashMap::new()),
                timer_seq: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Submit an operation on the debounced path.
    ///
    /// Any live debounce timer for the same kind is cancelled first; only
    /// the most recent same-kind submission within the debounce window ever
    /// reaches `pending`. Superseded submissions are silently discarded,
    /// callbacks included, and their returned IDs become unusable.
    ///
    /// Returns the operation's ID synchronously; never blocks.
    pub fn submit(&self, operation: Operation) -> Uuid {
        let id = operation.id;
        let kind = operation.kind;
        let seq = self.inner.timer_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.inner.config.debounce_interval();

        let mut timers = self.inner.timers.lock();
        if let Some(previous) = timers.remove(&kind) {
            previous.handle.abort();
            debug!(
                "Coalescing {:?} submission: {} supersedes {}",
                kind, id, previous.operation.id
            );
        }

        let task_inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            QueueInner::fire_timer(&task_inner, kind, seq);
        })
        .abort_handle();

        debug!("Debouncing operation: {} (kind: {:?})", id, kind);
        timers.insert(
            kind,
            DebounceEntry {
                seq,
                operation,
                handle,
            },
        );

        id
    }

    /// Submit an operation bypassing the debounce window.
    ///
    /// The operation is inserted into `pending` immediately and the
    /// processing loop is triggered. Returns the operation's ID.
    pub fn submit_now(&self, operation: Operation) -> Uuid {
        let id = operation.id;
        self.inner.insert_pending(operation);
        QueueInner::try_start(&self.inner);
        id
    }

    /// Remove a pending operation.
    ///
    /// Returns `true` if the operation was still pending. No-op (returns
    /// `false`) for operations that already executed, are mid-execution,
    /// or do not exist. Does not touch debounce timers.
    pub fn cancel(&self, id: Uuid) -> bool {
        let mut state = self.inner.state.lock();
        if let Some(position) = state.pending.iter().position(|op| op.id == id) {
            state.pending.remove(position);
            debug!("Cancelled pending operation: {}", id);
            true
        } else {
            false
        }
    }

    /// Cancel every debounce timer and empty `pending`.
    ///
    /// Debounced operations that have not fired never enqueue and their
    /// callbacks never run. An operation already mid-execution runs to
    /// completion, but nothing executes after it.
    pub fn cancel_all(&self) {
        let mut timers = self.inner.timers.lock();
        let aborted = timers.len();
        for entry in timers.drain().map(|(_, entry)| entry) {
            entry.handle.abort();
        }
        drop(timers);

        let mut state = self.inner.state.lock();
        let dropped = state.pending.len();
        state.pending.clear();
        debug!(
            "Cancelled all operations ({} timers aborted, {} pending dropped)",
            aborted, dropped
        );
    }

    /// Empty the error history. No other effect.
    pub fn clear_errors(&self) {
        self.inner.state.lock().errors.clear();
    }

    /// Force-fire all debounce timers and await full drain.
    ///
    /// Everything pending at the moment the timers are force-fired is
    /// guaranteed to have executed when this returns; operations submitted
    /// strictly after that moment are not guaranteed to be awaited.
    pub async fn flush(&self) {
        let fired: Vec<Operation> = {
            let mut timers = self.inner.timers.lock();
            timers
                .drain()
                .map(|(_, entry)| {
                    entry.handle.abort();
                    entry.operation
                })
                .collect()
        };
        for operation in fired {
            self.inner.insert_pending(operation);
        }
        QueueInner::try_start(&self.inner);

        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Number of operations awaiting execution.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether the processing loop is currently running.
    pub fn is_processing(&self) -> bool {
        self.inner.state.lock().processing
    }

    /// Whether the queue is fully drained (not processing, nothing pending).
    pub fn is_idle(&self) -> bool {
        let state = self.inner.state.lock();
        !state.processing && state.pending.is_empty()
    }

    /// Whether the error history is non-empty.
    pub fn has_errors(&self) -> bool {
        !self.inner.state.lock().errors.is_empty()
    }

    /// Snapshot of the error history, most recent first.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.inner.state.lock().errors.snapshot()
    }

    /// ID of the most recently succeeded operation.
    pub fn last_completed(&self) -> Option<Uuid> {
        self.inner.state.lock().last_completed
    }

    /// The queue's configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl QueueInner {
    /// Insert at the first position whose entry has strictly lower
    /// priority; append otherwise. Stable descending sort, FIFO ties.
    fn insert_pending(&self, operation: Operation) {
        let mut state = self.state.lock();
        let position = state
            .pending
            .iter()
            .position(|existing| existing.priority < operation.priority)
            .unwrap_or(state.pending.len());
        debug!(
            "Enqueueing operation: {} (kind: {:?}, priority: {})",
            operation.id, operation.kind, operation.priority
        );
        state.pending.insert(position, operation);
    }

    /// Move a fired debounce timer's operation into `pending`.
    ///
    /// Stale fires (entry replaced or removed since this timer was set)
    /// are dropped by the sequence check.
    fn fire_timer(inner: &Arc<Self>, kind: OperationKind, seq: u64) {
        let operation = {
            let mut timers = inner.timers.lock();
            match timers.get(&kind) {
                Some(entry) if entry.seq == seq => {
                    timers.remove(&kind).map(|entry| entry.operation)
                }
                _ => None,
            }
        };
        if let Some(operation) = operation {
            inner.insert_pending(operation);
            Self::try_start(inner);
        }
    }

    /// Start the processing loop unless one is already running or there is
    /// nothing to do. The decision is made under the state lock, so two
    /// loops can never start.
    fn try_start(inner: &Arc<Self>) {
        {
            let mut state = inner.state.lock();
            if state.processing || state.pending.is_empty() {
                return;
            }
            state.processing = true;
        }
        let inner = Arc::clone(inner);
        tokio::spawn(inner.drive());
    }

    /// Serial processing loop.
    ///
    /// Each iteration pops the current front of `pending`, so insertions
    /// made while an action runs re-sort the remaining work before the next
    /// take. Actions run inside a spawned task: a panic becomes an
    /// `OperationError::Panicked` instead of killing the loop.
    async fn drive(self: Arc<Self>) {
        loop {
            let operation = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(operation) => operation,
                    None => {
                        state.processing = false;
                        drop(state);
                        self.idle.notify_waiters();
                        return;
                    }
                }
            };

            let Operation {
                id,
                kind,
                action,
                on_success,
                on_error,
                ..
            } = operation;
            debug!("Executing operation: {} (kind: {:?})", id, kind);

            let outcome = match tokio::spawn(async move { action().await }).await {
                Ok(result) => result,
                Err(join_error) => Err(OperationError::Panicked(join_error.to_string())),
            };

            match outcome {
                Ok(()) => {
                    self.state.lock().last_completed = Some(id);
                    if let Some(callback) = on_success {
                        callback();
                    }
                }
                Err(failure) => {
                    error!("Operation {} failed: {}", id, failure);
                    if let Some(callback) = on_error {
                        callback(&failure);
                    }
                    self.state.lock().errors.record(id, failure);
                }
            }
        }
    }
}
