//! The save queue
//!
//! An ordered queue of save operations, processed strictly one at a time.
//! Enqueueing validates the operation and returns a ticket that resolves
//! when the operation either succeeds or exhausts its retries. Operations
//! complete remote writes in FIFO enqueue order; a retried operation stays
//! at the head and is never reordered relative to operations behind it.
//!
//! The queue is an explicit instance constructed once per session and
//! injected wherever saves originate; there is no hidden global state, and
//! tests construct as many independent queues as they need.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cardbox_core::domain::save_op::SaveOperation;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::error::{SaveError, SaveOutcome, SaveResult};
use crate::preparer::{PreparedSave, SaveDataPreparer};
use crate::retry::RetryPolicy;
use cardbox_core::ports::record_store::RecordStore;
use chrono::Utc;

/// Completion handle for an enqueued operation
///
/// Ownership of the operation's completion transfers to whoever holds the
/// ticket; dropping it only discards the notification, never the save.
pub struct SaveTicket {
    rx: oneshot::Receiver<SaveResult>,
}

impl SaveTicket {
    /// Waits for the operation to succeed or exhaust its retries
    pub async fn wait(self) -> SaveResult {
        self.rx.await.unwrap_or(Err(SaveError::QueueClosed))
    }
}

/// One queued operation plus its bookkeeping
struct PendingSave {
    seq: u64,
    operation: SaveOperation,
    attempts: u32,
    completion: Option<oneshot::Sender<SaveResult>>,
}

/// Queue state mutated only between awaits on the single worker
struct QueueState {
    queue: VecDeque<PendingSave>,
    processing: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    preparer: SaveDataPreparer,
    store: Arc<dyn RecordStore>,
    policy: RetryPolicy,
    next_seq: AtomicU64,
}

/// Serializes all remote record writes for one session
#[derive(Clone)]
pub struct SaveQueue {
    inner: Arc<QueueInner>,
}

impl SaveQueue {
    pub fn new(
        store: Arc<dyn RecordStore>,
        preparer: SaveDataPreparer,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    processing: false,
                }),
                preparer,
                store,
                policy,
                next_seq: AtomicU64::new(1),
            }),
        }
    }

    /// Validates and appends an operation, triggering processing
    ///
    /// Returns a [`SaveTicket`] resolving to the operation's outcome, or an
    /// immediate validation error that is never retried.
    pub async fn enqueue(&self, operation: SaveOperation) -> Result<SaveTicket, SaveError> {
        operation.validate()?;

        let (tx, rx) = oneshot::channel();
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);

        let should_start = {
            let mut state = self.inner.state.lock().await;
            state.queue.push_back(PendingSave {
                seq,
                operation,
                attempts: 0,
                completion: Some(tx),
            });
            debug!(seq, depth = state.queue.len(), "Enqueued save operation");

            if state.processing {
                false
            } else {
                state.processing = true;
                true
            }
        };

        if should_start {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                process_loop(inner).await;
            });
        }

        Ok(SaveTicket { rx })
    }

    /// Current queue depth (pending operations, including the in-flight head)
    pub async fn depth(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }
}

/// The single worker: runs the head operation to success or retry
/// exhaustion, then moves on. Exits when the queue drains, clearing the
/// processing flag so a later enqueue starts a fresh worker.
async fn process_loop(inner: Arc<QueueInner>) {
    loop {
        // Take the head (without popping) and count the attempt.
        let (seq, operation, attempt) = {
            let mut state = inner.state.lock().await;
            match state.queue.front_mut() {
                None => {
                    state.processing = false;
                    debug!("Save queue drained");
                    return;
                }
                Some(head) => {
                    head.attempts += 1;
                    (head.seq, head.operation.clone(), head.attempts)
                }
            }
        };

        debug!(seq, attempt, kind = %operation.kind, "Processing save operation");
        let result = execute(&inner, &operation).await;

        match result {
            Ok(outcome) => {
                complete_head(&inner, seq, Ok(outcome)).await;
            }
            Err(err) if inner.policy.allows_retry(attempt) => {
                let delay = inner.policy.delay_for(attempt);
                warn!(
                    seq,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Save failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;

                // Stale-operation guard: a concurrent recovery path may have
                // already resolved and removed the head while we slept.
                let state = inner.state.lock().await;
                if state.queue.front().map(|p| p.seq) != Some(seq) {
                    warn!(seq, "Operation no longer at queue head, skipping retry");
                }
                // Head (if still ours) stays for the next loop turn.
            }
            Err(err) => {
                info!(seq, attempt, error = %err, "Save failed after final attempt");
                complete_head(&inner, seq, Err(err)).await;
            }
        }
    }
}

/// Pops the head and resolves its ticket, guarding against the head having
/// changed underneath us
async fn complete_head(inner: &QueueInner, seq: u64, result: SaveResult) {
    let mut state = inner.state.lock().await;
    if state.queue.front().map(|p| p.seq) != Some(seq) {
        warn!(seq, "Stale completion: operation already removed from queue");
        return;
    }

    let mut head = state
        .queue
        .pop_front()
        .unwrap_or_else(|| unreachable!("front checked above"));

    match &result {
        Ok(outcome) => debug!(seq, written = outcome.written, "Save operation completed"),
        Err(err) => warn!(seq, error = %err, "Save operation rejected"),
    }

    if let Some(tx) = head.completion.take() {
        // The caller may have dropped its ticket; that only discards the
        // notification.
        let _ = tx.send(result);
    }
}

/// One attempt: prepare the field changes, then write
async fn execute(inner: &QueueInner, operation: &SaveOperation) -> SaveResult {
    match inner.preparer.prepare(operation).await? {
        PreparedSave::Skip => Ok(SaveOutcome {
            saved_at: Utc::now(),
            written: false,
        }),
        PreparedSave::Write(changes) => {
            let ack = inner
                .store
                .write(&operation.record_id, &changes)
                .await
                .map_err(|err| SaveError::Write(format!("{err:#}")))?;
            Ok(SaveOutcome {
                saved_at: ack.saved_at,
                written: true,
            })
        }
    }
}
