//! Persistence worker: ordered, non-blocking writes to the component store.
//!
//! DESIGN
//! ======
//! Mutations are applied to local state first and then enqueued here. One
//! tokio task drains a bounded queue in FIFO order, so writes for the same
//! widget reach the store in the order the edits were made. The enqueueing
//! side never awaits network I/O.
//!
//! ERROR HANDLING
//! ==============
//! A failed write is logged and reported back over an unbounded channel.
//! Nothing is retried or rolled back here; the controller decides what the
//! user sees. A full queue is reported to the caller instead of blocking.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::sync::Arc;

use canvas::geometry::{Point, Size};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::store::{ComponentStore, StoreError};

/// One write against the component store.
#[derive(Debug)]
pub enum PersistRequest {
    Position { id: Uuid, position: Point },
    Size { id: Uuid, size: Size },
    Content { id: Uuid, content: String },
    Style { id: Uuid, style: Value },
    Delete { id: Uuid },
    /// Signals once every request queued before it has been processed.
    Barrier(oneshot::Sender<()>),
}

impl PersistRequest {
    /// Short operation name for logs and failure reports.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Position { .. } => "update_position",
            Self::Size { .. } => "update_size",
            Self::Content { .. } => "update_content",
            Self::Style { .. } => "update_style",
            Self::Delete { .. } => "delete_component",
            Self::Barrier(_) => "barrier",
        }
    }
}

/// A write that the store rejected.
#[derive(Debug)]
pub struct PersistFailure {
    pub id: Uuid,
    pub op: &'static str,
    pub error: StoreError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("persistence queue is full")]
    Full,
    #[error("persistence worker has stopped")]
    Stopped,
}

impl ErrorCode for EnqueueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Full => "E_QUEUE_FULL",
            Self::Stopped => "E_PERSISTENCE_STOPPED",
        }
    }
}

/// Sending half of the persistence queue.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: mpsc::Sender<PersistRequest>,
}

impl PersistQueue {
    /// Queue a write without waiting.
    ///
    /// # Errors
    ///
    /// `Full` when the queue is at capacity, `Stopped` when the worker is gone.
    pub fn enqueue(&self, request: PersistRequest) -> Result<(), EnqueueError> {
        match self.tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!(op = request.op(), "persist queue full; rejecting write");
                Err(EnqueueError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                warn!(op = request.op(), "persist queue closed; rejecting write");
                Err(EnqueueError::Stopped)
            }
        }
    }

    /// Wait until every request queued so far has been processed.
    ///
    /// # Errors
    ///
    /// `Stopped` when the worker exits before reaching the barrier.
    pub async fn barrier(&self) -> Result<(), EnqueueError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx.send(PersistRequest::Barrier(done_tx)).await.map_err(|_| EnqueueError::Stopped)?;
        done_rx.await.map_err(|_| EnqueueError::Stopped)
    }
}

/// Spawn the persistence worker. Returns the queue and the failure stream.
///
/// Must be called from within a tokio runtime. The worker exits once every
/// clone of the queue has been dropped and the backlog is drained.
#[must_use]
pub fn spawn_persistence_worker(
    store: Arc<dyn ComponentStore>,
    capacity: usize,
) -> (PersistQueue, mpsc::UnboundedReceiver<PersistFailure>) {
    let capacity = capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<PersistRequest>(capacity);
    let (failure_tx, failure_rx) = mpsc::unbounded_channel();

    info!(queue_capacity = capacity, "persistence worker configured");

    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let op = request.op();
            let (id, result) = match request {
                PersistRequest::Barrier(done) => {
                    if done.send(()).is_err() {
                        debug!("barrier waiter went away");
                    }
                    continue;
                }
                PersistRequest::Position { id, position } => (id, store.update_position(id, position.x, position.y).await),
                PersistRequest::Size { id, size } => (id, store.update_size(id, size.width, size.height).await),
                PersistRequest::Content { id, content } => (id, store.update_content(id, &content).await),
                PersistRequest::Style { id, style } => (id, store.update_style(id, style).await),
                PersistRequest::Delete { id } => (id, store.delete_component(id).await),
            };

            if let Err(error) = result {
                warn!(%id, op, error = %error, "persist write failed");
                if failure_tx.send(PersistFailure { id, op, error }).is_err() {
                    debug!(%id, op, "failure receiver dropped");
                }
            }
        }
        debug!("persistence worker stopped");
    });

    (PersistQueue { tx }, failure_rx)
}
