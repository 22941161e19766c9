//! Serializes turns for one character on a background task.
//!
//! The UI holds a cloneable [`TurnHandle`] and submits text without waiting.
//! At most one turn is in flight or queued at a time; a submission while one
//! is pending is turned away with [`SubmitError::Busy`] instead of queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{SubmitError, TurnError, TurnResult};
use crate::orchestrator::TurnOrchestrator;

/// Cloneable submission side of a [`TurnRunner`].
#[derive(Debug, Clone)]
pub struct TurnHandle {
    sender: mpsc::Sender<String>,
    pending: Arc<AtomicBool>,
}

impl TurnHandle {
    /// Queue a player message. Fails fast if a turn is already pending.
    pub fn try_submit(&self, input: impl Into<String>) -> Result<(), SubmitError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::Busy);
        }
        match self.sender.try_send(input.into()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(SubmitError::Busy),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.pending.store(false, Ordering::Release);
                Err(SubmitError::Closed)
            }
        }
    }

    /// True while a submitted turn has not finished.
    pub fn is_busy(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Owns an orchestrator on a spawned task.
#[derive(Debug)]
pub struct TurnRunner {
    handle: TurnHandle,
    task: JoinHandle<TurnOrchestrator>,
}

impl TurnRunner {
    /// Move `orchestrator` onto a background task. Must be called inside a
    /// tokio runtime.
    pub fn spawn(orchestrator: TurnOrchestrator) -> Self {
        let (sender, mut receiver) = mpsc::channel::<String>(1);
        let pending = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&pending);

        let task = tokio::spawn(async move {
            let mut orchestrator = orchestrator;
            while let Some(input) = receiver.recv().await {
                let outcome = orchestrator.process_turn(&input).await;
                debug!(?outcome, "runner finished turn");
                done.store(false, Ordering::Release);
            }
            info!("turn runner stopped");
            orchestrator
        });

        Self {
            handle: TurnHandle { sender, pending },
            task,
        }
    }

    /// A new submission handle.
    pub fn handle(&self) -> TurnHandle {
        self.handle.clone()
    }

    /// Stop accepting turns and hand back the orchestrator once the current
    /// turn finishes. Waits until every cloned handle has been dropped.
    pub async fn shutdown(self) -> TurnResult<TurnOrchestrator> {
        drop(self.handle);
        self.task.await.map_err(|err| TurnError::Internal(format!("turn runner task failed: {err}")))
    }
}
