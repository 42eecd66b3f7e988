//! Job Scheduling
//!
//! Job identity, the job state machine, caller-facing handles, and the
//! bounded worker pool that gates admission. Jobs for distinct documents
//! carry no ordering guarantee and may complete out of submission order.

use std::sync::Arc;

use excellentcase_core::{JobError, TestSuite};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle of one submitted job.
///
/// `Completed`, `Failed`, and `Cancelled` are terminal; `Failed` and
/// `Cancelled` are reachable from any non-terminal state.
#[derive(Debug, Clone)]
pub enum JobState {
    Queued,
    Extracting,
    Analyzing,
    Generating,
    Completed(Arc<TestSuite>),
    Failed(JobError),
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed(_) | JobState::Failed(_) | JobState::Cancelled
        )
    }

    /// Short name for logging and assertions.
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Extracting => "extracting",
            JobState::Analyzing => "analyzing",
            JobState::Generating => "generating",
            JobState::Completed(_) => "completed",
            JobState::Failed(_) => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

/// Caller-facing handle to a running job.
///
/// Dropping the handle does not cancel the job; cancellation is explicit.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    state: watch::Receiver<JobState>,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Request cooperative cancellation. Takes effect at the job's next
    /// suspension point; an in-flight external call is not force-aborted but
    /// its result is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the job reaches a terminal state and return it.
    pub async fn wait(&mut self) -> JobState {
        loop {
            let current = self.state.borrow().clone();
            if current.is_terminal() {
                return current;
            }
            // Sender dropped means the job task ended; the last published
            // state stands.
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}

/// Job-side counterpart of a `JobHandle`.
pub(crate) struct JobContext {
    pub id: Uuid,
    state: watch::Sender<JobState>,
    pub cancel: CancellationToken,
}

impl JobContext {
    pub fn transition(&self, next: JobState) {
        tracing::debug!(job = %self.id, state = next.name(), "job transition");
        let _ = self.state.send(next);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Create a linked handle/context pair for a new job.
pub(crate) fn job_channel() -> (JobHandle, JobContext) {
    let id = Uuid::new_v4();
    let (tx, rx) = watch::channel(JobState::Queued);
    let cancel = CancellationToken::new();
    (
        JobHandle {
            id,
            state: rx,
            cancel: cancel.clone(),
        },
        JobContext {
            id,
            state: tx,
            cancel,
        },
    )
}

/// Bounded worker pool. Admission from `Queued` into `Extracting` requires a
/// slot; at most `max_concurrent` jobs run concurrently.
#[derive(Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Wait for a free slot. The returned permit releases the slot on drop.
    pub async fn acquire(&self) -> tokio::sync::OwnedSemaphorePermit {
        // The semaphore is never closed while the pool is alive.
        match self.slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("worker pool semaphore closed"),
        }
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
