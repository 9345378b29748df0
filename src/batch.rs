// src/batch.rs - Batch execution controller
//
// Drives the dispatcher across an ordered file list on its own tokio task, so
// the caller stays responsive. Events go out over an unbounded channel (the
// loop never blocks on emission); cancellation is a sticky atomic flag checked
// between files, never mid-dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::dispatch::PdfDispatcher;
use crate::platform::file_name_of;

/// Default inter-file throttle. Back-to-back submissions can swamp the OS
/// spooler; this is a rate limit, not a correctness requirement.
pub const DEFAULT_INTER_FILE_DELAY: Duration = Duration::from_millis(500);

/// Lifecycle notification emitted while a batch runs.
///
/// Per file the order is `FileStarted`, `Progress`, then exactly one of
/// `FileCompleted` / `FileError`; events for file `i` strictly precede events
/// for file `i + 1`; `Finished` is always last and fires exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress {
        current: usize,
        total: usize,
    },
    FileStarted {
        index: usize,
        filename: String,
    },
    FileCompleted {
        index: usize,
        filename: String,
    },
    FileError {
        index: usize,
        filename: String,
        message: String,
    },
    Finished {
        success_count: usize,
        error_count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Final tally of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub success_count: usize,
    pub error_count: usize,
    pub cancelled: bool,
}

/// Starts batch runs against a dispatcher. One batch per handle; a cancelled
/// batch cannot be restarted, start a new one instead.
pub struct BatchController {
    dispatcher: Arc<dyn PdfDispatcher>,
    inter_file_delay: Duration,
}

impl BatchController {
    pub fn new(dispatcher: Arc<dyn PdfDispatcher>) -> Self {
        Self {
            dispatcher,
            inter_file_delay: DEFAULT_INTER_FILE_DELAY,
        }
    }

    pub fn with_delay(dispatcher: Arc<dyn PdfDispatcher>, inter_file_delay: Duration) -> Self {
        Self {
            dispatcher,
            inter_file_delay,
        }
    }

    /// Spawn the batch run and hand back its event stream.
    pub fn start(&self, files: Vec<PathBuf>) -> BatchHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let status = Arc::new(RwLock::new(BatchStatus::Running));
        let job_id = Uuid::new_v4();

        let task = tokio::spawn(run_batch(
            self.dispatcher.clone(),
            files,
            self.inter_file_delay,
            tx,
            cancelled.clone(),
            status.clone(),
            job_id,
        ));

        BatchHandle {
            job_id,
            events: rx,
            cancelled,
            status,
            task,
        }
    }
}

/// Cloneable cancel switch, detachable from the handle so a signal watcher
/// can request cancellation while the event loop owns the handle.
#[derive(Debug, Clone)]
pub struct BatchCanceller {
    cancelled: Arc<AtomicBool>,
}

impl BatchCanceller {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Caller-side view of a running batch.
pub struct BatchHandle {
    pub job_id: Uuid,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancelled: Arc<AtomicBool>,
    status: Arc<RwLock<BatchStatus>>,
    task: tokio::task::JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Request cooperative cancellation. Takes effect at the next between-file
    /// check; the in-flight dispatch always completes. Sticky once set.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn canceller(&self) -> BatchCanceller {
        BatchCanceller {
            cancelled: self.cancelled.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Next event, or `None` once the run loop has finished and the stream is
    /// drained. `Finished` is always the last `Some` value.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    pub async fn status(&self) -> BatchStatus {
        *self.status.read().await
    }

    /// Join the run loop and take the final tally.
    pub async fn wait(self) -> BatchSummary {
        match self.task.await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!(job = %self.job_id, %err, "batch task failed to join");
                BatchSummary {
                    success_count: 0,
                    error_count: 0,
                    cancelled: true,
                }
            }
        }
    }
}

async fn run_batch(
    dispatcher: Arc<dyn PdfDispatcher>,
    files: Vec<PathBuf>,
    inter_file_delay: Duration,
    tx: mpsc::UnboundedSender<BatchEvent>,
    cancelled: Arc<AtomicBool>,
    status: Arc<RwLock<BatchStatus>>,
    job_id: Uuid,
) -> BatchSummary {
    let total = files.len();
    let mut success_count = 0usize;
    let mut error_count = 0usize;

    tracing::info!(job = %job_id, total, "print batch started");

    for (index, path) in files.iter().enumerate() {
        if cancelled.load(Ordering::SeqCst) {
            tracing::info!(job = %job_id, index, "cancellation observed, stopping batch");
            break;
        }

        let filename = file_name_of(path);
        let _ = tx.send(BatchEvent::FileStarted {
            index,
            filename: filename.clone(),
        });
        let _ = tx.send(BatchEvent::Progress {
            current: index + 1,
            total,
        });

        let outcome = dispatcher.dispatch(path).await;
        if outcome.succeeded {
            success_count += 1;
            let _ = tx.send(BatchEvent::FileCompleted { index, filename });
        } else {
            error_count += 1;
            let message = outcome.error_message();
            tracing::warn!(job = %job_id, file = %path.display(), message, "print failed");
            let _ = tx.send(BatchEvent::FileError {
                index,
                filename,
                message,
            });
        }

        if !cancelled.load(Ordering::SeqCst) && index + 1 < total {
            tokio::time::sleep(inter_file_delay).await;
        }
    }

    let was_cancelled = cancelled.load(Ordering::SeqCst);
    {
        let mut status = status.write().await;
        *status = if was_cancelled {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };
    }

    tracing::info!(
        job = %job_id,
        success_count,
        error_count,
        cancelled = was_cancelled,
        "print batch finished"
    );
    let _ = tx.send(BatchEvent::Finished {
        success_count,
        error_count,
    });

    BatchSummary {
        success_count,
        error_count,
        cancelled: was_cancelled,
    }
}
