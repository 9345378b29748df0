// Integration tests for the batch execution controller, driven by a stub
// dispatcher so no real print tooling is touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use pdfbatch::batch::{BatchController, BatchEvent, BatchStatus};
use pdfbatch::dispatch::{DispatchError, PdfDispatcher, PrintOutcome};

/// Dispatcher stub: fails on configured file names, optionally sleeps a
/// random number of milliseconds first, and counts invocations.
struct StubDispatcher {
    fail_on: Vec<&'static str>,
    max_latency_ms: u64,
    dispatched: AtomicUsize,
}

impl StubDispatcher {
    fn new(fail_on: Vec<&'static str>) -> Self {
        Self {
            fail_on,
            max_latency_ms: 0,
            dispatched: AtomicUsize::new(0),
        }
    }

    fn with_latency(fail_on: Vec<&'static str>, max_latency_ms: u64) -> Self {
        Self {
            fail_on,
            max_latency_ms,
            dispatched: AtomicUsize::new(0),
        }
    }

    fn dispatch_count(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfDispatcher for StubDispatcher {
    async fn dispatch(&self, path: &Path) -> PrintOutcome {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        if self.max_latency_ms > 0 {
            let ms = { rand::rng().random_range(0..self.max_latency_ms) };
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        let name = path.file_name().unwrap().to_str().unwrap();
        if self.fail_on.contains(&name) {
            PrintOutcome::failure(DispatchError::ExecutionFailed {
                tool: "stub".to_string(),
                detail: "refused by stub".to_string(),
            })
        } else {
            PrintOutcome::success()
        }
    }
}

fn files(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

fn controller(dispatcher: Arc<StubDispatcher>) -> BatchController {
    BatchController::with_delay(dispatcher, Duration::ZERO)
}

async fn drain(handle: &mut pdfbatch::batch::BatchHandle) -> Vec<BatchEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn middle_failure_produces_exact_event_sequence() {
    let dispatcher = Arc::new(StubDispatcher::new(vec!["b.pdf"]));
    let mut handle = controller(dispatcher).start(files(&["a.pdf", "b.pdf", "c.pdf"]));

    let events = drain(&mut handle).await;
    let expected = vec![
        BatchEvent::FileStarted {
            index: 0,
            filename: "a.pdf".to_string(),
        },
        BatchEvent::Progress {
            current: 1,
            total: 3,
        },
        BatchEvent::FileCompleted {
            index: 0,
            filename: "a.pdf".to_string(),
        },
        BatchEvent::FileStarted {
            index: 1,
            filename: "b.pdf".to_string(),
        },
        BatchEvent::Progress {
            current: 2,
            total: 3,
        },
        BatchEvent::FileError {
            index: 1,
            filename: "b.pdf".to_string(),
            message: "print command 'stub' failed: refused by stub".to_string(),
        },
        BatchEvent::FileStarted {
            index: 2,
            filename: "c.pdf".to_string(),
        },
        BatchEvent::Progress {
            current: 3,
            total: 3,
        },
        BatchEvent::FileCompleted {
            index: 2,
            filename: "c.pdf".to_string(),
        },
        BatchEvent::Finished {
            success_count: 2,
            error_count: 1,
        },
    ];
    assert_eq!(events, expected);

    let summary = handle.wait().await;
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.error_count, 1);
    assert!(!summary.cancelled);
}

#[tokio::test]
async fn single_failure_does_not_abort_the_batch() {
    let dispatcher = Arc::new(StubDispatcher::new(vec!["a.pdf"]));
    let mut handle = controller(dispatcher.clone()).start(files(&["a.pdf", "b.pdf"]));

    drain(&mut handle).await;
    let summary = handle.wait().await;
    assert_eq!(dispatcher.dispatch_count(), 2);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.error_count, 1);
}

#[tokio::test]
async fn counts_account_for_every_file() {
    let dispatcher = Arc::new(StubDispatcher::new(vec!["b.pdf", "d.pdf"]));
    let names = ["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf"];
    let mut handle = controller(dispatcher).start(files(&names));

    drain(&mut handle).await;
    let summary = handle.wait().await;
    assert_eq!(summary.success_count + summary.error_count, names.len());
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.error_count, 2);
}

#[tokio::test]
async fn cancel_before_start_dispatches_nothing() {
    let dispatcher = Arc::new(StubDispatcher::new(vec![]));
    let mut handle = controller(dispatcher.clone()).start(files(&["a.pdf", "b.pdf"]));
    handle.cancel();

    let events = drain(&mut handle).await;
    assert_eq!(
        events,
        vec![BatchEvent::Finished {
            success_count: 0,
            error_count: 0,
        }]
    );
    assert_eq!(dispatcher.dispatch_count(), 0);
    assert_eq!(handle.status().await, BatchStatus::Cancelled);

    let summary = handle.wait().await;
    assert!(summary.cancelled);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.error_count, 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_between_files_skips_the_remainder() {
    let dispatcher = Arc::new(StubDispatcher::new(vec![]));
    let controller =
        BatchController::with_delay(dispatcher.clone(), Duration::from_millis(500));
    let mut handle = controller.start(files(&["a.pdf", "b.pdf", "c.pdf"]));

    // Drain file 0's events, then cancel while the controller sits in the
    // inter-file delay.
    let mut seen = Vec::new();
    while let Some(event) = handle.next_event().await {
        let done = matches!(event, BatchEvent::FileCompleted { index: 0, .. });
        seen.push(event);
        if done {
            break;
        }
    }
    handle.cancel();

    let mut rest = drain(&mut handle).await;
    seen.append(&mut rest);
    assert_eq!(
        seen.last(),
        Some(&BatchEvent::Finished {
            success_count: 1,
            error_count: 0,
        })
    );
    assert!(!seen.iter().any(|e| matches!(e, BatchEvent::FileStarted { index: 1, .. })));
    assert_eq!(dispatcher.dispatch_count(), 1);
    assert_eq!(handle.status().await, BatchStatus::Cancelled);
}

#[tokio::test]
async fn status_reaches_completed_after_finish() {
    let dispatcher = Arc::new(StubDispatcher::new(vec![]));
    let mut handle = controller(dispatcher).start(files(&["a.pdf"]));
    drain(&mut handle).await;
    assert_eq!(handle.status().await, BatchStatus::Completed);
    assert!(!handle.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn event_order_is_stable_under_random_latencies() {
    for _ in 0..100 {
        let dispatcher = Arc::new(StubDispatcher::with_latency(vec!["b.pdf"], 5));
        let mut handle = controller(dispatcher).start(files(&["a.pdf", "b.pdf", "c.pdf"]));
        let events = drain(&mut handle).await;

        // Events for file i strictly precede events for file i + 1, and each
        // file's triple keeps its internal order.
        let mut current = 0usize;
        let mut phase = 0u8; // 0 = expect started, 1 = progress, 2 = outcome
        for event in &events[..events.len() - 1] {
            match (phase, event) {
                (0, BatchEvent::FileStarted { index, .. }) if *index == current => phase = 1,
                (1, BatchEvent::Progress { current: c, total: 3 }) if *c == current + 1 => {
                    phase = 2;
                }
                (2, BatchEvent::FileCompleted { index, .. })
                | (2, BatchEvent::FileError { index, .. })
                    if *index == current =>
                {
                    current += 1;
                    phase = 0;
                }
                _ => panic!("out-of-order event: {event:?}"),
            }
        }
        assert_eq!(current, 3);
        assert!(matches!(events.last(), Some(BatchEvent::Finished { .. })));
    }
}
