//! Caller-driven run polling.
//!
//! The coordinator never polls on its own. A caller that received an
//! in-progress [`Run`] uses a [`RunWatcher`] to re-check it right away and
//! then on a fixed interval until it settles. The watcher is cancellable through its
//! [`CancellationToken`]: cancelling stops further scheduled checks, and a
//! check already in flight completes but its result is dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::Run;

/// Anything that can report the current state of a run.
#[async_trait]
pub trait RunStatusSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn run_status(&self, run_id: &str) -> Result<Run, Self::Error>;
}

/// Polls a run until it leaves the in-progress statuses.
pub struct RunWatcher<S> {
    source: Arc<S>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<S> std::fmt::Debug for RunWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunWatcher")
            .field("interval", &self.interval)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl<S: RunStatusSource + 'static> RunWatcher<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Share an existing token, e.g. one owned by the caller's session so a
    /// logout cancels every watch it started.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this watcher when cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Observations following `initial`, one per check.
    ///
    /// The first check runs immediately; later ones wait out the interval.
    /// Yields nothing if `initial` is already settled. Ends after the first
    /// settled observation, after the first error (errors are surfaced, never
    /// retried), or on cancellation.
    pub fn watch(&self, initial: &Run) -> BoxStream<'static, Result<Run, S::Error>> {
        let source = Arc::clone(&self.source);
        let cancel = self.cancel.clone();
        let interval = self.interval;
        let run_id = initial.run_id.clone();
        let mut in_progress = initial.status.is_in_progress();
        let mut checked = false;

        async_stream::stream! {
            while in_progress {
                if !checked {
                    if cancel.is_cancelled() {
                        break;
                    }
                    checked = true;
                } else {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(interval) => {}
                    }
                }

                let result = source.run_status(&run_id).await;
                if cancel.is_cancelled() {
                    debug!(name: "watch.discarded", run_id = %run_id, "Discarding result of cancelled poll");
                    break;
                }

                match result {
                    Ok(run) => {
                        in_progress = run.status.is_in_progress();
                        yield Ok(run);
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;
    use tokio::sync::Notify;

    #[derive(Debug, Error)]
    #[error("status check failed")]
    struct CheckFailed;

    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Run, CheckFailed>>>,
        calls: AtomicUsize,
        /// When set, each check waits on this before answering.
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Run, CheckFailed>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl RunStatusSource for ScriptedSource {
        type Error = CheckFailed;

        async fn run_status(&self, _run_id: &str) -> Result<Run, CheckFailed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CheckFailed))
        }
    }

    fn running(id: &str) -> Run {
        Run::in_progress(id, RunStatus::Running)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_settled() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running("run-1")),
            Ok(Run::succeeded("run-1", vec![])),
        ]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let observed: Vec<Run> = watcher
            .watch(&running("run-1"))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(observed.len(), 2);
        assert_eq!(observed[0].status, RunStatus::Running);
        assert_eq!(observed[1], Run::succeeded("run-1", vec![]));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        // One interval between the two checks, none before the first.
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_is_immediate() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(Run::succeeded("run-1", vec![]))]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let first = watcher.watch(&running("run-1")).next().await.unwrap().unwrap();

        assert_eq!(first, Run::succeeded("run-1", vec![]));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_watch_never_checks() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(running("run-1"))]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));
        watcher.cancel();

        let observed: Vec<_> = watcher.watch(&running("run-1")).collect().await;

        assert!(observed.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_initial_run_is_not_polled() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));

        let observed: Vec<_> = watcher
            .watch(&Run::failed("run-1"))
            .collect()
            .await;

        assert!(observed.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_polling() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running("run-1")),
            Err(CheckFailed),
            Ok(running("run-1")),
        ]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));

        let observed: Vec<_> = watcher.watch(&running("run-1")).collect().await;

        assert_eq!(observed.len(), 2);
        assert!(observed[0].is_ok());
        assert!(observed[1].is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_next_check() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(running("run-1")),
            Ok(running("run-1")),
        ]));
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2));
        let mut stream = watcher.watch(&running("run-1"));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.status, RunStatus::Running);

        watcher.cancel();
        assert!(stream.next().await.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_is_discarded_after_cancel() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            responses: Mutex::new(vec![Ok(Run::succeeded("run-1", vec![]))].into()),
            gate: Some(Arc::clone(&gate)),
            ..ScriptedSource::default()
        });
        let cancel = CancellationToken::new();
        let watcher = RunWatcher::new(Arc::clone(&source), Duration::from_secs(2))
            .with_cancellation(cancel.clone());
        let stream = watcher.watch(&running("run-1"));

        let consumer = tokio::spawn(async move { stream.collect::<Vec<_>>().await });

        // Let the watcher block inside its first check.
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        cancel.cancel();
        gate.notify_one();

        let observed = consumer.await.unwrap();
        assert!(observed.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
