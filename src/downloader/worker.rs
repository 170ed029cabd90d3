//! Download workers — the fixed pool that drains the job queue
//!
//! Each worker loops: take one job off the shared queue (waiting while it is
//! empty), run the retry controller on it end-to-end, repeat. Workers exit
//! when the producer has closed the queue and it is drained, or when the run
//! is cancelled. A job's failure never affects the worker's next job.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use super::path_locks::PathLocks;
use crate::config::RetryConfig;
use crate::fetcher;
use crate::retry;
use crate::types::{DownloadJob, DownloadOutcome, EventSink};

/// Everything one worker needs for the lifetime of a run
pub(crate) struct WorkerContext {
    pub(crate) id: usize,
    pub(crate) jobs: Arc<Mutex<mpsc::Receiver<DownloadJob>>>,
    pub(crate) client: reqwest::Client,
    pub(crate) retry: RetryConfig,
    pub(crate) sink: EventSink,
    pub(crate) cancel: CancellationToken,
    pub(crate) locks: PathLocks,
}

/// Worker main loop; runs until the queue closes or the run is cancelled
pub(crate) async fn run(ctx: WorkerContext) {
    loop {
        // The receiver lock is held only while waiting for a job, never while
        // executing one — otherwise the pool would degenerate to one worker.
        let job = {
            let mut rx = ctx.jobs.lock().await;
            tokio::select! {
                job = rx.recv() => job,
                _ = ctx.cancel.cancelled() => None,
            }
        };
        let Some(job) = job else {
            break;
        };

        let dest = job.destination_path();
        // Two rows naming the same destination serialize here; the loser of
        // the race then sees the published file and takes the idempotent skip.
        let _guard = ctx.locks.acquire(&dest).await;

        tracing::debug!(worker = ctx.id, url = %job.source_url, "job started");
        let outcome = retry::download_with_retry(
            &job.source_url,
            &ctx.retry,
            &ctx.sink,
            &ctx.cancel,
            || fetcher::fetch_once(&ctx.client, &job.source_url, &dest),
        )
        .await;

        match outcome {
            DownloadOutcome::Success => {
                tracing::debug!(worker = ctx.id, url = %job.source_url, "job done");
            }
            DownloadOutcome::Failure { reason } => {
                tracing::warn!(worker = ctx.id, url = %job.source_url, %reason, "job failed");
            }
        }
    }
    tracing::debug!(worker = ctx.id, "worker exiting");
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventStreams;
    use std::path::PathBuf;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn spawn_pool(
        count: usize,
        jobs: Arc<Mutex<mpsc::Receiver<DownloadJob>>>,
        sink: EventSink,
        cancel: CancellationToken,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let locks = PathLocks::default();
        (0..count)
            .map(|id| {
                tokio::spawn(run(WorkerContext {
                    id,
                    jobs: jobs.clone(),
                    client: reqwest::Client::new(),
                    retry: RetryConfig {
                        max_attempts: 1,
                        delay: Duration::from_millis(1),
                    },
                    sink: sink.clone(),
                    cancel: cancel.clone(),
                    locks: locks.clone(),
                }))
            })
            .collect()
    }

    fn sink() -> (EventSink, EventStreams) {
        EventSink::bounded(64, 64)
    }

    #[tokio::test]
    async fn pool_drains_queue_and_exits_on_closure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".as_slice()))
            .expect(4)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (sink, mut streams) = sink();
        let (tx, rx) = mpsc::channel(1);
        let handles = spawn_pool(
            3,
            Arc::new(Mutex::new(rx)),
            sink,
            CancellationToken::new(),
        );

        for i in 0..4 {
            tx.send(DownloadJob {
                source_url: format!("{}/f{i}", server.uri()),
                relative_path: PathBuf::from(format!("f{i}")),
                destination_root: dir.path().to_path_buf(),
            })
            .await
            .unwrap();
        }
        drop(tx);

        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("worker must exit once the queue closes")
                .unwrap();
        }
        for i in 0..4 {
            assert!(dir.path().join(format!("f{i}")).is_file());
        }
        assert!(streams.errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_job_does_not_stall_the_next_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".as_slice()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (sink, mut streams) = sink();
        let (tx, rx) = mpsc::channel(1);
        let handles = spawn_pool(
            1,
            Arc::new(Mutex::new(rx)),
            sink,
            CancellationToken::new(),
        );

        // Nothing listens on port 1; this job burns its single attempt
        tx.send(DownloadJob {
            source_url: "http://127.0.0.1:1/broken".to_string(),
            relative_path: PathBuf::from("broken"),
            destination_root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();
        tx.send(DownloadJob {
            source_url: format!("{}/good", server.uri()),
            relative_path: PathBuf::from("good"),
            destination_root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();
        drop(tx);

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(!dir.path().join("broken").exists());
        assert!(dir.path().join("good").is_file());
        // Attempt error + exhaustion error for the broken job only
        let mut messages = Vec::new();
        while let Ok(event) = streams.errors.try_recv() {
            messages.push(event.message);
        }
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("after 1 attempts"));
    }

    #[tokio::test]
    async fn cancellation_stops_idle_workers() {
        let (sink, _streams) = sink();
        let (_tx, rx) = mpsc::channel::<DownloadJob>(1);
        let cancel = CancellationToken::new();
        let handles = spawn_pool(2, Arc::new(Mutex::new(rx)), sink, cancel.clone());

        cancel.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .expect("idle worker must exit on cancellation")
                .unwrap();
        }
    }
}
