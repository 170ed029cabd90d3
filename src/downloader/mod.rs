//! Core download engine — run orchestration over producer and worker pool
//!
//! [`ManifestDownloader`] owns the pieces that outlive a single run: the
//! configuration, the shared HTTP client, the event sink, and the one-run-at-
//! a-time guard. [`ManifestDownloader::start_run`] wires a manifest stream to
//! a fresh bounded job queue, spawns the producer and the worker pool, and
//! returns a [`RunHandle`] for waiting on or cancelling the run.

mod path_locks;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncBufRead;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest;
use crate::types::{EventSink, EventStreams};
use path_locks::PathLocks;

/// Handle to one in-flight download run
///
/// Dropping the handle does not stop the run; it keeps going in the
/// background and the engine accepts a new run once it finishes.
pub struct RunHandle {
    join: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// Request cancellation: the producer stops enqueuing, idle workers exit,
    /// and waiting retries abort. In-flight HTTP attempts run to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the producer has finished and every worker has drained out
    pub async fn wait(self) {
        let _ = self.join.await;
    }
}

/// Concurrent manifest download engine (cloneable — shared state is Arc-wrapped)
#[derive(Clone)]
pub struct ManifestDownloader {
    config: Arc<Config>,
    client: reqwest::Client,
    sink: EventSink,
    run_active: Arc<AtomicBool>,
}

impl ManifestDownloader {
    /// Create an engine and the event streams its runs will feed.
    ///
    /// The streams are handed out exactly once; both are bounded, so the
    /// embedder must keep draining them while a run is active or the run
    /// stalls on a full channel.
    pub fn new(config: Config) -> Result<(Self, EventStreams)> {
        config.validate()?;
        let (sink, streams) = EventSink::bounded(config.error_buffer, config.progress_buffer);
        let engine = Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
            sink,
            run_active: Arc::new(AtomicBool::new(false)),
        };
        Ok((engine, streams))
    }

    /// Whether a run is currently active (useful for disabling a UI trigger)
    pub fn is_running(&self) -> bool {
        self.run_active.load(Ordering::SeqCst)
    }

    /// Start one download run over an opened manifest stream.
    ///
    /// `manifest_dir` is the directory the manifest was opened from; every
    /// row's file lands under `<manifest_dir>/<destination_subdir>/<relativePath>`.
    /// Returns [`Error::RunInProgress`] if a previous run has not finished —
    /// the engine accepts one run at a time.
    pub fn start_run<R>(&self, manifest: R, manifest_dir: impl AsRef<Path>) -> Result<RunHandle>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::RunInProgress);
        }

        let destination_root: PathBuf =
            manifest_dir.as_ref().join(&self.config.destination_subdir);
        tracing::info!(
            destination = %destination_root.display(),
            workers = self.config.worker_count,
            "starting download run"
        );

        let cancel = CancellationToken::new();
        let (jobs_tx, jobs_rx) = mpsc::channel(self.config.job_queue_capacity);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let locks = PathLocks::default();

        let workers: Vec<_> = (0..self.config.worker_count)
            .map(|id| {
                tokio::spawn(worker::run(worker::WorkerContext {
                    id,
                    jobs: Arc::clone(&jobs_rx),
                    client: self.client.clone(),
                    retry: self.config.retry.clone(),
                    sink: self.sink.clone(),
                    cancel: cancel.clone(),
                    locks: locks.clone(),
                }))
            })
            .collect();

        let producer = tokio::spawn(manifest::produce_jobs(
            manifest,
            destination_root,
            jobs_tx,
            self.sink.clone(),
            cancel.clone(),
        ));

        // The run stays active until the queue is closed AND drained; only
        // then may the embedder start the next one.
        let run_active = Arc::clone(&self.run_active);
        let join = tokio::spawn(async move {
            let _ = producer.await;
            for handle in workers {
                let _ = handle.await;
            }
            run_active.store(false, Ordering::SeqCst);
            tracing::info!("download run finished");
        });

        Ok(RunHandle { join, cancel })
    }
}
