//! Core types and events for manifest-dl

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::error::Error;

/// One manifest row's worth of download work
///
/// Immutable once enqueued; consumed exactly once by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadJob {
    /// The URL to fetch
    pub source_url: String,
    /// Destination path relative to [`destination_root`](Self::destination_root)
    pub relative_path: PathBuf,
    /// Root directory all of this run's downloads land under
    pub destination_root: PathBuf,
}

impl DownloadJob {
    /// The final path this job's file is published at
    pub fn destination_path(&self) -> PathBuf {
        self.destination_root.join(&self.relative_path)
    }
}

/// Result of a single fetch attempt that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was downloaded and atomically published
    Downloaded,
    /// The destination already existed as a regular file; no network I/O performed
    AlreadyPresent,
}

/// Terminal result of one job after the retry controller is done with it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file is present at its destination
    Success,
    /// The job gave up; the reason has already been emitted on the error stream
    Failure {
        /// Why the job failed (exhausted retries, unretryable error, or cancellation)
        reason: String,
    },
}

/// One entry on the error stream
///
/// Events arrive in emission order, which under concurrent workers is not
/// the manifest's row order.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorEvent {
    /// Human-readable error text
    pub message: String,
    /// When the error was emitted
    pub at: DateTime<Utc>,
}

impl ErrorEvent {
    pub(crate) fn new(message: String) -> Self {
        Self {
            message,
            at: Utc::now(),
        }
    }
}

impl std::fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// One entry on the progress stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProgressEvent {
    /// A run started; all files will land under `destination_root`
    RunStarted {
        /// Root directory for this run's downloads
        destination_root: PathBuf,
    },
    /// A row was parsed and its job is about to be enqueued
    FileStarted {
        /// Basename of the row's URL
        basename: String,
    },
    /// The manifest is exhausted and every job has been dispatched
    ///
    /// Dispatched, not completed — workers may still be downloading.
    RunCompleted,
}

/// Receiving halves of the engine's two outbound event streams
///
/// Handed out once by [`ManifestDownloader::new`](crate::ManifestDownloader::new).
/// Both channels are bounded; an embedder that stops draining them eventually
/// stalls the run (intentional backpressure).
pub struct EventStreams {
    /// Ordered human-readable error stream
    pub errors: mpsc::Receiver<ErrorEvent>,
    /// Ordered progress stream
    pub progress: mpsc::Receiver<ProgressEvent>,
}

/// Sending half of the event streams, shared by the producer and all workers
#[derive(Clone)]
pub struct EventSink {
    error_tx: mpsc::Sender<ErrorEvent>,
    progress_tx: mpsc::Sender<ProgressEvent>,
}

impl EventSink {
    /// Create a bounded sink/streams pair
    pub(crate) fn bounded(error_buffer: usize, progress_buffer: usize) -> (Self, EventStreams) {
        let (error_tx, errors) = mpsc::channel(error_buffer);
        let (progress_tx, progress) = mpsc::channel(progress_buffer);
        (
            Self {
                error_tx,
                progress_tx,
            },
            EventStreams { errors, progress },
        )
    }

    /// Emit one error event; suspends while the error channel is full
    ///
    /// A dropped receiver is not an emitter error — the embedder has walked
    /// away from the stream and the event is discarded.
    pub async fn error(&self, error: &Error) {
        let _ = self.error_tx.send(ErrorEvent::new(error.to_string())).await;
    }

    /// Emit one progress event; suspends while the progress channel is full
    pub async fn progress(&self, event: ProgressEvent) {
        let _ = self.progress_tx.send(event).await;
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn destination_path_joins_root_and_relative() {
        let job = DownloadJob {
            source_url: "http://x/a.png".to_string(),
            relative_path: PathBuf::from("foo/a.png"),
            destination_root: PathBuf::from("/data/images"),
        };
        assert_eq!(
            job.destination_path(),
            Path::new("/data/images/foo/a.png")
        );
    }

    #[tokio::test]
    async fn sink_delivers_errors_in_emission_order() {
        let (sink, mut streams) = EventSink::bounded(4, 4);
        sink.error(&Error::Manifest {
            row: "first".to_string(),
        })
        .await;
        sink.error(&Error::Manifest {
            row: "second".to_string(),
        })
        .await;

        let a = streams.errors.recv().await.unwrap();
        let b = streams.errors.recv().await.unwrap();
        assert!(a.message.contains("first"));
        assert!(b.message.contains("second"));
        assert!(a.at <= b.at);
    }

    #[tokio::test]
    async fn full_error_channel_suspends_the_emitter() {
        let (sink, mut streams) = EventSink::bounded(1, 1);
        // First event fills the capacity-1 channel
        sink.error(&Error::RunInProgress).await;

        // Second emission must stay pending while the channel is full
        let second = sink.error(&Error::RunInProgress);
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), second)
                .await
                .is_err(),
            "emitter must suspend on a full error channel"
        );

        // Draining one event frees a slot and the next emission goes through
        streams.errors.recv().await.unwrap();
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            sink.error(&Error::RunInProgress),
        )
        .await
        .expect("emission must complete once the consumer drains");
        assert!(streams.errors.recv().await.is_some());
    }

    #[tokio::test]
    async fn sink_survives_dropped_receiver() {
        let (sink, streams) = EventSink::bounded(1, 1);
        drop(streams);
        // Neither call may panic or hang
        sink.progress(ProgressEvent::RunCompleted).await;
        sink.error(&Error::RunInProgress).await;
    }

    #[test]
    fn progress_event_serializes_with_kind_tag() {
        let json = serde_json::to_string(&ProgressEvent::FileStarted {
            basename: "a.png".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"file_started\""), "json: {json}");
    }
}
