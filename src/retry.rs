//! Retry controller — bounded attempts with a fixed inter-attempt delay
//!
//! Wraps a single-attempt operation (normally [`crate::fetcher::fetch_once`])
//! in a retry loop. Every failed attempt is reported on the error stream the
//! moment it happens, then the controller sleeps the configured delay and
//! tries again, up to the attempt cap. The sleep is local to the calling
//! worker and is tied to the run's cancellation token, so a future "stop run"
//! surface interrupts waiting retries without touching this module.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::Error;
use crate::types::{DownloadOutcome, EventSink, FetchOutcome};

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (transport errors, non-2xx responses, file I/O) should
/// return `true`. Failures that cannot improve on a retry (directory creation,
/// configuration) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the attempt should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // One attempt's worth of network, server, or file trouble — the
            // whole point of the retry loop
            Error::Network(_) | Error::HttpStatus { .. } | Error::Io(_) => true,
            // A destination directory that cannot be created will not appear
            // by waiting; fatal to the job on first sight
            Error::CreateDir { .. } => false,
            // Run-level and terminal conditions, never retried per attempt
            Error::Config { .. }
            | Error::Manifest { .. }
            | Error::RetriesExhausted { .. }
            | Error::RunInProgress => false,
        }
    }
}

/// Drive `operation` to success or give up after `config.max_attempts` tries.
///
/// Emits one error event per failed attempt and, when the cap is reached, a
/// final "cannot download ... after N attempts" event. The returned outcome
/// is `Failure` on exhaustion, on the first non-retryable error, and on
/// cancellation during an inter-attempt sleep; all three are non-fatal to the
/// rest of the pool.
pub async fn download_with_retry<F, Fut>(
    url: &str,
    config: &RetryConfig,
    sink: &EventSink,
    cancel: &CancellationToken,
    mut operation: F,
) -> DownloadOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::error::Result<FetchOutcome>>,
{
    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(FetchOutcome::Downloaded) => {
                if attempt > 1 {
                    tracing::info!(url, attempts = attempt, "download succeeded after retry");
                }
                return DownloadOutcome::Success;
            }
            Ok(FetchOutcome::AlreadyPresent) => {
                tracing::debug!(url, "already downloaded");
                return DownloadOutcome::Success;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url,
                    attempt,
                    max_attempts = config.max_attempts,
                    "download attempt failed"
                );
                sink.error(&e).await;

                if !e.is_retryable() {
                    return DownloadOutcome::Failure {
                        reason: e.to_string(),
                    };
                }
                if attempt < config.max_attempts {
                    tokio::select! {
                        _ = tokio::time::sleep(config.delay) => {}
                        _ = cancel.cancelled() => {
                            tracing::info!(url, "retry wait cancelled");
                            return DownloadOutcome::Failure {
                                reason: "run cancelled".to_string(),
                            };
                        }
                    }
                }
            }
        }
    }

    let exhausted = Error::RetriesExhausted {
        url: url.to_string(),
        attempts: config.max_attempts,
    };
    tracing::error!(url, attempts = config.max_attempts, "giving up on download");
    sink.error(&exhausted).await;
    DownloadOutcome::Failure {
        reason: exhausted.to_string(),
    }
}
