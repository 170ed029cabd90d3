//! Job producer — turns a tab-delimited manifest stream into download jobs
//!
//! Each row is `url<TAB>relativePath` (extra fields are ignored). Rows become
//! [`DownloadJob`]s pushed into the bounded job queue; a full queue suspends
//! the producer, so slow workers backpressure manifest parsing. A malformed
//! row or a stream read error is terminal: one error event, then no further
//! rows are parsed. Jobs already in the queue still complete.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::types::{DownloadJob, EventSink, ProgressEvent};

/// Read manifest rows from `reader` and enqueue one job per valid row.
///
/// Emits [`ProgressEvent::RunStarted`] before the first row, one
/// [`ProgressEvent::FileStarted`] per parsed row (before enqueuing it), and
/// [`ProgressEvent::RunCompleted`] once production ends. Closing the returned-to
/// side of `jobs` is the pool's only termination signal: this function drops
/// the sender when it returns.
pub async fn produce_jobs<R>(
    reader: R,
    destination_root: PathBuf,
    jobs: mpsc::Sender<DownloadJob>,
    sink: EventSink,
    cancel: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
{
    sink.progress(ProgressEvent::RunStarted {
        destination_root: destination_root.clone(),
    })
    .await;

    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                let err = Error::Io(e);
                tracing::warn!(error = %err, "manifest read failed, stopping production");
                sink.error(&err).await;
                break;
            }
        };
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            let err = Error::Manifest {
                row: fields.join(" | "),
            };
            tracing::warn!(error = %err, "malformed manifest row, stopping production");
            sink.error(&err).await;
            break;
        }

        let job = DownloadJob {
            source_url: fields[0].to_string(),
            relative_path: PathBuf::from(fields[1]),
            destination_root: destination_root.clone(),
        };

        sink.progress(ProgressEvent::FileStarted {
            basename: url_basename(&job.source_url).to_string(),
        })
        .await;

        tokio::select! {
            sent = jobs.send(job) => {
                if sent.is_err() {
                    // All workers are gone; nothing left to produce for.
                    tracing::debug!("job queue closed, stopping production");
                    break;
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("run cancelled, stopping production");
                return;
            }
        }
    }

    sink.progress(ProgressEvent::RunCompleted).await;
}

/// Last non-empty path segment of a URL, used as the progress-stream display name
fn url_basename(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    if trimmed.is_empty() {
        // Nothing but slashes; show the URL as-is rather than a blank line
        return url;
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
