//! # manifest-dl
//!
//! Concurrent bulk file downloader driven by tab-delimited URL manifests.
//!
//! Feed it a manifest stream of `url<TAB>relativePath` rows and it downloads
//! every listed file under `<manifestDir>/images/` with a bounded pool of
//! concurrent workers, per-file retry with a fixed delay, atomic temp-file +
//! rename publication, and idempotent re-runs (files already on disk are
//! skipped with zero network I/O).
//!
//! ## Design Philosophy
//!
//! - **Library-first** — no CLI or UI; file pickers, log views, and error
//!   export are thin wrappers the embedder writes around the event streams
//! - **Event-driven** — errors and progress flow out over two bounded
//!   channels; the core never renders anything
//! - **Bounded everywhere** — the job queue and both event channels apply
//!   backpressure instead of buffering without limit
//!
//! ## Quick Start
//!
//! ```no_run
//! use manifest_dl::{Config, EventStreams, ManifestDownloader};
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (engine, streams) = ManifestDownloader::new(Config::default())?;
//!
//!     // Drain the event streams; a run stalls if nobody reads them
//!     let EventStreams { mut errors, mut progress } = streams;
//!     tokio::spawn(async move {
//!         while let Some(error) = errors.recv().await {
//!             eprintln!("{error}");
//!         }
//!     });
//!     tokio::spawn(async move {
//!         while let Some(event) = progress.recv().await {
//!             println!("{event:?}");
//!         }
//!     });
//!
//!     let manifest = BufReader::new(tokio::fs::File::open("photos.tsv").await?);
//!     let run = engine.start_run(manifest, ".")?;
//!     run.wait().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Core download engine (run orchestration, worker pool)
pub mod downloader;
/// Error types
pub mod error;
/// Single-attempt fetch with atomic publication
pub mod fetcher;
/// Manifest parsing and job production
pub mod manifest;
/// Consumer-side rolling progress window
pub mod progress;
/// Retry logic with fixed inter-attempt delay
pub mod retry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, RetryConfig};
pub use downloader::{ManifestDownloader, RunHandle};
pub use error::{Error, Result};
pub use progress::{ProgressWindow, WINDOW_CAPACITY};
pub use retry::IsRetryable;
pub use types::{
    DownloadJob, DownloadOutcome, ErrorEvent, EventSink, EventStreams, FetchOutcome,
    ProgressEvent,
};
