//! Error types for manifest-dl
//!
//! Every failure the engine can hit is a variant of [`Error`]; all of them are
//! surfaced to the embedder as text on the error stream, and none of them abort
//! the process. The [`IsRetryable`] classification in [`crate::retry`] decides
//! which variants the retry controller is allowed to retry.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for manifest-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for manifest-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid worker count, zero capacity, etc.)
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the invalid setting
        message: String,
    },

    /// Malformed manifest row — fewer than two tab-delimited fields
    ///
    /// Terminal for the current run's job production: no job is created for
    /// this row or any row after it.
    #[error("wrong number of columns: {row}")]
    Manifest {
        /// The offending row's fields, joined with " | " for display
        row: String,
    },

    /// Network or transport error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("received status {status} for {url}")]
    HttpStatus {
        /// The non-2xx status the server returned
        status: reqwest::StatusCode,
        /// The URL that was requested
        url: String,
    },

    /// I/O error while writing, syncing, or renaming the downloaded file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not create the destination's parent directory
    ///
    /// Fatal to the job — directory creation is not retried.
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// All retry attempts for one job failed
    #[error("cannot download {url} after {attempts} attempts")]
    RetriesExhausted {
        /// The URL that could not be downloaded
        url: String,
        /// How many attempts were made
        attempts: u32,
    },

    /// A download run is already active; the engine accepts one run at a time
    #[error("a download run is already in progress")]
    RunInProgress,
}
