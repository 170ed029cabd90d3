//! Configuration types for manifest-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behavior for transient per-attempt failures
///
/// The delay is fixed between attempts — no exponential backoff. Bulk image
/// pulls against a single origin gain nothing from backoff and the fixed
/// cadence keeps worst-case job latency predictable
/// (`max_attempts * delay` plus transfer time).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per job (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (default: 10 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

/// Main configuration for [`ManifestDownloader`](crate::ManifestDownloader)
///
/// All fields have serde defaults, so a deserialized `{}` is a fully working
/// configuration matching the defaults below.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Number of concurrent download workers (default: 10)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Capacity of the bounded job queue between producer and workers (default: 1)
    ///
    /// Deliberately small: a full queue suspends the manifest producer, so slow
    /// workers backpressure row parsing instead of buffering the whole manifest.
    #[serde(default = "default_job_queue_capacity")]
    pub job_queue_capacity: usize,

    /// Capacity of the outbound error channel (default: 10)
    ///
    /// A burst of errors that outpaces the consumer blocks the emitting worker.
    /// That throttle is intentional, but it couples download throughput to how
    /// fast the embedder drains the error stream.
    #[serde(default = "default_error_buffer")]
    pub error_buffer: usize,

    /// Capacity of the outbound progress channel (default: 16)
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,

    /// Subdirectory of the manifest's directory that receives downloads (default: "images")
    #[serde(default = "default_destination_subdir")]
    pub destination_subdir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            retry: RetryConfig::default(),
            job_queue_capacity: default_job_queue_capacity(),
            error_buffer: default_error_buffer(),
            progress_buffer: default_progress_buffer(),
            destination_subdir: default_destination_subdir(),
        }
    }
}

impl Config {
    /// Reject configurations the engine cannot run with
    pub(crate) fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Config {
                message: "worker_count must be at least 1".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        if self.job_queue_capacity == 0 || self.error_buffer == 0 || self.progress_buffer == 0 {
            return Err(Error::Config {
                message: "channel capacities must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn default_worker_count() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_job_queue_capacity() -> usize {
    1
}

fn default_error_buffer() -> usize {
    10
}

fn default_progress_buffer() -> usize {
    16
}

fn default_destination_subdir() -> String {
    "images".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
