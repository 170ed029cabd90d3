//! Single-attempt HTTP fetch with atomic publication
//!
//! One call to [`fetch_once`] is one attempt: GET the URL, stream the body to
//! `<dest>.tmp` in the destination's own directory, fsync, then rename onto the
//! final path. The rename is same-filesystem by construction, so readers either
//! see no file or the complete file — never a partial write. Retry policy lives
//! in [`crate::retry`]; this module never retries.
//!
//! A failed attempt leaves its `.tmp` behind. That is deliberate: the file is
//! useful for diagnosing what the server actually sent, and the next attempt's
//! `File::create` truncates it anyway, so leftovers never corrupt a later run.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::types::FetchOutcome;

/// Perform exactly one download attempt for `url` into `dest`.
///
/// If `dest` already exists as a non-directory file the attempt is an
/// idempotent skip: success with zero network I/O. The check runs here rather
/// than in the retry controller so it is re-evaluated on every attempt — a
/// concurrent or earlier attempt may have published the file in the meantime.
pub async fn fetch_once(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<FetchOutcome> {
    if is_regular_file(dest).await {
        tracing::debug!(path = %dest.display(), "destination already present, skipping");
        return Ok(FetchOutcome::AlreadyPresent);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status,
            url: url.to_string(),
        });
    }

    let tmp = temp_path(dest);
    let mut file = fs::File::create(&tmp).await?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, dest).await?;
    tracing::debug!(url, path = %dest.display(), "downloaded");
    Ok(FetchOutcome::Downloaded)
}

/// `<dest>.tmp`, in the same directory as `dest` so the final rename is atomic
pub(crate) fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn is_regular_file(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(meta) => !meta.is_dir(),
        Err(_) => false,
    }
}
