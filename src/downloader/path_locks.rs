//! Per-destination-path serialization
//!
//! A manifest may name the same relative path on two rows. Without a guard the
//! two jobs race each other's temp file and rename; with one, the second job
//! waits and then takes the idempotent-skip path because the first already
//! published the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Run-scoped map of destination path to its lock
///
/// Keys are the joined destination paths as produced from the manifest, not
/// canonicalized — the files do not exist yet, and all paths in one run share
/// the same root, so textual equality is the right identity.
#[derive(Clone, Default)]
pub(crate) struct PathLocks {
    inner: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl PathLocks {
    /// Acquire the lock for `path`, waiting if another worker holds it
    pub(crate) async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(path.to_path_buf()).or_default())
        };
        slot.lock_owned().await
    }
}
