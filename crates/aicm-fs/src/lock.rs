//! Advisory lock file shared between threads and processes
//!
//! Each [`FileLock::acquire`] opens its own handle, so two acquisitions in the
//! same process exclude each other just like two processes do.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Guard over an exclusively locked file. The lock is released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock at `path` is held, or fail after `timeout`.
    ///
    /// The lock file and its parent directory are created on demand and left
    /// in place afterwards.
    pub fn acquire(path: &NormalizedPath, timeout: Duration) -> Result<Self> {
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native)
            .map_err(|e| Error::io(&native, e))?;

        let policy = backoff::ExponentialBackoff {
            current_interval: Duration::from_millis(5),
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(100),
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        backoff::retry(policy, || {
            file.try_lock_exclusive()
                .map_err(backoff::Error::transient)
        })
        .map_err(|_| Error::LockFailed {
            path: native.clone(),
        })?;

        tracing::trace!(path = %native.display(), "lock acquired");
        Ok(Self { file, path: native })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::trace!(path = %self.path.display(), "lock released");
    }
}
