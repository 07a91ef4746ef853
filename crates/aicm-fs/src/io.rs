//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fs2::FileExt;
use walkdir::WalkDir;

use crate::{Error, NormalizedPath, RelativePath, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Knobs for how hard atomic writes try before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Upper bound for acquiring the temp-file lock and retrying the rename.
    pub lock_timeout: Duration,
    /// Flush file contents to disk before renaming into place.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename in the same directory so readers see either
/// the old or the new content, never a prefix. Parent directories are created.
/// A transiently failing rename (e.g. a scanner holding the target open on
/// Windows) is retried with exponential backoff up to `config.lock_timeout`.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.{}.tmp",
        path.file_name().unwrap_or("unnamed"),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .try_lock_exclusive()
            .map_err(|_| Error::LockFailed {
                path: native_path.clone(),
            })?;

        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;

        if config.enable_fsync {
            temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        }

        FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;
        drop(temp_file);

        retry_transient(config.lock_timeout, || fs::rename(&temp_path, &native_path))
            .map_err(|e| Error::io(&native_path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Write text with the default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    fs::read(path.to_native()).map_err(|e| Error::io(path.to_native(), e))
}

/// Read a file as text, replacing invalid UTF-8 sequences.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let bytes = read_bytes(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// Like [`read_bytes`], but a missing file is `Ok(None)`.
pub fn read_bytes_optional(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    match fs::read(path.to_native()) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path.to_native(), e)),
    }
}

/// Like [`read_text`], but a missing file is `Ok(None)`.
pub fn read_text_optional(path: &NormalizedPath) -> Result<Option<String>> {
    Ok(read_bytes_optional(path)?.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// Remove a file. Returns `false` if it was already absent.
pub fn remove_file(path: &NormalizedPath) -> Result<bool> {
    match fs::remove_file(path.to_native()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path.to_native(), e)),
    }
}

/// List every regular file below `base`, sorted, as paths relative to it.
///
/// A missing `base` yields an empty list. Leftover temp files from
/// [`write_atomic`] are skipped.
pub fn list_files(base: &NormalizedPath) -> Result<Vec<RelativePath>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let root = base.to_native();
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(|p| p.to_path_buf()).unwrap_or_else(|| root.clone());
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') && name.ends_with(".tmp") {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&root)
            .map_err(|_| Error::invalid_path(entry.path().display().to_string(), "outside base"))?;
        files.push(RelativePath::parse(&relative.to_string_lossy())?);
    }

    files.sort();
    Ok(files)
}

fn retry_transient<T>(
    timeout: Duration,
    mut op: impl FnMut() -> std::io::Result<T>,
) -> std::io::Result<T> {
    let policy = backoff::ExponentialBackoff {
        current_interval: Duration::from_millis(10),
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(250),
        max_elapsed_time: Some(timeout),
        ..Default::default()
    };

    backoff::retry(policy, || {
        op().map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied | ErrorKind::ResourceBusy => backoff::Error::transient(e),
            _ => backoff::Error::permanent(e),
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}
