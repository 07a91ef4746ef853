//! Filesystem primitives for AI Config Manager
//!
//! Everything in here is domain-neutral: validated relative paths, atomic
//! writes, lossy text reads, recursive listing, checksums, format-detecting
//! config load/save and an advisory lock file.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use lock::FileLock;
pub use path::{NormalizedPath, RelativePath, validate_identifier};
