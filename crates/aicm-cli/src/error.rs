//! Error types for aicm-cli

use aicm_core::ErrorKind;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from aicm-core
    #[error(transparent)]
    Core(#[from] aicm_core::Error),

    /// Error from aicm-fs
    #[error(transparent)]
    Fs(#[from] aicm_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code: 2 for rejected input or config, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(err) => match err.kind() {
                ErrorKind::InvalidConfig | ErrorKind::InvalidInput | ErrorKind::StaleSelection => 2,
                ErrorKind::NotFound | ErrorKind::IoFailure => 1,
            },
            Self::User { .. } => 2,
            _ => 1,
        }
    }

    /// A hint printed after the error, such as which backup undoes a partial write.
    pub fn hint(&self) -> Option<String> {
        let Self::Core(err) = self else {
            return None;
        };
        err.recovery_backup()
            .map(|id| format!("Run `aicm backup restore {id}` to undo the partial change."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_display() {
        let error = CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_follows_core_kind() {
        let not_found: CliError = aicm_core::Error::not_found("backup x").into();
        assert_eq!(not_found.exit_code(), 1);

        let stale: CliError = aicm_core::Error::StaleSelection {
            ids: vec!["codex:nope".to_string()],
        }
        .into();
        assert_eq!(stale.exit_code(), 2);
        assert!(stale.hint().is_none());
    }

    #[test]
    fn test_partial_apply_hints_at_restore() {
        let err: CliError = aicm_core::Error::PartialApply {
            backup_id: Some("20260101T000000000Z-000".to_string()),
            failed: "claude/CLAUDE.md".to_string(),
            succeeded: vec!["codex/AGENTS.md".to_string()],
            source: Box::new(aicm_core::Error::not_found("x")),
        }
        .into();
        assert!(err.hint().unwrap().contains("20260101T000000000Z-000"));
    }
}
