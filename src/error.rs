use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which side of a managed database is ahead of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Listed in the index but not found on disk.
    Missing,
    /// Found on disk but not listed in the index.
    Extra,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("indexed but missing on disk"),
            Self::Extra => f.write_str("on disk but missing from index"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FahdbError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),
    #[error("no record metadata file found in {0}")]
    RecordNotFound(PathBuf),
    #[error("inconsistent database {home}: {} record(s) {kind}: {}", .ids.len(), .ids.join(", "))]
    InconsistentDatabase {
        home: PathBuf,
        kind: Divergence,
        ids: Vec<String>,
    },
    #[error("invalid input {path}: {reason}")]
    InputError { path: PathBuf, reason: String },
    #[error("sync destination already exists: {0}")]
    DestinationExists(PathBuf),
    #[error("record {unique_id} failed validation after copy: {reason}")]
    ValidationError { unique_id: String, reason: String },
}

impl FahdbError {
    pub fn input(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::InputError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::PathNotFound(_) => "E_PATH_NOT_FOUND",
            Self::RecordNotFound(_) => "E_RECORD_NOT_FOUND",
            Self::InconsistentDatabase { .. } => "E_INCONSISTENT_DATABASE",
            Self::InputError { .. } => "E_INPUT",
            Self::DestinationExists(_) => "E_DESTINATION_EXISTS",
            Self::ValidationError { .. } => "E_VALIDATION",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PathNotFound(_) => 2,
            Self::RecordNotFound(_) => 3,
            Self::InconsistentDatabase { .. } => 4,
            Self::InputError { .. } => 5,
            Self::DestinationExists(_) => 6,
            Self::ValidationError { .. } => 7,
        }
    }
}

/// Exit status for any error bubbling out of a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FahdbError>()
        .map(FahdbError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn typed_error_survives_context_chain() {
        let err = Err::<(), _>(FahdbError::DestinationExists(PathBuf::from("/tmp/x")))
            .context("copy failed")
            .expect_err("error");
        assert_eq!(exit_code_for(&err), 6);
        let typed = err.downcast_ref::<FahdbError>().expect("typed");
        assert_eq!(typed.code(), "E_DESTINATION_EXISTS");
    }

    #[test]
    fn untyped_errors_exit_with_one() {
        let err = anyhow::anyhow!("plain failure");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn inconsistent_database_lists_ids() {
        let err = FahdbError::InconsistentDatabase {
            home: PathBuf::from("/db"),
            kind: Divergence::Missing,
            ids: vec!["a".to_string(), "b".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 record(s) indexed but missing on disk"));
        assert!(text.contains("a, b"));
    }
}
