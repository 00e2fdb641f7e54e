//! Error types for solmate_io crate.
//!
//! Provides structured error handling for the creature store and the asset
//! manifests.

use thiserror::Error;

/// Main error type for solmate_io operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Unique or primary key violations
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed asset manifest
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<StoreError>,
    },
}

/// Result type alias for solmate_io operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Creates a new database error.
    #[must_use]
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Creates a new conflict error.
    #[must_use]
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a new manifest error.
    #[must_use]
    pub fn manifest<S: Into<String>>(msg: S) -> Self {
        Self::Manifest(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers.
    #[must_use]
    pub fn root(&self) -> &StoreError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), Self::Conflict(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err {
            let code = failure.extended_code;
            if code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            {
                return Self::Conflict(err.to_string());
            }
        }
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::database("disk on fire");
        assert_eq!(err.to_string(), "Database error: disk on fire");
    }

    #[test]
    fn test_error_context() {
        let err = StoreError::conflict("duplicate").with_context("inserting creature");
        assert!(err.to_string().contains("inserting creature"));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::FileSystem(_)));
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (k TEXT PRIMARY KEY)", []).unwrap();
        conn.execute("INSERT INTO t (k) VALUES ('a')", []).unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t (k) VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(err.is_conflict());
    }
}
