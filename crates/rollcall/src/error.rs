//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate,
//! along with the [`Notice`] pair (title + description) that user-facing
//! surfaces display for every failure path.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::roster::RosterField;

/// Reasons a roster import is rejected.
///
/// All variants are detected before anything is written; any of them blocks
/// the whole import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// A mandatory column could not be located in the header row.
    #[error("missing {field} column (header row {header_row}, found headers: {headers:?})")]
    MissingColumn {
        /// The field whose column is missing.
        field: RosterField,
        /// Index of the row that was used as the header.
        header_row: usize,
        /// The header cells as they were read.
        headers: Vec<String>,
    },

    /// One or more identifiers appear more than once.
    #[error("duplicate identifiers found: {}", .0.join(", "))]
    DuplicateIdentifier(Vec<String>),

    /// No row produced a usable record.
    #[error("no valid user data found")]
    EmptyResult,
}

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Roster Errors ===
    /// The uploaded roster failed validation.
    #[error("roster import rejected: {0}")]
    Import(#[from] ImportError),

    /// No roster record carries the given identifier.
    #[error("no user with identifier '{identifier}'")]
    RecordNotFound {
        /// The identifier that was looked up.
        identifier: String,
    },

    // === Authorization Errors ===
    /// The caller is not the configured admin.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why the credential was rejected.
        reason: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// A user-facing message with a short title and a longer description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short headline, e.g. for a dialog title.
    pub title: String,
    /// Full human-readable explanation.
    pub description: String,
}

impl Notice {
    /// Create a notice from a title and description.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

impl ImportError {
    /// Build the user-facing notice for this rejection.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::MissingColumn {
                field, headers, ..
            } => Notice::new(
                "Missing column",
                format!(
                    "The spreadsheet must contain a \"{}\" column. Found headers: {headers:?}",
                    field.label()
                ),
            ),
            Self::DuplicateIdentifier(values) => Notice::new(
                "Duplicate identifiers",
                format!("Duplicate identifiers found: {}", values.join(", ")),
            ),
            Self::EmptyResult => Notice::new(
                "No data found",
                "No valid user data found in the spreadsheet.",
            ),
        }
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a record-not-found error.
    #[must_use]
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::RecordNotFound {
            identifier: identifier.into(),
        }
    }

    /// Check if this error is an authorization failure.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this error is a roster validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Import(_))
    }

    /// Build the user-facing notice for this error.
    ///
    /// Persistence failures are surfaced as-is under a generic title; they
    /// are never retried.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Import(err) => err.notice(),
            Self::RecordNotFound { identifier } => {
                Notice::new("User not found", format!("No user with identifier {identifier}."))
            }
            Self::Unauthorized { reason } => Notice::new("Access denied", reason.clone()),
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. } => {
                Notice::new("Operation failed", self.to_string())
            }
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => {
                Notice::new("Configuration error", self.to_string())
            }
            Self::Io(_) | Self::DirectoryCreate { .. } | Self::Json(_) => {
                Notice::new("File error", self.to_string())
            }
            Self::Internal(_) => Notice::new("Unexpected error", self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display() {
        let err = ImportError::MissingColumn {
            field: RosterField::Identifier,
            header_row: 1,
            headers: vec!["Name".to_string(), "Passport".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("identifier"));
        assert!(msg.contains("header row 1"));
        assert!(msg.contains("Passport"));
    }

    #[test]
    fn test_duplicate_identifier_display() {
        let err = ImportError::DuplicateIdentifier(vec!["A1".to_string(), "B2".to_string()]);
        assert_eq!(err.to_string(), "duplicate identifiers found: A1, B2");
    }

    #[test]
    fn test_import_error_converts() {
        let err: Error = ImportError::EmptyResult.into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("no valid user data"));
    }

    #[test]
    fn test_notice_for_each_import_error() {
        let missing = ImportError::MissingColumn {
            field: RosterField::Name,
            header_row: 0,
            headers: vec!["Iqama".to_string()],
        };
        assert_eq!(missing.notice().title, "Missing column");
        assert!(missing.notice().description.contains("\"Name\""));

        let dup = ImportError::DuplicateIdentifier(vec!["A1".to_string()]);
        assert_eq!(dup.notice().title, "Duplicate identifiers");
        assert!(dup.notice().description.contains("A1"));

        assert_eq!(ImportError::EmptyResult.notice().title, "No data found");
    }

    #[test]
    fn test_notice_titles_are_distinct() {
        let titles = [
            Error::from(ImportError::EmptyResult).notice().title,
            Error::unauthorized("nope").notice().title,
            Error::record_not_found("X").notice().title,
            Error::internal("bug").notice().title,
            Error::DatabaseMigration {
                message: "bad".to_string(),
            }
            .notice()
            .title,
        ];
        for (i, a) in titles.iter().enumerate() {
            for b in &titles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_unauthorized() {
        let err = Error::unauthorized("only the authorized admin can log in");
        assert!(err.is_unauthorized());
        assert!(!err.is_validation());
        assert_eq!(
            err.notice().description,
            "only the authorized admin can log in"
        );
    }

    #[test]
    fn test_record_not_found_display() {
        let err = Error::record_not_found("2345678901");
        assert_eq!(err.to_string(), "no user with identifier '2345678901'");
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::new("Title", "Body");
        assert_eq!(notice.to_string(), "Title: Body");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert_eq!(err.notice().title, "File error");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert_eq!(err.notice().title, "Operation failed");
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "capacity must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("capacity"));
        assert_eq!(err.notice().title, "Configuration error");
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
