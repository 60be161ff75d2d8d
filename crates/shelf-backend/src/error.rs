//! Backend error types.
//!
//! Every gateway call returns either a plain-data result or a
//! [`BackendError`]. Its `Display` text is the string-typed rejection reason
//! the client shows next to the failed operation.

use std::path::PathBuf;

use shelf_model::EntityKind;
use thiserror::Error;

/// Backend request failure.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No database is currently open.
    #[error("No connection to database")]
    NoConnection,

    /// The addressed row does not exist.
    #[error("Missing {entity} [{id}]")]
    NotFound { entity: EntityKind, id: i64 },

    /// A referential or validation rule refused the request.
    #[error("{0}")]
    Constraint(String),

    /// The request was refused for a reason not covered above.
    #[error("{0}")]
    Rejected(String),

    /// SQLite engine error.
    #[error(transparent)]
    Sqlite(rusqlite::Error),

    /// File system error while opening or backing up a database.
    #[error("Failed to {operation} database at {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Shorthand for [`BackendError::NotFound`].
    pub fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoConnection => "No database is open.".to_string(),
            Self::NotFound { entity, id } => {
                format!("{} [{}] no longer exists.", entity.label(), id)
            }
            Self::Constraint(reason) | Self::Rejected(reason) => reason.clone(),
            Self::Sqlite(error) => match error.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => {
                    format!("The change was refused by the database: {error}")
                }
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                    "The database is busy. Try again in a moment.".to_string()
                }
                _ => error.to_string(),
            },
            Self::Io {
                operation, path, ..
            } => format!("Could not {} the database at {}", operation, path.display()),
        }
    }
}

impl From<rusqlite::Error> for BackendError {
    /// Trigger aborts carry the rule's own message and become
    /// [`BackendError::Constraint`]; everything else stays an engine error.
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, Some(message))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER =>
            {
                Self::Constraint(message.clone())
            }
            _ => Self::Sqlite(error),
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = BackendError::not_found(EntityKind::Work, 4);
        assert_eq!(error.to_string(), "Missing Work [4]");
        assert_eq!(error.user_message(), "Work [4] no longer exists.");
    }

    #[test]
    fn test_constraint_passes_reason_through() {
        let error = BackendError::Constraint("Status still in use".into());
        assert_eq!(error.to_string(), "Status still in use");
        assert_eq!(error.user_message(), "Status still in use");
    }
}
