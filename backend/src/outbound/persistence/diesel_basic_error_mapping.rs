//! Shared Diesel error classification for the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Coarse outcome of a failed Diesel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped or could not be used.
    Connection(String),
    /// A unique index rejected the write; carries the constraint name if known.
    UniqueViolation(Option<String>),
    /// A foreign key rejected the write.
    ForeignKeyViolation,
    /// A CHECK constraint rejected the write.
    CheckViolation,
    /// Anything else.
    Query(String),
}

/// Classify a Diesel error, logging the raw cause at debug level.
pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            DieselFailure::Connection(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation(info.constraint_name().map(str::to_owned))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            DieselFailure::ForeignKeyViolation
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            DieselFailure::CheckViolation
        }
        DieselError::DatabaseError(_, info) => DieselFailure::Query(info.message().to_owned()),
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        other => DieselFailure::Query(other.to_string()),
    }
}
