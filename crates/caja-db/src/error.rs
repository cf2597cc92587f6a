//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► caja_ledger::ApiError
//!                   │
//!                   └── Conflict: a guarded UPDATE matched no row and the
//!                       posting transaction was rolled back
//! ```
//!
//! Messages carry what SQLite reported; the ledger shows them unchanged.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Which guarded write lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Conditional stock decrement found less stock than requested.
    Stock,
    /// Conditional fiado charge found the client unauthorized or over limit.
    CreditLimit,
    /// Another shift is already open.
    ShiftOpen,
    /// Target row is not in the expected state, e.g. closing a closed shift.
    State,
    /// Another return already took back the units on this ticket.
    Returned,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the row: a ticket number taken by another
    /// terminal, or a second open shift.
    #[error("Duplicate value rejected by {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A column CHECK (non-negative stock, balance, price) rejected a write.
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    #[error("Conflict on {entity} {id}: {message}")]
    Conflict {
        kind: ConflictKind,
        entity: String,
        id: String,
        message: String,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A JSON column could not be written.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(
        kind: ConflictKind,
        entity: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DbError::Conflict {
            kind,
            entity: entity.into(),
            id: id.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        // "UNIQUE constraint failed: sales.ticket"
                        constraint: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or(message.as_str())
                            .to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Encoding(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let err = DbError::conflict(ConflictKind::Stock, "Product", "p-1", "stock 1 < 2");
        assert_eq!(err.to_string(), "Conflict on Product p-1: stock 1 < 2");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_closed_pool_is_a_connection_failure() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
