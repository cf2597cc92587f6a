//! # API Error Type
//!
//! Unified error type for ledger commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Caja POS                               │
//! │                                                                         │
//! │  ledger.checkout(tender)                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Business rule? ─── CoreError::InsufficientCash ───┐                   │
//! │         │              (nothing written)           │                   │
//! │         ▼                                          ▼                   │
//! │  Storage?  ──────── DbError::Conflict ────────► ApiError ──► UI        │
//! │         │              (transaction rolled back)   ▲                   │
//! │         ▼                                          │                   │
//! │  Admin gate? ────── Forbidden ─────────────────────┘                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures keep their raw message so the cashier sees what the
//! database said.

use serde::Serialize;
use ts_rs::TS;

use caja_core::CoreError;
use caja_db::{ConflictKind, DbError};

/// Error returned from ledger commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CREDIT_ERROR",
///   "message": "Client Carmen Soto is not authorized for credit"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Business rule rejected the operation
    BusinessLogic,

    /// Internal error
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Cash / tender problem
    PaymentError,

    /// Fiado client missing, unauthorized or over limit
    CreditError,

    /// No open shift, or one already open
    ShiftError,

    /// Another terminal changed the record first
    Conflict,

    /// Admin screens are locked
    Forbidden,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "Admin access required")
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Conflict { kind, .. } => {
                let code = match kind {
                    ConflictKind::Stock => ErrorCode::InsufficientStock,
                    ConflictKind::CreditLimit => ErrorCode::CreditError,
                    ConflictKind::ShiftOpen => ErrorCode::ShiftError,
                    ConflictKind::State => ErrorCode::Conflict,
                    ConflictKind::Returned => ErrorCode::BusinessLogic,
                };
                tracing::warn!(error = %message, "Posting lost a race and was rolled back");
                ApiError::new(code, message)
            }
            DbError::UniqueViolation { .. } => {
                tracing::warn!(error = %message, "Unique constraint rejected write");
                ApiError::new(ErrorCode::Conflict, message)
            }
            DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                tracing::error!(error = %message, "Constraint rejected write");
                ApiError::new(ErrorCode::ValidationError, message)
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Encoding(_)
            | DbError::PoolExhausted => {
                tracing::error!(error = %message, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match &err {
            CoreError::EmptyCart => ErrorCode::CartError,
            CoreError::CashRequired | CoreError::InsufficientCash { .. } => ErrorCode::PaymentError,
            CoreError::ClientRequired
            | CoreError::ClientNotAuthorized { .. }
            | CoreError::CreditLimitExceeded { .. }
            | CoreError::PaymentExceedsBalance { .. } => ErrorCode::CreditError,
            CoreError::NoOpenShift | CoreError::ShiftAlreadyOpen { .. } => ErrorCode::ShiftError,
            CoreError::ClientNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::NothingToReturn
            | CoreError::ReturnQuantityExceeded { .. }
            | CoreError::InvalidReturn { .. } => ErrorCode::BusinessLogic,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        tracing::warn!(code = ?code, reason = %message, "Operation rejected");
        ApiError::new(code, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for ledger commands.
pub type ApiResult<T> = Result<T, ApiError>;
