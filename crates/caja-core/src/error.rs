//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caja-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  caja-ledger errors                                                    │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is raised BEFORE any write happens. A rejected checkout,
//! return, shift action or credit payment never leaves partial state behind.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash checkout without a received amount.
    #[error("Cash received is required for cash payments")]
    CashRequired,

    /// Cash received does not cover the total.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart total: $2000
    /// Received:   $1500
    ///      │
    ///      ▼
    /// InsufficientCash { total: $2000, received: $1500 }
    ///      │
    ///      ▼
    /// UI shows: "Cash received $1500 is below total $2000"
    /// ```
    #[error("Cash received {received} is below total {total}")]
    InsufficientCash { total: Money, received: Money },

    /// Fiado checkout without a selected client.
    #[error("A credit client must be selected for fiado payments")]
    ClientRequired,

    /// Client id does not exist.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Client exists but is not authorized for credit.
    #[error("Client {client} is not authorized for credit")]
    ClientNotAuthorized { client: String },

    /// Charge would push the client's balance over their limit.
    #[error("Credit limit exceeded for {client}: balance {balance} + {amount} > limit {limit}")]
    CreditLimitExceeded {
        client: String,
        balance: Money,
        amount: Money,
        limit: Money,
    },

    /// Operation requires an open shift and none exists.
    #[error("No shift is currently open")]
    NoOpenShift,

    /// Opening a shift while another is open.
    #[error("Shift {shift_id} is already open")]
    ShiftAlreadyOpen { shift_id: String },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough stock to satisfy the requested quantity.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A return was requested with no positive quantity.
    #[error("Select at least one item to return")]
    NothingToReturn,

    /// Return quantity above what is still returnable on the original ticket.
    #[error("Cannot return {requested} of {product}: only {returnable} returnable")]
    ReturnQuantityExceeded {
        product: String,
        returnable: i64,
        requested: i64,
    },

    /// Return request is structurally invalid.
    #[error("Invalid return: {reason}")]
    InvalidReturn { reason: String },

    /// Partial payment larger than the outstanding balance.
    #[error("Payment {amount} exceeds outstanding balance {balance}")]
    PaymentExceedsBalance { balance: Money, amount: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, unknown enum label).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientCash {
            total: Money::from_minor(2000),
            received: Money::from_minor(1500),
        };
        assert_eq!(err.to_string(), "Cash received $1500 is below total $2000");

        let err = CoreError::CreditLimitExceeded {
            client: "Rosa".to_string(),
            balance: Money::from_minor(7000),
            amount: Money::from_minor(4000),
            limit: Money::from_minor(10000),
        };
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded for Rosa: balance $7000 + $4000 > limit $10000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "seller".to_string(),
        };
        assert_eq!(err.to_string(), "seller is required");

        let err = ValidationError::Negative {
            field: "initial cash".to_string(),
        };
        assert_eq!(err.to_string(), "initial cash cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
