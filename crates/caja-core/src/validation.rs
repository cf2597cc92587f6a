//! # Validation Module
//!
//! Field rules checked before any business rule or write. Every
//! validator trims and returns the cleaned value where there is one.
//!
//! The schema backs a few of these up: `CHECK (stock >= 0)`,
//! `CHECK (balance >= 0)` and the partial unique indexes on tickets and
//! open shifts.
//!
//! ## Usage
//! ```rust
//! use caja_core::validation::{validate_product_name, validate_quantity};
//!
//! assert!(validate_product_name("Pan amasado").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Product names: 1 to 200 characters after trimming.
///
/// ## Example
/// ```rust
/// use caja_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Coca-Cola 1.5L").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    validate_text("name", name, 200)
}

/// Validates a product category (non-empty, at most 100 characters).
pub fn validate_category(category: &str) -> ValidationResult<String> {
    validate_text("category", category, 100)
}

/// Validates an optional barcode.
///
/// Blank input clears the barcode.
pub fn validate_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(code) = barcode.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if code.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(Some(code.to_string()))
}

/// Validates the seller name that opens a shift.
pub fn validate_seller(seller: &str) -> ValidationResult<String> {
    validate_text("seller", seller, 100)
}

/// Validates a credit client's name.
pub fn validate_client_name(name: &str) -> ValidationResult<String> {
    validate_text("client name", name, 200)
}

/// Search box input. Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Cart and return quantities: 1 to [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices may be zero (bags, free samples) but never negative.
///
/// ## Example
/// ```rust
/// use caja_core::money::Money;
/// use caja_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_minor(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());
/// assert!(validate_price(Money::from_minor(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    validate_non_negative_money("price", price)
}

/// Rejects a negative amount, or one above [`MAX_AMOUNT`], for the named field.
pub fn validate_non_negative_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    validate_amount_cap(field, amount)
}

fn validate_amount_cap(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.minor() > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }

    Ok(())
}

/// Rejects a negative count (stock, reorder threshold).
pub fn validate_non_negative_count(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// An abono must move the balance.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    validate_amount_cap("payment amount", amount)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Called before a new line is added; [`MAX_CART_ITEMS`] lines at most.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert_eq!(validate_product_name("  Pan  ").unwrap(), "Pan");
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(None).unwrap(), None);
        assert_eq!(validate_barcode(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_barcode(Some("7801234567890")).unwrap(),
            Some("7801234567890".to_string())
        );
        assert!(validate_barcode(Some("780 123")).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_minor(-1)).is_err());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_minor(100)).is_ok());

        assert!(validate_price(Money::from_minor(MAX_AMOUNT)).is_ok());
        assert!(validate_price(Money::from_minor(MAX_AMOUNT + 1)).is_err());
        assert!(validate_non_negative_money("credit limit", Money::from_minor(i64::MAX)).is_err());
        assert!(validate_payment_amount(Money::from_minor(i64::MAX / 2)).is_err());
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_non_negative_count("stock", 0).is_ok());
        assert!(matches!(
            validate_non_negative_count("stock", -2),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }

}
