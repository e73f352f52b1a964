//! # Validation Module
//!
//! Field-level validation for values the operator types into a draft.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Field edits (THIS MODULE)                                    │
//! │  ├── quantity / price / tendered amount not negative                   │
//! │  └── references not blank                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: SaleDraft::validate (draft.rs)                               │
//! │  └── shop → device/session/store → customer → lines, first failure     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote API                                                   │
//! │  └── stock, pricing, open session, ledger posting                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_quantity, validate_reference};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(-1).is_err());
//! assert!(validate_reference("device", "  ").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_LINE_QUANTITY, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an id chosen from a lookup (device, store, account, ...).
///
/// ## Rules
/// - Must not be empty or whitespace
pub fn validate_reference(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (customer search lists everyone)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
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

/// Validates a line quantity.
///
/// ## Rules
/// - Zero is allowed (the line stays and contributes nothing)
/// - Must not be negative
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, unpriced products)
/// - Must not exceed MAX_UNIT_PRICE
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "unit price".to_string(),
        });
    }

    if price > MAX_UNIT_PRICE {
        return Err(ValidationError::TooLarge {
            field: "unit price".to_string(),
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates the amount tendered by the customer.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (sale on credit)
pub fn validate_tendered_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "amount tendered".to_string(),
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
    fn test_validate_quantity() {
        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_cents(1099)).is_ok());
        assert!(validate_unit_price(Money::from_cents(-1)).is_err());
        assert!(validate_unit_price(MAX_UNIT_PRICE).is_ok());
        assert_eq!(
            validate_unit_price(Money::from_cents(MAX_UNIT_PRICE.cents() + 1)),
            Err(ValidationError::TooLarge {
                field: "unit price".to_string(),
                max: MAX_UNIT_PRICE,
            })
        );
    }

    #[test]
    fn test_validate_tendered_amount() {
        assert!(validate_tendered_amount(Money::zero()).is_ok());
        assert!(validate_tendered_amount(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("store", "st-1").is_ok());
        assert_eq!(
            validate_reference("store", ""),
            Err(ValidationError::Required {
                field: "store".to_string()
            })
        );
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  coke ").unwrap(), "coke");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }
}
