//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Draft operation failures                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── DraftRejection   - Why a draft cannot be submitted yet            │
//! │                                                                         │
//! │  till-client errors (separate crate)                                   │
//! │  └── ClientError      - Transport / API / config failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │        DraftRejection ──────────────┼──► SubmitError → operator message │
//! │        ClientError ─────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (index, field, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while editing a draft.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A line operation referenced a position past the end of the draft.
    ///
    /// ## When This Occurs
    /// - The UI kept a stale row index after a line was removed
    /// - Two edits raced on the same row
    #[error("Line {index} does not exist (draft has {len} lines)")]
    LineIndexOutOfRange { index: usize, len: usize },

    /// An account id was selected that the draft does not know about.
    #[error("Payment account not found: {0}")]
    AccountNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
#[derive(Debug, Error, PartialEq)]
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

    /// Amount is above the accepted maximum.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: Money },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., not a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Draft Rejection
// =============================================================================

/// Reason a draft cannot be submitted.
///
/// Checks run in declaration order and only the first failure is reported,
/// so a draft missing both a customer and lines reports `MissingCustomer`.
///
/// ## Operator Messages
/// ```text
/// MissingShop             → "No shop_id (not found in token)."
/// MissingPointOfSale      → "Select device, cash session, and store."
/// MissingCustomer         → "Pick a customer."
/// NoLines                 → "Add at least one product line."
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DraftRejection {
    /// The credential carries no shop identity.
    #[error("No shop_id (not found in token).")]
    MissingShop,

    /// Device, cash session or store not selected.
    #[error("Select device, cash session, and store.")]
    MissingPointOfSale,

    /// No customer attached.
    #[error("Pick a customer.")]
    MissingCustomer,

    /// The draft has no lines.
    #[error("Add at least one product line.")]
    NoLines,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
