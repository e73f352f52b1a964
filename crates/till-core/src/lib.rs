//! # till-core: Pure Sale-Building Logic for Till
//!
//! This crate holds the one piece of Till that is more than glue: the
//! **sale draft** assembled on the "new sale" screen. Lines are merged by
//! product, totals are recomputed, the draft is validated and finally mapped
//! into the payload the remote sales endpoint expects.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  till-client (async, I/O)                       │   │
//! │  │   ApiClient ── DebouncedSearch ── NewSaleSession ── `till` CLI  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   draft   │  │  payment  │  │   │
//! │  │   │  Product  │  │   Money   │  │ SaleDraft │  │ Currency  │  │   │
//! │  │   │  Account  │  │  (cents)  │  │ SaleLine  │  │  Method   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │  catalog  │  │  search   │  │ validation│                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Lookup records returned by the API (Product, Customer, Account, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`payment`] - Currencies, exchange rates, payment method and account rules
//! - [`catalog`] - Product lookup cache used to price and render lines
//! - [`search`] - Sequencing for debounced lookups (latest query wins)
//! - [`draft`] - The sale draft builder
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::draft::SaleDraft;
//! use till_core::money::Money;
//!
//! let mut draft = SaleDraft::new(Some("shop-1".to_string()));
//! let prices = |id: &str| (id == "P1").then(|| Money::from_cents(500));
//!
//! draft.add_or_increment_line("P1", &prices);
//! draft.add_or_increment_line("P1", &prices);
//!
//! assert_eq!(draft.lines().len(), 1);
//! assert_eq!(draft.compute_total().cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod draft;
pub mod error;
pub mod money;
pub mod payment;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use draft::{
    LinePatch, PaymentSpec, PriceLookup, SaleDraft, SaleLine, SaleStatus, SaleSubmission,
    SubmissionPayment,
};
pub use error::{CoreError, DraftRejection, ValidationError};
pub use money::Money;
pub use payment::{Currency, ExchangeRate, PaymentMethod};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Account type name the API uses for physical cash drawers.
pub const CASH_ON_HAND: &str = "CASH_ON_HAND";

/// Secondary-currency units per reference unit used until the operator
/// enters a rate for the sale.
pub const DEFAULT_SOS_PER_USD: u32 = 27_000;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Highest unit price a line accepts ($1,000,000,000.00).
///
/// At this price and [`MAX_LINE_QUANTITY`], thousands of lines still total
/// well inside the range of [`Money`].
pub const MAX_UNIT_PRICE: Money = Money::from_cents(100_000_000_000);

/// Minimum number of characters before a product search is sent.
pub const DEFAULT_SEARCH_MIN_CHARS: usize = 2;
