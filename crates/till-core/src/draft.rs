//! # Sale Draft
//!
//! The in-progress sale assembled on the "new sale" screen.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Draft Lifecycle                             │
//! │                                                                         │
//! │  SaleDraft::new(shop_id)          empty, currency USD, rate 27000       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  apply_lookup_defaults()          first device, first store,            │
//! │        │                          open session of that device,          │
//! │        │                          default cash account                  │
//! │        ▼                                                                │
//! │  add_or_increment_line() ◄──┐     lines merged by product_id            │
//! │  update_line()              │     quantity / price edits                │
//! │  remove_line()              │                                           │
//! │  set_customer()             │                                           │
//! │  set_currency() ────────────┘     reselects the cash account            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate() ──► Err(DraftRejection)   first failing check only          │
//! │        │                                                                │
//! │        ▼ Ok                                                             │
//! │  to_submission_payload() ──► SaleSubmission ──► POST /api/sales         │
//! │        │                                                                │
//! │        ▼ created                                                        │
//! │  clear_after_submission()         lines, tendered amount, customer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Capture
//! A line's unit price is read from the [`PriceLookup`] once, when the line is
//! first added. Incrementing the line, or refreshing the catalog afterwards,
//! never changes it; only [`SaleDraft::update_line`] does.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, DraftRejection};
use crate::money::{self, Money};
use crate::payment::{default_cash_account, Currency, ExchangeRate, PaymentMethod};
use crate::types::{Account, CashSession, Customer, LookupData};
use crate::validation::{
    validate_quantity, validate_reference, validate_tendered_amount, validate_unit_price,
};
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Price Lookup
// =============================================================================

/// Source of unit prices for newly added lines.
///
/// Implemented by [`crate::Catalog`] and by any `Fn(&str) -> Option<Money>`.
pub trait PriceLookup {
    /// Reference-currency unit price of a product, if known.
    fn unit_price(&self, product_id: &str) -> Option<Money>;
}

impl<F> PriceLookup for F
where
    F: Fn(&str) -> Option<Money>,
{
    fn unit_price(&self, product_id: &str) -> Option<Money> {
        self(product_id)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// One product line of the draft.
///
/// Serializes directly into the `lines` entries of the sales payload:
/// `{ "product_id": "P1", "qty": 2, "unit_price_usd": 5.0 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,

    #[serde(rename = "qty")]
    pub quantity: i64,

    #[serde(rename = "unit_price_usd", with = "money::decimal")]
    #[ts(type = "number")]
    pub unit_price: Money,
}

impl SaleLine {
    /// Quantity × unit price.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Partial edit of a line. Fields left `None` are unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinePatch {
    pub quantity: Option<i64>,
    pub unit_price: Option<Money>,
}

impl LinePatch {
    /// Patch that only sets the quantity.
    pub fn quantity(quantity: i64) -> Self {
        LinePatch {
            quantity: Some(quantity),
            unit_price: None,
        }
    }

    /// Patch that only sets the unit price.
    pub fn unit_price(unit_price: Money) -> Self {
        LinePatch {
            quantity: None,
            unit_price: Some(unit_price),
        }
    }
}

// =============================================================================
// Payment Spec
// =============================================================================

/// How the customer is paying.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSpec {
    /// Tender currency.
    pub currency: Currency,

    /// Settlement account chosen in the cash-account picker.
    pub account_id: Option<String>,

    /// Amount the operator entered as paid, in the reference currency.
    pub amount_tendered: Money,

    /// Secondary units per reference unit. Only sent for secondary tender.
    pub exchange_rate: ExchangeRate,
}

impl Default for PaymentSpec {
    fn default() -> Self {
        PaymentSpec {
            currency: Currency::REFERENCE,
            account_id: None,
            amount_tendered: Money::zero(),
            exchange_rate: ExchangeRate::default(),
        }
    }
}

// =============================================================================
// Submission Payload
// =============================================================================

/// Status marker sent with every sale created from the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    #[default]
    Completed,
}

/// `pay` block of the sales payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubmissionPayment {
    pub method: PaymentMethod,
    pub currency: Currency,

    /// Operator-entered tendered amount, independent of the line total.
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub amount_usd: Money,

    /// Present only when tendering in the secondary currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub customer_rate_used: Option<ExchangeRate>,
}

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleSubmission {
    pub shop_id: String,
    pub device_id: String,
    pub cash_session_id: String,
    pub store_id: String,
    pub customer_id: String,
    pub lines: Vec<SaleLine>,
    pub pay: SubmissionPayment,
    pub status: SaleStatus,
}

// =============================================================================
// Sale Draft
// =============================================================================

/// The sale being assembled.
///
/// ## Invariants
/// - Lines are unique by `product_id` and keep insertion order
/// - Quantities and unit prices are never negative
/// - The exchange rate is always strictly positive
#[derive(Debug, Clone, Default)]
pub struct SaleDraft {
    shop_id: Option<String>,
    device_id: Option<String>,
    cash_session_id: Option<String>,
    store_id: Option<String>,
    customer: Option<Customer>,
    lines: Vec<SaleLine>,
    payment: PaymentSpec,
    accounts: Vec<Account>,
}

impl SaleDraft {
    /// Creates an empty draft for the shop named in the credential.
    ///
    /// A blank shop id is treated as missing.
    pub fn new(shop_id: Option<String>) -> Self {
        SaleDraft {
            shop_id: shop_id.filter(|id| !id.trim().is_empty()),
            ..Default::default()
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn shop_id(&self) -> Option<&str> {
        self.shop_id.as_deref()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn cash_session_id(&self) -> Option<&str> {
        self.cash_session_id.as_deref()
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn payment(&self) -> &PaymentSpec {
        &self.payment
    }

    /// All accounts known to the draft.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// The accounts offered in the payment-account picker.
    pub fn cash_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.is_cash_on_hand())
    }

    /// The currently selected settlement account.
    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.payment.account_id.as_deref()?;
        self.accounts.iter().find(|a| a.id == id)
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Product already on a line: quantity + 1, unit price unchanged;
    ///   a line already at MAX_LINE_QUANTITY stays there
    /// - Otherwise: new line with quantity 1, priced from `lookup`
    ///   (zero when the price is unknown, negative, or above MAX_UNIT_PRICE)
    ///
    /// ## Returns
    /// Index of the affected line.
    pub fn add_or_increment_line<L>(&mut self, product_id: &str, lookup: &L) -> usize
    where
        L: PriceLookup + ?Sized,
    {
        if let Some(index) = self.lines.iter().position(|l| l.product_id == product_id) {
            let line = &mut self.lines[index];
            if line.quantity >= MAX_LINE_QUANTITY {
                warn!(product_id, quantity = line.quantity, "Line at maximum quantity");
                return index;
            }
            line.quantity += 1;
            debug!(product_id, quantity = line.quantity, "Incremented sale line");
            return index;
        }

        let unit_price = match lookup.unit_price(product_id) {
            Some(price) if validate_unit_price(price).is_ok() => price,
            Some(price) => {
                warn!(product_id, price = %price, "Ignoring out-of-range catalog price");
                Money::zero()
            }
            None => Money::zero(),
        };

        self.lines.push(SaleLine {
            product_id: product_id.to_string(),
            quantity: 1,
            unit_price,
        });
        debug!(product_id, unit_price = %unit_price, "Added sale line");
        self.lines.len() - 1
    }

    /// Edits the quantity and/or unit price of a line.
    ///
    /// Both fields are validated before either is applied.
    pub fn update_line(&mut self, index: usize, patch: LinePatch) -> CoreResult<&SaleLine> {
        let len = self.lines.len();
        if index >= len {
            return Err(CoreError::LineIndexOutOfRange { index, len });
        }

        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(unit_price) = patch.unit_price {
            validate_unit_price(unit_price)?;
        }

        let line = &mut self.lines[index];
        if let Some(quantity) = patch.quantity {
            line.quantity = quantity;
        }
        if let Some(unit_price) = patch.unit_price {
            line.unit_price = unit_price;
        }

        debug!(
            index,
            product_id = %line.product_id,
            quantity = line.quantity,
            unit_price = %line.unit_price,
            "Updated sale line"
        );
        Ok(line)
    }

    /// Removes and returns a line. Later lines shift down by one.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<SaleLine> {
        let len = self.lines.len();
        if index >= len {
            return Err(CoreError::LineIndexOutOfRange { index, len });
        }

        let line = self.lines.remove(index);
        debug!(index, product_id = %line.product_id, "Removed sale line");
        Ok(line)
    }

    /// Sum of quantity × unit price over all lines, recomputed on every call.
    pub fn compute_total(&self) -> Money {
        self.lines.iter().map(SaleLine::line_total).sum()
    }

    // -------------------------------------------------------------------------
    // Point of Sale
    // -------------------------------------------------------------------------

    /// Selects the device, or clears it with `None`.
    pub fn set_device(&mut self, device_id: Option<&str>) -> CoreResult<()> {
        self.device_id = checked_reference("device", device_id)?;
        debug!(device_id = ?self.device_id, "Device selected");
        Ok(())
    }

    /// Selects the cash session, or clears it with `None`.
    pub fn set_cash_session(&mut self, cash_session_id: Option<&str>) -> CoreResult<()> {
        self.cash_session_id = checked_reference("cash session", cash_session_id)?;
        debug!(cash_session_id = ?self.cash_session_id, "Cash session selected");
        Ok(())
    }

    /// Selects the store, or clears it with `None`.
    pub fn set_store(&mut self, store_id: Option<&str>) -> CoreResult<()> {
        self.store_id = checked_reference("store", store_id)?;
        debug!(store_id = ?self.store_id, "Store selected");
        Ok(())
    }

    /// Fills in whatever the operator has not chosen yet from freshly
    /// loaded lookups, and loads the payment accounts.
    ///
    /// ## Defaults
    /// - Device: the first device
    /// - Store: the first store
    /// - Cash session: the open session of the selected device
    /// - Account: the default cash account for the current currency
    pub fn apply_lookup_defaults(&mut self, lookups: &LookupData) {
        if self.device_id.is_none() {
            self.device_id = lookups.devices.first().map(|d| d.id.clone());
        }

        if self.store_id.is_none() {
            self.store_id = lookups.stores.first().map(|s| s.id.clone());
        }

        if self.cash_session_id.is_none() {
            if let Some(device_id) = self.device_id.as_deref() {
                self.cash_session_id = open_sessions_for(&lookups.cash_sessions, device_id)
                    .next()
                    .map(|s| s.id.clone());
            }
        }

        self.set_payment_accounts(lookups.accounts.clone());

        debug!(
            device_id = ?self.device_id,
            cash_session_id = ?self.cash_session_id,
            store_id = ?self.store_id,
            account_id = ?self.payment.account_id,
            "Applied lookup defaults"
        );
    }

    // -------------------------------------------------------------------------
    // Customer
    // -------------------------------------------------------------------------

    /// Replaces the customer. `None` detaches it.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        debug!(customer_id = ?customer.as_ref().map(|c| &c.id), "Customer selected");
        self.customer = customer;
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// Switches the tender currency and reselects the default cash account.
    ///
    /// When no cash-on-hand account exists the current selection is kept.
    /// Lines and customer are untouched.
    pub fn set_currency(&mut self, currency: Currency) {
        self.payment.currency = currency;
        self.reselect_default_account();
        debug!(
            currency = %currency,
            account_id = ?self.payment.account_id,
            "Currency changed"
        );
    }

    /// Replaces the known accounts and reselects the default cash account
    /// for the current currency.
    pub fn set_payment_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;
        self.reselect_default_account();
        debug!(
            count = self.accounts.len(),
            account_id = ?self.payment.account_id,
            "Payment accounts loaded"
        );
    }

    /// Explicitly selects a settlement account by id.
    pub fn select_account(&mut self, account_id: &str) -> CoreResult<()> {
        validate_reference("account", account_id)?;
        if !self.accounts.iter().any(|a| a.id == account_id) {
            return Err(CoreError::AccountNotFound(account_id.to_string()));
        }

        self.payment.account_id = Some(account_id.to_string());
        debug!(account_id, "Payment account selected");
        Ok(())
    }

    /// Sets the amount the customer paid, in the reference currency.
    pub fn set_amount_tendered(&mut self, amount: Money) -> CoreResult<()> {
        validate_tendered_amount(amount)?;
        self.payment.amount_tendered = amount;
        debug!(amount = %amount, "Amount tendered set");
        Ok(())
    }

    /// Sets the secondary-currency rate used for this sale.
    pub fn set_exchange_rate(&mut self, rate: ExchangeRate) {
        self.payment.exchange_rate = rate;
        debug!(rate = %rate, "Exchange rate set");
    }

    /// Tendered amount expressed in the secondary currency, as printed on
    /// the receipt. `None` for reference-currency tender.
    pub fn native_tendered_amount(&self) -> Option<Decimal> {
        self.payment
            .currency
            .is_secondary()
            .then(|| self.payment.exchange_rate.convert(self.payment.amount_tendered))
    }

    fn reselect_default_account(&mut self) {
        if let Some(account) = default_cash_account(&self.accounts, self.payment.currency) {
            self.payment.account_id = Some(account.id.clone());
        }
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Checks the draft is complete enough to submit.
    ///
    /// ## Check Order
    /// 1. Shop identity
    /// 2. Device, cash session and store
    /// 3. Customer
    /// 4. At least one line
    ///
    /// Only the first failure is reported.
    pub fn validate(&self) -> Result<(), DraftRejection> {
        if self.shop_id.is_none() {
            return Err(DraftRejection::MissingShop);
        }
        if self.device_id.is_none() || self.cash_session_id.is_none() || self.store_id.is_none()
        {
            return Err(DraftRejection::MissingPointOfSale);
        }
        if self.customer.is_none() {
            return Err(DraftRejection::MissingCustomer);
        }
        if self.lines.is_empty() {
            return Err(DraftRejection::NoLines);
        }
        Ok(())
    }

    /// Builds the body of `POST /api/sales`.
    ///
    /// Validates first. `pay.amount_usd` is the tendered amount, never the
    /// computed total, and `customer_rate_used` is only present for
    /// secondary-currency tender.
    pub fn to_submission_payload(&self) -> Result<SaleSubmission, DraftRejection> {
        self.validate()?;

        let (Some(shop_id), Some(device_id), Some(cash_session_id), Some(store_id), Some(customer)) = (
            self.shop_id.clone(),
            self.device_id.clone(),
            self.cash_session_id.clone(),
            self.store_id.clone(),
            self.customer.as_ref(),
        ) else {
            return Err(DraftRejection::MissingPointOfSale);
        };

        let currency = self.payment.currency;
        let pay = SubmissionPayment {
            method: PaymentMethod::for_account(self.selected_account()),
            currency,
            amount_usd: self.payment.amount_tendered,
            customer_rate_used: currency
                .is_secondary()
                .then_some(self.payment.exchange_rate),
        };

        Ok(SaleSubmission {
            shop_id,
            device_id,
            cash_session_id,
            store_id,
            customer_id: customer.id.clone(),
            lines: self.lines.clone(),
            pay,
            status: SaleStatus::Completed,
        })
    }

    /// Resets the per-sale fields after the server accepted the sale.
    ///
    /// Lines, tendered amount and customer are cleared. Point-of-sale
    /// selection, currency, account and rate carry over to the next sale.
    pub fn clear_after_submission(&mut self) {
        self.lines.clear();
        self.payment.amount_tendered = Money::zero();
        self.customer = None;
        debug!("Draft cleared after submission");
    }
}

/// Cash sessions of a device that have not been closed.
pub fn open_sessions_for<'a>(
    sessions: &'a [CashSession],
    device_id: &'a str,
) -> impl Iterator<Item = &'a CashSession> {
    sessions
        .iter()
        .filter(move |s| s.device_id == device_id && s.is_open())
}

fn checked_reference(field: &str, id: Option<&str>) -> CoreResult<Option<String>> {
    match id {
        Some(id) => {
            validate_reference(field, id)?;
            Ok(Some(id.to_string()))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
