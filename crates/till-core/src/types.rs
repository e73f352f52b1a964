//! # Domain Types
//!
//! Records returned by the remote POS API and consumed by the draft builder.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Search results            Point of sale             Ledger             │
//! │  ──────────────            ─────────────             ──────             │
//! │  Product {id, sku,         Device {id, label}        Account {id, name, │
//! │    name, price_usd?}       CashSession {id,            AccountType?,    │
//! │  Customer {id, name,         device_id, opened_at,     currency?}       │
//! │    phone?}                   closed_at?}                                │
//! │                            Store {id, name, type}                       │
//! │                                                                         │
//! │  Reporting                                                              │
//! │  ─────────                                                              │
//! │  SaleSummary {id, total_usd?}   TodayReport {sales, cogs, cash, ...}    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The server is authoritative for every one of these; nothing here is
//! persisted locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{self, Money};
use crate::payment::Currency;
use crate::CASH_ON_HAND;

// =============================================================================
// Product
// =============================================================================

/// A product as returned by the product search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Server identifier.
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    #[serde(default)]
    pub sku: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Unit price in the reference currency, if the product has one.
    #[serde(default, with = "money::decimal_opt")]
    #[ts(type = "number | null")]
    pub price_usd: Option<Money>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that can be attached to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// Point of Sale Lookups
// =============================================================================

/// A registered POS device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// A cash drawer session opened on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub device_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    /// A session is open until the server stamps `closed_at`.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// A store (shop floor or warehouse) stock is sold from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A currency the server accepts for tender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyInfo {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Accounts
// =============================================================================

/// Ledger account type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountType {
    pub name: String,
}

/// A ledger account a payment can settle into.
///
/// ## Wire Shape
/// ```json
/// { "id": "a1", "name": "Cash Drawer USD", "AccountType": { "name": "CASH_ON_HAND" } }
/// ```
/// `currency` is optional; when the server provides it, it is trusted over
/// anything inferred from `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "AccountType", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

impl Account {
    /// Returns true for physical cash drawer accounts.
    pub fn is_cash_on_hand(&self) -> bool {
        self.account_type
            .as_ref()
            .is_some_and(|t| t.name == CASH_ON_HAND)
    }

    /// Returns true if the account name mentions the currency code,
    /// ignoring case.
    pub fn name_mentions(&self, currency: Currency) -> bool {
        self.name
            .to_ascii_uppercase()
            .contains(currency.code())
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// One row of the sales list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleSummary {
    pub id: String,
    #[serde(default, with = "money::decimal_opt")]
    #[ts(type = "number | null")]
    pub total_usd: Option<Money>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sales block of the today report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodaySales {
    pub count: i64,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub usd_sales_usd: Money,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub sos_sales_usd_equiv: Money,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub total_usd: Money,
}

/// Cash-drawer block of the today report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodayCash {
    #[serde(rename = "USD", with = "money::decimal")]
    #[ts(type = "number")]
    pub usd: Money,
    #[serde(rename = "SOS_usd_equiv", with = "money::decimal")]
    #[ts(type = "number")]
    pub sos_usd_equiv: Money,
}

/// Server-computed figures for the current UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodayReport {
    pub date_utc: String,
    pub sales: TodaySales,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub cogs_usd: Money,
    #[serde(with = "money::decimal")]
    #[ts(type = "number")]
    pub gross_margin_usd: Money,
    pub cash: TodayCash,
}

// =============================================================================
// Lookup Bundle
// =============================================================================

/// Everything the new-sale screen loads before the operator starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupData {
    pub devices: Vec<Device>,
    pub cash_sessions: Vec<CashSession>,
    pub stores: Vec<Store>,
    pub currencies: Vec<CurrencyInfo>,
    pub accounts: Vec<Account>,
}

// =============================================================================
// Unit Tests
// =============================================================================
