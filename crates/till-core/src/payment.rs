//! # Payment Rules
//!
//! Currencies, exchange rates, the payment method tag sent with a sale, and
//! the default cash-account choice.
//!
//! ## Tender Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator picks currency                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  default_cash_account(accounts, currency)                               │
//! │       ├── CASH_ON_HAND whose name contains the code  → chosen           │
//! │       ├── else first CASH_ON_HAND                    → chosen           │
//! │       └── else none                                  → keep current     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentMethod::for_account(account)                                    │
//! │       ├── account.currency set by server  → that currency's cash tag    │
//! │       ├── name contains "USD" / "SOS"     → CASH_USD / CASH_SOS         │
//! │       └── otherwise                       → CASH_USD                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Account;
use crate::DEFAULT_SOS_PER_USD;

// =============================================================================
// Currency
// =============================================================================

/// Tender currencies accepted at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar, the reference currency every price is normalized to.
    #[default]
    Usd,
    /// Somali shilling, tendered at an operator-supplied rate.
    Sos,
}

impl Currency {
    /// The currency all prices and totals are expressed in.
    pub const REFERENCE: Currency = Currency::Usd;

    /// The alternate tender currency.
    pub const SECONDARY: Currency = Currency::Sos;

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Sos => "SOS",
        }
    }

    /// Returns true if tendering in this currency needs an exchange rate.
    #[inline]
    pub fn is_secondary(&self) -> bool {
        *self == Currency::SECONDARY
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "SOS" => Ok(Currency::Sos),
            other => Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("unknown currency '{}', expected USD or SOS", other),
            }),
        }
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Secondary-currency units per reference unit (e.g. 27000 SOS per USD).
///
/// Always strictly positive; construct with [`ExchangeRate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    Decimal,
);

impl ExchangeRate {
    /// Creates a rate, rejecting zero and negative values.
    pub fn new(rate: Decimal) -> Result<Self, ValidationError> {
        if rate <= Decimal::ZERO {
            return Err(ValidationError::MustBePositive {
                field: "exchange rate".to_string(),
            });
        }
        Ok(ExchangeRate(rate))
    }

    /// Parses operator input such as `"27000"` or `"26950.5"`.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let rate = Decimal::from_str(text.trim()).map_err(|_| ValidationError::InvalidFormat {
            field: "exchange rate".to_string(),
            reason: "not a decimal number".to_string(),
        })?;
        ExchangeRate::new(rate)
    }

    /// Returns the rate as a decimal.
    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts a reference-currency amount into secondary units.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::payment::ExchangeRate;
    ///
    /// let rate = ExchangeRate::parse("27000").unwrap();
    /// let native = rate.convert(Money::from_cents(1050));
    /// assert_eq!(native.to_string(), "283500.00");
    /// ```
    pub fn convert(&self, amount: Money) -> Decimal {
        (amount.to_decimal() * self.0).round_dp(2)
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate(Decimal::from(DEFAULT_SOS_PER_USD))
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Payment method tag understood by the sales endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash settled into a USD drawer.
    CashUsd,
    /// Cash settled into a SOS drawer.
    CashSos,
}

impl PaymentMethod {
    /// The cash tag for a currency.
    pub const fn for_currency(currency: Currency) -> Self {
        match currency {
            Currency::Usd => PaymentMethod::CashUsd,
            Currency::Sos => PaymentMethod::CashSos,
        }
    }

    /// Derives the tag for the selected settlement account.
    ///
    /// An explicit server-supplied account currency wins. Without one, the
    /// account name is matched against `USD` and then `SOS`; anything else
    /// falls back to the reference-currency tag.
    pub fn for_account(account: Option<&Account>) -> Self {
        let Some(account) = account else {
            return PaymentMethod::for_currency(Currency::REFERENCE);
        };

        if let Some(currency) = account.currency {
            return PaymentMethod::for_currency(currency);
        }

        [Currency::Usd, Currency::Sos]
            .into_iter()
            .find(|c| account.name_mentions(*c))
            .map(PaymentMethod::for_currency)
            .unwrap_or(PaymentMethod::for_currency(Currency::REFERENCE))
    }
}

// =============================================================================
// Default Account Selection
// =============================================================================

/// Picks the default settlement account for a currency.
///
/// ## Rules
/// 1. A cash-on-hand account for the currency: server-declared currency, or a
///    name containing the currency code (case-insensitive)
/// 2. Otherwise the first cash-on-hand account
/// 3. Otherwise `None`
pub fn default_cash_account(accounts: &[Account], currency: Currency) -> Option<&Account> {
    let matches_currency = |a: &Account| match a.currency {
        Some(c) => c == currency,
        None => a.name_mentions(currency),
    };

    accounts
        .iter()
        .find(|a| a.is_cash_on_hand() && matches_currency(a))
        .or_else(|| accounts.iter().find(|a| a.is_cash_on_hand()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;

    fn account(id: &str, name: &str, cash: bool) -> Account {
        Account {
            id: id.to_string(),
            name: name.to_string(),
            account_type: cash.then(|| AccountType {
                name: crate::CASH_ON_HAND.to_string(),
            }),
            currency: None,
        }
    }

    #[test]
    fn test_currency_parsing_and_wire() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" SOS ".parse::<Currency>().unwrap(), Currency::Sos);
        assert!("EUR".parse::<Currency>().is_err());

        assert_eq!(serde_json::to_string(&Currency::Sos).unwrap(), "\"SOS\"");
        assert!(Currency::Sos.is_secondary());
        assert!(!Currency::Usd.is_secondary());
    }

    #[test]
    fn test_exchange_rate_must_be_positive() {
        assert!(ExchangeRate::parse("0").is_err());
        assert!(ExchangeRate::parse("-5").is_err());
        assert!(ExchangeRate::parse("abc").is_err());
        assert_eq!(
            ExchangeRate::parse("26950.5").unwrap().value(),
            Decimal::from_str("26950.5").unwrap()
        );
        assert_eq!(ExchangeRate::default().value(), Decimal::from(27_000));
    }

    #[test]
    fn test_exchange_rate_serializes_as_number() {
        let json = serde_json::to_value(ExchangeRate::parse("27000").unwrap()).unwrap();
        assert_eq!(json, serde_json::json!(27000.0));
    }

    #[test]
    fn test_method_from_explicit_currency_wins() {
        let mut a = account("a1", "Drawer USD", true);
        a.currency = Some(Currency::Sos);
        assert_eq!(PaymentMethod::for_account(Some(&a)), PaymentMethod::CashSos);
    }

    #[test]
    fn test_method_from_name_heuristic() {
        let usd = account("a1", "Cash usd", true);
        let sos = account("a2", "Cash SOS drawer", true);
        let other = account("a3", "Petty cash", true);

        assert_eq!(PaymentMethod::for_account(Some(&usd)), PaymentMethod::CashUsd);
        assert_eq!(PaymentMethod::for_account(Some(&sos)), PaymentMethod::CashSos);
        assert_eq!(PaymentMethod::for_account(Some(&other)), PaymentMethod::CashUsd);
        assert_eq!(PaymentMethod::for_account(None), PaymentMethod::CashUsd);
    }

    #[test]
    fn test_method_wire_tag() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashSos).unwrap(),
            "\"CASH_SOS\""
        );
    }

    #[test]
    fn test_default_cash_account_prefers_currency_match() {
        let accounts = vec![
            account("bank", "Bank SOS", false),
            account("usd", "Cash USD", true),
            account("sos", "Cash SOS", true),
        ];

        assert_eq!(
            default_cash_account(&accounts, Currency::Sos).map(|a| a.id.as_str()),
            Some("sos")
        );
        assert_eq!(
            default_cash_account(&accounts, Currency::Usd).map(|a| a.id.as_str()),
            Some("usd")
        );
    }

    #[test]
    fn test_default_cash_account_falls_back_to_first_cash() {
        let accounts = vec![
            account("bank", "Bank SOS", false),
            account("drawer", "Main drawer", true),
            account("usd", "Cash USD", true),
        ];

        assert_eq!(
            default_cash_account(&accounts, Currency::Sos).map(|a| a.id.as_str()),
            Some("drawer")
        );
        assert!(default_cash_account(&accounts[..1], Currency::Sos).is_none());
    }
}
