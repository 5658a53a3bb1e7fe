//! Money types with precise decimal arithmetic
//!
//! Warranty and company-paid costs are carried as `Money` to avoid
//! floating-point errors in claim settlement figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Currency codes following ISO 4217
///
/// Limited to the markets the warranty program operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Vnd,
    Inr,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::Vnd => 0,
            _ => 2,
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Vnd => "VND",
            Currency::Inr => "INR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A monetary amount with associated currency
///
/// Amounts are rounded to the currency's minor unit on construction.
/// The `Add`/`Sub` operators panic on a currency mismatch; use
/// `checked_add`/`checked_sub` on fallible paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(currency.decimal_places()),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns the decimal amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Fallible addition, checking currency agreement
    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    /// Fallible subtraction, checking currency agreement
    pub fn checked_sub(self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        Ok(Money::new(self.amount - other.amount, self.currency))
    }

    /// Multiplies by an integer quantity (e.g. unit cost x parts used)
    pub fn times(self, quantity: u32) -> Money {
        Money::new(self.amount * Decimal::from(quantity), self.currency)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.code().to_string(),
                other.currency.code().to_string(),
            ));
        }
        Ok(())
    }
}

impl Add for Money {
    type Output = Money;

    /// Panics on currency mismatch; use `checked_add` where mixed
    /// currencies are possible.
    fn add(self, other: Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch in Money::add"
        );
        Money::new(self.amount + other.amount, self.currency)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch in Money::sub"
        );
        Money::new(self.amount - other.amount, self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_to_minor_unit() {
        let m = Money::new(dec!(10.005), Currency::Usd);
        assert_eq!(m.amount(), dec!(10.00));

        let vnd = Money::new(dec!(1000.4), Currency::Vnd);
        assert_eq!(vnd.amount(), dec!(1000));
    }

    #[test]
    fn test_money_add_same_currency() {
        let a = Money::new(dec!(100), Currency::Usd);
        let b = Money::new(dec!(50.25), Currency::Usd);
        assert_eq!((a + b).amount(), dec!(150.25));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Money::new(dec!(100), Currency::Usd);
        let b = Money::new(dec!(50), Currency::Eur);
        assert!(matches!(
            a.checked_add(b),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_times() {
        let unit = Money::new(dec!(19.99), Currency::Usd);
        assert_eq!(unit.times(3).amount(), dec!(59.97));
    }

    #[test]
    fn test_zero() {
        let z = Money::zero(Currency::Gbp);
        assert!(z.is_zero());
        assert!(!z.is_negative());
    }
}
