//! # Money Types
//!
//! Currency and amount types shared by the fare and cargo calculators.
//! Amounts are held in the smallest currency unit so sums stay exact.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Currencies the booking flow can be priced in (ISO 4217).
/// The currency is selected from the route, never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    SGD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::SGD => "SGD",
        }
    }

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u8 {
        2
    }

    /// Convert a decimal amount to the smallest currency unit (cents)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }

    /// Parse a currency code, case-insensitive
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "SGD" => Some(Currency::SGD),
            _ => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::SGD => "S$",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An amount in the smallest unit of its currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in smallest currency unit (cents)
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    /// Create an amount from a decimal value, rounded to the nearest cent
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create an amount from smallest units
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { amount: 0, currency }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Scale by a factor, rounding to the nearest cent
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            amount: (self.amount as f64 * factor).round() as i64,
            currency: self.currency,
        }
    }

    /// Round to the nearest whole currency unit (half away from zero)
    pub fn round_to_unit(&self) -> Self {
        let unit = 10_i64.pow(self.currency.decimal_places() as u32);
        let units = (self.amount as f64 / unit as f64).round() as i64;
        Self {
            amount: units * unit,
            currency: self.currency,
        }
    }

    /// Two-decimal string as payment providers expect it (e.g. "170.00")
    pub fn to_decimal_string(&self) -> String {
        format!("{:.2}", self.as_decimal())
    }

    /// Format for display (e.g. "S$170.00")
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.as_decimal())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Money::from_cents(self.amount + rhs.amount, self.currency)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        Money::from_cents(self.amount - rhs.amount, self.currency)
    }
}
