//! Type-safe price representation using decimal arithmetic.
//!
//! Package prices and affiliate commissions are money; they never touch
//! floating point.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(cents, 2),
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Commission earned on this price at `rate` (0.15 = 15%).
    ///
    /// Rounded half-away-from-zero to cents.
    #[must_use]
    pub fn commission(&self, rate: Decimal) -> Self {
        let amount = (self.amount * rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self::new(amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_from_cents() {
        let price = Price::from_cents(24_900, CurrencyCode::EUR);
        assert_eq!(price.amount, Decimal::new(249, 0));
    }

    #[test]
    fn test_commission_rounds_to_cents() {
        let price = Price::from_cents(9_999, CurrencyCode::EUR);
        let commission = price.commission(Decimal::new(15, 2));
        // 99.99 * 0.15 = 14.9985
        assert_eq!(commission.amount, Decimal::new(1500, 2));
        assert_eq!(commission.currency_code, CurrencyCode::EUR);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(24_900, CurrencyCode::EUR).to_string(), "€249.00");
        assert_eq!(Price::from_cents(150, CurrencyCode::USD).to_string(), "$1.50");
    }
}
