use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency code an amount is denominated in.
///
/// Denominations are compared as plain strings. Standard ISO 4217 codes
/// (GBP, USD, EUR) and arbitrary settlement units are both accepted.
///
/// # Examples
///
/// ```
/// use posting_limits::core::denomination::Denomination;
///
/// let gbp = Denomination::new("GBP");
/// let usd = Denomination::new("USD");
/// assert_ne!(gbp, usd);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denomination(String);

impl Denomination {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Denomination {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Decimal places used when an amount is shown to a customer.
pub const DISPLAY_PLACES: u32 = 2;

/// Rounding applied when an amount is reduced to a fixed number of places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Midpoint away from zero. Used for currency display.
    HalfUp,
    /// Truncate toward zero. Used for accrual residue.
    Down,
}

impl Rounding {
    /// Round `amount` to `places` decimal places.
    ///
    /// ```
    /// use posting_limits::core::denomination::Rounding;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(Rounding::HalfUp.apply(dec!(1.005), 2), dec!(1.01));
    /// assert_eq!(Rounding::Down.apply(dec!(1.009), 2), dec!(1.00));
    /// ```
    pub fn apply(self, amount: Decimal, places: u32) -> Decimal {
        let strategy = match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::Down => RoundingStrategy::ToZero,
        };
        amount.round_dp_with_strategy(places, strategy)
    }
}

/// Format an amount for a human-readable message: half-up to two places.
pub fn display_amount(amount: Decimal) -> Decimal {
    Rounding::HalfUp.apply(amount, DISPLAY_PLACES)
}
