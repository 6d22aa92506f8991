//! Type-safe money representation using decimal arithmetic.
//!
//! The shop sells in USD only. Amounts are stored as `NUMERIC(10, 2)` in
//! `PostgreSQL` and sent to Stripe as integer cents.

use std::fmt;
use std::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors produced by money conversions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative where only non-negative values make sense.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit into integer cents.
    #[error("amount out of range")]
    Overflow,
}

/// A USD amount.
///
/// ```
/// use moonstone_core::Money;
///
/// let price = Money::from_cents(2450);
/// assert_eq!(price.display(), "$24.50");
/// assert_eq!(price.to_cents().unwrap(), 2450);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal dollar amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build from integer cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The dollar amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Convert to integer cents, rounding half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative amounts and
    /// [`MoneyError::Overflow`] when the value does not fit in `i64`.
    pub fn to_cents(&self) -> Result<i64, MoneyError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(MoneyError::Negative);
        }
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or(MoneyError::Overflow)
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Human readable form, e.g. `$24.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${rounded:.2}")
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_cents_and_back() {
        assert_eq!(Money::from_cents(1999).to_cents().unwrap(), 1999);
        assert_eq!(Money::from_cents(0).to_cents().unwrap(), 0);
    }

    #[test]
    fn test_to_cents_rounds_half_up() {
        let m = Money::new(Decimal::from_str("10.005").unwrap());
        assert_eq!(m.to_cents().unwrap(), 1001);
    }

    #[test]
    fn test_negative_rejected() {
        let m = Money::new(Decimal::from_str("-1.00").unwrap());
        assert_eq!(m.to_cents(), Err(MoneyError::Negative));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(500).display(), "$5.00");
        assert_eq!(Money::from_cents(12345).to_string(), "$123.45");
    }

    #[test]
    fn test_times_and_sum() {
        let line = Money::from_cents(1250).times(3);
        assert_eq!(line, Money::from_cents(3750));
        let total: Money = [Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(350));
    }
}
