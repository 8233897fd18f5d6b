use std::{fmt, iter::Sum, ops::Add, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Every amount in the engine (expense totals, owed/paid shares, balances)
/// goes through this type, so nothing is ever summed in floating point.
///
/// The value is signed: a positive balance means the group owes the user,
/// a negative one means the user owes the group.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// The amount in currency units (`1234` cents -> `12.34`).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Converts an exact currency-unit amount into cents.
    ///
    /// Fails when the value carries more than two significant decimals or
    /// does not fit into `i64` cents.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, EngineError> {
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(EngineError::InvalidAmount(format!(
                "{value} has more than 2 decimals"
            )));
        }
        normalized
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(MoneyCents)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
    }

    /// Rounds a currency-unit amount to the nearest cent, midpoints away
    /// from zero (`33.335` -> `33.34`).
    pub fn round_from_decimal(value: Decimal) -> Result<Self, EngineError> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self::try_from_decimal(rounded)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// At most 2 fractional digits are allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }
        let normalized = trimmed.replace(',', ".");
        if normalized.contains(['e', 'E']) {
            return Err(EngineError::InvalidAmount("invalid amount".to_string()));
        }
        let value = Decimal::from_str(&normalized)
            .map_err(|_| EngineError::InvalidAmount("invalid amount".to_string()))?;
        if value.scale() > 2 {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }
        Self::try_from_decimal(value)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-3333).to_string(), "-33.33");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<MoneyCents>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<MoneyCents>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<MoneyCents>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("0.001".parse::<MoneyCents>().is_err());
        assert!("".parse::<MoneyCents>().is_err());
        assert!("1e3".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn rounding_goes_half_away_from_zero() {
        assert_eq!(
            MoneyCents::round_from_decimal(dec!(33.335)).unwrap(),
            MoneyCents::new(3334)
        );
        assert_eq!(
            MoneyCents::round_from_decimal(dec!(33.3333)).unwrap(),
            MoneyCents::new(3333)
        );
        assert_eq!(
            MoneyCents::round_from_decimal(dec!(-0.005)).unwrap(),
            MoneyCents::new(-1)
        );
    }

    #[test]
    fn exact_conversion_rejects_sub_cent_values() {
        assert_eq!(
            MoneyCents::try_from_decimal(dec!(12.50)).unwrap(),
            MoneyCents::new(1250)
        );
        assert_eq!(
            MoneyCents::try_from_decimal(dec!(12.500000)).unwrap(),
            MoneyCents::new(1250)
        );
        assert!(MoneyCents::try_from_decimal(dec!(12.505)).is_err());
    }

    #[test]
    fn amounts_beyond_i64_cents_are_rejected() {
        assert_eq!(
            "79228162514264337593543950335".parse::<MoneyCents>(),
            Err(EngineError::InvalidAmount("amount too large".to_string()))
        );
        assert_eq!(
            MoneyCents::try_from_decimal(Decimal::MAX),
            Err(EngineError::InvalidAmount("amount too large".to_string()))
        );
        assert_eq!(
            MoneyCents::round_from_decimal(Decimal::MIN),
            Err(EngineError::InvalidAmount("amount too large".to_string()))
        );
        assert_eq!(
            MoneyCents::try_from_decimal(dec!(92233720368547758.07)).unwrap(),
            MoneyCents::new(i64::MAX)
        );
        assert!(MoneyCents::try_from_decimal(dec!(92233720368547758.08)).is_err());
    }

    #[test]
    fn sums_and_round_trips_through_decimal() {
        let total: MoneyCents = [3333, 3333, 3334].into_iter().map(MoneyCents::new).sum();
        assert_eq!(total, MoneyCents::new(10_000));
        assert_eq!(total.to_decimal(), dec!(100.00));
    }
}
