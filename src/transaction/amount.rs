//! Fixed-point money amounts.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The number of digits after the decimal point.
pub const DECIMAL_PLACES: u32 = 2;
/// The total number of digits an amount may have, including the decimal places.
pub const MAX_DIGITS: u32 = 10;

/// Exclusive upper bound on the absolute number of cents, i.e. 10^MAX_DIGITS.
const CENTS_LIMIT: i64 = 10_000_000_000;

/// The reasons a decimal cannot be used as an [Amount].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs)]
pub enum AmountError {
    #[error("A valid number is required.")]
    NotANumber,
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,
    #[error("Ensure that there are no more than 10 digits in total.")]
    TooManyDigits,
}

/// An amount of money with two decimal places, stored as whole cents.
///
/// Serialises as a decimal string such as `"12.50"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// No money.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from a number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The amount as a decimal with exactly two decimal places.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    /// Convert a decimal into an amount.
    ///
    /// Trailing zeros past the second decimal place are ignored, so `1.500`
    /// is accepted.
    ///
    /// # Errors
    ///
    /// Returns an [AmountError] if `value` has more than two significant
    /// decimal places or more than ten digits in total.
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        let value = value.normalize();

        if value.scale() > DECIMAL_PLACES {
            return Err(AmountError::TooManyDecimalPlaces);
        }

        let cents = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .ok_or(AmountError::TooManyDigits)?;

        if cents.abs() >= CENTS_LIMIT {
            return Err(AmountError::TooManyDigits);
        }

        Ok(Self(cents))
    }

    /// Parse an amount from JSON, which may hold either a string or a number.
    ///
    /// # Errors
    ///
    /// Returns [AmountError::NotANumber] for any other kind of JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AmountError> {
        match value {
            serde_json::Value::String(text) => text.parse(),
            serde_json::Value::Number(number) => number.to_string().parse(),
            _ => Err(AmountError::NotANumber),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| AmountError::NotANumber)?;

        Self::from_decimal(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_decimal().fmt(f)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(Amount)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Amount, AmountError};

    #[test]
    fn parses_two_decimal_places() {
        assert_eq!("12.50".parse(), Ok(Amount::from_cents(1250)));
        assert_eq!("0.01".parse(), Ok(Amount::from_cents(1)));
        assert_eq!("7".parse(), Ok(Amount::from_cents(700)));
    }

    #[test]
    fn ignores_trailing_zeros() {
        assert_eq!("1.500".parse(), Ok(Amount::from_cents(150)));
    }

    #[test]
    fn rejects_three_decimal_places() {
        assert_eq!(
            "1.234".parse::<Amount>(),
            Err(AmountError::TooManyDecimalPlaces)
        );
    }

    #[test]
    fn rejects_more_than_ten_digits() {
        assert_eq!("99999999.99".parse(), Ok(Amount::from_cents(9_999_999_999)));
        assert_eq!(
            "100000000.00".parse::<Amount>(),
            Err(AmountError::TooManyDigits)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("abc".parse::<Amount>(), Err(AmountError::NotANumber));
        assert_eq!("".parse::<Amount>(), Err(AmountError::NotANumber));
    }

    #[test]
    fn parses_json_strings_and_numbers() {
        assert_eq!(
            Amount::from_json(&json!("12.5")),
            Ok(Amount::from_cents(1250))
        );
        assert_eq!(Amount::from_json(&json!(12.5)), Ok(Amount::from_cents(1250)));
        assert_eq!(Amount::from_json(&json!(3)), Ok(Amount::from_cents(300)));
        assert_eq!(Amount::from_json(&json!(true)), Err(AmountError::NotANumber));
    }

    #[test]
    fn serialises_with_two_decimal_places() {
        assert_eq!(
            serde_json::to_value(Amount::from_cents(1250)).unwrap(),
            json!("12.50")
        );
        assert_eq!(serde_json::to_value(Amount::ZERO).unwrap(), json!("0.00"));
        assert_eq!(
            serde_json::to_value(Amount::from_cents(-705)).unwrap(),
            json!("-7.05")
        );
    }

    #[test]
    fn arithmetic_works_in_cents() {
        let total: Amount = [150, 250, 100].into_iter().map(Amount::from_cents).sum();

        assert_eq!(total, Amount::from_cents(500));
        assert_eq!(
            Amount::from_cents(100) - Amount::from_cents(250),
            Amount::from_cents(-150)
        );
    }
}
