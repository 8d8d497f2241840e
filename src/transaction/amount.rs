//! Decimal amounts held as a whole number of base units
//!
//! One unit is `10^-DECIMAL_PLACES`, so every amount written with at most
//! `DECIMAL_PLACES` fractional digits is stored exactly and sums never drift.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits an amount can carry.
pub const DECIMAL_PLACES: u32 = 8;

/// Base units in one whole amount.
pub const UNITS_PER_WHOLE: i64 = 10_i64.pow(DECIMAL_PLACES);

/// Deterministic fixed-point decimal used for balances and transfer amounts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(i64::MAX);

    pub const fn from_units(units: i64) -> Self {
        Amount(units)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    /// A whole amount. Every `u32` fits without overflow.
    pub const fn from_whole(whole: u32) -> Self {
        Amount(whole as i64 * UNITS_PER_WHOLE)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Little-endian bytes of the unit count, as signed and hashed.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

/// Parse a plain decimal amount: digits with an optional fractional part.
///
/// Signs, exponents, whitespace and empty integer or fractional parts are rejected,
/// as is any nonzero digit beyond [`DECIMAL_PLACES`].
pub fn parse_amount(text: &str) -> Result<Amount, LedgerError> {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
        return Err(LedgerError::MalformedTransaction(format!(
            "Amount '{}' is not a plain decimal number",
            text
        )));
    }

    let significant = frac_part.unwrap_or("").trim_end_matches('0');
    if significant.len() > DECIMAL_PLACES as usize {
        return Err(LedgerError::MalformedTransaction(format!(
            "Amount '{}' has more than {} decimal places",
            text, DECIMAL_PLACES
        )));
    }

    let out_of_range =
        || LedgerError::MalformedTransaction(format!("Amount '{}' out of range", text));

    // Only overflow can fail here; the digits were checked above.
    let whole: i64 = int_part.parse().map_err(|_| out_of_range())?;
    let fraction = significant
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(DECIMAL_PLACES as usize)
        .fold(0i64, |acc, digit| acc * 10 + i64::from(digit - b'0'));

    whole
        .checked_mul(UNITS_PER_WHOLE)
        .and_then(|units| units.checked_add(fraction))
        .map(Amount)
        .ok_or_else(out_of_range)
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let per_whole = UNITS_PER_WHOLE as u64;
        let (whole, fraction) = (magnitude / per_whole, magnitude % per_whole);

        if fraction == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:0width$}", fraction, width = DECIMAL_PLACES as usize);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> Amount {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(amount("1.5").units(), 150_000_000);
        assert_eq!(amount("0.00000001").units(), 1);
        assert_eq!(amount("5"), Amount::from_whole(5));
        assert_eq!(amount("007.10"), amount("7.1"));
        assert_eq!(amount("2.000000000000"), Amount::from_whole(2));
    }

    #[test]
    fn test_decimal_sums_do_not_drift() {
        let total = amount("0.2").checked_add(amount("0.4")).unwrap();
        assert_eq!(total, amount("0.6"));

        let mut balance = Amount::from_whole(5);
        for _ in 0..10 {
            balance = balance.checked_add(amount("0.1")).unwrap();
        }
        assert_eq!(balance, Amount::from_whole(6));
        assert_eq!(balance.to_string(), "6");
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(amount("5.60").to_string(), "5.6");
        assert_eq!(amount("0.2").to_string(), "0.2");
        assert_eq!(Amount::ZERO.to_string(), "0");
        assert_eq!(Amount::from_units(-150_000_000).to_string(), "-1.5");
        assert_eq!(Amount::MAX.to_string(), "92233720368.54775807");
        assert_eq!(amount(&Amount::MAX.to_string()), Amount::MAX);
    }

    #[test]
    fn test_parse_rejects_inexact_and_out_of_range() {
        assert!(matches!(
            parse_amount("0.000000001"),
            Err(LedgerError::MalformedTransaction(_))
        ));
        assert!(parse_amount("92233720368.54775808").is_err());
        assert!(parse_amount("99999999999999999999").is_err());
        for text in ["", "-1", "+1", "1e3", "1.", ".5", " 1", "1,5"] {
            assert!(parse_amount(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Amount::MAX.checked_add(Amount::from_units(1)), None);
        assert_eq!(
            Amount::from_whole(2).checked_sub(Amount::from_whole(3)),
            Some(Amount::from_units(-UNITS_PER_WHOLE))
        );
        assert_eq!(Amount::from_whole(1).to_le_bytes(), UNITS_PER_WHOLE.to_le_bytes());
    }
}
