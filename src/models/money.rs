//! Conversion between wire amounts and stored cents.
//!
//! Balances and amounts are stored as `i64` cents to avoid floating-point
//! errors. Clients send and receive decimal values; this module is the only
//! place the two representations meet.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::AppError;

/// Number of decimal places kept for every amount.
pub const SCALE: u32 = 2;

/// Convert a client-supplied amount to cents.
///
/// # Errors
///
/// `InvalidInput` when the amount is zero or negative, has more than two
/// decimal places, or does not fit in an `i64` number of cents.
pub fn to_cents(amount: Decimal) -> Result<i64, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }

    if amount.normalize().scale() > SCALE {
        return Err(AppError::InvalidInput(
            "Amount must have at most two decimal places".to_string(),
        ));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| AppError::InvalidInput("Amount is too large".to_string()))
}

/// Convert stored cents back to a decimal with two places.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("500", 50_000)]
    #[case("10.5", 1_050)]
    #[case("0.01", 1)]
    #[case("19.990", 1_999)]
    fn accepts_positive_amounts(#[case] input: &str, #[case] expected: i64) {
        let amount = Decimal::from_str(input).unwrap();
        assert_eq!(to_cents(amount).unwrap(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("0.001")]
    #[case("1.234")]
    fn rejects_invalid_amounts(#[case] input: &str) {
        let amount = Decimal::from_str(input).unwrap();
        assert!(matches!(to_cents(amount), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn rejects_amounts_beyond_i64_cents() {
        assert!(to_cents(Decimal::MAX).is_err());
    }

    #[test]
    fn cents_render_with_two_places() {
        assert_eq!(from_cents(30_000).to_string(), "300.00");
        assert_eq!(from_cents(5).to_string(), "0.05");
    }
}
