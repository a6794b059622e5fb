//! Common money helpers shared by the tax and trade calculators.
//!
//! Every monetary value that leaves a calculator passes through
//! [`normalize_money`]: it is rounded to cents and floored at zero.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use levy_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use levy_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Normalizes a monetary value: rounds to cents, then floors at zero.
///
/// This is total over every decimal input; negative values become zero
/// rather than an error.
///
/// ```
/// use rust_decimal_macros::dec;
/// use levy_core::calculations::common::normalize_money;
///
/// assert_eq!(normalize_money(dec!(1234.567)), dec!(1234.57));
/// assert_eq!(normalize_money(dec!(-10)), dec!(0));
/// ```
pub fn normalize_money(value: Decimal) -> Decimal {
    max(round_half_up(value), Decimal::ZERO)
}

/// Converts a raw floating point value into a decimal without rounding or
/// clamping. Non-finite and out-of-range values become zero.
pub fn decimal_from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(123.454));

        assert_eq!(result, dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(123.455));

        assert_eq!(result, dec!(123.46));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-123.455));

        assert_eq!(result, dec!(-123.46)); // Away from zero
    }

    #[test]
    fn round_half_up_handles_small_values() {
        let result = round_half_up(dec!(0.001));

        assert_eq!(result, dec!(0.00));
    }

    #[test]
    fn round_half_up_handles_large_values() {
        let result = round_half_up(dec!(999999.999));

        assert_eq!(result, dec!(1000000.00));
    }

    // =========================================================================
    // max tests
    // =========================================================================

    #[test]
    fn max_returns_larger_value() {
        assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
        assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
    }

    #[test]
    fn max_handles_negative_and_positive() {
        let result = max(dec!(-50.00), dec!(50.00));

        assert_eq!(result, dec!(50.00));
    }

    // =========================================================================
    // normalize_money tests
    // =========================================================================

    #[test]
    fn normalize_money_rounds_to_cents() {
        let result = normalize_money(dec!(10.005));

        assert_eq!(result, dec!(10.01));
    }

    #[test]
    fn normalize_money_clamps_negative_to_zero() {
        let result = normalize_money(dec!(-0.01));

        assert_eq!(result, Decimal::ZERO);
    }

    #[test]
    fn normalize_money_clamps_tiny_negative_to_zero() {
        // Rounds to -0.00 first, which must still compare equal to zero.
        let result = normalize_money(dec!(-0.004));

        assert_eq!(result, Decimal::ZERO);
        assert!(!result.is_sign_negative());
    }

    #[test]
    fn normalize_money_keeps_zero() {
        assert_eq!(normalize_money(Decimal::ZERO), Decimal::ZERO);
    }

    // =========================================================================
    // decimal_from_f64 tests
    // =========================================================================

    #[test]
    fn decimal_from_f64_coerces_non_finite_to_zero() {
        assert_eq!(decimal_from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(decimal_from_f64(f64::INFINITY), Decimal::ZERO);
        assert_eq!(decimal_from_f64(f64::NEG_INFINITY), Decimal::ZERO);
    }

    #[test]
    fn decimal_from_f64_coerces_out_of_range_to_zero() {
        assert_eq!(decimal_from_f64(1e300), Decimal::ZERO);
    }

    #[test]
    fn decimal_from_f64_keeps_sign() {
        assert_eq!(decimal_from_f64(-2.5), dec!(-2.5));
    }
}
