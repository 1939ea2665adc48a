//! Shared arithmetic helpers for the calculators.
//!
//! All amounts are NOK held as [`Decimal`]. Rounding to whole øre (two
//! decimal places) happens once per computed component, never on
//! intermediate products.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to whole øre using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use skatt_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(35796.004)), dec!(35796.00));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a whole-number percentage (`22` meaning 22 %) to `amount`,
/// rounding the product once.
///
/// ```
/// use rust_decimal_macros::dec;
/// use skatt_core::calculations::common::apply_percent;
///
/// assert_eq!(apply_percent(dec!(500000), dec!(8.2)), dec!(41000.00));
/// ```
pub fn apply_percent(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    round_half_up(amount * percent / Decimal::ONE_HUNDRED)
}

/// Expresses `part` as a percentage of `whole`, or zero when `whole` is not
/// positive.
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up(part / whole * Decimal::ONE_HUNDRED)
}

/// Returns the larger of two values, or `a` when equal.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a >= b { a } else { b }
}

/// Formats an amount as whole kroner with space-separated thousands,
/// the way Norwegian amounts are usually written.
///
/// ```
/// use rust_decimal_macros::dec;
/// use skatt_core::calculations::common::format_nok;
///
/// assert_eq!(format_nok(dec!(69900)), "69 900");
/// assert_eq!(format_nok(dec!(1234567.89)), "1 234 568");
/// ```
pub fn format_nok(amount: Decimal) -> String {
    let whole = amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = whole.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    if whole.is_sign_negative() && !whole.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}
