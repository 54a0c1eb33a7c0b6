//! Money helpers.
//!
//! Prices are stored as `NUMERIC(10,2)` and carried as [`Decimal`] everywhere,
//! so cart totals never pick up floating point drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as a dollar string with two decimals (e.g. `$4.50`).
///
/// ```
/// use farmers_place_core::format_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_money(Decimal::new(45, 1)), "$4.50");
/// ```
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${rounded:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_amount() {
        assert_eq!(format_money(Decimal::new(12, 0)), "$12.00");
    }

    #[test]
    fn test_format_rounds_half_up() {
        assert_eq!(format_money(Decimal::new(19_995, 3)), "$20.00");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_money(Decimal::new(-250, 2)), "-$2.50");
    }
}
