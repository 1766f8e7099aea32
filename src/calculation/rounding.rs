//! Currency rounding helpers.
//!
//! Payroll amounts are whole currency units. Products of rates and hours are
//! rounded half-up; derived hourly rates are truncated.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to a whole currency unit, halves away from zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_half_up;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_half_up(Decimal::from_str("148500.5").unwrap()), Decimal::from(148_501));
/// assert_eq!(round_half_up(Decimal::from_str("148500.49").unwrap()), Decimal::from(148_500));
/// ```
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Drops any fractional currency unit.
pub fn truncate_to_unit(amount: Decimal) -> Decimal {
    amount.trunc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(round_half_up(dec("0.5")), dec("1"));
        assert_eq!(round_half_up(dec("2.5")), dec("3"));
        assert_eq!(round_half_up(dec("2.4999")), dec("2"));
    }

    #[test]
    fn test_whole_amount_unchanged() {
        assert_eq!(round_half_up(dec("3380000")), dec("3380000"));
    }

    #[test]
    fn test_truncate_drops_fraction() {
        assert_eq!(truncate_to_unit(dec("14354.066")), dec("14354"));
        assert_eq!(truncate_to_unit(dec("14354.999")), dec("14354"));
    }
}
