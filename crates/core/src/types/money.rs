//! Decimal money arithmetic for cart and order totals.
//!
//! Totals are summed at full precision and rounded once, after aggregation.
//! Rounding each line first drifts by up to half a unit per line.

use rust_decimal::Decimal;

/// Decimal places kept on order totals unless configured otherwise.
pub const DEFAULT_TOTAL_DECIMALS: u32 = 2;

/// Largest precision accepted for order totals.
///
/// Matches the scale check on the order total column.
pub const MAX_TOTAL_DECIMALS: u32 = 6;

/// Price of one cart or order line: unit price times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: impl Into<Decimal>) -> Decimal {
    unit_price * quantity.into()
}

/// Sum line amounts and round the result to `decimals` places.
///
/// Uses banker's rounding (midpoint to even), the rounding mode of
/// [`Decimal::round_dp`]. An empty iterator sums to zero.
///
/// ```
/// use bookstore_core::round_total;
/// use rust_decimal::Decimal;
///
/// let lines = [Decimal::new(2000, 2), Decimal::new(525, 2)];
/// assert_eq!(round_total(lines, 2), Decimal::new(2525, 2));
/// ```
#[must_use]
pub fn round_total<I>(amounts: I, decimals: u32) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc + amount)
        .round_dp(decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(d("10.00"), 2), d("20.00"));
        assert_eq!(line_total(d("5.25"), 0), Decimal::ZERO);
    }

    #[test]
    fn test_round_total_sums_before_rounding() {
        // Per-line rounding to one place would give 0.0 + 0.0 + 0.0 = 0.0.
        let lines = [d("0.04"), d("0.04"), d("0.04")];
        assert_eq!(round_total(lines, 1), d("0.1"));
    }

    #[test]
    fn test_round_total_uses_bankers_rounding() {
        assert_eq!(round_total([d("2.125")], 2), d("2.12"));
        assert_eq!(round_total([d("2.135")], 2), d("2.14"));
    }

    #[test]
    fn test_round_total_empty_is_zero() {
        assert_eq!(round_total(std::iter::empty(), 2), Decimal::ZERO);
    }

    #[test]
    fn test_round_total_respects_precision() {
        let lines = [d("19.99"), d("0.018")];
        assert_eq!(round_total(lines, 2), d("20.01"));
        assert_eq!(round_total(lines, 0), d("20"));
        assert_eq!(round_total(lines, 3), d("20.008"));
    }
}
