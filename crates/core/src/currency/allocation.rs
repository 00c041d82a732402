//! Amount allocation using the Largest Remainder Method.
//!
//! Every allocation sums exactly to its input total.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Allocation utility for distributing amounts.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Splits `total` into `count` near-equal parts at `decimal_places`.
    ///
    /// The first parts receive the leftover units. Negative totals are split
    /// by magnitude and keep their sign.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use ledgergen_core::currency::AllocationUtil;
    ///
    /// let parts = AllocationUtil::allocate_equal(dec!(100), 3, 2);
    /// assert_eq!(parts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    #[must_use]
    pub fn allocate_equal(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }

        let total_rounded =
            total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
        if count == 1 {
            return vec![total_rounded];
        }

        let magnitude = total_rounded.abs();
        let count_dec = Decimal::from(count as u64);
        let unit = Decimal::new(1, decimal_places);

        let base = (magnitude / count_dec)
            .round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        let remainder = magnitude - base * count_dec;
        let extra_count = (remainder / unit)
            .round_dp_with_strategy(0, RoundingStrategy::ToZero)
            .to_usize()
            .unwrap_or(0);

        (0..count)
            .map(|i| if i < extra_count { base + unit } else { base })
            .map(|part| if total_rounded.is_sign_negative() { -part } else { part })
            .collect()
    }

    /// Splits `total` in proportion to `weights`; the last part absorbs rounding.
    ///
    /// Returns an empty vector when the weights sum to zero.
    #[must_use]
    pub fn allocate_proportional(
        total: Decimal,
        weights: &[Decimal],
        decimal_places: u32,
    ) -> Vec<Decimal> {
        let weight_sum: Decimal = weights.iter().copied().sum();
        if weights.is_empty() || weight_sum.is_zero() {
            return vec![];
        }

        let mut allocated = Decimal::ZERO;
        let mut parts = Vec::with_capacity(weights.len());
        for (i, weight) in weights.iter().enumerate() {
            let part = if i + 1 == weights.len() {
                total - allocated
            } else {
                // Dividing first keeps large totals in range.
                (total * (*weight / weight_sum))
                    .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
            };
            allocated += part;
            parts.push(part);
        }
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_allocate_equal_empty() {
        assert!(AllocationUtil::allocate_equal(dec!(100), 0, 2).is_empty());
    }

    #[test]
    fn test_allocate_equal_single() {
        assert_eq!(AllocationUtil::allocate_equal(dec!(100), 1, 2), vec![dec!(100)]);
    }

    #[test]
    fn test_allocate_equal_even_split() {
        assert_eq!(
            AllocationUtil::allocate_equal(dec!(1200), 2, 2),
            vec![dec!(600), dec!(600)]
        );
    }

    #[test]
    fn test_allocate_equal_negative() {
        let result = AllocationUtil::allocate_equal(dec!(-100), 3, 2);
        assert_eq!(result, vec![dec!(-33.34), dec!(-33.33), dec!(-33.33)]);
    }

    #[test]
    fn test_allocate_equal_sum_invariant() {
        let test_cases = [
            (dec!(100), 3),
            (dec!(100), 7),
            (dec!(0.01), 3),
            (dec!(999.99), 7),
            (dec!(1790.1234), 3),
        ];

        for (total, count) in test_cases {
            let dp = total.scale().max(2);
            let result = AllocationUtil::allocate_equal(total, count, dp);
            assert_eq!(
                result.iter().sum::<Decimal>(),
                total,
                "Sum invariant failed for total={total}, count={count}"
            );
        }
    }

    #[test]
    fn test_allocate_proportional() {
        let result =
            AllocationUtil::allocate_proportional(dec!(100), &[dec!(600), dec!(600), dec!(600)], 2);
        assert_eq!(result, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
    }

    #[test]
    fn test_allocate_proportional_zero_weights() {
        assert!(AllocationUtil::allocate_proportional(dec!(100), &[Decimal::ZERO], 2).is_empty());
    }
}
