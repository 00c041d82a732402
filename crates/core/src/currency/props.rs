//! Property-based tests for currency operations.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::AllocationUtil;
use super::service::CurrencyService;

/// Positive amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive rates from 0.0001 to 10000.0000.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn allocation_count() -> impl Strategy<Value = usize> {
    1usize..50
}

fn weights() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2)), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converted amounts never carry more than 4 decimal places.
    #[test]
    fn prop_convert_rounds_to_4_decimals(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = CurrencyService::convert(amount, rate).unwrap();
        prop_assert!(result.scale() <= 4, "{} has more than 4 decimal places", result);
    }

    /// A rate of one preserves the amount.
    #[test]
    fn prop_local_rate_preserves_amount(amount in positive_amount()) {
        prop_assert_eq!(CurrencyService::convert(amount, Decimal::ONE), Some(amount));
    }

    /// Equal allocation conserves the total at the amount's own precision.
    #[test]
    fn prop_allocate_equal_sum_invariant(
        total in positive_amount(),
        count in allocation_count(),
        negate in any::<bool>(),
    ) {
        let total = if negate { -total } else { total };
        let result = AllocationUtil::allocate_equal(total, count, total.scale().max(2));

        prop_assert_eq!(result.len(), count);
        prop_assert_eq!(result.iter().copied().sum::<Decimal>(), total);
        for part in &result {
            prop_assert_eq!(part.is_sign_negative() && !part.is_zero(), negate && !part.is_zero());
        }
    }

    /// Parts of an equal allocation differ by at most one unit.
    #[test]
    fn prop_allocate_equal_is_fair(
        total in positive_amount(),
        count in allocation_count(),
    ) {
        let result = AllocationUtil::allocate_equal(total, count, 2);
        let max = result.iter().copied().max().unwrap_or_default();
        let min = result.iter().copied().min().unwrap_or_default();
        prop_assert!(max - min <= Decimal::new(1, 2));
    }

    /// Proportional allocation conserves the total.
    #[test]
    fn prop_allocate_proportional_sum_invariant(
        total in positive_amount(),
        weights in weights(),
    ) {
        let result = AllocationUtil::allocate_proportional(total, &weights, 2);
        prop_assert_eq!(result.len(), weights.len());
        prop_assert_eq!(result.iter().copied().sum::<Decimal>(), total);
    }
}
