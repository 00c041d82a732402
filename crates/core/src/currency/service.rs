//! Rounding rules for money arithmetic.
//!
//! Conversions use Banker's Rounding (MidpointNearestEven) at 4 decimal
//! places. VAT totals reported to the authority are rounded to whole units,
//! half away from zero.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Decimal places kept on converted local amounts.
pub const CONVERSION_DECIMAL_PLACES: u32 = 4;

/// Stateless money arithmetic helpers.
pub struct CurrencyService;

impl CurrencyService {
    /// Converts an amount with a rate, rounded to 4 places (Banker's Rounding).
    ///
    /// Returns `None` when the product does not fit in a `Decimal`.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use ledgergen_core::currency::CurrencyService;
    ///
    /// assert_eq!(CurrencyService::convert(dec!(500), dec!(3.58)), Some(dec!(1790.0000)));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal) -> Option<Decimal> {
        amount.checked_mul(rate).map(|value| {
            value.round_dp_with_strategy(
                CONVERSION_DECIMAL_PLACES,
                RoundingStrategy::MidpointNearestEven,
            )
        })
    }

    /// Rounds with Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Rounds to whole currency units, half away from zero.
    #[must_use]
    pub fn round_whole(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Grosses up a net amount for a withholding percentage: `net * p / (1 - p)`.
    ///
    /// Rounded to cents. Returns `None` when `p` is not in `[0, 1)`.
    #[must_use]
    pub fn withholding_for_net(net: Decimal, percentage: Decimal) -> Option<Decimal> {
        if percentage < Decimal::ZERO || percentage >= Decimal::ONE {
            return None;
        }
        let withholding = net.checked_mul(percentage)?.checked_div(Decimal::ONE - percentage)?;
        Some(Self::round(withholding, 2))
    }
}
