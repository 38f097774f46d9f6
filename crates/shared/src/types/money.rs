//! Money rounding and currency conversion helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every stored amount is a `rust_decimal::Decimal` rounded to two places
//! with round-half-up, which is what tenant ledgers have always used.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every stored money amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a money amount to two places using round-half-up.
///
/// `2.345 -> 2.35`, `-2.345 -> -2.35`.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a base-currency amount into a currency quoted at `exchange_rate`
/// units of base per unit.
///
/// Returns the base amount unchanged when the rate is not positive.
#[must_use]
pub fn foreign_from_base(base_amount: Decimal, exchange_rate: Decimal) -> Decimal {
    if exchange_rate <= Decimal::ZERO {
        return round_money(base_amount);
    }
    round_money(base_amount / exchange_rate)
}
