//! Invoice payment status synchronisation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hisaab_shared::types::round_money;

use super::types::InvoicePaymentStatus;

/// Paid/balance figures of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaymentState {
    /// Invoice total.
    pub total_amount: Decimal,
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`.
    pub balance_amount: Decimal,
    /// Derived status.
    pub payment_status: InvoicePaymentStatus,
}

/// Applies `paid_delta` to an invoice's paid amount and recomputes balance
/// and payment status.
///
/// Running it again with a zero delta returns the same state.
#[must_use]
pub fn sync_invoice_payment_status(
    total_amount: Decimal,
    paid_amount: Decimal,
    paid_delta: Decimal,
) -> InvoicePaymentState {
    let paid_amount = round_money(paid_amount + paid_delta);
    let payment_status = if paid_amount <= Decimal::ZERO {
        InvoicePaymentStatus::Unpaid
    } else if paid_amount < total_amount {
        InvoicePaymentStatus::Partial
    } else if paid_amount == total_amount {
        InvoicePaymentStatus::Paid
    } else {
        InvoicePaymentStatus::Overpaid
    };

    InvoicePaymentState {
        total_amount,
        paid_amount,
        balance_amount: total_amount - paid_amount,
        payment_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), dec!(0), InvoicePaymentStatus::Unpaid, dec!(1180))]
    #[case(dec!(0), dec!(500), InvoicePaymentStatus::Partial, dec!(680))]
    #[case(dec!(500), dec!(680), InvoicePaymentStatus::Paid, dec!(0))]
    #[case(dec!(1180), dec!(20), InvoicePaymentStatus::Overpaid, dec!(-20))]
    #[case(dec!(1180), dec!(-1180), InvoicePaymentStatus::Unpaid, dec!(1180))]
    fn test_sync_status(
        #[case] paid: Decimal,
        #[case] delta: Decimal,
        #[case] expected_status: InvoicePaymentStatus,
        #[case] expected_balance: Decimal,
    ) {
        let state = sync_invoice_payment_status(dec!(1180), paid, delta);
        assert_eq!(state.payment_status, expected_status);
        assert_eq!(state.balance_amount, expected_balance);
        assert_eq!(state.paid_amount, paid + delta);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A zero delta is a no-op, however many times it is applied.
        #[test]
        fn prop_zero_delta_is_idempotent(
            total_cents in 1i64..10_000_000i64,
            paid_cents in 0i64..20_000_000i64,
        ) {
            let total = Decimal::new(total_cents, 2);
            let paid = Decimal::new(paid_cents, 2);
            let first = sync_invoice_payment_status(total, paid, Decimal::ZERO);
            let second =
                sync_invoice_payment_status(first.total_amount, first.paid_amount, Decimal::ZERO);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.paid_amount + first.balance_amount, total);
        }
    }
}
