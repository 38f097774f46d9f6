//! Property-based tests for the GST split.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::GstService;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn gst_rate() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ZERO),
        Just(Decimal::new(5, 0)),
        Just(Decimal::new(12, 0)),
        Just(Decimal::new(18, 0)),
        Just(Decimal::new(28, 0)),
        Just(Decimal::new(25, 1)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Totals are always the sum of their rounded parts.
    #[test]
    fn prop_totals_are_sums(
        subtotal in amount(),
        rate in gst_rate(),
        is_interstate in any::<bool>(),
    ) {
        let gst = GstService::calculate_gst(subtotal, rate, is_interstate).unwrap();
        prop_assert_eq!(gst.total_gst, gst.cgst_amount + gst.sgst_amount + gst.igst_amount);
        prop_assert_eq!(gst.total_amount, gst.subtotal + gst.total_gst);
        prop_assert!(gst.cgst_amount.scale() <= 2);
        prop_assert!(gst.igst_amount.scale() <= 2);
    }

    /// Interstate uses only IGST; intrastate uses equal CGST and SGST.
    #[test]
    fn prop_split_shape(subtotal in amount(), rate in gst_rate()) {
        let inter = GstService::calculate_gst(subtotal, rate, true).unwrap();
        prop_assert!(inter.cgst_amount.is_zero() && inter.sgst_amount.is_zero());

        let intra = GstService::calculate_gst(subtotal, rate, false).unwrap();
        prop_assert!(intra.igst_amount.is_zero());
        prop_assert_eq!(intra.cgst_amount, intra.sgst_amount);
        prop_assert_eq!(intra.cgst_rate + intra.sgst_rate, rate);
    }

    /// Independent rounding keeps the intrastate total within a cent of IGST.
    #[test]
    fn prop_intrastate_within_a_cent_of_interstate(subtotal in amount(), rate in gst_rate()) {
        let inter = GstService::calculate_gst(subtotal, rate, true).unwrap();
        let intra = GstService::calculate_gst(subtotal, rate, false).unwrap();
        prop_assert!((inter.total_gst - intra.total_gst).abs() <= Decimal::new(1, 2));
    }

    /// Reverse calculation recovers the subtotal within rounding tolerance.
    #[test]
    fn prop_reverse_round_trip(
        subtotal in amount(),
        rate in gst_rate(),
        is_interstate in any::<bool>(),
    ) {
        let forward = GstService::calculate_gst(subtotal, rate, is_interstate).unwrap();
        let reverse =
            GstService::calculate_reverse_gst(forward.total_amount, rate, is_interstate).unwrap();
        prop_assert!((reverse.subtotal - subtotal).abs() <= Decimal::new(1, 2));
        prop_assert!((reverse.total_amount - forward.total_amount).abs() <= Decimal::new(2, 2));
    }
}
