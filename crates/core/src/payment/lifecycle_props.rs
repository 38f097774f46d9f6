//! Property-based tests for the payment state machine.

use proptest::prelude::*;
use uuid::Uuid;

use super::error::PaymentError;
use super::lifecycle::PaymentLifecycle;
use super::types::{GatewayStatus, PaymentMode, PaymentStatus};

fn status_strategy() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Draft),
        Just(PaymentStatus::Posted),
        Just(PaymentStatus::Cancelled),
        Just(PaymentStatus::Reconciled),
    ]
}

fn mode_strategy() -> impl Strategy<Value = PaymentMode> {
    prop_oneof![
        Just(PaymentMode::Cash),
        Just(PaymentMode::Bank),
        Just(PaymentMode::Cheque),
        Just(PaymentMode::Upi),
        Just(PaymentMode::Online),
        Just(PaymentMode::Card),
        Just(PaymentMode::Wallet),
        Just(PaymentMode::Neft),
        Just(PaymentMode::Rtgs),
        Just(PaymentMode::Imps),
    ]
}

fn gateway_strategy() -> impl Strategy<Value = GatewayStatus> {
    prop_oneof![
        Just(GatewayStatus::Success),
        Just(GatewayStatus::Failed),
        Just(GatewayStatus::Pending),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A payment starts DRAFT exactly when one of its instruments is online.
    #[test]
    fn prop_initial_status_follows_modes(modes in prop::collection::vec(mode_strategy(), 1..5)) {
        let status = PaymentLifecycle::initial_status(&modes);
        let any_online = modes.iter().any(|m| m.is_online());
        prop_assert_eq!(status == PaymentStatus::Draft, any_online);
        prop_assert!(matches!(status, PaymentStatus::Draft | PaymentStatus::Posted));
    }

    /// Gateway confirmation is accepted only from DRAFT.
    #[test]
    fn prop_confirm_only_from_draft(status in status_strategy(), gateway in gateway_strategy()) {
        let result = PaymentLifecycle::confirm_gateway(status, gateway);
        if status == PaymentStatus::Draft {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid_state = matches!(result, Err(PaymentError::InvalidState { .. }));
            prop_assert!(is_invalid_state);
        }
    }

    /// Once reconciled, reconcile fails with AlreadyReconciled and delete with InvalidState.
    #[test]
    fn prop_reconciled_is_terminal(id in any::<u128>()) {
        let id = Uuid::from_u128(id);
        let reconcile = PaymentLifecycle::validate_reconcile(id, PaymentStatus::Reconciled, true);
        let is_already_reconciled = matches!(reconcile, Err(PaymentError::AlreadyReconciled(_)));
        prop_assert!(is_already_reconciled);
        let delete = PaymentLifecycle::validate_delete(PaymentStatus::Reconciled);
        let is_invalid_state = matches!(delete, Err(PaymentError::InvalidState { .. }));
        prop_assert!(is_invalid_state);
    }

    /// Delete is allowed exactly for DRAFT and CANCELLED.
    #[test]
    fn prop_delete_states(status in status_strategy()) {
        let allowed = matches!(status, PaymentStatus::Draft | PaymentStatus::Cancelled);
        prop_assert_eq!(PaymentLifecycle::validate_delete(status).is_ok(), allowed);
    }
}
