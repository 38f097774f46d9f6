//! Payment state machine.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::PaymentError;
use super::types::{GatewayStatus, PaymentMode, PaymentStatus};

/// What a gateway callback does to a draft payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// Move to POSTED and post the voucher.
    Post,
    /// Record the gateway fields and stay DRAFT.
    StayDraft,
}

/// Stateless service validating payment transitions.
pub struct PaymentLifecycle;

impl PaymentLifecycle {
    /// Status a new invoice or advance payment starts in.
    ///
    /// Any online instrument means the payment waits for its gateway callback.
    #[must_use]
    pub fn initial_status(modes: &[PaymentMode]) -> PaymentStatus {
        if modes.iter().any(|mode| mode.is_online()) {
            PaymentStatus::Draft
        } else {
            PaymentStatus::Posted
        }
    }

    /// Validates a gateway callback and decides the outcome.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the payment is DRAFT.
    pub fn confirm_gateway(
        status: PaymentStatus,
        gateway_status: GatewayStatus,
    ) -> Result<GatewayOutcome, PaymentError> {
        if status != PaymentStatus::Draft {
            return Err(PaymentError::InvalidState {
                action: "confirm",
                status,
            });
        }
        Ok(match gateway_status {
            GatewayStatus::Success => GatewayOutcome::Post,
            GatewayStatus::Failed | GatewayStatus::Pending => GatewayOutcome::StayDraft,
        })
    }

    /// Only DRAFT payments can be edited; posted ones already have a voucher.
    ///
    /// # Errors
    ///
    /// `InvalidState` for any other status.
    pub fn validate_update(status: PaymentStatus) -> Result<(), PaymentError> {
        match status {
            PaymentStatus::Draft => Ok(()),
            _ => Err(PaymentError::InvalidState {
                action: "update",
                status,
            }),
        }
    }

    /// Only DRAFT and CANCELLED payments can be deleted.
    ///
    /// # Errors
    ///
    /// `InvalidState` for POSTED or RECONCILED payments.
    pub fn validate_delete(status: PaymentStatus) -> Result<(), PaymentError> {
        match status {
            PaymentStatus::Draft | PaymentStatus::Cancelled => Ok(()),
            PaymentStatus::Posted | PaymentStatus::Reconciled => Err(PaymentError::InvalidState {
                action: "delete",
                status,
            }),
        }
    }

    /// DRAFT and POSTED payments can be reconciled once.
    ///
    /// # Errors
    ///
    /// `AlreadyReconciled` when reconciled, `InvalidState` when cancelled.
    pub fn validate_reconcile(
        payment_id: Uuid,
        status: PaymentStatus,
        is_reconciled: bool,
    ) -> Result<(), PaymentError> {
        if is_reconciled || status == PaymentStatus::Reconciled {
            return Err(PaymentError::AlreadyReconciled(payment_id));
        }
        match status {
            PaymentStatus::Draft | PaymentStatus::Posted => Ok(()),
            _ => Err(PaymentError::InvalidState {
                action: "reconcile",
                status,
            }),
        }
    }

    /// DRAFT and POSTED payments can be cancelled.
    ///
    /// # Errors
    ///
    /// `InvalidState` for CANCELLED or RECONCILED payments.
    pub fn validate_cancel(status: PaymentStatus) -> Result<(), PaymentError> {
        match status {
            PaymentStatus::Draft | PaymentStatus::Posted => Ok(()),
            _ => Err(PaymentError::InvalidState {
                action: "cancel",
                status,
            }),
        }
    }

    /// Allocation needs a posted voucher and something left to allocate.
    ///
    /// # Errors
    ///
    /// `InvalidState` for DRAFT/CANCELLED, `OverAllocation` when nothing is left.
    pub fn validate_allocate(
        status: PaymentStatus,
        unallocated_amount: Decimal,
    ) -> Result<(), PaymentError> {
        match status {
            PaymentStatus::Posted | PaymentStatus::Reconciled => {}
            _ => {
                return Err(PaymentError::InvalidState {
                    action: "allocate",
                    status,
                });
            }
        }
        if unallocated_amount <= Decimal::ZERO {
            return Err(PaymentError::OverAllocation {
                requested: Decimal::ZERO,
                available: unallocated_amount,
            });
        }
        Ok(())
    }

    /// A posted, non-refund payment can be reversed once.
    ///
    /// # Errors
    ///
    /// `InvalidState`, `RefundNotReversible` or `AlreadyReversed`.
    pub fn validate_reverse(
        payment_id: Uuid,
        status: PaymentStatus,
        is_refund: bool,
        already_refunded: bool,
    ) -> Result<(), PaymentError> {
        match status {
            PaymentStatus::Posted | PaymentStatus::Reconciled => {}
            _ => {
                return Err(PaymentError::InvalidState {
                    action: "reverse",
                    status,
                });
            }
        }
        if is_refund {
            return Err(PaymentError::RefundNotReversible(payment_id));
        }
        if already_refunded {
            return Err(PaymentError::AlreadyReversed(payment_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(&[PaymentMode::Cash], PaymentStatus::Posted)]
    #[case(&[PaymentMode::Cheque, PaymentMode::Bank], PaymentStatus::Posted)]
    #[case(&[PaymentMode::Upi], PaymentStatus::Draft)]
    #[case(&[PaymentMode::Cash, PaymentMode::Card], PaymentStatus::Draft)]
    fn test_initial_status(#[case] modes: &[PaymentMode], #[case] expected: PaymentStatus) {
        assert_eq!(PaymentLifecycle::initial_status(modes), expected);
    }

    #[test]
    fn test_confirm_gateway() {
        assert_eq!(
            PaymentLifecycle::confirm_gateway(PaymentStatus::Draft, GatewayStatus::Success).unwrap(),
            GatewayOutcome::Post
        );
        assert_eq!(
            PaymentLifecycle::confirm_gateway(PaymentStatus::Draft, GatewayStatus::Failed).unwrap(),
            GatewayOutcome::StayDraft
        );
        assert!(matches!(
            PaymentLifecycle::confirm_gateway(PaymentStatus::Posted, GatewayStatus::Success),
            Err(PaymentError::InvalidState { action: "confirm", .. })
        ));
    }

    #[rstest]
    #[case(PaymentStatus::Draft, true)]
    #[case(PaymentStatus::Cancelled, true)]
    #[case(PaymentStatus::Posted, false)]
    #[case(PaymentStatus::Reconciled, false)]
    fn test_delete(#[case] status: PaymentStatus, #[case] allowed: bool) {
        assert_eq!(PaymentLifecycle::validate_delete(status).is_ok(), allowed);
    }

    #[test]
    fn test_reconcile_twice() {
        let id = Uuid::new_v4();
        assert!(PaymentLifecycle::validate_reconcile(id, PaymentStatus::Posted, false).is_ok());
        assert!(PaymentLifecycle::validate_reconcile(id, PaymentStatus::Draft, false).is_ok());
        assert!(matches!(
            PaymentLifecycle::validate_reconcile(id, PaymentStatus::Reconciled, true),
            Err(PaymentError::AlreadyReconciled(p)) if p == id
        ));
        assert!(matches!(
            PaymentLifecycle::validate_reconcile(id, PaymentStatus::Cancelled, false),
            Err(PaymentError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_allocate() {
        assert!(PaymentLifecycle::validate_allocate(PaymentStatus::Posted, dec!(1)).is_ok());
        assert!(PaymentLifecycle::validate_allocate(PaymentStatus::Reconciled, dec!(1)).is_ok());
        assert!(matches!(
            PaymentLifecycle::validate_allocate(PaymentStatus::Draft, dec!(1)),
            Err(PaymentError::InvalidState { .. })
        ));
        assert!(matches!(
            PaymentLifecycle::validate_allocate(PaymentStatus::Posted, dec!(0)),
            Err(PaymentError::OverAllocation { .. })
        ));
    }

    #[test]
    fn test_reverse() {
        let id = Uuid::new_v4();
        assert!(
            PaymentLifecycle::validate_reverse(id, PaymentStatus::Posted, false, false).is_ok()
        );
        assert!(matches!(
            PaymentLifecycle::validate_reverse(id, PaymentStatus::Posted, true, false),
            Err(PaymentError::RefundNotReversible(_))
        ));
        assert!(matches!(
            PaymentLifecycle::validate_reverse(id, PaymentStatus::Reconciled, false, true),
            Err(PaymentError::AlreadyReversed(_))
        ));
        assert!(matches!(
            PaymentLifecycle::validate_reverse(id, PaymentStatus::Draft, false, false),
            Err(PaymentError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_update_and_cancel() {
        assert!(PaymentLifecycle::validate_update(PaymentStatus::Draft).is_ok());
        assert!(PaymentLifecycle::validate_update(PaymentStatus::Posted).is_err());
        assert!(PaymentLifecycle::validate_cancel(PaymentStatus::Posted).is_ok());
        assert!(PaymentLifecycle::validate_cancel(PaymentStatus::Reconciled).is_err());
    }
}
