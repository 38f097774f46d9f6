//! Allocation planning.
//!
//! The whole batch is validated, per line and in aggregate, before the
//! repository writes anything. The repository then applies the plan as-is.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hisaab_shared::types::round_money;

use super::error::PaymentError;
use super::lifecycle::PaymentLifecycle;
use super::types::{PaymentStatus, PaymentType};
use crate::document::{
    DocumentError, InvoiceKind, InvoicePaymentState, InvoiceStatus, sync_invoice_payment_status,
};
use crate::party::PartyRef;

/// The payment figures allocation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSnapshot {
    /// Payment id.
    pub id: Uuid,
    /// Current status.
    pub status: PaymentStatus,
    /// Receipt or payment.
    pub payment_type: PaymentType,
    /// Counterparty, if any.
    pub party: Option<PartyRef>,
    /// `total_amount_base`.
    pub total_amount: Decimal,
    /// `allocated_amount_base`.
    pub allocated_amount: Decimal,
    /// `unallocated_amount_base`.
    pub unallocated_amount: Decimal,
}

/// One requested allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Target invoice kind.
    pub invoice_kind: InvoiceKind,
    /// Target invoice id.
    pub document_id: Uuid,
    /// Amount to allocate in base currency.
    pub amount: Decimal,
    /// Discount granted on settlement (recorded only).
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Other adjustment (recorded only).
    #[serde(default)]
    pub adjustment_amount: Decimal,
}

impl AllocationRequest {
    /// Allocation without discount or adjustment.
    #[must_use]
    pub const fn new(invoice_kind: InvoiceKind, document_id: Uuid, amount: Decimal) -> Self {
        Self {
            invoice_kind,
            document_id,
            amount,
            discount_amount: Decimal::ZERO,
            adjustment_amount: Decimal::ZERO,
        }
    }
}

/// An allocation target as loaded (and locked) by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentBalance {
    /// Invoice kind.
    pub invoice_kind: InvoiceKind,
    /// Invoice id.
    pub document_id: Uuid,
    /// Invoice party.
    pub party: PartyRef,
    /// Invoice status.
    pub status: InvoiceStatus,
    /// Invoice total.
    pub total_amount: Decimal,
    /// Paid so far.
    pub paid_amount: Decimal,
    /// Held by other payments' allocations awaiting gateway confirmation.
    pub reserved_amount: Decimal,
}

impl DocumentBalance {
    /// Balance still open to new allocations.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.total_amount - self.paid_amount - self.reserved_amount
    }
}

/// A validated allocation and the invoice state it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAllocation {
    /// The request, amounts rounded.
    pub request: AllocationRequest,
    /// Invoice balance before this allocation.
    pub balance_before: Decimal,
    /// Invoice paid/balance/status after this allocation.
    pub state_after: InvoicePaymentState,
}

/// A fully validated allocation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Allocations in request order.
    pub allocations: Vec<PlannedAllocation>,
    /// Sum allocated by this batch.
    pub total_allocated: Decimal,
    /// Payment `allocated_amount_base` after the batch.
    pub allocated_after: Decimal,
    /// Payment `unallocated_amount_base` after the batch.
    pub unallocated_after: Decimal,
}

/// Validates allocation batches.
pub struct AllocationPlanner;

impl AllocationPlanner {
    /// Plans an allocation batch against a posted payment.
    ///
    /// `existing` holds the documents this payment is already allocated to.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if any line or the aggregate is invalid.
    pub fn plan<F>(
        payment: &PaymentSnapshot,
        requests: &[AllocationRequest],
        existing: &HashSet<Uuid>,
        lookup: F,
    ) -> Result<AllocationPlan, PaymentError>
    where
        F: FnMut(InvoiceKind, Uuid) -> Option<DocumentBalance>,
    {
        PaymentLifecycle::validate_allocate(payment.status, payment.unallocated_amount)?;
        Self::plan_lines(payment, requests, existing, lookup)
    }

    /// Plans allocations without the status check, for payments being created.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if any line or the aggregate is invalid.
    pub fn plan_lines<F>(
        payment: &PaymentSnapshot,
        requests: &[AllocationRequest],
        existing: &HashSet<Uuid>,
        mut lookup: F,
    ) -> Result<AllocationPlan, PaymentError>
    where
        F: FnMut(InvoiceKind, Uuid) -> Option<DocumentBalance>,
    {
        if requests.is_empty() {
            return Err(PaymentError::EmptyAllocation);
        }

        let mut seen: HashSet<Uuid> = HashSet::with_capacity(requests.len());
        let mut allocations = Vec::with_capacity(requests.len());
        let mut total_allocated = Decimal::ZERO;

        for request in requests {
            let amount = round_money(request.amount);
            if amount <= Decimal::ZERO {
                return Err(PaymentError::InvalidAmount(request.amount));
            }
            for extra in [request.discount_amount, request.adjustment_amount] {
                if extra.is_sign_negative() && !extra.is_zero() {
                    return Err(PaymentError::InvalidAmount(extra));
                }
            }
            if existing.contains(&request.document_id) || !seen.insert(request.document_id) {
                return Err(PaymentError::DuplicateAllocation(request.document_id));
            }

            let document = lookup(request.invoice_kind, request.document_id)
                .ok_or(PaymentError::DocumentNotFound(request.document_id))?;
            Self::validate_target(payment, &document)?;

            let balance = document.balance();
            if amount > balance {
                return Err(PaymentError::OverAllocation {
                    requested: amount,
                    available: balance,
                });
            }
            if amount > payment.unallocated_amount {
                return Err(PaymentError::OverAllocation {
                    requested: amount,
                    available: payment.unallocated_amount,
                });
            }

            total_allocated += amount;
            allocations.push(PlannedAllocation {
                request: AllocationRequest {
                    amount,
                    discount_amount: round_money(request.discount_amount),
                    adjustment_amount: round_money(request.adjustment_amount),
                    ..request.clone()
                },
                balance_before: balance,
                state_after: sync_invoice_payment_status(
                    document.total_amount,
                    document.paid_amount,
                    amount,
                ),
            });
        }

        if total_allocated > payment.unallocated_amount {
            return Err(PaymentError::OverAllocation {
                requested: total_allocated,
                available: payment.unallocated_amount,
            });
        }

        Ok(AllocationPlan {
            allocations,
            total_allocated,
            allocated_after: payment.allocated_amount + total_allocated,
            unallocated_after: payment.unallocated_amount - total_allocated,
        })
    }

    /// Re-plans the allocations a DRAFT payment stored at creation against
    /// the documents as they stand when the payment is about to post.
    ///
    /// The stored rows are validated from scratch: the whole payment total
    /// is available to them and they may not duplicate each other.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if any stored allocation no longer fits.
    pub fn replan_stored<F>(
        payment: &PaymentSnapshot,
        stored: &[AllocationRequest],
        lookup: F,
    ) -> Result<AllocationPlan, PaymentError>
    where
        F: FnMut(InvoiceKind, Uuid) -> Option<DocumentBalance>,
    {
        let fresh = PaymentSnapshot {
            allocated_amount: Decimal::ZERO,
            unallocated_amount: payment.total_amount,
            ..*payment
        };
        Self::plan_lines(&fresh, stored, &HashSet::new(), lookup)
    }

    fn validate_target(
        payment: &PaymentSnapshot,
        document: &DocumentBalance,
    ) -> Result<(), PaymentError> {
        if document.invoice_kind.settled_by() != payment.payment_type {
            return Err(PaymentError::DocumentMismatch(document.document_id));
        }
        if let Some(party) = payment.party
            && party != document.party
        {
            return Err(PaymentError::DocumentMismatch(document.document_id));
        }
        if !document.status.is_posted() {
            return Err(DocumentError::InvalidState {
                action: "allocate against",
                status: document.status,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InvoicePaymentStatus;
    use crate::party::PartyType;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct Fixture {
        payment: PaymentSnapshot,
        documents: HashMap<Uuid, DocumentBalance>,
    }

    impl Fixture {
        fn new(unallocated: Decimal) -> Self {
            let party = PartyRef::new(PartyType::Customer, Uuid::new_v4());
            Self {
                payment: PaymentSnapshot {
                    id: Uuid::new_v4(),
                    status: PaymentStatus::Posted,
                    payment_type: PaymentType::Receipt,
                    party: Some(party),
                    total_amount: unallocated,
                    allocated_amount: Decimal::ZERO,
                    unallocated_amount: unallocated,
                },
                documents: HashMap::new(),
            }
        }

        fn invoice(&mut self, total: Decimal, paid: Decimal) -> Uuid {
            let id = Uuid::new_v4();
            self.documents.insert(
                id,
                DocumentBalance {
                    invoice_kind: InvoiceKind::Sales,
                    document_id: id,
                    party: self.payment.party.unwrap(),
                    status: InvoiceStatus::Posted,
                    total_amount: total,
                    paid_amount: paid,
                    reserved_amount: Decimal::ZERO,
                },
            );
            id
        }

        fn plan(&self, requests: &[AllocationRequest]) -> Result<AllocationPlan, PaymentError> {
            AllocationPlanner::plan(&self.payment, requests, &HashSet::new(), |_, id| {
                self.documents.get(&id).copied()
            })
        }
    }

    fn sales(id: Uuid, amount: Decimal) -> AllocationRequest {
        AllocationRequest::new(InvoiceKind::Sales, id, amount)
    }

    #[test]
    fn test_allocate_exact_unallocated() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(0));
        let b = fx.invoice(dec!(1000), dec!(100));

        let plan = fx.plan(&[sales(a, dec!(300)), sales(b, dec!(200))]).unwrap();

        assert_eq!(plan.total_allocated, dec!(500));
        assert_eq!(plan.unallocated_after, dec!(0));
        assert_eq!(plan.allocated_after, dec!(500));
        assert_eq!(
            plan.allocations[0].state_after.payment_status,
            InvoicePaymentStatus::Paid
        );
        assert_eq!(plan.allocations[1].state_after.paid_amount, dec!(300));
        assert_eq!(plan.allocations[1].balance_before, dec!(900));
    }

    #[test]
    fn test_aggregate_over_allocation() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(0));
        let b = fx.invoice(dec!(300), dec!(0));

        let result = fx.plan(&[sales(a, dec!(300)), sales(b, dec!(200.01))]);
        assert!(matches!(
            result,
            Err(PaymentError::OverAllocation { requested, available })
                if requested == dec!(500.01) && available == dec!(500)
        ));
    }

    #[test]
    fn test_line_exceeds_document_balance() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(250));
        assert!(matches!(
            fx.plan(&[sales(a, dec!(60))]),
            Err(PaymentError::OverAllocation { available, .. }) if available == dec!(50)
        ));
    }

    #[test]
    fn test_line_exceeds_unallocated() {
        let mut fx = Fixture::new(dec!(100));
        let a = fx.invoice(dec!(300), dec!(0));
        assert!(matches!(
            fx.plan(&[sales(a, dec!(100.01))]),
            Err(PaymentError::OverAllocation { available, .. }) if available == dec!(100)
        ));
    }

    #[test]
    fn test_reserved_amount_limits_balance() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(118), dec!(0));
        fx.documents.get_mut(&a).unwrap().reserved_amount = dec!(100);

        assert!(matches!(
            fx.plan(&[sales(a, dec!(18.01))]),
            Err(PaymentError::OverAllocation { available, .. }) if available == dec!(18)
        ));
        let plan = fx.plan(&[sales(a, dec!(18))]).unwrap();
        assert_eq!(plan.allocations[0].state_after.paid_amount, dec!(18));
    }

    #[test]
    fn test_replan_stored_ignores_recorded_allocation() {
        let mut fx = Fixture::new(dec!(118));
        fx.payment.status = PaymentStatus::Draft;
        fx.payment.allocated_amount = dec!(118);
        fx.payment.unallocated_amount = Decimal::ZERO;
        let a = fx.invoice(dec!(118), dec!(0));

        let plan = AllocationPlanner::replan_stored(&fx.payment, &[sales(a, dec!(118))], |_, id| {
            fx.documents.get(&id).copied()
        })
        .unwrap();
        assert_eq!(plan.allocated_after, dec!(118));
        assert_eq!(plan.unallocated_after, Decimal::ZERO);
    }

    #[test]
    fn test_replan_stored_rejects_settled_or_cancelled_documents() {
        let mut fx = Fixture::new(dec!(118));
        fx.payment.status = PaymentStatus::Draft;
        let paid = fx.invoice(dec!(118), dec!(100));
        let cancelled = fx.invoice(dec!(118), dec!(0));
        fx.documents.get_mut(&cancelled).unwrap().status = InvoiceStatus::Cancelled;
        let lookup = |_: InvoiceKind, id: Uuid| fx.documents.get(&id).copied();

        assert!(matches!(
            AllocationPlanner::replan_stored(&fx.payment, &[sales(paid, dec!(118))], lookup),
            Err(PaymentError::OverAllocation { available, .. }) if available == dec!(18)
        ));
        assert!(matches!(
            AllocationPlanner::replan_stored(&fx.payment, &[sales(cancelled, dec!(118))], lookup),
            Err(PaymentError::Document(DocumentError::InvalidState { .. }))
        ));
    }

    #[test]
    fn test_duplicate_document_in_batch() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(0));
        assert!(matches!(
            fx.plan(&[sales(a, dec!(100)), sales(a, dec!(100))]),
            Err(PaymentError::DuplicateAllocation(id)) if id == a
        ));
    }

    #[test]
    fn test_duplicate_existing_allocation() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(0));
        let existing = HashSet::from([a]);
        let result = AllocationPlanner::plan(&fx.payment, &[sales(a, dec!(10))], &existing, |_, id| {
            fx.documents.get(&id).copied()
        });
        assert!(matches!(result, Err(PaymentError::DuplicateAllocation(_))));
    }

    #[test]
    fn test_empty_batch_and_bad_amounts() {
        let mut fx = Fixture::new(dec!(500));
        assert!(matches!(fx.plan(&[]), Err(PaymentError::EmptyAllocation)));
        let a = fx.invoice(dec!(300), dec!(0));
        assert!(matches!(
            fx.plan(&[sales(a, dec!(0))]),
            Err(PaymentError::InvalidAmount(_))
        ));
        let mut request = sales(a, dec!(10));
        request.discount_amount = dec!(-1);
        assert!(matches!(fx.plan(&[request]), Err(PaymentError::InvalidAmount(_))));
    }

    #[test]
    fn test_missing_and_mismatched_documents() {
        let mut fx = Fixture::new(dec!(500));
        assert!(matches!(
            fx.plan(&[sales(Uuid::new_v4(), dec!(10))]),
            Err(PaymentError::DocumentNotFound(_))
        ));

        let a = fx.invoice(dec!(300), dec!(0));
        fx.documents.get_mut(&a).unwrap().invoice_kind = InvoiceKind::Purchase;
        assert!(matches!(
            fx.plan(&[sales(a, dec!(10))]),
            Err(PaymentError::DocumentMismatch(_))
        ));

        let b = fx.invoice(dec!(300), dec!(0));
        fx.documents.get_mut(&b).unwrap().party =
            PartyRef::new(PartyType::Customer, Uuid::new_v4());
        assert!(matches!(
            fx.plan(&[sales(b, dec!(10))]),
            Err(PaymentError::DocumentMismatch(_))
        ));

        let c = fx.invoice(dec!(300), dec!(0));
        fx.documents.get_mut(&c).unwrap().status = InvoiceStatus::Draft;
        assert!(matches!(
            fx.plan(&[sales(c, dec!(10))]),
            Err(PaymentError::Document(DocumentError::InvalidState { .. }))
        ));
    }

    #[test]
    fn test_draft_payment_cannot_allocate() {
        let mut fx = Fixture::new(dec!(500));
        let a = fx.invoice(dec!(300), dec!(0));
        fx.payment.status = PaymentStatus::Draft;
        assert!(matches!(
            fx.plan(&[sales(a, dec!(10))]),
            Err(PaymentError::InvalidState { .. })
        ));
        assert!(
            AllocationPlanner::plan_lines(&fx.payment, &[sales(a, dec!(10))], &HashSet::new(), |_, id| {
                fx.documents.get(&id).copied()
            })
            .is_ok()
        );
    }
}
