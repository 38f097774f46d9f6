//! Property-based tests for allocation planning.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::allocation::{AllocationPlanner, AllocationRequest, DocumentBalance, PaymentSnapshot};
use super::error::PaymentError;
use super::types::{PaymentStatus, PaymentType};
use crate::document::{InvoiceKind, InvoiceStatus};
use crate::party::{PartyRef, PartyType};

fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2))
}

fn setup(
    unallocated: Decimal,
    balances: &[Decimal],
) -> (PaymentSnapshot, HashMap<Uuid, DocumentBalance>) {
    let party = PartyRef::new(PartyType::Patient, Uuid::new_v4());
    let payment = PaymentSnapshot {
        id: Uuid::new_v4(),
        status: PaymentStatus::Posted,
        payment_type: PaymentType::Receipt,
        party: Some(party),
        total_amount: unallocated,
        allocated_amount: Decimal::ZERO,
        unallocated_amount: unallocated,
    };
    let documents = balances
        .iter()
        .map(|balance| {
            let id = Uuid::new_v4();
            (
                id,
                DocumentBalance {
                    invoice_kind: InvoiceKind::Test,
                    document_id: id,
                    party,
                    status: InvoiceStatus::Posted,
                    total_amount: *balance,
                    paid_amount: Decimal::ZERO,
                    reserved_amount: Decimal::ZERO,
                },
            )
        })
        .collect();
    (payment, documents)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Allocating exactly the remaining unallocated amount succeeds and
    /// leaves nothing unallocated; one cent more is rejected.
    #[test]
    fn prop_allocation_boundary(unallocated in cents()) {
        let (payment, documents) = setup(unallocated, &[unallocated + Decimal::ONE]);
        let id = *documents.keys().next().unwrap();
        let lookup = |_: InvoiceKind, doc: Uuid| documents.get(&doc).copied();

        let exact = [AllocationRequest::new(InvoiceKind::Test, id, unallocated)];
        let plan = AllocationPlanner::plan(&payment, &exact, &HashSet::new(), lookup).unwrap();
        prop_assert_eq!(plan.unallocated_after, Decimal::ZERO);
        prop_assert_eq!(plan.allocated_after, payment.total_amount);

        let over = [AllocationRequest::new(
            InvoiceKind::Test,
            id,
            unallocated + Decimal::new(1, 2),
        )];
        let result = AllocationPlanner::plan(&payment, &over, &HashSet::new(), lookup);
        let is_over = matches!(result, Err(PaymentError::OverAllocation { .. }));
        prop_assert!(is_over);
    }

    /// Any accepted plan keeps allocated + unallocated equal to the total.
    #[test]
    fn prop_plan_preserves_payment_total(
        unallocated in cents(),
        amounts in prop::collection::vec(cents(), 1..6),
    ) {
        let (payment, documents) = setup(unallocated, &amounts);
        let requests: Vec<AllocationRequest> = documents
            .values()
            .map(|doc| AllocationRequest::new(InvoiceKind::Test, doc.document_id, doc.total_amount))
            .collect();
        let lookup = |_: InvoiceKind, doc: Uuid| documents.get(&doc).copied();

        match AllocationPlanner::plan(&payment, &requests, &HashSet::new(), lookup) {
            Ok(plan) => {
                prop_assert!(plan.total_allocated <= unallocated);
                prop_assert_eq!(plan.allocated_after + plan.unallocated_after, payment.total_amount);
            }
            Err(err) => {
                let total: Decimal = amounts.iter().copied().sum();
                prop_assert!(total > unallocated);
                let is_over = matches!(err, PaymentError::OverAllocation { .. });
                prop_assert!(is_over);
            }
        }
    }
}
