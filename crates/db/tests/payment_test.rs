//! Payment lifecycle integration tests.
//!
//! Covers allocation limits, gateway confirmation, advances, TDS, reconciliation,
//! cancellation and reversal with refund. Skipped when no database is configured.

#![allow(clippy::uninlined_format_args)]

mod common;

use hisaab_core::document::{DocumentError, InvoiceKind};
use hisaab_core::ledger::AccountRole;
use hisaab_core::party::{PartyRef, PartyType};
use hisaab_core::payment::{AllocationRequest, PaymentError, PaymentMode, PaymentType};
use hisaab_db::entities::sea_orm_active_enums::{
    InvoicePaymentStatus, InvoiceStatus, PaymentStatus,
};
use hisaab_db::repositories::{CreatePaymentInput, GatewayConfirmation, PaymentDetailInput};
use hisaab_db::{InvoiceRepository, PartyAccountRepository, PaymentRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{bootstrapped, date, party, posted_sales_invoice, settings};

fn cash_receipt(number: &str, customer: Uuid, amount: Decimal) -> CreatePaymentInput {
    CreatePaymentInput::new(
        number,
        PaymentType::Receipt,
        date(2026, 4, 15),
        Some(PartyRef::new(PartyType::Customer, customer)),
        vec![PaymentDetailInput::new(PaymentMode::Cash, amount)],
    )
}

fn upi_receipt(number: &str, customer: Uuid, amount: Decimal) -> CreatePaymentInput {
    CreatePaymentInput::new(
        number,
        PaymentType::Receipt,
        date(2026, 4, 15),
        Some(PartyRef::new(PartyType::Customer, customer)),
        vec![PaymentDetailInput::new(PaymentMode::Upi, amount)],
    )
}

fn gateway(status: &str) -> GatewayConfirmation {
    GatewayConfirmation {
        gateway_transaction_id: Some(format!("txn_{}", status.to_lowercase())),
        gateway_status: status.to_string(),
        gateway_fee: None,
    }
}

fn against(invoice_id: Uuid, amount: Decimal) -> Vec<AllocationRequest> {
    vec![AllocationRequest::new(InvoiceKind::Sales, invoice_id, amount)]
}

#[tokio::test]
async fn test_allocation_exact_balance_pays_invoice() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, setup) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-100", dec!(1000)).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let over = payments
        .create_invoice_payment(
            &ctx,
            cash_receipt("RCPT-1", customer, dec!(1180.01)),
            &against(invoice.id, dec!(1180.01)),
        )
        .await;
    assert!(matches!(over, Err(PaymentError::OverAllocation { .. })));

    let created = payments
        .create_invoice_payment(
            &ctx,
            cash_receipt("RCPT-1", customer, dec!(1180.00)),
            &against(invoice.id, dec!(1180.00)),
        )
        .await
        .unwrap();
    assert_eq!(created.payment.status, PaymentStatus::Posted);
    assert_eq!(created.payment.allocated_amount_base, dec!(1180.00));
    assert_eq!(created.payment.unallocated_amount_base, Decimal::ZERO);
    let voucher = created.voucher.expect("cash receipt is posted");
    assert!(voucher.voucher.voucher_number.starts_with("RV"));

    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.paid_amount, dec!(1180.00));
    assert_eq!(invoice.balance_amount, Decimal::ZERO);
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Paid);
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    let cash = common::account(&db, setup.account(AccountRole::Cash).unwrap()).await;
    assert_eq!(cash.current_balance, dec!(1180.00));
    let receivable = PartyAccountRepository::new(db.clone())
        .get_or_create(&ctx, PartyType::Customer, customer)
        .await
        .unwrap();
    assert_eq!(common::account(&db, receivable).await.current_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_partial_payment_marks_partially_paid() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-101", dec!(1000)).await;

    PaymentRepository::new(db.clone(), settings())
        .create_invoice_payment(
            &ctx,
            cash_receipt("RCPT-2", customer, dec!(500)),
            &against(invoice.id, dec!(500)),
        )
        .await
        .unwrap();

    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.balance_amount, dec!(680.00));
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Partial);
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
}

#[tokio::test]
async fn test_payment_number_unique_per_tenant() {
    let Some(db) = common::connect().await else {
        return;
    };
    let payments = PaymentRepository::new(db.clone(), settings());

    let (first, _) = bootstrapped(&db).await;
    let (second, _) = bootstrapped(&db).await;
    let first_customer = party(&db, &first, PartyType::Customer).await;
    let second_customer = party(&db, &second, PartyType::Customer).await;

    payments
        .create(&first, cash_receipt("PAY-001", first_customer, dec!(10)))
        .await
        .unwrap();
    payments
        .create(&second, cash_receipt("PAY-001", second_customer, dec!(10)))
        .await
        .unwrap();

    let duplicate = payments
        .create(&first, cash_receipt("PAY-001", first_customer, dec!(20)))
        .await;
    assert!(matches!(duplicate, Err(PaymentError::Duplicate(n)) if n == "PAY-001"));
}

#[tokio::test]
async fn test_gateway_payment_posts_on_success_only() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-102", dec!(100)).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let input = CreatePaymentInput::new(
        "UPI-1",
        PaymentType::Receipt,
        date(2026, 4, 15),
        Some(PartyRef::new(PartyType::Customer, customer)),
        vec![PaymentDetailInput::new(PaymentMode::Upi, dec!(118))],
    );
    let created = payments
        .create_invoice_payment(&ctx, input, &against(invoice.id, dec!(118)))
        .await
        .unwrap();
    assert_eq!(created.payment.status, PaymentStatus::Draft);
    assert!(created.voucher.is_none());

    let pending = payments
        .confirm_gateway_payment(
            &ctx,
            created.payment.id,
            GatewayConfirmation {
                gateway_transaction_id: Some("txn_1".to_string()),
                gateway_status: "PENDING".to_string(),
                gateway_fee: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.payment.status, PaymentStatus::Draft);
    assert!(pending.voucher.is_none());

    let confirmed = payments
        .confirm_gateway_payment(
            &ctx,
            created.payment.id,
            GatewayConfirmation {
                gateway_transaction_id: Some("txn_1".to_string()),
                gateway_status: "success".to_string(),
                gateway_fee: Some(dec!(2.36)),
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.payment.status, PaymentStatus::Posted);
    assert!(confirmed.voucher.is_some());
    assert_eq!(confirmed.details[0].gateway_status.as_deref(), Some("SUCCESS"));

    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn test_tds_receipt_settles_invoice_gross() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, setup) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-103", dec!(1000)).await;

    let created = PaymentRepository::new(db.clone(), settings())
        .create_invoice_payment(
            &ctx,
            cash_receipt("RCPT-TDS", customer, dec!(1080)).with_tds(dec!(100)),
            &against(invoice.id, dec!(1180)),
        )
        .await
        .unwrap();
    assert_eq!(created.payment.total_amount_base, dec!(1180.00));
    assert_eq!(created.payment.tds_amount_base, dec!(100.00));

    let tds = common::account(&db, setup.account(AccountRole::TdsReceivable).unwrap()).await;
    assert_eq!(tds.current_balance, dec!(100.00));
    let cash = common::account(&db, setup.account(AccountRole::Cash).unwrap()).await;
    assert_eq!(cash.current_balance, dec!(1080.00));
}

#[tokio::test]
async fn test_advance_applied_to_invoice() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, setup) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let advance = payments
        .create_advance_payment(&ctx, cash_receipt("ADV-1", customer, dec!(500)))
        .await
        .unwrap();
    assert!(advance.payment.is_advance);
    assert_eq!(advance.payment.advance_amount_base, dec!(500.00));
    let customer_advance = setup.account(AccountRole::CustomerAdvance).unwrap();
    assert_eq!(
        common::account(&db, customer_advance).await.current_balance,
        dec!(500.00)
    );

    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-104", dec!(250)).await;
    let applied = payments
        .allocate(
            &ctx,
            advance.payment.id,
            &against(invoice.id, dec!(295)),
            date(2026, 4, 20),
        )
        .await
        .unwrap();
    assert_eq!(applied.payment.allocated_amount_base, dec!(295.00));
    assert_eq!(applied.payment.unallocated_amount_base, dec!(205.00));
    assert!(applied.voucher.is_some());
    assert_eq!(
        common::account(&db, customer_advance).await.current_balance,
        dec!(205.00)
    );

    let again = payments
        .allocate(
            &ctx,
            advance.payment.id,
            &against(invoice.id, dec!(1)),
            date(2026, 4, 21),
        )
        .await;
    assert!(matches!(again, Err(PaymentError::DuplicateAllocation(_))));
}

#[tokio::test]
async fn test_advance_requires_party_and_no_tds() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let with_tds = payments
        .create_advance_payment(&ctx, cash_receipt("ADV-2", customer, dec!(100)).with_tds(dec!(5)))
        .await;
    assert!(with_tds.is_err());

    let mut no_party = cash_receipt("ADV-3", customer, dec!(100));
    no_party.party = None;
    assert!(payments.create_advance_payment(&ctx, no_party).await.is_err());
}

#[tokio::test]
async fn test_reconciled_payment_is_terminal() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let payments = PaymentRepository::new(db.clone(), settings());
    let advance = payments
        .create_advance_payment(&ctx, cash_receipt("ADV-4", customer, dec!(100)))
        .await
        .unwrap();

    let reconciled = payments.reconcile(&ctx, advance.payment.id).await.unwrap();
    assert_eq!(reconciled.status, PaymentStatus::Reconciled);
    assert!(reconciled.is_reconciled);
    assert!(reconciled.reconciled_at.is_some());

    let twice = payments.reconcile(&ctx, advance.payment.id).await;
    assert!(matches!(twice, Err(PaymentError::AlreadyReconciled(_))));

    let cancel = payments
        .cancel(&ctx, advance.payment.id, date(2026, 4, 30), None)
        .await;
    assert!(matches!(cancel, Err(PaymentError::InvalidState { .. })));

    let delete = payments.delete(&ctx, advance.payment.id).await;
    assert!(delete.is_err());
}

#[tokio::test]
async fn test_reverse_payment_creates_refund_and_reopens_invoice() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, setup) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-105", dec!(1000)).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let created = payments
        .create_invoice_payment(
            &ctx,
            cash_receipt("RCPT-R", customer, dec!(1180)),
            &against(invoice.id, dec!(1180)),
        )
        .await
        .unwrap();

    let reversal = payments
        .reverse(&ctx, created.payment.id, date(2026, 4, 25), Some("bounced"))
        .await
        .unwrap();
    assert_eq!(reversal.refund.payment_number, "RCPT-R-REF");
    assert!(reversal.refund.is_refund);
    assert_eq!(reversal.refund.original_payment_id, Some(created.payment.id));
    assert_eq!(reversal.original.refund_payment_id, Some(reversal.refund.id));
    assert_eq!(reversal.vouchers.len(), 1);

    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.paid_amount, Decimal::ZERO);
    assert_eq!(invoice.balance_amount, dec!(1180.00));
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Unpaid);
    assert_eq!(invoice.status, InvoiceStatus::Posted);

    let cash = common::account(&db, setup.account(AccountRole::Cash).unwrap()).await;
    assert_eq!(cash.current_balance, Decimal::ZERO);
    common::assert_ledger_consistent(&db, cash.id).await;

    let again = payments
        .reverse(&ctx, created.payment.id, date(2026, 4, 26), None)
        .await;
    assert!(matches!(again, Err(PaymentError::AlreadyReversed(_))));

    let refund_again = payments
        .reverse(&ctx, reversal.refund.id, date(2026, 4, 26), None)
        .await;
    assert!(matches!(refund_again, Err(PaymentError::RefundNotReversible(_))));
}

#[tokio::test]
async fn test_cancel_draft_and_posted_payments() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, setup) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let draft = payments
        .create(&ctx, cash_receipt("DRAFT-1", customer, dec!(40)))
        .await
        .unwrap();
    let (cancelled, vouchers) = payments
        .cancel(&ctx, draft.payment.id, date(2026, 4, 16), None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);
    assert!(vouchers.is_empty());

    let posted = payments
        .create_advance_payment(&ctx, cash_receipt("ADV-5", customer, dec!(60)))
        .await
        .unwrap();
    let (cancelled, vouchers) = payments
        .cancel(&ctx, posted.payment.id, date(2026, 4, 16), Some("duplicate entry"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);
    assert_eq!(vouchers.len(), 1);
    let cash = common::account(&db, setup.account(AccountRole::Cash).unwrap()).await;
    assert_eq!(cash.current_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_update_only_while_draft() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let draft = payments
        .create(&ctx, cash_receipt("DRAFT-2", customer, dec!(40)))
        .await
        .unwrap();
    let updated = payments
        .update(&ctx, draft.payment.id, cash_receipt("DRAFT-2", customer, dec!(45)))
        .await
        .unwrap();
    assert_eq!(updated.payment.total_amount_base, dec!(45.00));
    assert_eq!(updated.details.len(), 1);

    let posted = payments
        .create_advance_payment(&ctx, cash_receipt("ADV-6", customer, dec!(10)))
        .await
        .unwrap();
    let result = payments
        .update(&ctx, posted.payment.id, cash_receipt("ADV-6", customer, dec!(11)))
        .await;
    assert!(matches!(result, Err(PaymentError::InvalidState { .. })));
}

#[tokio::test]
async fn test_draft_allocations_hold_invoice_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-106", dec!(100)).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let first = payments
        .create_invoice_payment(&ctx, upi_receipt("UPI-A", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await
        .unwrap();
    assert_eq!(first.payment.status, PaymentStatus::Draft);

    let second = payments
        .create_invoice_payment(&ctx, upi_receipt("UPI-B", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await;
    assert!(matches!(
        second,
        Err(PaymentError::OverAllocation { available, .. }) if available == Decimal::ZERO
    ));
    let cash = payments
        .create_invoice_payment(&ctx, cash_receipt("RCPT-H", customer, dec!(1)), &against(invoice.id, dec!(1)))
        .await;
    assert!(matches!(cash, Err(PaymentError::OverAllocation { .. })));

    payments
        .confirm_gateway_payment(&ctx, first.payment.id, gateway("SUCCESS"))
        .await
        .unwrap();
    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.paid_amount, dec!(118.00));
    assert_eq!(invoice.balance_amount, Decimal::ZERO);
    assert_eq!(invoice.payment_status, InvoicePaymentStatus::Paid);
}

#[tokio::test]
async fn test_confirmation_rechecks_stored_allocations() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-107", dec!(100)).await;
    let invoices = InvoiceRepository::new(db.clone(), settings());
    let payments = PaymentRepository::new(db.clone(), settings());

    let draft = payments
        .create_invoice_payment(&ctx, upi_receipt("UPI-C", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await
        .unwrap();

    let overpaid = invoices.sync_payment_status(&ctx, invoice.id, dec!(118.01)).await;
    assert!(matches!(
        overpaid,
        Err(DocumentError::Overpayment { available, .. }) if available == dec!(118.00)
    ));
    invoices
        .sync_payment_status(&ctx, invoice.id, dec!(100))
        .await
        .unwrap();

    let confirmed = payments
        .confirm_gateway_payment(&ctx, draft.payment.id, gateway("SUCCESS"))
        .await;
    assert!(matches!(
        confirmed,
        Err(PaymentError::OverAllocation { available, .. }) if available == dec!(18.00)
    ));

    let payment = payments.get(&ctx, draft.payment.id).await.unwrap();
    assert_eq!(payment.payment.status, PaymentStatus::Draft);
    assert!(payment.voucher.is_none());
    let invoice = invoices.get(&ctx, invoice.id).await.unwrap();
    assert_eq!(invoice.paid_amount, dec!(100.00));
    assert!(invoice.paid_amount <= invoice.total_amount);
}

#[tokio::test]
async fn test_invoice_cancel_blocked_by_draft_payment() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-108", dec!(100)).await;
    let invoices = InvoiceRepository::new(db.clone(), settings());
    let payments = PaymentRepository::new(db.clone(), settings());

    let draft = payments
        .create_invoice_payment(&ctx, upi_receipt("UPI-D", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await
        .unwrap();

    let blocked = invoices.cancel(&ctx, invoice.id, date(2026, 4, 20), None).await;
    assert!(matches!(
        blocked,
        Err(DocumentError::PendingPayments(pending)) if pending == dec!(118.00)
    ));

    payments
        .cancel(&ctx, draft.payment.id, date(2026, 4, 20), None)
        .await
        .unwrap();
    let (cancelled, reversal) = invoices
        .cancel(&ctx, invoice.id, date(2026, 4, 20), None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert!(reversal.is_some());

    let confirmed = payments
        .confirm_gateway_payment(&ctx, draft.payment.id, gateway("SUCCESS"))
        .await;
    assert!(matches!(confirmed, Err(PaymentError::InvalidState { .. })));

    let late = invoices.sync_payment_status(&ctx, invoice.id, dec!(1)).await;
    assert!(matches!(late, Err(DocumentError::InvalidState { .. })));
    let invoice = invoices.get(&ctx, invoice.id).await.unwrap();
    assert_eq!(invoice.paid_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_reconciling_draft_drops_its_allocations() {
    let Some(db) = common::connect().await else {
        return;
    };
    let (ctx, _) = bootstrapped(&db).await;
    let customer = party(&db, &ctx, PartyType::Customer).await;
    let invoice = posted_sales_invoice(&db, &ctx, customer, "SI-109", dec!(100)).await;
    let payments = PaymentRepository::new(db.clone(), settings());

    let draft = payments
        .create_invoice_payment(&ctx, upi_receipt("UPI-E", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await
        .unwrap();
    let reconciled = payments.reconcile(&ctx, draft.payment.id).await.unwrap();
    assert_eq!(reconciled.status, PaymentStatus::Reconciled);
    assert_eq!(reconciled.allocated_amount_base, Decimal::ZERO);
    assert_eq!(reconciled.unallocated_amount_base, dec!(118.00));
    assert!(payments.get(&ctx, draft.payment.id).await.unwrap().allocations.is_empty());

    payments
        .create_invoice_payment(&ctx, cash_receipt("RCPT-F", customer, dec!(118)), &against(invoice.id, dec!(118)))
        .await
        .unwrap();
    let invoice = InvoiceRepository::new(db.clone(), settings())
        .get(&ctx, invoice.id)
        .await
        .unwrap();
    assert_eq!(invoice.paid_amount, dec!(118.00));
}
