//! Invoice repository.
//!
//! Sales, purchase and diagnostic test invoices share one table and one
//! lifecycle. Posting hands the GST-split amounts to the posting engine and
//! links the voucher back; cancelling a posted invoice posts its reversal.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use hisaab_core::document::{
    CancelAction, DocumentError, DocumentLifecycle, InvoiceAmounts, InvoiceKind, InvoiceStatus,
    sync_invoice_payment_status,
};
use hisaab_core::ledger::{DocumentReference, LedgerError};
use hisaab_core::party::PartyRef;
use hisaab_core::posting::{BusinessEvent, EventAmounts};
use hisaab_shared::{LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use super::voucher::{PostedVoucher, post_event, reverse};
use super::{document_db, is_unique_violation};
use crate::entities::sea_orm_active_enums::{
    InvoiceKind as DbInvoiceKind, InvoicePaymentStatus, InvoiceStatus as DbInvoiceStatus,
    PartyType as DbPartyType, PaymentStatus as DbPaymentStatus,
};
use crate::entities::{invoices, parties, payment_allocations, payments};
use crate::rls::TenantScope;

/// Header fields of an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    /// Invoice number, unique per tenant and kind.
    pub invoice_number: String,
    /// Customer, supplier or patient id (type follows the invoice kind).
    pub party_id: Uuid,
    /// Invoice date (voucher date on posting).
    pub invoice_date: NaiveDate,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Document currency; base currency when `None`.
    pub currency: Option<String>,
    /// Units of base currency per unit of `currency`.
    pub exchange_rate: Decimal,
    /// Taxable value in base currency.
    pub subtotal: Decimal,
    /// GST rate in percent.
    pub gst_rate: Decimal,
    /// IGST instead of CGST + SGST.
    pub is_interstate: bool,
    /// Flat cess amount.
    pub cess_amount: Decimal,
    /// Narration.
    pub narration: Option<String>,
}

impl InvoiceInput {
    /// Creates an intrastate base-currency invoice input.
    #[must_use]
    pub fn new(
        invoice_number: impl Into<String>,
        party_id: Uuid,
        invoice_date: NaiveDate,
        subtotal: Decimal,
        gst_rate: Decimal,
    ) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            party_id,
            invoice_date,
            due_date: None,
            currency: None,
            exchange_rate: Decimal::ONE,
            subtotal,
            gst_rate,
            is_interstate: false,
            cess_amount: Decimal::ZERO,
            narration: None,
        }
    }

    /// Marks the invoice as interstate (IGST).
    #[must_use]
    pub const fn interstate(mut self) -> Self {
        self.is_interstate = true;
        self
    }

    /// Sets the cess amount.
    #[must_use]
    pub const fn with_cess(mut self, cess_amount: Decimal) -> Self {
        self.cess_amount = cess_amount;
        self
    }
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Creates a DRAFT invoice.
    ///
    /// # Errors
    ///
    /// `Duplicate` for a used number, `InvalidAmount`/`Gst` for bad amounts,
    /// `Ledger(PartyNotFound)` for an unknown party.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        kind: InvoiceKind,
        input: InvoiceInput,
    ) -> Result<invoices::Model, DocumentError> {
        let amounts = compute_amounts(&input)?;
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let txn = scope.txn();

        ensure_party(txn, scope.tenant_id(), kind, input.party_id).await?;
        ensure_unique_number(txn, scope.tenant_id(), kind, &input.invoice_number, None).await?;

        let now = Utc::now().into();
        let invoice = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            invoice_kind: Set(kind.into()),
            invoice_number: Set(input.invoice_number.clone()),
            party_type: Set(kind.party_type().into()),
            party_id: Set(input.party_id),
            invoice_date: Set(input.invoice_date),
            due_date: Set(input.due_date),
            currency: Set(self.currency(&input)),
            exchange_rate: Set(input.exchange_rate),
            gst_rate: Set(input.gst_rate),
            is_interstate: Set(input.is_interstate),
            subtotal: Set(amounts.subtotal),
            cgst_amount: Set(amounts.cgst_amount),
            sgst_amount: Set(amounts.sgst_amount),
            igst_amount: Set(amounts.igst_amount),
            cess_amount: Set(amounts.cess_amount),
            tax_amount: Set(amounts.tax_amount),
            total_amount: Set(amounts.total_amount),
            paid_amount: Set(Decimal::ZERO),
            balance_amount: Set(amounts.total_amount),
            notes_total: Set(Decimal::ZERO),
            status: Set(DbInvoiceStatus::Draft),
            payment_status: Set(InvoicePaymentStatus::Unpaid),
            voucher_id: Set(None),
            narration: Set(input.narration),
            is_deleted: Set(false),
            created_by: Set(scope.actor_id()),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| duplicate_or_db(err, &input.invoice_number))?;

        scope.commit().await.map_err(document_db)?;
        Ok(invoice)
    }

    /// Replaces the header and amounts of a DRAFT invoice.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the invoice is DRAFT, plus the errors of [`Self::create`].
    pub async fn update(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
        input: InvoiceInput,
    ) -> Result<invoices::Model, DocumentError> {
        let amounts = compute_amounts(&input)?;
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let txn = scope.txn();

        let invoice = lock_invoice(txn, scope.tenant_id(), invoice_id).await?;
        DocumentLifecycle::validate_update(invoice.status.into())?;

        let kind: InvoiceKind = invoice.invoice_kind.into();
        if input.party_id != invoice.party_id {
            ensure_party(txn, scope.tenant_id(), kind, input.party_id).await?;
        }
        if input.invoice_number != invoice.invoice_number {
            ensure_unique_number(txn, scope.tenant_id(), kind, &input.invoice_number, Some(invoice.id))
                .await?;
        }

        let currency = self.currency(&input);
        let mut active: invoices::ActiveModel = invoice.into();
        active.invoice_number = Set(input.invoice_number.clone());
        active.party_id = Set(input.party_id);
        active.invoice_date = Set(input.invoice_date);
        active.due_date = Set(input.due_date);
        active.currency = Set(currency);
        active.exchange_rate = Set(input.exchange_rate);
        active.gst_rate = Set(input.gst_rate);
        active.is_interstate = Set(input.is_interstate);
        active.subtotal = Set(amounts.subtotal);
        active.cgst_amount = Set(amounts.cgst_amount);
        active.sgst_amount = Set(amounts.sgst_amount);
        active.igst_amount = Set(amounts.igst_amount);
        active.cess_amount = Set(amounts.cess_amount);
        active.tax_amount = Set(amounts.tax_amount);
        active.total_amount = Set(amounts.total_amount);
        active.balance_amount = Set(amounts.total_amount);
        active.narration = Set(input.narration);
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let updated = active
            .update(txn)
            .await
            .map_err(|err| duplicate_or_db(err, &input.invoice_number))?;

        scope.commit().await.map_err(document_db)?;
        Ok(updated)
    }

    /// Posts a DRAFT invoice and links its voucher.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless DRAFT, or any posting error.
    pub async fn post(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
    ) -> Result<(invoices::Model, PostedVoucher), DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let txn = scope.txn();

        let invoice = lock_invoice(txn, scope.tenant_id(), invoice_id).await?;
        DocumentLifecycle::validate_post(invoice.status.into())?;

        let kind: InvoiceKind = invoice.invoice_kind.into();
        let mut event = BusinessEvent::new(
            kind.event_kind(),
            invoice.invoice_date,
            DocumentReference::new(kind.as_str(), invoice.id, invoice.invoice_number.as_str()),
            &self.settings.base_currency,
            EventAmounts {
                total: invoice.total_amount,
                subtotal: invoice.subtotal,
                cgst: invoice.cgst_amount,
                sgst: invoice.sgst_amount,
                igst: invoice.igst_amount,
                cess: invoice.cess_amount,
                ..EventAmounts::default()
            },
        )
        .with_party(PartyRef::new(invoice.party_type.into(), invoice.party_id))
        .with_currency(&invoice.currency, invoice.exchange_rate);
        event.narration.clone_from(&invoice.narration);

        let posted = post_event(&scope, &self.settings, &event).await?;

        let mut active: invoices::ActiveModel = invoice.into();
        active.status = Set(DbInvoiceStatus::Posted);
        active.voucher_id = Set(Some(posted.voucher.id));
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(txn).await.map_err(document_db)?;

        scope.commit().await.map_err(document_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_number = %updated.invoice_number,
            voucher_number = %posted.voucher.voucher_number,
            total = %updated.total_amount,
            "Invoice posted"
        );
        Ok((updated, posted))
    }

    /// Cancels an invoice.
    ///
    /// A DRAFT invoice is simply marked cancelled; an unpaid POSTED invoice
    /// gets a reversal voucher dated `cancel_date`.
    ///
    /// # Errors
    ///
    /// `HasPayments` if anything was paid, `PendingPayments` while DRAFT
    /// payments are allocated to it, `InvalidState` if already cancelled.
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
        cancel_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<(invoices::Model, Option<PostedVoucher>), DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let txn = scope.txn();

        let invoice = lock_invoice(txn, scope.tenant_id(), invoice_id).await?;
        let pending = pending_allocations(txn, scope.tenant_id(), &[invoice.id], None)
            .await
            .map_err(document_db)?
            .remove(&invoice.id)
            .unwrap_or_default();
        let action =
            DocumentLifecycle::validate_cancel(invoice.status.into(), invoice.paid_amount, pending)?;

        let reversal = match (action, invoice.voucher_id) {
            (CancelAction::ReverseVoucher, Some(voucher_id)) => {
                Some(reverse(&scope, &self.settings, voucher_id, cancel_date, reason).await?)
            }
            (CancelAction::ReverseVoucher, None) => {
                return Err(DocumentError::Ledger(LedgerError::VoucherNotFound(invoice.id)));
            }
            (CancelAction::Discard, _) => None,
        };

        let mut active: invoices::ActiveModel = invoice.into();
        active.status = Set(DbInvoiceStatus::Cancelled);
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(txn).await.map_err(document_db)?;

        scope.commit().await.map_err(document_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            invoice_number = %updated.invoice_number,
            reversed = reversal.is_some(),
            "Invoice cancelled"
        );
        Ok((updated, reversal))
    }

    /// Applies `paid_delta` to an invoice and recomputes its payment status.
    ///
    /// A zero delta leaves the invoice as it is.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` if the invoice does not exist for the tenant.
    pub async fn sync_payment_status(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
        paid_delta: Decimal,
    ) -> Result<invoices::Model, DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let updated = apply_paid_delta(scope.txn(), scope.tenant_id(), invoice_id, paid_delta).await?;
        scope.commit().await.map_err(document_db)?;
        Ok(updated)
    }

    /// Loads an invoice.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` if missing or deleted.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
    ) -> Result<invoices::Model, DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let invoice = invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::TenantId.eq(scope.tenant_id()))
            .filter(invoices::Column::IsDeleted.eq(false))
            .one(scope.txn())
            .await
            .map_err(document_db)?
            .ok_or(DocumentError::InvoiceNotFound(invoice_id))?;
        scope.commit().await.map_err(document_db)?;
        Ok(invoice)
    }

    fn currency(&self, input: &InvoiceInput) -> String {
        input
            .currency
            .as_deref()
            .unwrap_or(&self.settings.base_currency)
            .to_uppercase()
    }
}

/// Locks an invoice row `FOR UPDATE`.
pub(crate) async fn lock_invoice(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    invoice_id: Uuid,
) -> Result<invoices::Model, DocumentError> {
    invoices::Entity::find_by_id(invoice_id)
        .filter(invoices::Column::TenantId.eq(tenant_id))
        .filter(invoices::Column::IsDeleted.eq(false))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(document_db)?
        .ok_or(DocumentError::InvoiceNotFound(invoice_id))
}

/// The status synchronizer's write side: applies `paid_delta` to the locked
/// invoice and stores the recomputed paid, balance and statuses.
///
/// A positive delta must land on a posted invoice and fit its balance.
pub(crate) async fn apply_paid_delta(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    invoice_id: Uuid,
    paid_delta: Decimal,
) -> Result<invoices::Model, DocumentError> {
    let invoice = lock_invoice(txn, tenant_id, invoice_id).await?;
    if paid_delta.is_zero() {
        return Ok(invoice);
    }
    DocumentLifecycle::validate_payment(
        invoice.status.into(),
        invoice.total_amount,
        invoice.paid_amount,
        paid_delta,
    )?;

    let state = sync_invoice_payment_status(invoice.total_amount, invoice.paid_amount, paid_delta);
    let status = InvoiceStatus::from(invoice.status).after_payment(state.payment_status);

    let mut active: invoices::ActiveModel = invoice.into();
    active.paid_amount = Set(state.paid_amount);
    active.balance_amount = Set(state.balance_amount);
    active.payment_status = Set(state.payment_status.into());
    active.status = Set(status.into());
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await.map_err(document_db)
}

/// Sums, per document, what DRAFT payments have allocated while they wait
/// for gateway confirmation. `exclude_payment` leaves one payment out.
pub(crate) async fn pending_allocations(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    document_ids: &[Uuid],
    exclude_payment: Option<Uuid>,
) -> Result<HashMap<Uuid, Decimal>, DbErr> {
    if document_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query = payment_allocations::Entity::find()
        .inner_join(payments::Entity)
        .filter(payment_allocations::Column::TenantId.eq(tenant_id))
        .filter(payment_allocations::Column::DocumentId.is_in(document_ids.iter().copied()))
        .filter(payments::Column::Status.eq(DbPaymentStatus::Draft))
        .filter(payments::Column::IsDeleted.eq(false));
    if let Some(payment_id) = exclude_payment {
        query = query.filter(payment_allocations::Column::PaymentId.ne(payment_id));
    }

    let mut pending: HashMap<Uuid, Decimal> = HashMap::new();
    for row in query.all(txn).await? {
        *pending.entry(row.document_id).or_default() += row.allocated_amount_base;
    }
    Ok(pending)
}

fn compute_amounts(input: &InvoiceInput) -> Result<InvoiceAmounts, DocumentError> {
    if input.exchange_rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidExchangeRate.into());
    }
    InvoiceAmounts::compute(
        input.subtotal,
        input.gst_rate,
        input.is_interstate,
        input.cess_amount,
    )
}

async fn ensure_party(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    kind: InvoiceKind,
    party_id: Uuid,
) -> Result<(), DocumentError> {
    let party = parties::Entity::find_by_id(party_id)
        .filter(parties::Column::TenantId.eq(tenant_id))
        .filter(parties::Column::IsDeleted.eq(false))
        .one(txn)
        .await
        .map_err(document_db)?
        .ok_or(LedgerError::PartyNotFound(party_id))?;

    if party.party_type != DbPartyType::from(kind.party_type()) {
        return Err(DocumentError::PartyMismatch(kind));
    }
    if !party.is_active {
        return Err(LedgerError::PartyNotFound(party_id).into());
    }
    Ok(())
}

async fn ensure_unique_number(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    kind: InvoiceKind,
    invoice_number: &str,
    exclude: Option<Uuid>,
) -> Result<(), DocumentError> {
    let mut query = invoices::Entity::find()
        .filter(invoices::Column::TenantId.eq(tenant_id))
        .filter(invoices::Column::InvoiceKind.eq(DbInvoiceKind::from(kind)))
        .filter(invoices::Column::InvoiceNumber.eq(invoice_number));
    if let Some(id) = exclude {
        query = query.filter(invoices::Column::Id.ne(id));
    }
    let taken = query.one(txn).await.map_err(document_db)?;
    if taken.is_some() {
        return Err(DocumentError::Duplicate(invoice_number.to_string()));
    }
    Ok(())
}

fn duplicate_or_db(err: sea_orm::DbErr, number: &str) -> DocumentError {
    if is_unique_violation(&err) {
        DocumentError::Duplicate(number.to_string())
    } else {
        document_db(err)
    }
}
