//! Credit and debit note repository.
//!
//! A note is issued against a posted invoice and posted immediately. It
//! takes the invoice's GST rate, place of supply and party.

use chrono::{NaiveDate, Utc};
use hisaab_core::document::{DocumentError, DocumentLifecycle, InvoiceAmounts, NoteType};
use hisaab_core::ledger::DocumentReference;
use hisaab_core::party::PartyRef;
use hisaab_core::posting::{BusinessEvent, EventAmounts};
use hisaab_shared::{LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use super::invoice::lock_invoice;
use super::voucher::{PostedVoucher, post_event};
use super::{document_db, is_unique_violation};
use crate::entities::{invoices, notes};
use crate::rls::TenantScope;

/// Input for a credit or debit note.
#[derive(Debug, Clone)]
pub struct NoteInput {
    /// Credit (sales return) or debit (purchase return).
    pub note_type: NoteType,
    /// Note number, unique per tenant.
    pub note_number: String,
    /// Invoice the note adjusts.
    pub invoice_id: Uuid,
    /// Note date (voucher date).
    pub note_date: NaiveDate,
    /// Taxable value returned.
    pub subtotal: Decimal,
    /// Flat cess returned.
    pub cess_amount: Decimal,
    /// Reason for the return.
    pub reason: Option<String>,
}

impl NoteInput {
    /// Creates a note input without cess or reason.
    #[must_use]
    pub fn new(
        note_type: NoteType,
        note_number: impl Into<String>,
        invoice_id: Uuid,
        note_date: NaiveDate,
        subtotal: Decimal,
    ) -> Self {
        Self {
            note_type,
            note_number: note_number.into(),
            invoice_id,
            note_date,
            subtotal,
            cess_amount: Decimal::ZERO,
            reason: None,
        }
    }

    /// Sets the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A stored note with its voucher.
#[derive(Debug, Clone)]
pub struct PostedNote {
    /// Note row.
    pub note: notes::Model,
    /// Voucher posted for it.
    pub voucher: PostedVoucher,
}

/// Note repository.
#[derive(Debug, Clone)]
pub struct NoteRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl NoteRepository {
    /// Creates a new note repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Issues and posts a note against an invoice.
    ///
    /// # Errors
    ///
    /// - `WrongInvoiceKind` unless a credit note targets a sales invoice or a
    ///   debit note a purchase invoice. Test invoices take no notes.
    /// - `InvalidState` unless the invoice is posted
    /// - `NoteExceedsInvoice` if all notes together would exceed the invoice total
    /// - `Duplicate` for a used note number
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: NoteInput,
    ) -> Result<PostedNote, DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let txn = scope.txn();

        let invoice = lock_invoice(txn, scope.tenant_id(), input.invoice_id).await?;
        let amounts = InvoiceAmounts::compute(
            input.subtotal,
            invoice.gst_rate,
            invoice.is_interstate,
            input.cess_amount,
        )?;
        DocumentLifecycle::validate_note(
            input.note_type,
            invoice.invoice_kind.into(),
            invoice.status.into(),
            invoice.total_amount,
            invoice.notes_total,
            amounts.total_amount,
        )?;

        let taken = notes::Entity::find()
            .filter(notes::Column::TenantId.eq(scope.tenant_id()))
            .filter(notes::Column::NoteNumber.eq(input.note_number.as_str()))
            .one(txn)
            .await
            .map_err(document_db)?;
        if taken.is_some() {
            return Err(DocumentError::Duplicate(input.note_number));
        }

        let note_id = Uuid::new_v4();
        let mut event = BusinessEvent::new(
            input.note_type.event_kind(),
            input.note_date,
            DocumentReference::new(input.note_type.as_str(), note_id, input.note_number.as_str()),
            &self.settings.base_currency,
            EventAmounts {
                total: amounts.total_amount,
                subtotal: amounts.subtotal,
                cgst: amounts.cgst_amount,
                sgst: amounts.sgst_amount,
                igst: amounts.igst_amount,
                cess: amounts.cess_amount,
                ..EventAmounts::default()
            },
        )
        .with_party(PartyRef::new(invoice.party_type.into(), invoice.party_id))
        .with_currency(&invoice.currency, invoice.exchange_rate);
        event.narration = Some(match &input.reason {
            Some(reason) => format!("{} against {}: {reason}", input.note_type, invoice.invoice_number),
            None => format!("{} against {}", input.note_type, invoice.invoice_number),
        });

        let voucher = post_event(&scope, &self.settings, &event).await?;

        let note = notes::ActiveModel {
            id: Set(note_id),
            tenant_id: Set(scope.tenant_id()),
            note_type: Set(input.note_type.into()),
            note_number: Set(input.note_number.clone()),
            invoice_id: Set(invoice.id),
            party_type: Set(invoice.party_type),
            party_id: Set(invoice.party_id),
            note_date: Set(input.note_date),
            subtotal: Set(amounts.subtotal),
            cgst_amount: Set(amounts.cgst_amount),
            sgst_amount: Set(amounts.sgst_amount),
            igst_amount: Set(amounts.igst_amount),
            cess_amount: Set(amounts.cess_amount),
            tax_amount: Set(amounts.tax_amount),
            total_amount: Set(amounts.total_amount),
            reason: Set(input.reason),
            voucher_id: Set(voucher.voucher.id),
            is_deleted: Set(false),
            created_by: Set(scope.actor_id()),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DocumentError::Duplicate(input.note_number.clone())
            } else {
                document_db(err)
            }
        })?;

        let notes_total = invoice.notes_total + note.total_amount;
        let mut active: invoices::ActiveModel = invoice.into();
        active.notes_total = Set(notes_total);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await.map_err(document_db)?;

        scope.commit().await.map_err(document_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            note_type = %input.note_type,
            note_number = %note.note_number,
            voucher_number = %voucher.voucher.voucher_number,
            total = %note.total_amount,
            "Note posted"
        );
        Ok(PostedNote { note, voucher })
    }

    /// Loads a note.
    ///
    /// # Errors
    ///
    /// `NoteNotFound` if missing or deleted.
    pub async fn get(&self, ctx: &TenantContext, note_id: Uuid) -> Result<notes::Model, DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let note = notes::Entity::find_by_id(note_id)
            .filter(notes::Column::TenantId.eq(scope.tenant_id()))
            .filter(notes::Column::IsDeleted.eq(false))
            .one(scope.txn())
            .await
            .map_err(document_db)?
            .ok_or(DocumentError::NoteNotFound(note_id))?;
        scope.commit().await.map_err(document_db)?;
        Ok(note)
    }

    /// Lists the notes issued against an invoice, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_invoice(
        &self,
        ctx: &TenantContext,
        invoice_id: Uuid,
    ) -> Result<Vec<notes::Model>, DocumentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(document_db)?;
        let rows = notes::Entity::find()
            .filter(notes::Column::TenantId.eq(scope.tenant_id()))
            .filter(notes::Column::InvoiceId.eq(invoice_id))
            .filter(notes::Column::IsDeleted.eq(false))
            .order_by_asc(notes::Column::NoteDate)
            .order_by_asc(notes::Column::CreatedAt)
            .all(scope.txn())
            .await
            .map_err(document_db)?;
        scope.commit().await.map_err(document_db)?;
        Ok(rows)
    }
}
