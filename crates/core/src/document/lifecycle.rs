//! Invoice and note lifecycle rules.

use rust_decimal::Decimal;

use super::error::DocumentError;
use super::types::{InvoiceKind, InvoiceStatus, NoteType};

/// What cancelling an invoice requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAction {
    /// Draft invoice: nothing was posted, just mark it cancelled.
    Discard,
    /// Posted invoice: post a reversal of its voucher.
    ReverseVoucher,
}

/// Stateless checks for document transitions.
pub struct DocumentLifecycle;

impl DocumentLifecycle {
    /// Only draft invoices may be edited.
    ///
    /// # Errors
    ///
    /// `InvalidState` for any other status.
    pub fn validate_update(status: InvoiceStatus) -> Result<(), DocumentError> {
        match status {
            InvoiceStatus::Draft => Ok(()),
            _ => Err(DocumentError::InvalidState {
                action: "update",
                status,
            }),
        }
    }

    /// Only draft invoices may be posted.
    ///
    /// # Errors
    ///
    /// `InvalidState` for any other status.
    pub fn validate_post(status: InvoiceStatus) -> Result<(), DocumentError> {
        match status {
            InvoiceStatus::Draft => Ok(()),
            _ => Err(DocumentError::InvalidState {
                action: "post",
                status,
            }),
        }
    }

    /// Drafts and unpaid posted invoices may be cancelled.
    ///
    /// `pending_amount` is what DRAFT payments have allocated to the invoice
    /// while they wait for gateway confirmation.
    ///
    /// # Errors
    ///
    /// `HasPayments` if anything was paid, `PendingPayments` if unconfirmed
    /// payments are allocated to it, `InvalidState` otherwise.
    pub fn validate_cancel(
        status: InvoiceStatus,
        paid_amount: Decimal,
        pending_amount: Decimal,
    ) -> Result<CancelAction, DocumentError> {
        match status {
            InvoiceStatus::Draft => Ok(CancelAction::Discard),
            InvoiceStatus::Posted if paid_amount.is_zero() && pending_amount.is_zero() => {
                Ok(CancelAction::ReverseVoucher)
            }
            InvoiceStatus::Posted if paid_amount.is_zero() => {
                Err(DocumentError::PendingPayments(pending_amount))
            }
            InvoiceStatus::Posted | InvoiceStatus::PartiallyPaid | InvoiceStatus::Paid => {
                Err(DocumentError::HasPayments(paid_amount))
            }
            InvoiceStatus::Cancelled => Err(DocumentError::InvalidState {
                action: "cancel",
                status,
            }),
        }
    }

    /// Checks a change of `paid_delta` may be recorded on an invoice.
    ///
    /// Payments only land on posted invoices and never past the total.
    /// Negative deltas (unwinding a payment) are always accepted.
    ///
    /// # Errors
    ///
    /// `InvalidState` for draft or cancelled invoices, `Overpayment` when
    /// the paid amount would exceed the total.
    pub fn validate_payment(
        status: InvoiceStatus,
        total_amount: Decimal,
        paid_amount: Decimal,
        paid_delta: Decimal,
    ) -> Result<(), DocumentError> {
        if paid_delta <= Decimal::ZERO {
            return Ok(());
        }
        if !status.is_posted() {
            return Err(DocumentError::InvalidState {
                action: "record a payment against",
                status,
            });
        }
        let available = total_amount - paid_amount;
        if paid_delta > available {
            return Err(DocumentError::Overpayment {
                requested: paid_delta,
                available,
            });
        }
        Ok(())
    }

    /// Checks a note may be issued against an invoice.
    ///
    /// `notes_total` is the sum of earlier notes against the same invoice.
    ///
    /// # Errors
    ///
    /// `WrongInvoiceKind`, `InvalidState` or `NoteExceedsInvoice`.
    pub fn validate_note(
        note_type: NoteType,
        invoice_kind: InvoiceKind,
        invoice_status: InvoiceStatus,
        invoice_total: Decimal,
        notes_total: Decimal,
        note_total: Decimal,
    ) -> Result<(), DocumentError> {
        if note_type.invoice_kind() != invoice_kind {
            return Err(DocumentError::WrongInvoiceKind(invoice_kind));
        }
        if !invoice_status.is_posted() {
            return Err(DocumentError::InvalidState {
                action: "issue a note against",
                status: invoice_status,
            });
        }
        if note_total <= Decimal::ZERO {
            return Err(DocumentError::InvalidAmount(note_total));
        }
        let available = invoice_total - notes_total;
        if note_total > available {
            return Err(DocumentError::NoteExceedsInvoice {
                requested: note_total,
                available,
            });
        }
        Ok(())
    }
}
