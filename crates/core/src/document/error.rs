//! Document error types.

use hisaab_shared::ErrorKind;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::{InvoiceKind, InvoiceStatus};
use crate::gst::GstError;
use crate::ledger::LedgerError;

/// Errors raised by invoice and note operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Invoice not found or deleted.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// Note not found or deleted.
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// Document number already used within the tenant.
    #[error("Document number {0} already exists")]
    Duplicate(String),

    /// Operation not allowed in the current status.
    #[error("Cannot {action} an invoice in status {status}")]
    InvalidState {
        /// What was attempted.
        action: &'static str,
        /// Current status.
        status: InvoiceStatus,
    },

    /// Cancelling an invoice that has payments against it.
    #[error("Invoice has {0} paid against it and cannot be cancelled")]
    HasPayments(Decimal),

    /// Cancelling an invoice that unconfirmed payments are allocated to.
    #[error("Invoice has {0} allocated from payments awaiting confirmation")]
    PendingPayments(Decimal),

    /// A payment would take the paid amount past the invoice total.
    #[error("Payment of {requested} exceeds invoice balance {available}")]
    Overpayment {
        /// Amount being recorded.
        requested: Decimal,
        /// Invoice total less paid amount.
        available: Decimal,
    },

    /// Note issued against the wrong invoice kind.
    #[error("Note cannot be issued against a {0}")]
    WrongInvoiceKind(InvoiceKind),

    /// Notes against an invoice would exceed its total.
    #[error("Note total {requested} exceeds remaining invoice amount {available}")]
    NoteExceedsInvoice {
        /// Requested note total.
        requested: Decimal,
        /// Invoice total less earlier notes.
        available: Decimal,
    },

    /// The party does not match the document kind.
    #[error("Party type does not match a {0}")]
    PartyMismatch(InvoiceKind),

    /// Amount is zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// GST calculation error.
    #[error(transparent)]
    Gst(#[from] GstError),

    /// Posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl DocumentError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvoiceNotFound(_) | Self::NoteNotFound(_) => ErrorKind::NotFound,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::InvalidState { .. } | Self::HasPayments(_) | Self::PendingPayments(_) => {
                ErrorKind::InvalidState
            }
            Self::Overpayment { .. } => ErrorKind::OverAllocation,
            Self::WrongInvoiceKind(_)
            | Self::NoteExceedsInvoice { .. }
            | Self::PartyMismatch(_)
            | Self::InvalidAmount(_)
            | Self::Gst(_) => ErrorKind::Validation,
            Self::Ledger(err) => err.kind(),
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::NoteNotFound(_) => "NOTE_NOT_FOUND",
            Self::Duplicate(_) => "DUPLICATE_DOCUMENT_NUMBER",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::HasPayments(_) => "INVOICE_HAS_PAYMENTS",
            Self::PendingPayments(_) => "INVOICE_HAS_PENDING_PAYMENTS",
            Self::Overpayment { .. } => "INVOICE_OVERPAYMENT",
            Self::WrongInvoiceKind(_) => "WRONG_INVOICE_KIND",
            Self::NoteExceedsInvoice { .. } => "NOTE_EXCEEDS_INVOICE",
            Self::PartyMismatch(_) => "PARTY_MISMATCH",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Gst(_) => "INVALID_GST",
            Self::Ledger(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
