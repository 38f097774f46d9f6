//! Payment error types.

use hisaab_shared::ErrorKind;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::{PaymentStatus, PaymentType};
use crate::document::DocumentError;
use crate::ledger::LedgerError;

/// Errors raised by payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment number already used within the tenant.
    #[error("Payment number {0} already exists")]
    Duplicate(String),

    /// Payment not found or deleted.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// Allocation target not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Operation not allowed in the current status.
    #[error("Cannot {action} a payment in status {status}")]
    InvalidState {
        /// What was attempted.
        action: &'static str,
        /// Current status.
        status: PaymentStatus,
    },

    /// Refund payments cannot be reversed.
    #[error("Payment {0} is a refund and cannot be reversed")]
    RefundNotReversible(Uuid),

    /// The payment already has a refund.
    #[error("Payment {0} has already been reversed")]
    AlreadyReversed(Uuid),

    /// Allocation exceeds what is available.
    #[error("Allocation of {requested} exceeds available {available}")]
    OverAllocation {
        /// Requested amount.
        requested: Decimal,
        /// Document balance or payment unallocated amount.
        available: Decimal,
    },

    /// Reconcile called on a reconciled payment.
    #[error("Payment {0} is already reconciled")]
    AlreadyReconciled(Uuid),

    /// Same document allocated twice.
    #[error("Document {0} is already allocated from this payment")]
    DuplicateAllocation(Uuid),

    /// Allocation batch is empty.
    #[error("At least one allocation is required")]
    EmptyAllocation,

    /// Allocation target belongs to another party or payment direction.
    #[error("Document {0} cannot be settled by this payment")]
    DocumentMismatch(Uuid),

    /// Amount is zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// The payment type has no posting template.
    #[error("{0} payments cannot be posted")]
    NotPostable(PaymentType),

    /// A payment needs at least one detail line.
    #[error("Payment must have at least one detail line")]
    NoDetails,

    /// Posting failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Document update failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PaymentError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::NotFound(_) | Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } | Self::RefundNotReversible(_) | Self::AlreadyReversed(_) => {
                ErrorKind::InvalidState
            }
            Self::OverAllocation { .. } => ErrorKind::OverAllocation,
            Self::AlreadyReconciled(_) => ErrorKind::AlreadyReconciled,
            Self::DuplicateAllocation(_)
            | Self::EmptyAllocation
            | Self::DocumentMismatch(_)
            | Self::InvalidAmount(_)
            | Self::NotPostable(_)
            | Self::NoDetails => ErrorKind::Validation,
            Self::Ledger(err) => err.kind(),
            Self::Document(err) => err.kind(),
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "DUPLICATE_PAYMENT_NUMBER",
            Self::NotFound(_) => "PAYMENT_NOT_FOUND",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::RefundNotReversible(_) => "REFUND_NOT_REVERSIBLE",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::OverAllocation { .. } => "OVER_ALLOCATION",
            Self::AlreadyReconciled(_) => "ALREADY_RECONCILED",
            Self::DuplicateAllocation(_) => "DUPLICATE_ALLOCATION",
            Self::EmptyAllocation => "EMPTY_ALLOCATION",
            Self::DocumentMismatch(_) => "DOCUMENT_MISMATCH",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::NotPostable(_) => "PAYMENT_NOT_POSTABLE",
            Self::NoDetails => "NO_PAYMENT_DETAILS",
            Self::Ledger(err) => err.error_code(),
            Self::Document(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
