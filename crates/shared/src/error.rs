//! Application-wide error types.
//!
//! Engine errors carry an [`ErrorKind`] from the posting taxonomy. Callers turn
//! them into an [`AppError`] and pick a transport status from there.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Failure categories raised by the accounting core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing key, tenant mapping, account group or voucher type. Needs tenant setup.
    Configuration,
    /// Referenced party, document, account or payment is missing or soft-deleted.
    NotFound,
    /// Payment or note number already used within the tenant.
    Duplicate,
    /// Debit and credit legs did not sum equal.
    UnbalancedVoucher,
    /// Operation attempted from a disallowed state.
    InvalidState,
    /// Allocation exceeds the document balance or the payment's unallocated amount.
    OverAllocation,
    /// Reconcile called on an already reconciled payment.
    AlreadyReconciled,
    /// Malformed input (zero or negative amounts, empty batches).
    Validation,
    /// Storage or unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status a controller should use for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Duplicate | Self::AlreadyReconciled => 409,
            Self::Configuration | Self::Internal => 500,
            Self::UnbalancedVoucher
            | Self::InvalidState
            | Self::OverAllocation
            | Self::Validation => 400,
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Tenant setup is incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an application error from an engine error kind and its message.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Duplicate | ErrorKind::AlreadyReconciled => Self::Conflict(message),
            ErrorKind::UnbalancedVoucher
            | ErrorKind::InvalidState
            | ErrorKind::OverAllocation => Self::BusinessRule(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Internal => Self::Internal(message),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Configuration(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
