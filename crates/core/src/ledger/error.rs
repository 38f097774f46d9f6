//! Ledger error types.
//!
//! Configuration problems are split out into [`ConfigurationError`] because
//! they all mean the same thing to a caller: the tenant needs setting up.

use hisaab_shared::ErrorKind;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::party::PartyType;

/// Tenant setup is missing something a posting needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The account configuration key is unknown, inactive or deleted.
    #[error("Account configuration key {0} is not defined")]
    UnknownKey(String),

    /// Neither a tenant mapping nor a default account exists for the key.
    #[error("Account configuration key {0} is not mapped to an account")]
    KeyNotMapped(String),

    /// An account group code is missing for the tenant.
    #[error("Account group {0} is not set up")]
    AccountGroupMissing(String),

    /// A voucher type code is missing or inactive for the tenant.
    #[error("Voucher type {0} is not set up")]
    VoucherTypeMissing(String),

    /// The party type has no auto-provisioned account.
    #[error("Party type {0} has no account mapping")]
    PartyTypeNotProvisioned(PartyType),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Configuration ==========
    /// Tenant configuration error.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    // ========== Validation Errors ==========
    /// A voucher must have at least 2 legs.
    #[error("Voucher must have at least 2 lines")]
    InsufficientLegs,

    /// Voucher is not balanced (debits != credits).
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount in base currency.
        debit: Decimal,
        /// Total credit amount in base currency.
        credit: Decimal,
    },

    /// Leg amount cannot be zero.
    #[error("Line amount cannot be zero")]
    ZeroAmount,

    /// Leg amount cannot be negative.
    #[error("Line amount cannot be negative")]
    NegativeAmount,

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive")]
    InvalidExchangeRate,

    /// A posting template needs a party but the event has none.
    #[error("Posting requires a party")]
    MissingParty,

    // ========== Not Found ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Party not found, inactive or deleted.
    #[error("Party not found: {0}")]
    PartyNotFound(Uuid),

    /// Voucher not found.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(Uuid),

    // ========== Conflicts ==========
    /// Account code already used within the tenant.
    #[error("Account code {0} already exists")]
    DuplicateAccount(String),

    // ========== State Errors ==========
    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(Uuid),

    /// The voucher already has a reversal.
    #[error("Voucher {0} has already been reversed")]
    AlreadyReversed(Uuid),

    /// Reversal vouchers cannot themselves be reversed.
    #[error("Voucher {0} is a reversal and cannot be reversed")]
    CannotReverseReversal(Uuid),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Unbalanced { .. } => ErrorKind::UnbalancedVoucher,
            Self::InsufficientLegs
            | Self::ZeroAmount
            | Self::NegativeAmount
            | Self::InvalidExchangeRate
            | Self::MissingParty => ErrorKind::Validation,
            Self::AccountNotFound(_) | Self::PartyNotFound(_) | Self::VoucherNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::DuplicateAccount(_) => ErrorKind::Duplicate,
            Self::AccountInactive(_) | Self::AlreadyReversed(_) | Self::CannotReverseReversal(_) => {
                ErrorKind::InvalidState
            }
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InsufficientLegs => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_VOUCHER",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidExchangeRate => "INVALID_EXCHANGE_RATE",
            Self::MissingParty => "MISSING_PARTY",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::PartyNotFound(_) => "PARTY_NOT_FOUND",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::CannotReverseReversal(_) => "CANNOT_REVERSE_REVERSAL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InsufficientLegs.error_code(), "INSUFFICIENT_LINES");
        assert_eq!(
            LedgerError::Unbalanced {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_VOUCHER"
        );
        assert_eq!(
            LedgerError::from(ConfigurationError::KeyNotMapped("SALES".into())).error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            LedgerError::from(ConfigurationError::UnknownKey("X".into())).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            LedgerError::Unbalanced {
                debit: Decimal::ONE,
                credit: Decimal::ZERO,
            }
            .kind(),
            ErrorKind::UnbalancedVoucher
        );
        assert_eq!(
            LedgerError::PartyNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::AlreadyReversed(Uuid::nil()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            LedgerError::DuplicateAccount("1100".into()).kind(),
            ErrorKind::Duplicate
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::ZeroAmount.http_status_code(), 400);
        assert_eq!(LedgerError::AccountNotFound(Uuid::nil()).http_status_code(), 404);
        assert_eq!(
            LedgerError::Database("test".to_string()).http_status_code(),
            500
        );
        assert_eq!(
            LedgerError::from(ConfigurationError::VoucherTypeMissing("SV".into()))
                .http_status_code(),
            500
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(5000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Voucher is not balanced. Debit: 100.00, Credit: 50.00"
        );
        let err = LedgerError::from(ConfigurationError::PartyTypeNotProvisioned(
            PartyType::Employee,
        ));
        assert_eq!(err.to_string(), "Party type EMPLOYEE has no account mapping");
    }
}
