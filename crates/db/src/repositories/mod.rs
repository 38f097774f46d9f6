//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every public operation opens a [`TenantScope`](crate::rls::TenantScope),
//! does all of its reads and writes inside it and commits once.

pub mod account;
pub mod account_config;
pub mod invoice;
pub mod note;
pub mod party_account;
pub mod payment;
pub mod tenant_setup;
pub mod voucher;

pub use account::{AccountRepository, CreateAccountInput, PaginatedLedgerEntries};
pub use account_config::AccountConfigRepository;
pub use invoice::{InvoiceInput, InvoiceRepository};
pub use note::{NoteInput, NoteRepository, PostedNote};
pub use party_account::PartyAccountRepository;
pub use payment::{
    AllocationResult, CreatePaymentInput, GatewayConfirmation, PaymentDetailInput,
    PaymentRepository, PaymentReversal, PaymentWithDetails,
};
pub use tenant_setup::{TenantBootstrap, TenantSetupRepository};
pub use voucher::{PostedVoucher, VoucherRepository};

use hisaab_core::document::DocumentError;
use hisaab_core::ledger::LedgerError;
use hisaab_core::payment::PaymentError;
use sea_orm::{DbErr, SqlErr};

/// Wraps a database error into a [`LedgerError`].
pub(crate) fn ledger_db(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Wraps a database error into a [`PaymentError`].
pub(crate) fn payment_db(err: DbErr) -> PaymentError {
    PaymentError::Database(err.to_string())
}

/// Wraps a database error into a [`DocumentError`].
pub(crate) fn document_db(err: DbErr) -> DocumentError {
    DocumentError::Database(err.to_string())
}

/// Returns true if `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
