//! Invoices, credit/debit notes and their payment status.
//!
//! - Invoice kinds, statuses and GST-derived amounts
//! - Invoice and note lifecycle rules
//! - The payment status synchronizer run after every allocation

pub mod error;
pub mod lifecycle;
pub mod status;
pub mod types;

pub use error::DocumentError;
pub use lifecycle::{CancelAction, DocumentLifecycle};
pub use status::{InvoicePaymentState, sync_invoice_payment_status};
pub use types::{InvoiceAmounts, InvoiceKind, InvoicePaymentStatus, InvoiceStatus, NoteType};
