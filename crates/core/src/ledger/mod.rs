//! Double-entry bookkeeping logic.
//!
//! This module implements the voucher side of the posting engine:
//! - Account roles and account types
//! - Voucher drafts, legs and resolved lines
//! - Running balance planning
//! - Validation and account resolution
//! - Reversals and voucher numbering

pub mod balance;
pub mod error;
pub mod numbering;
pub mod reversal;
pub mod roles;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{AccountState, AccountType, BalancePlan, NormalSide, RunningBalance, plan_balances};
pub use error::{ConfigurationError, LedgerError};
pub use numbering::format_voucher_number;
pub use reversal::{REVERSAL_SUFFIX, ReversalService, ReversibleVoucher};
pub use roles::AccountRole;
pub use service::LedgerService;
pub use types::{
    AccountInfo, AccountRef, DocumentReference, EntryType, PostingLeg, ResolvedLine,
    VoucherDraft, VoucherTotals,
};
