//! Data-driven posting templates.
//!
//! Every business event is a two-or-more-leg voucher. What differs between
//! a sale, a receipt or a waste write-off is only which roles are hit, on
//! which side, with which amount. That lives in a static rule table; one
//! expander turns any event into a [`VoucherDraft`](crate::ledger::VoucherDraft).

pub mod event;
pub mod rules;
pub mod template;

pub use event::{BusinessEvent, EventAmounts, EventKind, InstrumentLeg};
pub use rules::{AmountField, LegRule, LegTarget, PostingTemplate};
pub use template::expand;
