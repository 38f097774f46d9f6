//! Core business logic for Hisaab.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Repositories in `hisaab-db` load rows, call into these services and persist
//! whatever they return inside a single database transaction.
//!
//! # Modules
//!
//! - `ledger` - Vouchers, account roles, running balances and reversals
//! - `posting` - Data-driven posting templates turning business events into vouchers
//! - `gst` - CGST/SGST/IGST split calculation
//! - `payment` - Payment state machine and allocation planning
//! - `document` - Invoice and note lifecycles, payment status synchronisation
//! - `party` - Party types and auto-provisioned party account naming

pub mod document;
pub mod gst;
pub mod ledger;
pub mod party;
pub mod payment;
pub mod posting;
