//! Common types used across the application.

pub mod context;
pub mod id;
pub mod money;

pub use context::TenantContext;
pub use id::*;
pub use money::{MONEY_SCALE, foreign_from_base, round_money};
