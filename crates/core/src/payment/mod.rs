//! Payment lifecycle and allocation.
//!
//! - Payment status, type and instrument modes
//! - The DRAFT → POSTED → RECONCILED state machine
//! - Allocation planning, validated in full before anything is written

pub mod allocation;
pub mod error;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
mod allocation_props;
#[cfg(test)]
mod lifecycle_props;

pub use allocation::{
    AllocationPlan, AllocationPlanner, AllocationRequest, DocumentBalance, PaymentSnapshot,
    PlannedAllocation,
};
pub use error::PaymentError;
pub use lifecycle::{GatewayOutcome, PaymentLifecycle};
pub use types::{GatewayStatus, PaymentMode, PaymentStatus, PaymentType};
