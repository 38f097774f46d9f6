//! Explicit tenant and actor context.
//!
//! Every posting operation takes a `TenantContext` argument. Nothing in the
//! engine reads tenant identity from ambient or thread-local state.

use serde::{Deserialize, Serialize};

use super::id::{TenantId, UserId};

/// The tenant an operation runs for and the user performing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant whose books are touched.
    pub tenant_id: TenantId,
    /// User recorded as `created_by` / `updated_by`.
    pub actor_id: UserId,
}

impl TenantContext {
    /// Creates a context for the given tenant and actor.
    #[must_use]
    pub const fn new(tenant_id: TenantId, actor_id: UserId) -> Self {
        Self {
            tenant_id,
            actor_id,
        }
    }
}
