//! Row-Level Security (RLS) tenant scoping.
//!
//! Every posting operation runs inside a [`TenantScope`]: one database
//! transaction whose first statement sets `app.current_tenant_id` with
//! `SET LOCAL`, so the tenant policies from the initial migration apply to
//! every query in it and the setting disappears at commit or rollback.
//!
//! # Usage
//!
//! ```ignore
//! use hisaab_db::rls::TenantScope;
//!
//! let scope = TenantScope::begin(&db, &ctx).await?;
//! let accounts = accounts::Entity::find().all(scope.txn()).await?;
//! scope.commit().await?;
//! ```

use hisaab_shared::TenantContext;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

/// A tenant-scoped database transaction.
///
/// Dropping the scope without calling [`TenantScope::commit`] rolls the
/// transaction back, so an aborted or timed-out posting leaves the store
/// unchanged.
pub struct TenantScope {
    txn: DatabaseTransaction,
    ctx: TenantContext,
}

impl TenantScope {
    /// Begins a transaction and sets the tenant context on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn begin(db: &DatabaseConnection, ctx: &TenantContext) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_tenant_context(&txn, ctx.tenant_id.into_inner()).await?;
        Ok(Self { txn, ctx: *ctx })
    }

    /// Returns the underlying transaction.
    #[must_use]
    pub fn txn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Returns the raw tenant id.
    #[must_use]
    pub const fn tenant_id(&self) -> Uuid {
        self.ctx.tenant_id.into_inner()
    }

    /// Returns the raw actor id.
    #[must_use]
    pub const fn actor_id(&self) -> Uuid {
        self.ctx.actor_id.into_inner()
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails, including when the deferred
    /// voucher balance trigger rejects the transaction.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Sets the tenant context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn set_tenant_context(txn: &DatabaseTransaction, tenant_id: Uuid) -> Result<(), DbErr> {
    txn.execute_unprepared(&tenant_context_sql(tenant_id)).await?;
    Ok(())
}

fn tenant_context_sql(tenant_id: Uuid) -> String {
    // A Uuid renders as hex and dashes only, so inlining it is safe.
    format!("SET LOCAL app.current_tenant_id = '{tenant_id}'")
}
