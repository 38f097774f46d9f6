//! Account configuration repository.
//!
//! Resolves a semantic role to a tenant's ledger account: the tenant mapping
//! wins, the key's global default is the fallback, and anything else is a
//! configuration error.

use chrono::Utc;
use hisaab_core::ledger::{AccountRole, ConfigurationError, LedgerError};
use hisaab_shared::TenantContext;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::ledger_db;
use crate::entities::{account_configuration_keys, account_configurations, accounts};
use crate::rls::TenantScope;

/// Repository for role to account bindings.
#[derive(Debug, Clone)]
pub struct AccountConfigRepository {
    db: DatabaseConnection,
}

impl AccountConfigRepository {
    /// Creates a new account configuration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves `role` to an account id for the tenant.
    ///
    /// # Errors
    ///
    /// `Configuration` if the key is unknown or has neither a tenant mapping
    /// nor a default account.
    pub async fn resolve(
        &self,
        ctx: &TenantContext,
        role: AccountRole,
    ) -> Result<Uuid, LedgerError> {
        self.resolve_code(ctx, role.code()).await
    }

    /// Resolves a raw key code, for keys outside the built-in role catalog.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    pub async fn resolve_code(&self, ctx: &TenantContext, code: &str) -> Result<Uuid, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let account_id = resolve_key(scope.txn(), scope.tenant_id(), code).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(account_id)
    }

    /// Binds `role` to `account_id` for the tenant, replacing any earlier binding.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is missing or deleted, `Configuration`
    /// if the key is not in the catalog.
    pub async fn set_mapping(
        &self,
        ctx: &TenantContext,
        role: AccountRole,
        account_id: Uuid,
    ) -> Result<account_configurations::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let mapping = bind_role(&scope, role, account_id).await?;
        scope.commit().await.map_err(ledger_db)?;

        debug!(
            tenant_id = %ctx.tenant_id,
            role = %role,
            account_id = %account_id,
            "Account role mapped"
        );
        Ok(mapping)
    }

    /// Sets the global default account of a key.
    ///
    /// # Errors
    ///
    /// `Configuration` if the key is not in the catalog.
    pub async fn set_default_account(
        &self,
        role: AccountRole,
        account_id: Option<Uuid>,
    ) -> Result<account_configuration_keys::Model, LedgerError> {
        let key = find_key(&self.db, role.code()).await?;
        let mut active: account_configuration_keys::ActiveModel = key.into();
        active.default_account_id = Set(account_id);
        active.update(&self.db).await.map_err(ledger_db)
    }

    /// Inserts every catalog role missing from the global key table.
    ///
    /// Returns the number of keys created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn ensure_catalog(&self) -> Result<u64, LedgerError> {
        let txn = self.db.begin().await.map_err(ledger_db)?;
        let created = ensure_catalog(&txn).await?;
        txn.commit().await.map_err(ledger_db)?;

        if created > 0 {
            debug!(created, "Account configuration keys created");
        }
        Ok(created)
    }
}

/// Inserts missing catalog keys on `conn`.
pub(crate) async fn ensure_catalog<C: ConnectionTrait>(conn: &C) -> Result<u64, LedgerError> {
    let now = Utc::now().into();
    let keys = AccountRole::ALL
        .into_iter()
        .map(|role| account_configuration_keys::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(role.code().to_string()),
            name: Set(role.description().to_string()),
            description: Set(Some(role.description().to_string())),
            account_type: Set(role.default_account_type().into()),
            default_account_id: Set(None),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
        });

    account_configuration_keys::Entity::insert_many(keys)
        .on_conflict(
            OnConflict::column(account_configuration_keys::Column::Code)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(ledger_db)
}

/// Resolves a key code to an account inside an open transaction.
pub(crate) async fn resolve_key<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    code: &str,
) -> Result<Uuid, LedgerError> {
    let key = find_key(conn, code).await?;

    let mapping = account_configurations::Entity::find()
        .filter(account_configurations::Column::TenantId.eq(tenant_id))
        .filter(account_configurations::Column::KeyId.eq(key.id))
        .one(conn)
        .await
        .map_err(ledger_db)?;

    let account_id = match (mapping, key.default_account_id) {
        (Some(mapping), _) => mapping.account_id,
        (None, Some(default_account_id)) => default_account_id,
        (None, None) => return Err(ConfigurationError::KeyNotMapped(code.to_string()).into()),
    };

    debug!(tenant_id = %tenant_id, key = code, account_id = %account_id, "Account role resolved");
    Ok(account_id)
}

/// Upserts the tenant binding of `role` inside `scope`.
pub(crate) async fn bind_role(
    scope: &TenantScope,
    role: AccountRole,
    account_id: Uuid,
) -> Result<account_configurations::Model, LedgerError> {
    let txn = scope.txn();
    let key = find_key(txn, role.code()).await?;

    accounts::Entity::find_by_id(account_id)
        .filter(accounts::Column::TenantId.eq(scope.tenant_id()))
        .filter(accounts::Column::IsDeleted.eq(false))
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or(LedgerError::AccountNotFound(account_id))?;

    let existing = account_configurations::Entity::find()
        .filter(account_configurations::Column::TenantId.eq(scope.tenant_id()))
        .filter(account_configurations::Column::KeyId.eq(key.id))
        .one(txn)
        .await
        .map_err(ledger_db)?;

    let now = Utc::now().into();
    let mapping = match existing {
        Some(existing) => {
            let mut active: account_configurations::ActiveModel = existing.into();
            active.account_id = Set(account_id);
            active.updated_at = Set(now);
            active.update(txn).await
        }
        None => {
            account_configurations::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(scope.tenant_id()),
                key_id: Set(key.id),
                account_id: Set(account_id),
                created_by: Set(scope.actor_id()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(txn)
            .await
        }
    };
    mapping.map_err(ledger_db)
}

async fn find_key<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<account_configuration_keys::Model, LedgerError> {
    account_configuration_keys::Entity::find()
        .filter(account_configuration_keys::Column::Code.eq(code))
        .filter(account_configuration_keys::Column::IsActive.eq(true))
        .filter(account_configuration_keys::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(ledger_db)?
        .ok_or_else(|| ConfigurationError::UnknownKey(code.to_string()).into())
}
