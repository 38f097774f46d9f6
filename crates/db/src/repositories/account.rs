//! Account repository for chart of accounts operations.
//!
//! Accounts are never deleted: a ledger row always points at a live account
//! row, so retiring an account means deactivating it.

use chrono::{NaiveDate, Utc};
use hisaab_core::ledger::{ConfigurationError, LedgerError};
use hisaab_shared::TenantContext;
use hisaab_shared::types::round_money;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use super::{is_unique_violation, ledger_db};
use crate::entities::{account_groups, accounts, ledgers};
use crate::rls::TenantScope;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account code (unique within the tenant).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Group the account belongs to; the group decides the account type.
    pub group_code: String,
    /// Opening balance in base currency.
    pub opening_balance: Decimal,
}

impl CreateAccountInput {
    /// Creates an input with a zero opening balance.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, group_code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            group_code: group_code.into(),
            opening_balance: Decimal::ZERO,
        }
    }
}

/// Paginated ledger history of one account.
#[derive(Debug, Clone)]
pub struct PaginatedLedgerEntries {
    /// Ledger rows, newest first.
    pub entries: Vec<ledgers::Model>,
    /// Total count of rows.
    pub total: u64,
    /// Current page (1-indexed).
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total pages.
    pub total_pages: u64,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account under a group.
    ///
    /// # Errors
    ///
    /// - `DuplicateAccount` if the code is taken within the tenant
    /// - `Configuration(AccountGroupMissing)` if the group does not exist
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let txn = scope.txn();

        let existing = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(scope.tenant_id()))
            .filter(accounts::Column::Code.eq(input.code.as_str()))
            .one(txn)
            .await
            .map_err(ledger_db)?;
        if existing.is_some() {
            return Err(LedgerError::DuplicateAccount(input.code));
        }

        let group = account_groups::Entity::find()
            .filter(account_groups::Column::TenantId.eq(scope.tenant_id()))
            .filter(account_groups::Column::Code.eq(input.group_code.as_str()))
            .one(txn)
            .await
            .map_err(ledger_db)?
            .ok_or_else(|| ConfigurationError::AccountGroupMissing(input.group_code.clone()))?;

        let opening_balance = round_money(input.opening_balance);
        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            group_id: Set(group.id),
            code: Set(input.code.clone()),
            name: Set(input.name),
            account_type: Set(group.account_type),
            opening_balance: Set(opening_balance),
            current_balance: Set(opening_balance),
            ledger_version: Set(0),
            system_code: Set(None),
            is_system_account: Set(false),
            is_active: Set(true),
            is_deleted: Set(false),
            created_by: Set(scope.actor_id()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                LedgerError::DuplicateAccount(input.code.clone())
            } else {
                ledger_db(err)
            }
        })?;

        scope.commit().await.map_err(ledger_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            account_code = %account.code,
            group = %group.code,
            "Account created"
        );
        Ok(account)
    }

    /// Deactivates an account. Postings to it fail from then on; its ledger
    /// history stays.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is missing or deleted.
    pub async fn deactivate(
        &self,
        ctx: &TenantContext,
        account_id: Uuid,
    ) -> Result<accounts::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let txn = scope.txn();

        let account = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::TenantId.eq(scope.tenant_id()))
            .filter(accounts::Column::IsDeleted.eq(false))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let account = active.update(txn).await.map_err(ledger_db)?;

        scope.commit().await.map_err(ledger_db)?;
        Ok(account)
    }

    /// Loads an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is missing or deleted.
    pub async fn get(&self, ctx: &TenantContext, account_id: Uuid) -> Result<accounts::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let account = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::TenantId.eq(scope.tenant_id()))
            .filter(accounts::Column::IsDeleted.eq(false))
            .one(scope.txn())
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(account)
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(
        &self,
        ctx: &TenantContext,
        code: &str,
    ) -> Result<Option<accounts::Model>, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let account = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(scope.tenant_id()))
            .filter(accounts::Column::Code.eq(code))
            .filter(accounts::Column::IsDeleted.eq(false))
            .one(scope.txn())
            .await
            .map_err(ledger_db)?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(account)
    }

    /// Returns the most recent ledger row of an account (highest version).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_ledger(
        &self,
        ctx: &TenantContext,
        account_id: Uuid,
    ) -> Result<Option<ledgers::Model>, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let latest = ledgers::Entity::find()
            .filter(ledgers::Column::TenantId.eq(scope.tenant_id()))
            .filter(ledgers::Column::AccountId.eq(account_id))
            .order_by_desc(ledgers::Column::AccountVersion)
            .one(scope.txn())
            .await
            .map_err(ledger_db)?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(latest)
    }

    /// Lists ledger rows of an account within an optional date range.
    ///
    /// # Arguments
    ///
    /// * `page` - Page number (1-indexed)
    /// * `limit` - Number of entries per page
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn ledger_history(
        &self,
        ctx: &TenantContext,
        account_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedLedgerEntries, LedgerError> {
        let limit = limit.max(1);
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;

        let mut query = ledgers::Entity::find()
            .filter(ledgers::Column::TenantId.eq(scope.tenant_id()))
            .filter(ledgers::Column::AccountId.eq(account_id));
        if let Some(from_date) = from {
            query = query.filter(ledgers::Column::TransactionDate.gte(from_date));
        }
        if let Some(to_date) = to {
            query = query.filter(ledgers::Column::TransactionDate.lte(to_date));
        }

        let total = query.clone().count(scope.txn()).await.map_err(ledger_db)?;
        let total_pages = if total == 0 { 1 } else { total.div_ceil(limit) };
        let offset = page.saturating_sub(1) * limit;

        let entries = query
            .order_by_desc(ledgers::Column::AccountVersion)
            .offset(offset)
            .limit(limit)
            .all(scope.txn())
            .await
            .map_err(ledger_db)?;

        scope.commit().await.map_err(ledger_db)?;
        Ok(PaginatedLedgerEntries {
            entries,
            total,
            page,
            limit,
            total_pages,
        })
    }
}
