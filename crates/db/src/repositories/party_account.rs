//! Party account provisioning.
//!
//! Customers, patients and suppliers get their own receivable or payable
//! account the first time a posting touches them. The unique constraint on
//! `(tenant_id, system_code)` settles concurrent first postings: the losing
//! insert does nothing and both callers read back the same row.

use chrono::Utc;
use hisaab_core::ledger::{ConfigurationError, LedgerError};
use hisaab_core::party::{PartyRef, PartyType};
use hisaab_shared::TenantContext;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use super::ledger_db;
use crate::entities::sea_orm_active_enums::PartyType as DbPartyType;
use crate::entities::{account_groups, accounts, parties};
use crate::rls::TenantScope;

/// Repository for auto-provisioned party accounts.
#[derive(Debug, Clone)]
pub struct PartyAccountRepository {
    db: DatabaseConnection,
}

impl PartyAccountRepository {
    /// Creates a new party account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the party's account, creating it on first use.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the party type is not auto-provisioned and has no
    ///   account, or the account group is missing
    /// - `PartyNotFound` if the party is missing, inactive or deleted
    pub async fn get_or_create(
        &self,
        ctx: &TenantContext,
        party_type: PartyType,
        party_id: Uuid,
    ) -> Result<Uuid, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let account_id = party_account(&scope, PartyRef::new(party_type, party_id)).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(account_id)
    }

    /// Registers a party. Its number comes from the database sequence; the
    /// account is provisioned on its first posting.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_party(
        &self,
        ctx: &TenantContext,
        party_type: PartyType,
        name: &str,
    ) -> Result<parties::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let party = parties::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            party_no: NotSet,
            party_type: Set(party_type.into()),
            name: Set(name.trim().to_string()),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(scope.txn())
        .await
        .map_err(ledger_db)?;
        scope.commit().await.map_err(ledger_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            party_type = %party_type,
            party_no = party.party_no,
            "Party created"
        );
        Ok(party)
    }

    /// Deactivates a party. Postings naming it fail from then on; an account
    /// already provisioned for it keeps its ledger.
    ///
    /// # Errors
    ///
    /// `PartyNotFound` if the party is missing or deleted.
    pub async fn deactivate_party(
        &self,
        ctx: &TenantContext,
        party_id: Uuid,
    ) -> Result<parties::Model, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let party = parties::Entity::find_by_id(party_id)
            .filter(parties::Column::TenantId.eq(scope.tenant_id()))
            .filter(parties::Column::IsDeleted.eq(false))
            .lock_exclusive()
            .one(scope.txn())
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::PartyNotFound(party_id))?;

        let mut active: parties::ActiveModel = party.into();
        active.is_active = Set(false);
        let party = active.update(scope.txn()).await.map_err(ledger_db)?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(party)
    }
}

/// Get-or-create inside an open scope.
pub(crate) async fn party_account(scope: &TenantScope, party: PartyRef) -> Result<Uuid, LedgerError> {
    let txn = scope.txn();
    let tenant_id = scope.tenant_id();
    let system_code = party.party_type.system_code(party.party_id);

    let existing = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id))
        .filter(accounts::Column::SystemCode.eq(system_code.as_str()))
        .filter(accounts::Column::IsDeleted.eq(false))
        .one(txn)
        .await
        .map_err(ledger_db)?;
    if let Some(account) = existing {
        return Ok(account.id);
    }

    let spec = party
        .party_type
        .account_spec()
        .ok_or(ConfigurationError::PartyTypeNotProvisioned(party.party_type))?;

    let party_row = parties::Entity::find_by_id(party.party_id)
        .filter(parties::Column::TenantId.eq(tenant_id))
        .filter(parties::Column::PartyType.eq(DbPartyType::from(party.party_type)))
        .filter(parties::Column::IsActive.eq(true))
        .filter(parties::Column::IsDeleted.eq(false))
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or(LedgerError::PartyNotFound(party.party_id))?;

    let group = account_groups::Entity::find()
        .filter(account_groups::Column::TenantId.eq(tenant_id))
        .filter(account_groups::Column::Code.eq(spec.group_code))
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or_else(|| ConfigurationError::AccountGroupMissing(spec.group_code.to_string()))?;

    let now = Utc::now().into();
    let candidate = accounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        group_id: Set(group.id),
        code: Set(spec.account_code(party_row.party_no)),
        name: Set(spec.account_name(&party_row.name)),
        account_type: Set(group.account_type),
        opening_balance: Set(Decimal::ZERO),
        current_balance: Set(Decimal::ZERO),
        ledger_version: Set(0),
        system_code: Set(Some(system_code.clone())),
        is_system_account: Set(true),
        is_active: Set(true),
        is_deleted: Set(false),
        created_by: Set(scope.actor_id()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = accounts::Entity::insert(candidate)
        .on_conflict(
            OnConflict::columns([accounts::Column::TenantId, accounts::Column::SystemCode])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .map_err(ledger_db)?;

    let account = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id))
        .filter(accounts::Column::SystemCode.eq(system_code.as_str()))
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or_else(|| LedgerError::Database(format!("party account {system_code} vanished")))?;
    if account.is_deleted {
        return Err(LedgerError::AccountNotFound(account.id));
    }

    if inserted > 0 {
        info!(
            tenant_id = %tenant_id,
            party_type = %party.party_type,
            party_id = %party.party_id,
            account_code = %account.code,
            "Party account provisioned"
        );
    }
    Ok(account.id)
}
