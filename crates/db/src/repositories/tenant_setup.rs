//! Tenant bootstrap.
//!
//! Gives a new tenant everything the posting engine needs: the five account
//! groups, one system account per role, the voucher types and the role
//! bindings. Every insert skips rows that already exist, so running it again
//! is harmless and never overrides a binding the tenant changed.

use std::collections::HashMap;

use chrono::Utc;
use hisaab_core::ledger::{AccountRole, AccountType, LedgerError};
use hisaab_shared::TenantContext;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use super::account_config::ensure_catalog;
use super::ledger_db;
use crate::entities::{
    account_configuration_keys, account_configurations, account_groups, accounts, voucher_types,
};
use crate::rls::TenantScope;

/// Account groups every tenant gets, by code.
const GROUPS: [(AccountType, &str); 5] = [
    (AccountType::Asset, "Assets"),
    (AccountType::Liability, "Liabilities"),
    (AccountType::Equity, "Equity"),
    (AccountType::Revenue, "Revenue"),
    (AccountType::Expense, "Expenses"),
];

/// Voucher types as (code, name). The code doubles as the number prefix.
const VOUCHER_TYPES: [(&str, &str); 8] = [
    ("JV", "Journal Voucher"),
    ("SV", "Sales Voucher"),
    ("PV", "Purchase Voucher"),
    ("RV", "Receipt Voucher"),
    ("PY", "Payment Voucher"),
    ("CN", "Credit Note"),
    ("DN", "Debit Note"),
    ("CV", "Contra Voucher"),
];

/// What a bootstrapped tenant looks like.
#[derive(Debug, Clone)]
pub struct TenantBootstrap {
    /// Account group ids by group code.
    pub groups: HashMap<String, Uuid>,
    /// Account bound to each role.
    pub role_accounts: HashMap<AccountRole, Uuid>,
    /// Voucher type ids by code.
    pub voucher_types: HashMap<String, Uuid>,
}

impl TenantBootstrap {
    /// Account bound to `role`.
    #[must_use]
    pub fn account(&self, role: AccountRole) -> Option<Uuid> {
        self.role_accounts.get(&role).copied()
    }
}

/// Repository bootstrapping tenants.
#[derive(Debug, Clone)]
pub struct TenantSetupRepository {
    db: DatabaseConnection,
}

impl TenantSetupRepository {
    /// Creates a new tenant setup repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Bootstraps the tenant in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn bootstrap(&self, ctx: &TenantContext) -> Result<TenantBootstrap, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let txn = scope.txn();
        let tenant_id = scope.tenant_id();
        let now: DateTimeWithTimeZone = Utc::now().into();

        ensure_catalog(txn).await?;

        let groups = GROUPS.into_iter().map(|(account_type, name)| account_groups::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            code: Set(account_type.group_code().to_string()),
            name: Set(name.to_string()),
            account_type: Set(account_type.into()),
            created_at: Set(now),
        });
        account_groups::Entity::insert_many(groups)
            .on_conflict(
                OnConflict::columns([account_groups::Column::TenantId, account_groups::Column::Code])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(ledger_db)?;
        let groups: HashMap<String, Uuid> = account_groups::Entity::find()
            .filter(account_groups::Column::TenantId.eq(tenant_id))
            .all(txn)
            .await
            .map_err(ledger_db)?
            .into_iter()
            .map(|group| (group.code, group.id))
            .collect();

        let mut system_accounts = Vec::with_capacity(AccountRole::ALL.len());
        for role in AccountRole::ALL {
            let account_type = role.default_account_type();
            let group_id = *groups.get(account_type.group_code()).ok_or_else(|| {
                LedgerError::Database(format!("group {} missing after insert", account_type.group_code()))
            })?;
            system_accounts.push(accounts::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                group_id: Set(group_id),
                code: Set(role.default_account_code().to_string()),
                name: Set(role.description().to_string()),
                account_type: Set(account_type.into()),
                opening_balance: Set(Decimal::ZERO),
                current_balance: Set(Decimal::ZERO),
                ledger_version: Set(0),
                system_code: Set(Some(system_code(role))),
                is_system_account: Set(true),
                is_active: Set(true),
                is_deleted: Set(false),
                created_by: Set(scope.actor_id()),
                created_at: Set(now),
                updated_at: Set(now),
            });
        }
        accounts::Entity::insert_many(system_accounts)
            .on_conflict(
                OnConflict::columns([accounts::Column::TenantId, accounts::Column::SystemCode])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(ledger_db)?;
        let by_system_code: HashMap<String, Uuid> = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id))
            .filter(accounts::Column::SystemCode.starts_with(SYSTEM_CODE_PREFIX))
            .all(txn)
            .await
            .map_err(ledger_db)?
            .into_iter()
            .filter_map(|account| account.system_code.map(|code| (code, account.id)))
            .collect();

        let keys: HashMap<String, Uuid> = account_configuration_keys::Entity::find()
            .all(txn)
            .await
            .map_err(ledger_db)?
            .into_iter()
            .map(|key| (key.code, key.id))
            .collect();

        let mut bindings = Vec::with_capacity(AccountRole::ALL.len());
        for role in AccountRole::ALL {
            let (Some(&key_id), Some(&account_id)) =
                (keys.get(role.code()), by_system_code.get(&system_code(role)))
            else {
                continue;
            };
            bindings.push(account_configurations::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                key_id: Set(key_id),
                account_id: Set(account_id),
                created_by: Set(scope.actor_id()),
                created_at: Set(now),
                updated_at: Set(now),
            });
        }
        account_configurations::Entity::insert_many(bindings)
            .on_conflict(
                OnConflict::columns([
                    account_configurations::Column::TenantId,
                    account_configurations::Column::KeyId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(ledger_db)?;

        let key_codes: HashMap<Uuid, String> =
            keys.into_iter().map(|(code, id)| (id, code)).collect();
        let role_accounts: HashMap<AccountRole, Uuid> = account_configurations::Entity::find()
            .filter(account_configurations::Column::TenantId.eq(tenant_id))
            .all(txn)
            .await
            .map_err(ledger_db)?
            .into_iter()
            .filter_map(|mapping| {
                let role = AccountRole::from_code(key_codes.get(&mapping.key_id)?)?;
                Some((role, mapping.account_id))
            })
            .collect();

        let types = VOUCHER_TYPES.into_iter().map(|(code, name)| voucher_types::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            prefix: Set(code.to_string()),
            next_number: Set(1),
            is_active: Set(true),
            created_at: Set(now),
        });
        voucher_types::Entity::insert_many(types)
            .on_conflict(
                OnConflict::columns([voucher_types::Column::TenantId, voucher_types::Column::Code])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(ledger_db)?;
        let voucher_types: HashMap<String, Uuid> = voucher_types::Entity::find()
            .filter(voucher_types::Column::TenantId.eq(tenant_id))
            .all(txn)
            .await
            .map_err(ledger_db)?
            .into_iter()
            .map(|voucher_type| (voucher_type.code, voucher_type.id))
            .collect();

        scope.commit().await.map_err(ledger_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            groups = groups.len(),
            roles = role_accounts.len(),
            voucher_types = voucher_types.len(),
            "Tenant bootstrapped"
        );
        Ok(TenantBootstrap {
            groups,
            role_accounts,
            voucher_types,
        })
    }
}

const SYSTEM_CODE_PREFIX: &str = "ROLE_";

fn system_code(role: AccountRole) -> String {
    format!("{SYSTEM_CODE_PREFIX}{}", role.code())
}
