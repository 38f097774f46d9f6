//! Shared setup for the database integration tests.
//!
//! Every test runs against its own freshly bootstrapped tenant, so tests can
//! share one database and run in parallel without cleanup.

#![allow(dead_code)]

use std::env;

use chrono::NaiveDate;
use hisaab_core::document::InvoiceKind;
use hisaab_core::ledger::AccountType;
use hisaab_core::party::PartyType;
use hisaab_db::entities::{accounts, ledgers};
use hisaab_db::migration::{Migrator, MigratorTrait};
use hisaab_db::repositories::{InvoiceInput, TenantBootstrap};
use hisaab_db::{InvoiceRepository, PartyAccountRepository, TenantSetupRepository};
use hisaab_shared::types::{TenantId, UserId};
use hisaab_shared::{LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn database_url() -> Option<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("HISAAB__DATABASE__URL"))
        .ok()
}

/// Connects and migrates once per test binary. `None` skips the test.
pub async fn connect() -> Option<DatabaseConnection> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test - DATABASE_URL not set");
        return None;
    };
    let db = match Database::connect(&url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {e}");
            return None;
        }
    };
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match Migrator::up(&db, None).await {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("Migration failed: {e}");
                    false
                }
            }
        })
        .await;
    migrated.then_some(db)
}

pub fn settings() -> LedgerSettings {
    LedgerSettings::default()
}

/// A fresh tenant with a fresh actor.
pub fn tenant() -> TenantContext {
    TenantContext::new(TenantId::new(), UserId::new())
}

/// A fresh bootstrapped tenant.
pub async fn bootstrapped(db: &DatabaseConnection) -> (TenantContext, TenantBootstrap) {
    let ctx = tenant();
    let setup = TenantSetupRepository::new(db.clone())
        .bootstrap(&ctx)
        .await
        .expect("bootstrap failed");
    (ctx, setup)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn party(db: &DatabaseConnection, ctx: &TenantContext, party_type: PartyType) -> Uuid {
    PartyAccountRepository::new(db.clone())
        .create_party(ctx, party_type, &format!("{party_type} {}", Uuid::new_v4()))
        .await
        .expect("create party failed")
        .id
}

/// Creates and posts a sales invoice: `subtotal` at 18% intrastate GST.
pub async fn posted_sales_invoice(
    db: &DatabaseConnection,
    ctx: &TenantContext,
    customer_id: Uuid,
    number: &str,
    subtotal: Decimal,
) -> hisaab_db::entities::invoices::Model {
    let repo = InvoiceRepository::new(db.clone(), settings());
    let draft = repo
        .create(
            ctx,
            InvoiceKind::Sales,
            InvoiceInput::new(number, customer_id, date(2026, 4, 1), subtotal, Decimal::from(18)),
        )
        .await
        .expect("create invoice failed");
    repo.post(ctx, draft.id).await.expect("post invoice failed").0
}

pub async fn account(db: &DatabaseConnection, account_id: Uuid) -> accounts::Model {
    accounts::Entity::find_by_id(account_id)
        .one(db)
        .await
        .unwrap()
        .expect("account missing")
}

/// Ledger rows of an account in version order.
pub async fn ledger_rows(db: &DatabaseConnection, account_id: Uuid) -> Vec<ledgers::Model> {
    ledgers::Entity::find()
        .filter(ledgers::Column::AccountId.eq(account_id))
        .order_by_asc(ledgers::Column::AccountVersion)
        .all(db)
        .await
        .unwrap()
}

/// Asserts that an account's versions are gapless from 1, every row chains
/// onto the previous one and the cached balance matches the last row.
pub async fn assert_ledger_consistent(db: &DatabaseConnection, account_id: Uuid) {
    let account = account(db, account_id).await;
    let account_type: AccountType = account.account_type.into();
    let rows = ledger_rows(db, account_id).await;

    let mut balance = account.opening_balance;
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.account_version, index as i64 + 1, "version gap on {}", account.code);
        assert_eq!(row.previous_balance, balance, "broken chain on {}", account.code);
        balance += account_type.calculate_balance_change(row.debit_amount, row.credit_amount);
        assert_eq!(row.balance, balance, "wrong running balance on {}", account.code);
    }
    assert_eq!(account.current_balance, balance);
    assert_eq!(account.ledger_version, rows.len() as i64);
}
