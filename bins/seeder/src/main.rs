//! Demo tenant seeder for Hisaab development and testing.
//!
//! Bootstraps a demo tenant (account groups, system accounts, voucher types
//! and role bindings), then books a small set of documents against it: a
//! sales invoice settled by a cash receipt, a purchase invoice, a patient
//! advance and a waste write-off.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use hisaab_core::document::InvoiceKind;
use hisaab_core::ledger::DocumentReference;
use hisaab_core::party::{PartyRef, PartyType};
use hisaab_core::payment::{AllocationRequest, PaymentMode, PaymentType};
use hisaab_db::entities::invoices;
use hisaab_db::repositories::{CreatePaymentInput, InvoiceInput, PaymentDetailInput};
use hisaab_db::{
    AccountConfigRepository, InvoiceRepository, PartyAccountRepository, PaymentRepository,
    TenantSetupRepository, VoucherRepository,
};
use hisaab_shared::types::{TenantId, UserId};
use hisaab_shared::{AppConfig, LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo tenant id (stable across runs).
const DEMO_TENANT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Demo actor id (stable across runs).
const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);

/// Number of the first seeded invoice; its presence means the documents exist.
const FIRST_INVOICE: &str = "DEMO-SI-0001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hisaab=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = hisaab_db::connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let keys = AccountConfigRepository::new(db.clone())
        .ensure_catalog()
        .await?;
    info!(created = keys, "Account configuration catalog ready");

    let ctx = TenantContext::new(
        TenantId::from_uuid(DEMO_TENANT_ID),
        UserId::from_uuid(DEMO_USER_ID),
    );
    let setup = TenantSetupRepository::new(db.clone()).bootstrap(&ctx).await?;
    info!(
        tenant_id = %ctx.tenant_id,
        roles = setup.role_accounts.len(),
        "Demo tenant ready"
    );

    seed_documents(&db, &ctx, &config.ledger).await?;

    info!("Seeding complete");
    Ok(())
}

fn day(d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 4, d).context("invalid seed date")
}

/// Books the demo documents unless a previous run already did.
async fn seed_documents(
    db: &DatabaseConnection,
    ctx: &TenantContext,
    settings: &LedgerSettings,
) -> anyhow::Result<()> {
    let parties = PartyAccountRepository::new(db.clone());
    let documents = InvoiceRepository::new(db.clone(), settings.clone());
    let payments = PaymentRepository::new(db.clone(), settings.clone());
    let vouchers = VoucherRepository::new(db.clone(), settings.clone());

    let seeded = invoices::Entity::find()
        .filter(invoices::Column::TenantId.eq(ctx.tenant_id.into_inner()))
        .filter(invoices::Column::InvoiceNumber.eq(FIRST_INVOICE))
        .one(db)
        .await?;
    if seeded.is_some() {
        info!("Demo documents already seeded, skipping");
        return Ok(());
    }

    let customer = parties
        .create_party(ctx, PartyType::Customer, "Sharma Traders")
        .await?;
    let sale = documents
        .create(
            ctx,
            InvoiceKind::Sales,
            InvoiceInput::new(
                FIRST_INVOICE,
                customer.id,
                day(1)?,
                Decimal::new(10_000, 0),
                Decimal::from(18),
            ),
        )
        .await?;
    let (sale, _) = documents.post(ctx, sale.id).await?;
    info!(invoice = %sale.invoice_number, total = %sale.total_amount, "Seeded sales invoice");

    let receipt = payments
        .create_invoice_payment(
            ctx,
            CreatePaymentInput::new(
                "DEMO-RCPT-0001",
                PaymentType::Receipt,
                day(5)?,
                Some(PartyRef::new(PartyType::Customer, customer.id)),
                vec![PaymentDetailInput::new(PaymentMode::Cash, sale.total_amount)],
            ),
            &[AllocationRequest::new(InvoiceKind::Sales, sale.id, sale.total_amount)],
        )
        .await?;
    info!(payment = %receipt.payment.payment_number, "Seeded cash receipt");

    let supplier = parties
        .create_party(ctx, PartyType::Supplier, "Gupta Pharma Distributors")
        .await?;
    let purchase = documents
        .create(
            ctx,
            InvoiceKind::Purchase,
            InvoiceInput::new(
                "DEMO-PI-0001",
                supplier.id,
                day(2)?,
                Decimal::new(4_000, 0),
                Decimal::from(12),
            )
            .interstate(),
        )
        .await?;
    let (purchase, _) = documents.post(ctx, purchase.id).await?;
    info!(
        invoice = %purchase.invoice_number,
        total = %purchase.total_amount,
        "Seeded purchase invoice"
    );

    let patient = parties
        .create_party(ctx, PartyType::Patient, "Walk-in Patient")
        .await?;
    let advance = payments
        .create_advance_payment(
            ctx,
            CreatePaymentInput::new(
                "DEMO-ADV-0001",
                PaymentType::Receipt,
                day(3)?,
                Some(PartyRef::new(PartyType::Patient, patient.id)),
                vec![PaymentDetailInput::new(PaymentMode::Cash, Decimal::new(1_500, 0))],
            ),
        )
        .await?;
    info!(payment = %advance.payment.payment_number, "Seeded patient advance");

    let waste = vouchers
        .post_waste_write_off(
            ctx,
            day(6)?,
            Decimal::new(25_050, 2),
            DocumentReference::manual("WASTE"),
            Some("Expired stock".to_string()),
        )
        .await?;
    info!(posted = waste.is_some(), "Seeded waste write-off");

    Ok(())
}
