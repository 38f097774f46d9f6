//! Voucher repository: the persistence side of the posting engine.
//!
//! Posting runs inside one tenant-scoped transaction:
//! 1. Validate leg amounts and balance (nothing touched yet)
//! 2. Lock the voucher type counter row
//! 3. Resolve every distinct account reference once
//! 4. Lock the touched accounts in id order
//! 5. Resolve lines, plan running balances, number the voucher
//! 6. Insert voucher, lines and ledger rows, write balances back
//!
//! Account locks are always taken in ascending id order so two postings
//! over the same accounts queue instead of deadlocking.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use hisaab_core::ledger::{
    AccountInfo, AccountRef, AccountState, ConfigurationError, DocumentReference, LedgerError,
    LedgerService, PostingLeg, ResolvedLine, ReversalService, ReversibleVoucher, VoucherDraft,
    format_voucher_number, plan_balances,
};
use hisaab_core::posting::{self, BusinessEvent, EventAmounts, EventKind};
use hisaab_shared::types::foreign_from_base;
use hisaab_shared::{LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::account_config::resolve_key;
use super::ledger_db;
use super::party_account::party_account;
use crate::entities::{accounts, ledgers, voucher_lines, voucher_types, vouchers};
use crate::rls::TenantScope;

/// A voucher with its lines and ledger rows, both in line order.
#[derive(Debug, Clone)]
pub struct PostedVoucher {
    /// Voucher header.
    pub voucher: vouchers::Model,
    /// Lines ordered by `line_no`.
    pub lines: Vec<voucher_lines::Model>,
    /// One ledger row per line, same order.
    pub ledgers: Vec<ledgers::Model>,
}

impl PostedVoucher {
    /// Voucher id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.voucher.id
    }

    /// Sum of line debits.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|line| line.debit_base).sum()
    }

    /// Sum of line credits.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|line| line.credit_base).sum()
    }
}

/// Voucher repository.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl VoucherRepository {
    /// Creates a new voucher repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Posts a voucher draft.
    ///
    /// The caller links the returned voucher id onto its own document.
    ///
    /// # Errors
    ///
    /// - `Unbalanced`, `InsufficientLegs`, `ZeroAmount`, `NegativeAmount` for bad drafts
    /// - `Configuration` for a missing voucher type, role binding or account group
    /// - `AccountNotFound`, `PartyNotFound`, `AccountInactive` during resolution
    pub async fn post_transaction(
        &self,
        ctx: &TenantContext,
        draft: &VoucherDraft,
    ) -> Result<PostedVoucher, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let posted = post_draft(&scope, &self.settings, draft).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(posted)
    }

    /// Expands a business event through its template and posts it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::post_transaction`], plus `MissingParty` for party rules
    /// without a party.
    pub async fn post_event(
        &self,
        ctx: &TenantContext,
        event: &BusinessEvent,
    ) -> Result<PostedVoucher, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let posted = post_event(&scope, &self.settings, event).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(posted)
    }

    /// Posts the mirror image of a voucher and links the two.
    ///
    /// # Errors
    ///
    /// `VoucherNotFound`, `AlreadyReversed`, `CannotReverseReversal`, or any
    /// posting error.
    pub async fn reverse_voucher(
        &self,
        ctx: &TenantContext,
        voucher_id: Uuid,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<PostedVoucher, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let posted = reverse(&scope, &self.settings, voucher_id, reversal_date, reason).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(posted)
    }

    /// Posts a waste write-off (Dr waste expense, Cr inventory).
    ///
    /// Waste tracking must never block inventory operations: when the tenant
    /// has no accounts for it the posting is skipped with a warning and
    /// `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Any posting error other than `Configuration`.
    pub async fn post_waste_write_off(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
        amount: Decimal,
        reference: DocumentReference,
        narration: Option<String>,
    ) -> Result<Option<PostedVoucher>, LedgerError> {
        let mut event = BusinessEvent::new(
            EventKind::WasteWriteOff,
            date,
            reference,
            &self.settings.base_currency,
            EventAmounts {
                total: amount,
                ..EventAmounts::default()
            },
        );
        event.narration = narration;

        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        match post_event(&scope, &self.settings, &event).await {
            Ok(posted) => {
                scope.commit().await.map_err(ledger_db)?;
                Ok(Some(posted))
            }
            Err(LedgerError::Configuration(err)) => {
                scope.rollback().await.map_err(ledger_db)?;
                warn!(
                    tenant_id = %ctx.tenant_id,
                    amount = %amount,
                    error = %err,
                    "Waste write-off not posted"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Loads a voucher with its lines and ledger rows.
    ///
    /// # Errors
    ///
    /// `VoucherNotFound` if the voucher does not exist for the tenant.
    pub async fn get_voucher(
        &self,
        ctx: &TenantContext,
        voucher_id: Uuid,
    ) -> Result<PostedVoucher, LedgerError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(ledger_db)?;
        let voucher = vouchers::Entity::find_by_id(voucher_id)
            .filter(vouchers::Column::TenantId.eq(scope.tenant_id()))
            .one(scope.txn())
            .await
            .map_err(ledger_db)?
            .ok_or(LedgerError::VoucherNotFound(voucher_id))?;
        let posted = load_posted(scope.txn(), voucher).await?;
        scope.commit().await.map_err(ledger_db)?;
        Ok(posted)
    }
}

/// Expands and posts `event` inside `scope`.
pub(crate) async fn post_event(
    scope: &TenantScope,
    settings: &LedgerSettings,
    event: &BusinessEvent,
) -> Result<PostedVoucher, LedgerError> {
    let draft = posting::expand(event)?;
    post_draft(scope, settings, &draft).await
}

/// Posts `draft` inside `scope`.
pub(crate) async fn post_draft(
    scope: &TenantScope,
    settings: &LedgerSettings,
    draft: &VoucherDraft,
) -> Result<PostedVoucher, LedgerError> {
    insert_voucher(scope, settings, draft, None).await
}

/// Reverses `voucher_id` inside `scope`.
pub(crate) async fn reverse(
    scope: &TenantScope,
    settings: &LedgerSettings,
    voucher_id: Uuid,
    reversal_date: NaiveDate,
    reason: Option<&str>,
) -> Result<PostedVoucher, LedgerError> {
    let txn = scope.txn();
    let original = vouchers::Entity::find_by_id(voucher_id)
        .filter(vouchers::Column::TenantId.eq(scope.tenant_id()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or(LedgerError::VoucherNotFound(voucher_id))?;

    let voucher_type = voucher_types::Entity::find_by_id(original.voucher_type_id)
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or_else(|| ConfigurationError::VoucherTypeMissing(original.voucher_type_id.to_string()))?;

    let lines = voucher_lines::Entity::find()
        .filter(voucher_lines::Column::VoucherId.eq(original.id))
        .order_by_asc(voucher_lines::Column::LineNo)
        .all(txn)
        .await
        .map_err(ledger_db)?;

    let reversible = ReversibleVoucher {
        id: original.id,
        voucher_number: original.voucher_number.clone(),
        voucher_type_code: voucher_type.code,
        reference: DocumentReference {
            reference_type: original.reference_type.clone(),
            reference_id: original.reference_id,
            reference_number: original.reference_number.clone(),
        },
        currency: original.currency.clone(),
        exchange_rate: original.exchange_rate,
        is_reversal: original.is_reversal,
        reversal_voucher_id: original.reversal_voucher_id,
        lines: lines
            .into_iter()
            .map(|line| ResolvedLine {
                line_no: line.line_no,
                account_id: line.account_id,
                debit: line.debit_base,
                credit: line.credit_base,
                description: line.description,
                tax_amount: line.tax_amount_base,
            })
            .collect(),
    };

    let draft = ReversalService::build_reversal(&reversible, reversal_date, reason)?;
    let posted = insert_voucher(scope, settings, &draft, Some(original.id)).await?;

    let original_number = original.voucher_number.clone();
    let mut active: vouchers::ActiveModel = original.into();
    active.reversal_voucher_id = Set(Some(posted.voucher.id));
    active.update(txn).await.map_err(ledger_db)?;

    info!(
        tenant_id = %scope.tenant_id(),
        voucher_number = %original_number,
        reversal_number = %posted.voucher.voucher_number,
        "Voucher reversed"
    );
    Ok(posted)
}

/// Reverses every voucher referencing `reference_id` that is not already
/// reversed, oldest first.
pub(crate) async fn reverse_all_for(
    scope: &TenantScope,
    settings: &LedgerSettings,
    reference_id: Uuid,
    reversal_date: NaiveDate,
    reason: Option<&str>,
) -> Result<Vec<PostedVoucher>, LedgerError> {
    let open = vouchers::Entity::find()
        .filter(vouchers::Column::TenantId.eq(scope.tenant_id()))
        .filter(vouchers::Column::ReferenceId.eq(reference_id))
        .filter(vouchers::Column::IsReversal.eq(false))
        .filter(vouchers::Column::ReversalVoucherId.is_null())
        .order_by_asc(vouchers::Column::CreatedAt)
        .order_by_asc(vouchers::Column::VoucherNumber)
        .all(scope.txn())
        .await
        .map_err(ledger_db)?;

    let mut reversals = Vec::with_capacity(open.len());
    for voucher in open {
        reversals.push(reverse(scope, settings, voucher.id, reversal_date, reason).await?);
    }
    Ok(reversals)
}

async fn insert_voucher(
    scope: &TenantScope,
    settings: &LedgerSettings,
    draft: &VoucherDraft,
    reverses: Option<Uuid>,
) -> Result<PostedVoucher, LedgerError> {
    let txn = scope.txn();
    let tenant_id = scope.tenant_id();

    // Fail fast on malformed drafts before taking any lock.
    LedgerService::validate_legs(draft)?;

    let voucher_type = voucher_types::Entity::find()
        .filter(voucher_types::Column::TenantId.eq(tenant_id))
        .filter(voucher_types::Column::Code.eq(draft.voucher_type_code.as_str()))
        .filter(voucher_types::Column::IsActive.eq(true))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ledger_db)?
        .ok_or_else(|| ConfigurationError::VoucherTypeMissing(draft.voucher_type_code.clone()))?;

    let refs = resolve_refs(scope, &draft.legs).await?;
    let mut locked = lock_accounts(txn, tenant_id, refs.values().copied()).await?;

    let (lines, totals) = LedgerService::validate_and_resolve(draft, |account_ref| {
        let account_id = refs
            .get(account_ref)
            .copied()
            .ok_or_else(|| LedgerError::Database(format!("unresolved {account_ref}")))?;
        let account = locked
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        Ok(AccountInfo {
            id: account.id,
            account_type: account.account_type.into(),
            is_active: account.is_active,
        })
    })?;

    let states: HashMap<Uuid, AccountState> = locked
        .values()
        .map(|account| {
            (
                account.id,
                AccountState {
                    account_type: account.account_type.into(),
                    current_balance: account.current_balance,
                    ledger_version: account.ledger_version,
                },
            )
        })
        .collect();
    let plan = plan_balances(&lines, &states).map_err(LedgerError::AccountNotFound)?;

    let sequence = voucher_type.next_number;
    let voucher_number =
        format_voucher_number(&voucher_type.prefix, sequence, settings.voucher_number_width);
    let voucher_type_id = voucher_type.id;
    let mut counter: voucher_types::ActiveModel = voucher_type.into();
    counter.next_number = Set(sequence + 1);
    counter.update(txn).await.map_err(ledger_db)?;

    let now = Utc::now().into();
    let voucher = vouchers::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        voucher_type_id: Set(voucher_type_id),
        voucher_number: Set(voucher_number),
        voucher_date: Set(draft.voucher_date),
        currency: Set(draft.currency.clone()),
        exchange_rate: Set(draft.exchange_rate),
        total_amount_base: Set(totals.total_debit),
        total_amount_foreign: Set(foreign_from_base(
            totals.total_debit,
            draft.exchange_rate,
        )),
        reference_type: Set(draft.reference.reference_type.clone()),
        reference_id: Set(draft.reference.reference_id),
        reference_number: Set(draft.reference.reference_number.clone()),
        narration: Set(draft.narration.clone()),
        is_posted: Set(true),
        is_reversal: Set(reverses.is_some()),
        reversed_voucher_id: Set(reverses),
        reversal_voucher_id: Set(None),
        created_by: Set(scope.actor_id()),
        created_at: Set(now),
    }
    .insert(txn)
    .await
    .map_err(ledger_db)?;

    let mut line_rows = Vec::with_capacity(lines.len());
    let mut ledger_rows = Vec::with_capacity(lines.len());
    for (line, snapshot) in lines.iter().zip(&plan.line_balances) {
        let line_row = voucher_lines::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            voucher_id: Set(voucher.id),
            line_no: Set(line.line_no),
            account_id: Set(line.account_id),
            debit_base: Set(line.debit),
            credit_base: Set(line.credit),
            description: Set(line.description.clone()),
            tax_amount_base: Set(line.tax_amount),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(ledger_db)?;

        let ledger_row = ledgers::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            account_id: Set(line.account_id),
            voucher_id: Set(voucher.id),
            voucher_line_id: Set(line_row.id),
            transaction_date: Set(draft.voucher_date),
            debit_amount: Set(line.debit),
            credit_amount: Set(line.credit),
            account_version: Set(snapshot.account_version),
            previous_balance: Set(snapshot.previous_balance),
            balance: Set(snapshot.current_balance),
            narration: Set(line.description.clone().or_else(|| draft.narration.clone())),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(ledger_db)?;

        line_rows.push(line_row);
        ledger_rows.push(ledger_row);
    }

    let mut touched: Vec<Uuid> = plan.final_balances.keys().copied().collect();
    touched.sort_unstable();
    for account_id in touched {
        let (Some(account), Some(last)) =
            (locked.remove(&account_id), plan.final_balances.get(&account_id))
        else {
            return Err(LedgerError::AccountNotFound(account_id));
        };
        let mut active: accounts::ActiveModel = account.into();
        active.current_balance = Set(last.current_balance);
        active.ledger_version = Set(last.account_version);
        active.updated_at = Set(now);
        active.update(txn).await.map_err(ledger_db)?;
    }

    info!(
        tenant_id = %tenant_id,
        voucher_number = %voucher.voucher_number,
        reference_type = %voucher.reference_type,
        total = %voucher.total_amount_base,
        lines = line_rows.len(),
        "Voucher posted"
    );

    Ok(PostedVoucher {
        voucher,
        lines: line_rows,
        ledgers: ledger_rows,
    })
}

/// Resolves each distinct account reference of `legs` exactly once.
async fn resolve_refs(
    scope: &TenantScope,
    legs: &[PostingLeg],
) -> Result<HashMap<AccountRef, Uuid>, LedgerError> {
    let distinct = LedgerService::distinct_accounts(legs);
    let mut resolved = HashMap::with_capacity(distinct.len());
    for account_ref in distinct {
        let account_id = match account_ref {
            AccountRef::Role(role) => resolve_key(scope.txn(), scope.tenant_id(), role.code()).await?,
            AccountRef::Party(party) => party_account(scope, party).await?,
            AccountRef::Account(id) => id,
        };
        resolved.insert(account_ref, account_id);
    }
    Ok(resolved)
}

/// Locks accounts `FOR UPDATE` in ascending id order.
async fn lock_accounts(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, accounts::Model>, LedgerError> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();

    let rows = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant_id))
        .filter(accounts::Column::Id.is_in(ids))
        .filter(accounts::Column::IsDeleted.eq(false))
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(ledger_db)?;

    Ok(rows.into_iter().map(|account| (account.id, account)).collect())
}

/// Loads lines and ledger rows of `voucher` in line order.
pub(crate) async fn load_posted(
    txn: &DatabaseTransaction,
    voucher: vouchers::Model,
) -> Result<PostedVoucher, LedgerError> {
    let lines = voucher_lines::Entity::find()
        .filter(voucher_lines::Column::VoucherId.eq(voucher.id))
        .order_by_asc(voucher_lines::Column::LineNo)
        .all(txn)
        .await
        .map_err(ledger_db)?;

    let line_order: HashMap<Uuid, i32> = lines.iter().map(|line| (line.id, line.line_no)).collect();
    let mut ledger_rows = ledgers::Entity::find()
        .filter(ledgers::Column::VoucherId.eq(voucher.id))
        .all(txn)
        .await
        .map_err(ledger_db)?;
    ledger_rows.sort_by_key(|row| line_order.get(&row.voucher_line_id).copied().unwrap_or(i32::MAX));

    Ok(PostedVoucher {
        voucher,
        lines,
        ledgers: ledger_rows,
    })
}
