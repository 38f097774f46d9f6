//! Payment repository.
//!
//! Implements the payment state machine on top of the posting engine:
//!
//! - `create` stores a DRAFT payment without a voucher
//! - `create_invoice_payment` / `create_advance_payment` post immediately for
//!   offline instruments and wait for the gateway callback for online ones
//! - `allocate` locks the payment row, then the target invoices in id order,
//!   validates the whole batch and writes it in one transaction
//! - `cancel` and `reverse` post reversal vouchers and unwind invoice paid amounts

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use hisaab_core::document::InvoiceKind;
use hisaab_core::ledger::{DocumentReference, LedgerError};
use hisaab_core::party::PartyRef;
use hisaab_core::payment::{
    AllocationPlan, AllocationPlanner, AllocationRequest, DocumentBalance, GatewayOutcome,
    GatewayStatus, PaymentError, PaymentLifecycle, PaymentMode, PaymentSnapshot, PaymentStatus,
    PaymentType,
};
use hisaab_core::posting::{BusinessEvent, EventAmounts, InstrumentLeg};
use hisaab_shared::types::{foreign_from_base, round_money};
use hisaab_shared::{LedgerSettings, TenantContext};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use super::invoice::{apply_paid_delta, pending_allocations};
use super::voucher::{PostedVoucher, load_posted, post_event, reverse_all_for};
use super::{is_unique_violation, payment_db};
use crate::entities::sea_orm_active_enums::{
    PartyType as DbPartyType, PaymentStatus as DbPaymentStatus,
};
use crate::entities::{invoices, parties, payment_allocations, payment_details, payments, vouchers};
use crate::rls::TenantScope;

/// Suffix of the payment number given to a refund payment.
const REFUND_SUFFIX: &str = "-REF";

/// One instrument line of a payment.
#[derive(Debug, Clone)]
pub struct PaymentDetailInput {
    /// Instrument mode.
    pub payment_mode: PaymentMode,
    /// Amount in base currency.
    pub amount: Decimal,
    /// Bank name for cheques and transfers.
    pub bank_name: Option<String>,
    /// Cheque or transfer number.
    pub instrument_number: Option<String>,
    /// Cheque date.
    pub instrument_date: Option<NaiveDate>,
    /// Gateway transaction id, when already known.
    pub gateway_transaction_id: Option<String>,
}

impl PaymentDetailInput {
    /// Creates a detail line with no instrument metadata.
    #[must_use]
    pub const fn new(payment_mode: PaymentMode, amount: Decimal) -> Self {
        Self {
            payment_mode,
            amount,
            bank_name: None,
            instrument_number: None,
            instrument_date: None,
            gateway_transaction_id: None,
        }
    }

    /// Sets the instrument number.
    #[must_use]
    pub fn with_instrument(mut self, instrument_number: impl Into<String>) -> Self {
        self.instrument_number = Some(instrument_number.into());
        self
    }
}

/// Header and details of a new or replaced payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    /// Payment number, unique per tenant.
    pub payment_number: String,
    /// Receipt, payment or contra.
    pub payment_type: PaymentType,
    /// Payment date (voucher date).
    pub payment_date: NaiveDate,
    /// Counterparty.
    pub party: Option<PartyRef>,
    /// Payment currency; base currency when `None`.
    pub currency: Option<String>,
    /// Units of base currency per unit of `currency`.
    pub exchange_rate: Decimal,
    /// TDS withheld, in base currency.
    pub tds_amount: Decimal,
    /// Narration.
    pub narration: Option<String>,
    /// Instrument lines.
    pub details: Vec<PaymentDetailInput>,
}

impl CreatePaymentInput {
    /// Creates a base-currency input without TDS.
    #[must_use]
    pub fn new(
        payment_number: impl Into<String>,
        payment_type: PaymentType,
        payment_date: NaiveDate,
        party: Option<PartyRef>,
        details: Vec<PaymentDetailInput>,
    ) -> Self {
        Self {
            payment_number: payment_number.into(),
            payment_type,
            payment_date,
            party,
            currency: None,
            exchange_rate: Decimal::ONE,
            tds_amount: Decimal::ZERO,
            narration: None,
            details,
        }
    }

    /// Sets the TDS amount.
    #[must_use]
    pub const fn with_tds(mut self, tds_amount: Decimal) -> Self {
        self.tds_amount = tds_amount;
        self
    }

    /// Sets currency and exchange rate.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>, exchange_rate: Decimal) -> Self {
        self.currency = Some(currency.into());
        self.exchange_rate = exchange_rate;
        self
    }

    /// Sets the narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }
}

/// A gateway callback.
#[derive(Debug, Clone)]
pub struct GatewayConfirmation {
    /// Gateway transaction id.
    pub gateway_transaction_id: Option<String>,
    /// Raw gateway status (`SUCCESS`, `FAILED`, anything else is pending).
    pub gateway_status: String,
    /// Fee charged by the gateway.
    pub gateway_fee: Option<Decimal>,
}

/// A payment with its details, allocations and voucher.
#[derive(Debug, Clone)]
pub struct PaymentWithDetails {
    /// Payment header.
    pub payment: payments::Model,
    /// Instrument lines ordered by `line_no`.
    pub details: Vec<payment_details::Model>,
    /// Allocations, oldest first.
    pub allocations: Vec<payment_allocations::Model>,
    /// Posted voucher, if any.
    pub voucher: Option<PostedVoucher>,
}

/// Result of an allocation batch.
#[derive(Debug, Clone)]
pub struct AllocationResult {
    /// Payment after the batch.
    pub payment: payments::Model,
    /// Allocation rows written by the batch.
    pub allocations: Vec<payment_allocations::Model>,
    /// Advance-applied voucher, for advance payments.
    pub voucher: Option<PostedVoucher>,
}

/// Result of a payment reversal.
#[derive(Debug, Clone)]
pub struct PaymentReversal {
    /// Original payment, now linked to its refund.
    pub original: payments::Model,
    /// Refund payment.
    pub refund: payments::Model,
    /// Reversal vouchers, oldest original first.
    pub vouchers: Vec<PostedVoucher>,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
    settings: LedgerSettings,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    /// Stores a DRAFT payment with its details. No voucher is posted; the
    /// payment is posted by [`Self::confirm_gateway_payment`].
    ///
    /// # Errors
    ///
    /// `Duplicate` for a used payment number, `NoDetails`/`InvalidAmount` for
    /// bad input.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: CreatePaymentInput,
    ) -> Result<PaymentWithDetails, PaymentError> {
        let total = validate_input(&input, false)?;
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;

        let payment = self
            .insert_payment(&scope, &input, total, false)
            .await?;
        let details = insert_details(&scope, payment.id, &input.details).await?;

        scope.commit().await.map_err(payment_db)?;
        log_created(ctx, &payment);
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations: Vec::new(),
            voucher: None,
        })
    }

    /// Creates a payment against invoices.
    ///
    /// The allocation batch is validated against the new payment before
    /// anything is written. Offline instruments post the voucher and update
    /// the invoices at once; online ones leave the payment DRAFT with its
    /// allocations recorded until the gateway confirms.
    ///
    /// # Errors
    ///
    /// Input, allocation and posting errors; nothing is written on failure.
    pub async fn create_invoice_payment(
        &self,
        ctx: &TenantContext,
        input: CreatePaymentInput,
        allocations: &[AllocationRequest],
    ) -> Result<PaymentWithDetails, PaymentError> {
        let total = validate_input(&input, false)?;
        let modes: Vec<PaymentMode> = input.details.iter().map(|d| d.payment_mode).collect();
        let status = PaymentLifecycle::initial_status(&modes);

        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let snapshot = PaymentSnapshot {
            id: Uuid::nil(),
            status,
            payment_type: input.payment_type,
            party: input.party,
            total_amount: total,
            allocated_amount: Decimal::ZERO,
            unallocated_amount: total,
        };
        let documents = lock_invoices(txn, scope.tenant_id(), allocations).await?;
        let reserved = reserved_for(txn, scope.tenant_id(), &documents, None).await?;
        let plan = AllocationPlanner::plan_lines(&snapshot, allocations, &HashSet::new(), |kind, id| {
            document_balance(&documents, &reserved, kind, id)
        })?;

        let mut payment = self
            .insert_payment(&scope, &input, total, false)
            .await?;
        let details = insert_details(&scope, payment.id, &input.details).await?;
        let rows = insert_allocations(&scope, payment.id, &plan, input.payment_date).await?;

        let mut active: payments::ActiveModel = payment.into();
        active.allocated_amount_base = Set(plan.allocated_after);
        active.unallocated_amount_base = Set(plan.unallocated_after);
        payment = active.update(txn).await.map_err(payment_db)?;

        let voucher = if status == PaymentStatus::Posted {
            let (posted, voucher) = self
                .post_payment(&scope, payment, &details, &rows, false)
                .await?;
            payment = posted;
            Some(voucher)
        } else {
            None
        };

        scope.commit().await.map_err(payment_db)?;
        log_created(ctx, &payment);
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations: rows,
            voucher,
        })
    }

    /// Creates an advance payment, posted to the party's advance account.
    ///
    /// # Errors
    ///
    /// Input and posting errors. Advances need a party and carry no TDS.
    pub async fn create_advance_payment(
        &self,
        ctx: &TenantContext,
        input: CreatePaymentInput,
    ) -> Result<PaymentWithDetails, PaymentError> {
        let total = validate_input(&input, true)?;
        let modes: Vec<PaymentMode> = input.details.iter().map(|d| d.payment_mode).collect();
        let status = PaymentLifecycle::initial_status(&modes);

        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let mut payment = self
            .insert_payment(&scope, &input, total, true)
            .await?;
        let details = insert_details(&scope, payment.id, &input.details).await?;

        let voucher = if status == PaymentStatus::Posted {
            let (posted, voucher) = self
                .post_payment(&scope, payment, &details, &[], true)
                .await?;
            payment = posted;
            Some(voucher)
        } else {
            None
        };

        scope.commit().await.map_err(payment_db)?;
        log_created(ctx, &payment);
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations: Vec::new(),
            voucher,
        })
    }

    /// Handles a gateway callback for a DRAFT payment.
    ///
    /// Gateway fields are recorded on the online detail lines either way. On
    /// `SUCCESS` the payment is posted: against its invoices if it has
    /// allocations, as an advance otherwise. The allocations recorded at
    /// creation are validated again against the locked invoices first, and
    /// a payment whose allocations no longer fit is not posted.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the payment is DRAFT, `OverAllocation` or
    /// `Document` when a stored allocation no longer fits, plus posting errors.
    pub async fn confirm_gateway_payment(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
        confirmation: GatewayConfirmation,
    ) -> Result<PaymentWithDetails, PaymentError> {
        let gateway_status = GatewayStatus::parse(&confirmation.gateway_status);
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        let outcome = PaymentLifecycle::confirm_gateway(payment.status.into(), gateway_status)?;

        let mut details = Vec::new();
        for detail in load_details(txn, payment.id).await? {
            let is_online = PaymentMode::parse(&detail.payment_mode).is_some_and(PaymentMode::is_online);
            if !is_online {
                details.push(detail);
                continue;
            }
            let mut active: payment_details::ActiveModel = detail.into();
            active.gateway_transaction_id = Set(confirmation.gateway_transaction_id.clone());
            active.gateway_status = Set(Some(gateway_status.as_str().to_string()));
            active.gateway_fee = Set(confirmation.gateway_fee.map(round_money));
            details.push(active.update(txn).await.map_err(payment_db)?);
        }

        let allocations = load_allocations(txn, payment.id).await?;
        let (payment, voucher) = match outcome {
            GatewayOutcome::Post => {
                let as_advance = payment.is_advance || allocations.is_empty();
                if !as_advance {
                    recheck_stored(txn, scope.tenant_id(), &payment, &allocations).await?;
                }
                let (payment, voucher) = self
                    .post_payment(&scope, payment, &details, &allocations, as_advance)
                    .await?;
                (payment, Some(voucher))
            }
            GatewayOutcome::StayDraft => (payment, None),
        };

        scope.commit().await.map_err(payment_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            payment_number = %payment.payment_number,
            gateway_status = %gateway_status.as_str(),
            posted = voucher.is_some(),
            "Payment gateway confirmation processed"
        );
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations,
            voucher,
        })
    }

    /// Replaces the header and details of a DRAFT payment.
    ///
    /// A payment that already carries allocations keeps its type and party,
    /// and its new total must cover what is allocated.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless DRAFT, `Duplicate` for a used number,
    /// `DocumentMismatch`/`OverAllocation` when allocations no longer fit.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
        input: CreatePaymentInput,
    ) -> Result<PaymentWithDetails, PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        PaymentLifecycle::validate_update(payment.status.into())?;
        let total = validate_input(&input, payment.is_advance)?;

        if input.payment_number != payment.payment_number {
            ensure_unique_number(txn, scope.tenant_id(), &input.payment_number).await?;
        }
        if let Some(party) = input.party {
            ensure_party(txn, scope.tenant_id(), party).await?;
        }

        let allocations = load_allocations(txn, payment.id).await?;
        if let Some(first) = allocations.first() {
            if input.payment_type != PaymentType::from(payment.payment_type)
                || input.party != party_of(&payment)
            {
                return Err(PaymentError::DocumentMismatch(first.document_id));
            }
            if total < payment.allocated_amount_base {
                return Err(PaymentError::OverAllocation {
                    requested: payment.allocated_amount_base,
                    available: total,
                });
            }
        }

        payment_details::Entity::delete_many()
            .filter(payment_details::Column::PaymentId.eq(payment.id))
            .exec(txn)
            .await
            .map_err(payment_db)?;

        let allocated = payment.allocated_amount_base;
        let is_advance = payment.is_advance;
        let mut active: payments::ActiveModel = payment.into();
        active.payment_number = Set(input.payment_number.clone());
        active.payment_type = Set(input.payment_type.into());
        active.payment_date = Set(input.payment_date);
        active.party_type = Set(input.party.map(|party| party.party_type.into()));
        active.party_id = Set(input.party.map(|party| party.party_id));
        active.currency = Set(self.currency(&input));
        active.exchange_rate = Set(input.exchange_rate);
        active.total_amount_base = Set(total);
        active.total_amount_foreign = Set(foreign_from_base(total, input.exchange_rate));
        active.unallocated_amount_base = Set(total - allocated);
        active.tds_amount_base = Set(round_money(input.tds_amount));
        active.advance_amount_base = Set(if is_advance { total } else { Decimal::ZERO });
        active.narration = Set(input.narration.clone());
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let payment = active
            .update(txn)
            .await
            .map_err(|err| duplicate_or_db(err, &input.payment_number))?;
        let details = insert_details(&scope, payment.id, &input.details).await?;

        scope.commit().await.map_err(payment_db)?;
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations,
            voucher: None,
        })
    }

    /// Soft-deletes a DRAFT or CANCELLED payment.
    ///
    /// Allocations of a DRAFT payment never reached the invoices and are removed.
    ///
    /// # Errors
    ///
    /// `InvalidState` for POSTED or RECONCILED payments.
    pub async fn delete(&self, ctx: &TenantContext, payment_id: Uuid) -> Result<(), PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        let status = PaymentStatus::from(payment.status);
        PaymentLifecycle::validate_delete(status)?;

        if status == PaymentStatus::Draft {
            payment_allocations::Entity::delete_many()
                .filter(payment_allocations::Column::PaymentId.eq(payment.id))
                .exec(txn)
                .await
                .map_err(payment_db)?;
        }

        let mut active: payments::ActiveModel = payment.into();
        active.is_deleted = Set(true);
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await.map_err(payment_db)?;

        scope.commit().await.map_err(payment_db)
    }

    /// Marks a DRAFT or POSTED payment as reconciled.
    ///
    /// A DRAFT payment never posts, so the allocations it recorded while
    /// waiting for the gateway are dropped.
    ///
    /// # Errors
    ///
    /// `AlreadyReconciled` on the second call, `InvalidState` for cancelled payments.
    pub async fn reconcile(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
    ) -> Result<payments::Model, PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        PaymentLifecycle::validate_reconcile(payment.id, payment.status.into(), payment.is_reconciled)?;

        let was_draft = PaymentStatus::from(payment.status) == PaymentStatus::Draft;
        let total = payment.total_amount_base;
        if was_draft {
            payment_allocations::Entity::delete_many()
                .filter(payment_allocations::Column::PaymentId.eq(payment.id))
                .exec(txn)
                .await
                .map_err(payment_db)?;
        }

        let now = Utc::now().into();
        let mut active: payments::ActiveModel = payment.into();
        if was_draft {
            active.allocated_amount_base = Set(Decimal::ZERO);
            active.unallocated_amount_base = Set(total);
        }
        active.status = Set(DbPaymentStatus::Reconciled);
        active.is_reconciled = Set(true);
        active.reconciled_at = Set(Some(now));
        active.reconciled_by = Set(Some(scope.actor_id()));
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(now);
        let payment = active.update(txn).await.map_err(payment_db)?;

        scope.commit().await.map_err(payment_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            payment_number = %payment.payment_number,
            "Payment reconciled"
        );
        Ok(payment)
    }

    /// Allocates the unallocated part of a posted payment to invoices.
    ///
    /// The batch succeeds or fails as a whole. Allocating an advance payment
    /// also posts the advance-applied voucher for the batch total.
    ///
    /// # Errors
    ///
    /// `InvalidState`, `OverAllocation`, `DuplicateAllocation`,
    /// `DocumentNotFound`, `DocumentMismatch`, `EmptyAllocation`.
    pub async fn allocate(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
        requests: &[AllocationRequest],
        allocation_date: NaiveDate,
    ) -> Result<AllocationResult, PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        let existing: HashSet<Uuid> = load_allocations(txn, payment.id)
            .await?
            .into_iter()
            .map(|allocation| allocation.document_id)
            .collect();

        let documents = lock_invoices(txn, scope.tenant_id(), requests).await?;
        let reserved = reserved_for(txn, scope.tenant_id(), &documents, Some(payment.id)).await?;
        let plan = AllocationPlanner::plan(&snapshot(&payment), requests, &existing, |kind, id| {
            document_balance(&documents, &reserved, kind, id)
        })?;

        let rows = insert_allocations(&scope, payment.id, &plan, allocation_date).await?;
        for row in sorted_by_document(&rows) {
            apply_paid_delta(txn, scope.tenant_id(), row.document_id, row.allocated_amount_base).await?;
        }

        let voucher = if payment.is_advance {
            Some(self.post_advance_applied(&scope, &payment, &plan, allocation_date).await?)
        } else {
            None
        };

        let mut active: payments::ActiveModel = payment.into();
        active.allocated_amount_base = Set(plan.allocated_after);
        active.unallocated_amount_base = Set(plan.unallocated_after);
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let payment = active.update(txn).await.map_err(payment_db)?;

        scope.commit().await.map_err(payment_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            payment_number = %payment.payment_number,
            allocations = rows.len(),
            allocated = %plan.total_allocated,
            unallocated = %payment.unallocated_amount_base,
            "Payment allocated"
        );
        Ok(AllocationResult {
            payment,
            allocations: rows,
            voucher,
        })
    }

    /// Cancels a DRAFT or POSTED payment.
    ///
    /// A posted payment has every voucher it produced reversed and its
    /// allocated amounts taken back off the invoices. Allocation rows stay
    /// for audit.
    ///
    /// # Errors
    ///
    /// `InvalidState` for CANCELLED or RECONCILED payments.
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
        cancel_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<(payments::Model, Vec<PostedVoucher>), PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        let status = PaymentStatus::from(payment.status);
        PaymentLifecycle::validate_cancel(status)?;

        let reversals = if status == PaymentStatus::Posted {
            let reversals = reverse_all_for(&scope, &self.settings, payment.id, cancel_date, reason).await?;
            unwind_allocations(&scope, payment.id).await?;
            reversals
        } else {
            Vec::new()
        };

        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(DbPaymentStatus::Cancelled);
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let payment = active.update(txn).await.map_err(payment_db)?;

        scope.commit().await.map_err(payment_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            payment_number = %payment.payment_number,
            reversals = reversals.len(),
            "Payment cancelled"
        );
        Ok((payment, reversals))
    }

    /// Reverses a posted payment into a refund.
    ///
    /// Every voucher of the payment is reversed, the allocated invoices get
    /// their paid amounts back, and a refund payment pointing at the original
    /// is stored with the main reversal voucher. The original keeps its
    /// status and records the refund link.
    ///
    /// # Errors
    ///
    /// `InvalidState`, `RefundNotReversible`, `AlreadyReversed`.
    pub async fn reverse(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<PaymentReversal, PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let original = lock_payment(txn, scope.tenant_id(), payment_id).await?;
        PaymentLifecycle::validate_reverse(
            original.id,
            original.status.into(),
            original.is_refund,
            original.refund_payment_id.is_some(),
        )?;

        let reversals = reverse_all_for(&scope, &self.settings, original.id, reversal_date, reason).await?;
        let main_reversal = reversals
            .iter()
            .find(|posted| posted.voucher.reversed_voucher_id == original.voucher_id)
            .map(|posted| posted.voucher.id);
        unwind_allocations(&scope, original.id).await?;

        let refund_number = format!("{}{REFUND_SUFFIX}", original.payment_number);
        ensure_unique_number(txn, scope.tenant_id(), &refund_number).await?;

        let now = Utc::now().into();
        let refund = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            payment_number: Set(refund_number.clone()),
            payment_type: Set(original.payment_type),
            payment_date: Set(reversal_date),
            party_type: Set(original.party_type),
            party_id: Set(original.party_id),
            currency: Set(original.currency.clone()),
            exchange_rate: Set(original.exchange_rate),
            total_amount_base: Set(original.total_amount_base),
            total_amount_foreign: Set(original.total_amount_foreign),
            allocated_amount_base: Set(Decimal::ZERO),
            unallocated_amount_base: Set(Decimal::ZERO),
            tds_amount_base: Set(original.tds_amount_base),
            advance_amount_base: Set(Decimal::ZERO),
            is_advance: Set(false),
            status: Set(DbPaymentStatus::Posted),
            is_reconciled: Set(false),
            reconciled_at: Set(None),
            reconciled_by: Set(None),
            voucher_id: Set(main_reversal),
            is_refund: Set(true),
            original_payment_id: Set(Some(original.id)),
            refund_payment_id: Set(None),
            narration: Set(Some(match reason {
                Some(reason) => format!("Refund of {}: {reason}", original.payment_number),
                None => format!("Refund of {}", original.payment_number),
            })),
            is_deleted: Set(false),
            created_by: Set(scope.actor_id()),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| duplicate_or_db(err, &refund_number))?;

        let mirrored: Vec<PaymentDetailInput> = load_details(txn, original.id)
            .await?
            .into_iter()
            .filter_map(|detail| {
                PaymentMode::parse(&detail.payment_mode).map(|mode| PaymentDetailInput {
                    payment_mode: mode,
                    amount: detail.amount_base,
                    bank_name: detail.bank_name,
                    instrument_number: detail.instrument_number,
                    instrument_date: detail.instrument_date,
                    gateway_transaction_id: detail.gateway_transaction_id,
                })
            })
            .collect();
        insert_details(&scope, refund.id, &mirrored).await?;

        let mut active: payments::ActiveModel = original.into();
        active.refund_payment_id = Set(Some(refund.id));
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(now);
        let original = active.update(txn).await.map_err(payment_db)?;

        scope.commit().await.map_err(payment_db)?;

        info!(
            tenant_id = %ctx.tenant_id,
            payment_number = %original.payment_number,
            refund_number = %refund.payment_number,
            reversals = reversals.len(),
            "Payment reversed"
        );
        Ok(PaymentReversal {
            original,
            refund,
            vouchers: reversals,
        })
    }

    /// Loads a payment with its details, allocations and voucher.
    ///
    /// # Errors
    ///
    /// `NotFound` if missing or deleted.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        payment_id: Uuid,
    ) -> Result<PaymentWithDetails, PaymentError> {
        let scope = TenantScope::begin(&self.db, ctx).await.map_err(payment_db)?;
        let txn = scope.txn();

        let payment = payments::Entity::find_by_id(payment_id)
            .filter(payments::Column::TenantId.eq(scope.tenant_id()))
            .filter(payments::Column::IsDeleted.eq(false))
            .one(txn)
            .await
            .map_err(payment_db)?
            .ok_or(PaymentError::NotFound(payment_id))?;
        let details = load_details(txn, payment.id).await?;
        let allocations = load_allocations(txn, payment.id).await?;

        let voucher = match payment.voucher_id {
            Some(voucher_id) => {
                let voucher = vouchers::Entity::find_by_id(voucher_id)
                    .one(txn)
                    .await
                    .map_err(payment_db)?
                    .ok_or(LedgerError::VoucherNotFound(voucher_id))?;
                Some(load_posted(txn, voucher).await?)
            }
            None => None,
        };

        scope.commit().await.map_err(payment_db)?;
        Ok(PaymentWithDetails {
            payment,
            details,
            allocations,
            voucher,
        })
    }

    async fn insert_payment(
        &self,
        scope: &TenantScope,
        input: &CreatePaymentInput,
        total: Decimal,
        is_advance: bool,
    ) -> Result<payments::Model, PaymentError> {
        let txn = scope.txn();
        ensure_unique_number(txn, scope.tenant_id(), &input.payment_number).await?;
        if let Some(party) = input.party {
            ensure_party(txn, scope.tenant_id(), party).await?;
        }

        let now = Utc::now().into();
        payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            payment_number: Set(input.payment_number.clone()),
            payment_type: Set(input.payment_type.into()),
            payment_date: Set(input.payment_date),
            party_type: Set(input.party.map(|party| party.party_type.into())),
            party_id: Set(input.party.map(|party| party.party_id)),
            currency: Set(self.currency(input)),
            exchange_rate: Set(input.exchange_rate),
            total_amount_base: Set(total),
            total_amount_foreign: Set(foreign_from_base(total, input.exchange_rate)),
            allocated_amount_base: Set(Decimal::ZERO),
            unallocated_amount_base: Set(total),
            tds_amount_base: Set(round_money(input.tds_amount)),
            advance_amount_base: Set(Decimal::ZERO),
            is_advance: Set(is_advance),
            status: Set(DbPaymentStatus::Draft),
            is_reconciled: Set(false),
            reconciled_at: Set(None),
            reconciled_by: Set(None),
            voucher_id: Set(None),
            is_refund: Set(false),
            original_payment_id: Set(None),
            refund_payment_id: Set(None),
            narration: Set(input.narration.clone()),
            is_deleted: Set(false),
            created_by: Set(scope.actor_id()),
            created_at: Set(now),
            updated_by: Set(None),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(|err| duplicate_or_db(err, &input.payment_number))
    }

    /// Posts the payment voucher, moves the payment to POSTED and brings the
    /// allocated invoices up to date.
    async fn post_payment(
        &self,
        scope: &TenantScope,
        payment: payments::Model,
        details: &[payment_details::Model],
        allocations: &[payment_allocations::Model],
        as_advance: bool,
    ) -> Result<(payments::Model, PostedVoucher), PaymentError> {
        let payment_type = PaymentType::from(payment.payment_type);
        let kind = payment_type
            .posting_kind(as_advance)
            .ok_or(PaymentError::NotPostable(payment_type))?;

        let instruments = details
            .iter()
            .map(|detail| {
                let mode = PaymentMode::parse(&detail.payment_mode).ok_or_else(|| {
                    PaymentError::Database(format!("unknown payment mode {}", detail.payment_mode))
                })?;
                Ok(InstrumentLeg {
                    mode,
                    amount: detail.amount_base,
                    description: detail
                        .instrument_number
                        .as_ref()
                        .map(|number| format!("{mode} {number}")),
                })
            })
            .collect::<Result<Vec<_>, PaymentError>>()?;

        let mut event = BusinessEvent::new(
            kind,
            payment.payment_date,
            DocumentReference::new(kind.as_str(), payment.id, payment.payment_number.as_str()),
            &self.settings.base_currency,
            EventAmounts {
                total: payment.total_amount_base,
                tds: payment.tds_amount_base,
                ..EventAmounts::default()
            },
        )
        .with_instruments(instruments)
        .with_currency(&payment.currency, payment.exchange_rate);
        event.party = party_of(&payment);
        event.narration.clone_from(&payment.narration);

        let voucher = post_event(scope, &self.settings, &event).await?;

        for allocation in sorted_by_document(allocations) {
            apply_paid_delta(
                scope.txn(),
                scope.tenant_id(),
                allocation.document_id,
                allocation.allocated_amount_base,
            )
            .await?;
        }

        let total = payment.total_amount_base;
        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(DbPaymentStatus::Posted);
        active.voucher_id = Set(Some(voucher.voucher.id));
        if as_advance {
            active.is_advance = Set(true);
            active.advance_amount_base = Set(total);
        }
        active.updated_by = Set(Some(scope.actor_id()));
        active.updated_at = Set(Utc::now().into());
        let payment = active.update(scope.txn()).await.map_err(payment_db)?;
        Ok((payment, voucher))
    }

    async fn post_advance_applied(
        &self,
        scope: &TenantScope,
        payment: &payments::Model,
        plan: &AllocationPlan,
        allocation_date: NaiveDate,
    ) -> Result<PostedVoucher, PaymentError> {
        let payment_type = PaymentType::from(payment.payment_type);
        let kind = payment_type
            .advance_applied_kind()
            .ok_or(PaymentError::NotPostable(payment_type))?;

        let mut event = BusinessEvent::new(
            kind,
            allocation_date,
            DocumentReference::new(kind.as_str(), payment.id, payment.payment_number.as_str()),
            &self.settings.base_currency,
            EventAmounts {
                total: plan.total_allocated,
                ..EventAmounts::default()
            },
        )
        .with_narration(format!("Advance {} applied", payment.payment_number));
        event.party = party_of(payment);

        Ok(post_event(scope, &self.settings, &event).await?)
    }

    fn currency(&self, input: &CreatePaymentInput) -> String {
        input
            .currency
            .as_deref()
            .unwrap_or(&self.settings.base_currency)
            .to_uppercase()
    }
}

/// Validates amounts and returns the payment total: instruments plus TDS.
fn validate_input(input: &CreatePaymentInput, is_advance: bool) -> Result<Decimal, PaymentError> {
    if input.details.is_empty() {
        return Err(PaymentError::NoDetails);
    }
    if input.exchange_rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidExchangeRate.into());
    }
    let mut total = Decimal::ZERO;
    for detail in &input.details {
        if detail.amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidAmount(detail.amount));
        }
        total += round_money(detail.amount);
    }
    let tds = round_money(input.tds_amount);
    if tds.is_sign_negative() && !tds.is_zero() {
        return Err(PaymentError::InvalidAmount(input.tds_amount));
    }
    if is_advance {
        if !tds.is_zero() {
            return Err(PaymentError::InvalidAmount(input.tds_amount));
        }
        if input.party.is_none() {
            return Err(LedgerError::MissingParty.into());
        }
    }
    Ok(total + tds)
}

fn party_of(payment: &payments::Model) -> Option<PartyRef> {
    match (payment.party_type, payment.party_id) {
        (Some(party_type), Some(party_id)) => Some(PartyRef::new(party_type.into(), party_id)),
        _ => None,
    }
}

fn snapshot(payment: &payments::Model) -> PaymentSnapshot {
    PaymentSnapshot {
        id: payment.id,
        status: payment.status.into(),
        payment_type: payment.payment_type.into(),
        party: party_of(payment),
        total_amount: payment.total_amount_base,
        allocated_amount: payment.allocated_amount_base,
        unallocated_amount: payment.unallocated_amount_base,
    }
}

fn document_balance(
    documents: &HashMap<Uuid, invoices::Model>,
    reserved: &HashMap<Uuid, Decimal>,
    kind: InvoiceKind,
    document_id: Uuid,
) -> Option<DocumentBalance> {
    let invoice = documents.get(&document_id)?;
    if InvoiceKind::from(invoice.invoice_kind) != kind {
        return None;
    }
    Some(DocumentBalance {
        invoice_kind: kind,
        document_id,
        party: PartyRef::new(invoice.party_type.into(), invoice.party_id),
        status: invoice.status.into(),
        total_amount: invoice.total_amount,
        paid_amount: invoice.paid_amount,
        reserved_amount: reserved.get(&document_id).copied().unwrap_or_default(),
    })
}

fn sorted_by_document(rows: &[payment_allocations::Model]) -> Vec<&payment_allocations::Model> {
    let mut sorted: Vec<&payment_allocations::Model> = rows.iter().collect();
    sorted.sort_by_key(|row| row.document_id);
    sorted
}

fn log_created(ctx: &TenantContext, payment: &payments::Model) {
    info!(
        tenant_id = %ctx.tenant_id,
        payment_number = %payment.payment_number,
        payment_type = %PaymentType::from(payment.payment_type),
        status = %PaymentStatus::from(payment.status),
        total = %payment.total_amount_base,
        "Payment created"
    );
}

async fn lock_payment(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    payment_id: Uuid,
) -> Result<payments::Model, PaymentError> {
    payments::Entity::find_by_id(payment_id)
        .filter(payments::Column::TenantId.eq(tenant_id))
        .filter(payments::Column::IsDeleted.eq(false))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(payment_db)?
        .ok_or(PaymentError::NotFound(payment_id))
}

/// Locks the requested invoices in id order.
async fn lock_invoices(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    requests: &[AllocationRequest],
) -> Result<HashMap<Uuid, invoices::Model>, PaymentError> {
    let mut ids: Vec<Uuid> = requests.iter().map(|request| request.document_id).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = invoices::Entity::find()
        .filter(invoices::Column::TenantId.eq(tenant_id))
        .filter(invoices::Column::Id.is_in(ids))
        .filter(invoices::Column::IsDeleted.eq(false))
        .order_by_asc(invoices::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(payment_db)?;
    Ok(rows.into_iter().map(|invoice| (invoice.id, invoice)).collect())
}

/// What other DRAFT payments hold on the locked invoices.
async fn reserved_for(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    documents: &HashMap<Uuid, invoices::Model>,
    exclude_payment: Option<Uuid>,
) -> Result<HashMap<Uuid, Decimal>, PaymentError> {
    let ids: Vec<Uuid> = documents.keys().copied().collect();
    pending_allocations(txn, tenant_id, &ids, exclude_payment)
        .await
        .map_err(payment_db)
}

/// Validates a DRAFT payment's stored allocations against its invoices as
/// they stand now, with the invoices locked.
async fn recheck_stored(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    payment: &payments::Model,
    allocations: &[payment_allocations::Model],
) -> Result<(), PaymentError> {
    let stored: Vec<AllocationRequest> = allocations
        .iter()
        .map(|row| AllocationRequest {
            invoice_kind: row.invoice_kind.into(),
            document_id: row.document_id,
            amount: row.allocated_amount_base,
            discount_amount: row.discount_amount,
            adjustment_amount: row.adjustment_amount,
        })
        .collect();
    let documents = lock_invoices(txn, tenant_id, &stored).await?;
    let reserved = reserved_for(txn, tenant_id, &documents, Some(payment.id)).await?;
    AllocationPlanner::replan_stored(&snapshot(payment), &stored, |kind, id| {
        document_balance(&documents, &reserved, kind, id)
    })?;
    Ok(())
}

async fn load_details(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
) -> Result<Vec<payment_details::Model>, PaymentError> {
    payment_details::Entity::find()
        .filter(payment_details::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_details::Column::LineNo)
        .all(txn)
        .await
        .map_err(payment_db)
}

async fn load_allocations(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
) -> Result<Vec<payment_allocations::Model>, PaymentError> {
    payment_allocations::Entity::find()
        .filter(payment_allocations::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_allocations::Column::CreatedAt)
        .order_by_asc(payment_allocations::Column::DocumentId)
        .all(txn)
        .await
        .map_err(payment_db)
}

async fn insert_details(
    scope: &TenantScope,
    payment_id: Uuid,
    details: &[PaymentDetailInput],
) -> Result<Vec<payment_details::Model>, PaymentError> {
    let now = Utc::now().into();
    let mut rows = Vec::with_capacity(details.len());
    for (line_no, detail) in (1..).zip(details) {
        let row = payment_details::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            payment_id: Set(payment_id),
            line_no: Set(line_no),
            payment_mode: Set(detail.payment_mode.as_str().to_string()),
            amount_base: Set(round_money(detail.amount)),
            bank_name: Set(detail.bank_name.clone()),
            instrument_number: Set(detail.instrument_number.clone()),
            instrument_date: Set(detail.instrument_date),
            gateway_transaction_id: Set(detail.gateway_transaction_id.clone()),
            gateway_status: Set(None),
            gateway_fee: Set(None),
            created_at: Set(now),
        }
        .insert(scope.txn())
        .await
        .map_err(payment_db)?;
        rows.push(row);
    }
    Ok(rows)
}

async fn insert_allocations(
    scope: &TenantScope,
    payment_id: Uuid,
    plan: &AllocationPlan,
    allocation_date: NaiveDate,
) -> Result<Vec<payment_allocations::Model>, PaymentError> {
    let now = Utc::now().into();
    let mut rows = Vec::with_capacity(plan.allocations.len());
    for planned in &plan.allocations {
        let request = &planned.request;
        let row = payment_allocations::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(scope.tenant_id()),
            payment_id: Set(payment_id),
            invoice_kind: Set(request.invoice_kind.into()),
            document_id: Set(request.document_id),
            allocated_amount_base: Set(request.amount),
            discount_amount: Set(request.discount_amount),
            adjustment_amount: Set(request.adjustment_amount),
            allocation_date: Set(allocation_date),
            created_by: Set(scope.actor_id()),
            created_at: Set(now),
        }
        .insert(scope.txn())
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                PaymentError::DuplicateAllocation(request.document_id)
            } else {
                payment_db(err)
            }
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Takes every allocated amount of the payment back off its invoices.
async fn unwind_allocations(scope: &TenantScope, payment_id: Uuid) -> Result<(), PaymentError> {
    let allocations = load_allocations(scope.txn(), payment_id).await?;
    for allocation in sorted_by_document(&allocations) {
        apply_paid_delta(
            scope.txn(),
            scope.tenant_id(),
            allocation.document_id,
            -allocation.allocated_amount_base,
        )
        .await?;
    }
    Ok(())
}

async fn ensure_unique_number(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    payment_number: &str,
) -> Result<(), PaymentError> {
    let taken = payments::Entity::find()
        .filter(payments::Column::TenantId.eq(tenant_id))
        .filter(payments::Column::PaymentNumber.eq(payment_number))
        .one(txn)
        .await
        .map_err(payment_db)?;
    if taken.is_some() {
        return Err(PaymentError::Duplicate(payment_number.to_string()));
    }
    Ok(())
}

async fn ensure_party(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    party: PartyRef,
) -> Result<(), PaymentError> {
    parties::Entity::find_by_id(party.party_id)
        .filter(parties::Column::TenantId.eq(tenant_id))
        .filter(parties::Column::PartyType.eq(DbPartyType::from(party.party_type)))
        .filter(parties::Column::IsActive.eq(true))
        .filter(parties::Column::IsDeleted.eq(false))
        .one(txn)
        .await
        .map_err(payment_db)?
        .ok_or(LedgerError::PartyNotFound(party.party_id))?;
    Ok(())
}

fn duplicate_or_db(err: sea_orm::DbErr, payment_number: &str) -> PaymentError {
    if is_unique_violation(&err) {
        PaymentError::Duplicate(payment_number.to_string())
    } else {
        payment_db(err)
    }
}
