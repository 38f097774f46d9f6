//! Ledger service for voucher validation and resolution.
//!
//! This module provides the core business logic for validating and resolving
//! vouchers before they are persisted to the database.

use hisaab_shared::types::round_money;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{
    AccountInfo, AccountRef, EntryType, PostingLeg, ResolvedLine, VoucherDraft, VoucherTotals,
};

/// Ledger service for voucher validation and resolution.
///
/// This service contains pure business logic with no database dependencies.
/// Account lookups are injected as closures so the repository can resolve
/// every account once per posting and reuse the answers.
pub struct LedgerService;

impl LedgerService {
    /// Validates leg amounts and balance without touching accounts.
    ///
    /// Each leg is rounded to money precision first, then debits and credits
    /// must sum exactly equal.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the draft is malformed or unbalanced.
    pub fn validate_legs(draft: &VoucherDraft) -> Result<VoucherTotals, LedgerError> {
        if draft.exchange_rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidExchangeRate);
        }
        if draft.legs.len() < 2 {
            return Err(LedgerError::InsufficientLegs);
        }

        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;
        for leg in &draft.legs {
            let amount = Self::leg_amount(leg)?;
            match leg.entry_type {
                EntryType::Debit => debit += amount,
                EntryType::Credit => credit += amount,
            }
        }

        let totals = VoucherTotals::new(debit, credit);
        if !totals.is_balanced {
            return Err(LedgerError::Unbalanced { debit, credit });
        }
        Ok(totals)
    }

    /// Validate and resolve a voucher draft before persisting.
    ///
    /// 1. Validates exchange rate and minimum legs (at least 2)
    /// 2. Rounds every leg to money precision and rejects zero/negative amounts
    /// 3. Resolves each leg's account and rejects inactive accounts
    /// 4. Assigns dense 1-based line numbers
    /// 5. Validates Σdebit == Σcredit exactly
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation or resolution fails.
    pub fn validate_and_resolve<R>(
        draft: &VoucherDraft,
        mut resolve_account: R,
    ) -> Result<(Vec<ResolvedLine>, VoucherTotals), LedgerError>
    where
        R: FnMut(&AccountRef) -> Result<AccountInfo, LedgerError>,
    {
        let totals = Self::validate_legs(draft)?;

        let mut lines = Vec::with_capacity(draft.legs.len());
        let mut line_no = 0;
        for leg in &draft.legs {
            let amount = Self::leg_amount(leg)?;
            let info = resolve_account(&leg.account)?;
            if !info.is_active {
                return Err(LedgerError::AccountInactive(info.id));
            }

            line_no += 1;
            let (debit, credit) = match leg.entry_type {
                EntryType::Debit => (amount, Decimal::ZERO),
                EntryType::Credit => (Decimal::ZERO, amount),
            };
            lines.push(ResolvedLine {
                line_no,
                account_id: info.id,
                debit,
                credit,
                description: leg.description.clone(),
                tax_amount: leg.tax_amount.map(round_money),
            });
        }

        let resolved_totals = Self::calculate_totals(&lines);
        debug_assert_eq!(resolved_totals, totals);
        Ok((lines, resolved_totals))
    }

    /// Distinct account references in first-seen order.
    #[must_use]
    pub fn distinct_accounts(legs: &[PostingLeg]) -> Vec<AccountRef> {
        let mut refs: Vec<AccountRef> = Vec::with_capacity(legs.len());
        for leg in legs {
            if !refs.contains(&leg.account) {
                refs.push(leg.account);
            }
        }
        refs
    }

    /// Calculate voucher totals from resolved lines.
    #[must_use]
    pub fn calculate_totals(lines: &[ResolvedLine]) -> VoucherTotals {
        let total_debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.credit).sum();

        VoucherTotals::new(total_debit, total_credit)
    }

    fn leg_amount(leg: &PostingLeg) -> Result<Decimal, LedgerError> {
        if leg.amount.is_sign_negative() && !leg.amount.is_zero() {
            return Err(LedgerError::NegativeAmount);
        }
        let amount = round_money(leg.amount);
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        Ok(amount)
    }
}
