//! Property-based tests for `LedgerService` and balance planning.
//!
//! - Committed vouchers are exactly balanced
//! - Line numbers are dense and 1-based
//! - The last ledger snapshot per account equals its final balance

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::{AccountState, AccountType, plan_balances};
use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{AccountInfo, AccountRef, DocumentReference, PostingLeg, VoucherDraft};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

fn make_draft(legs: Vec<PostingLeg>) -> VoucherDraft {
    VoucherDraft {
        voucher_type_code: "JV".to_string(),
        voucher_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        reference: DocumentReference::manual("JOURNAL"),
        narration: None,
        currency: "INR".to_string(),
        exchange_rate: Decimal::ONE,
        legs,
    }
}

/// Builds a balanced draft: one debit and one mirroring credit per amount,
/// rotating through `accounts`.
fn balanced_draft(amounts: &[Decimal], accounts: &[Uuid]) -> VoucherDraft {
    let mut legs = Vec::with_capacity(amounts.len() * 2);
    for (i, amount) in amounts.iter().enumerate() {
        let debit_account = accounts[i % accounts.len()];
        let credit_account = accounts[(i + 1) % accounts.len()];
        legs.push(PostingLeg::debit(AccountRef::Account(debit_account), *amount));
        legs.push(PostingLeg::credit(AccountRef::Account(credit_account), *amount));
    }
    make_draft(legs)
}

fn resolver(
    types: &HashMap<Uuid, AccountType>,
) -> impl FnMut(&AccountRef) -> Result<AccountInfo, LedgerError> + '_ {
    move |account| match account {
        AccountRef::Account(id) => types
            .get(id)
            .map(|account_type| AccountInfo {
                id: *id,
                account_type: *account_type,
                is_active: true,
            })
            .ok_or(LedgerError::AccountNotFound(*id)),
        _ => Err(LedgerError::AccountNotFound(Uuid::nil())),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every draft that passes validation has Σdebit == Σcredit on its lines.
    #[test]
    fn prop_resolved_vouchers_balance(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        types in prop::collection::vec(account_type_strategy(), 2..5),
    ) {
        let accounts: Vec<Uuid> = types.iter().map(|_| Uuid::new_v4()).collect();
        let type_map: HashMap<Uuid, AccountType> =
            accounts.iter().copied().zip(types.iter().copied()).collect();
        let draft = balanced_draft(&amounts, &accounts);

        let (lines, totals) =
            LedgerService::validate_and_resolve(&draft, resolver(&type_map)).unwrap();

        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        prop_assert_eq!(debit, credit);
        prop_assert!(totals.is_balanced);
        for line in &lines {
            prop_assert!(line.debit.is_zero() != line.credit.is_zero());
        }
    }

    /// Line numbers run 1..=N without gaps.
    #[test]
    fn prop_line_numbers_dense(
        amounts in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let accounts = vec![Uuid::new_v4(), Uuid::new_v4()];
        let type_map: HashMap<Uuid, AccountType> =
            accounts.iter().map(|id| (*id, AccountType::Asset)).collect();
        let draft = balanced_draft(&amounts, &accounts);

        let (lines, _) = LedgerService::validate_and_resolve(&draft, resolver(&type_map)).unwrap();
        let numbers: Vec<i32> = lines.iter().map(|l| l.line_no).collect();
        let expected: Vec<i32> = (1..=i32::try_from(lines.len()).unwrap()).collect();
        prop_assert_eq!(numbers, expected);
    }

    /// Shifting one leg by a single cent always fails with `Unbalanced`.
    #[test]
    fn prop_one_cent_off_is_rejected(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        victim in any::<prop::sample::Index>(),
    ) {
        let accounts = vec![Uuid::new_v4(), Uuid::new_v4()];
        let mut draft = balanced_draft(&amounts, &accounts);
        let idx = victim.index(draft.legs.len());
        draft.legs[idx].amount += Decimal::new(1, 2);

        let result = LedgerService::validate_legs(&draft);
        prop_assert!(matches!(result, Err(LedgerError::Unbalanced { .. })), "expected Unbalanced");
    }

    /// After planning, the last snapshot of each account equals its final balance,
    /// and the final balance equals the opening plus the net normal-side change.
    #[test]
    fn prop_last_snapshot_matches_final_balance(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        types in prop::collection::vec(account_type_strategy(), 2..5),
        opening in prop::collection::vec(-1_000_000i64..1_000_000i64, 5),
    ) {
        let accounts: Vec<Uuid> = types.iter().map(|_| Uuid::new_v4()).collect();
        let type_map: HashMap<Uuid, AccountType> =
            accounts.iter().copied().zip(types.iter().copied()).collect();
        let states: HashMap<Uuid, AccountState> = accounts
            .iter()
            .zip(types.iter())
            .zip(opening.iter())
            .map(|((id, account_type), cents)| {
                (*id, AccountState {
                    account_type: *account_type,
                    current_balance: Decimal::new(*cents, 2),
                    ledger_version: 0,
                })
            })
            .collect();
        let draft = balanced_draft(&amounts, &accounts);
        let (lines, _) = LedgerService::validate_and_resolve(&draft, resolver(&type_map)).unwrap();

        let plan = plan_balances(&lines, &states).unwrap();

        for (account_id, final_balance) in &plan.final_balances {
            let last = lines
                .iter()
                .zip(plan.line_balances.iter())
                .filter(|(line, _)| line.account_id == *account_id)
                .map(|(_, snapshot)| *snapshot)
                .last()
                .unwrap();
            prop_assert_eq!(last, *final_balance);

            let state = states[account_id];
            let net: Decimal = lines
                .iter()
                .filter(|line| line.account_id == *account_id)
                .map(|line| state.account_type.calculate_balance_change(line.debit, line.credit))
                .sum();
            prop_assert_eq!(final_balance.current_balance, state.current_balance + net);
        }
    }
}
