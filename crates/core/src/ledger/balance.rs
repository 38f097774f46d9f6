//! Account balance calculations.
//!
//! - Asset/Expense: balance += debit - credit (debit-normal)
//! - Liability/Equity/Revenue: balance += credit - debit (credit-normal)

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::ResolvedLine;

/// Chart-of-accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Asset (debit-normal).
    Asset,
    /// Liability (credit-normal).
    Liability,
    /// Equity (credit-normal).
    Equity,
    /// Revenue (credit-normal).
    Revenue,
    /// Expense (debit-normal).
    Expense,
}

/// Which side increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalSide {
    /// Debit-normal accounts (Asset, Expense).
    DebitNormal,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    CreditNormal,
}

impl AccountType {
    /// Returns the normal side of this account type.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Expense => NormalSide::DebitNormal,
            Self::Liability | Self::Equity | Self::Revenue => NormalSide::CreditNormal,
        }
    }

    /// Code of the account group accounts of this type live under.
    #[must_use]
    pub const fn group_code(self) -> &'static str {
        match self {
            Self::Asset => "ASET",
            Self::Liability => "LIAB",
            Self::Equity => "EQTY",
            Self::Revenue => "REVN",
            Self::Expense => "EXPN",
        }
    }

    /// Calculates the signed balance change for a debit/credit pair.
    #[must_use]
    pub fn calculate_balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_side() {
            NormalSide::DebitNormal => debit - credit,
            NormalSide::CreditNormal => credit - debit,
        }
    }
}

/// Running balance information for one ledger row.
///
/// - `account_version`: monotonically increasing counter per account
/// - `previous_balance`: balance before this row
/// - `current_balance`: balance after this row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Account version (monotonically increasing).
    pub account_version: i64,
    /// Balance before this entry.
    pub previous_balance: Decimal,
    /// Balance after this entry.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Starting point for an account that currently sits at `balance`, `version`.
    #[must_use]
    pub const fn opening(account_version: i64, balance: Decimal) -> Self {
        Self {
            account_version,
            previous_balance: balance,
            current_balance: balance,
        }
    }

    /// Returns the next running balance after applying `balance_change`.
    #[must_use]
    pub fn next_entry(&self, balance_change: Decimal) -> Self {
        Self {
            account_version: self.account_version + 1,
            previous_balance: self.current_balance,
            current_balance: self.current_balance + balance_change,
        }
    }
}

/// Current persisted state of an account before posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    /// Account type.
    pub account_type: AccountType,
    /// `accounts.current_balance`.
    pub current_balance: Decimal,
    /// `accounts.ledger_version`.
    pub ledger_version: i64,
}

/// The outcome of planning a voucher's effect on balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePlan {
    /// One snapshot per line, in line order.
    pub line_balances: Vec<RunningBalance>,
    /// Final state per touched account.
    pub final_balances: HashMap<Uuid, RunningBalance>,
}

/// Computes ledger snapshots for each line.
///
/// Lines touching the same account chain off each other, so the last snapshot
/// for an account always equals the final `current_balance` written back.
///
/// # Errors
///
/// Returns the missing account id if a line references an account absent from `states`.
pub fn plan_balances(
    lines: &[ResolvedLine],
    states: &HashMap<Uuid, AccountState>,
) -> Result<BalancePlan, Uuid> {
    let mut running: HashMap<Uuid, RunningBalance> = HashMap::with_capacity(states.len());
    let mut line_balances = Vec::with_capacity(lines.len());

    for line in lines {
        let state = states.get(&line.account_id).ok_or(line.account_id)?;
        let current = running
            .get(&line.account_id)
            .copied()
            .unwrap_or_else(|| RunningBalance::opening(state.ledger_version, state.current_balance));
        let change = state
            .account_type
            .calculate_balance_change(line.debit, line.credit);
        let next = current.next_entry(change);
        running.insert(line.account_id, next);
        line_balances.push(next);
    }

    Ok(BalancePlan {
        line_balances,
        final_balances: running,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn balance_change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn line(line_no: i32, account_id: Uuid, debit: Decimal, credit: Decimal) -> ResolvedLine {
        ResolvedLine {
            line_no,
            account_id,
            debit,
            credit,
            description: None,
            tax_amount: None,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A chain of entries ends at the opening balance plus every change,
        /// with the version advanced once per entry.
        #[test]
        fn prop_chain_sums_changes(
            opening in balance_change_strategy(),
            changes in prop::collection::vec(balance_change_strategy(), 1..20),
        ) {
            let mut current = RunningBalance::opening(7, opening);
            for change in &changes {
                let next = current.next_entry(*change);
                prop_assert_eq!(next.previous_balance, current.current_balance);
                prop_assert_eq!(next.account_version, current.account_version + 1);
                current = next;
            }
            let expected = opening + changes.iter().copied().sum::<Decimal>();
            prop_assert_eq!(current.current_balance, expected);
            prop_assert_eq!(current.account_version, 7 + changes.len() as i64);
        }
    }

    #[test]
    fn test_debit_normal_change() {
        assert_eq!(
            AccountType::Asset.calculate_balance_change(dec!(100), dec!(0)),
            dec!(100)
        );
        assert_eq!(
            AccountType::Expense.calculate_balance_change(dec!(0), dec!(40)),
            dec!(-40)
        );
    }

    #[test]
    fn test_credit_normal_change() {
        assert_eq!(
            AccountType::Revenue.calculate_balance_change(dec!(0), dec!(100)),
            dec!(100)
        );
        assert_eq!(
            AccountType::Liability.calculate_balance_change(dec!(25), dec!(0)),
            dec!(-25)
        );
    }

    #[test]
    fn test_group_codes() {
        assert_eq!(AccountType::Asset.group_code(), "ASET");
        assert_eq!(AccountType::Liability.group_code(), "LIAB");
        assert_eq!(AccountType::Equity.group_code(), "EQTY");
        assert_eq!(AccountType::Revenue.group_code(), "REVN");
        assert_eq!(AccountType::Expense.group_code(), "EXPN");
    }

    #[test]
    fn test_plan_balances_chains_repeated_account() {
        let cash = Uuid::new_v4();
        let sales = Uuid::new_v4();
        let states = HashMap::from([
            (
                cash,
                AccountState {
                    account_type: AccountType::Asset,
                    current_balance: dec!(500),
                    ledger_version: 3,
                },
            ),
            (
                sales,
                AccountState {
                    account_type: AccountType::Revenue,
                    current_balance: dec!(0),
                    ledger_version: 0,
                },
            ),
        ]);
        let lines = vec![
            line(1, cash, dec!(60), dec!(0)),
            line(2, cash, dec!(40), dec!(0)),
            line(3, sales, dec!(0), dec!(100)),
        ];

        let plan = plan_balances(&lines, &states).unwrap();

        assert_eq!(plan.line_balances[0].previous_balance, dec!(500));
        assert_eq!(plan.line_balances[0].current_balance, dec!(560));
        assert_eq!(plan.line_balances[0].account_version, 4);
        assert_eq!(plan.line_balances[1].previous_balance, dec!(560));
        assert_eq!(plan.line_balances[1].current_balance, dec!(600));
        assert_eq!(plan.line_balances[1].account_version, 5);
        assert_eq!(plan.line_balances[2].current_balance, dec!(100));
        assert_eq!(plan.line_balances[2].account_version, 1);
        assert_eq!(plan.final_balances[&cash].current_balance, dec!(600));
        assert_eq!(plan.final_balances[&sales].current_balance, dec!(100));
    }

    #[test]
    fn test_plan_balances_missing_account() {
        let missing = Uuid::new_v4();
        let lines = vec![line(1, missing, dec!(1), dec!(0))];
        assert_eq!(plan_balances(&lines, &HashMap::new()), Err(missing));
    }
}
