//! Domain types for voucher creation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::balance::AccountType;
use super::roles::AccountRole;
use crate::party::PartyRef;

/// Side of a voucher line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl EntryType {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// How a leg names its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountRef {
    /// Resolved through the tenant's account configuration.
    Role(AccountRole),
    /// The party's auto-provisioned receivable/payable account.
    Party(PartyRef),
    /// Caller-supplied account id.
    Account(Uuid),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role {role}"),
            Self::Party(party) => write!(f, "{} {}", party.party_type, party.party_id),
            Self::Account(id) => write!(f, "account {id}"),
        }
    }
}

/// One debit or credit leg of a voucher, before account resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLeg {
    /// Target account.
    pub account: AccountRef,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Amount in base currency (must be positive).
    pub amount: Decimal,
    /// Optional line description.
    pub description: Option<String>,
    /// Tax carried by this line, for reporting.
    pub tax_amount: Option<Decimal>,
}

impl PostingLeg {
    /// Creates a debit leg.
    #[must_use]
    pub const fn debit(account: AccountRef, amount: Decimal) -> Self {
        Self {
            account,
            entry_type: EntryType::Debit,
            amount,
            description: None,
            tax_amount: None,
        }
    }

    /// Creates a credit leg.
    #[must_use]
    pub const fn credit(account: AccountRef, amount: Decimal) -> Self {
        Self {
            account,
            entry_type: EntryType::Credit,
            amount,
            description: None,
            tax_amount: None,
        }
    }

    /// Sets the line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tax amount carried by this line.
    #[must_use]
    pub const fn with_tax_amount(mut self, tax_amount: Decimal) -> Self {
        self.tax_amount = Some(tax_amount);
        self
    }
}

/// Polymorphic link from a voucher back to its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// e.g. `SALES_INVOICE`, `PAYMENT`, `CREDIT_NOTE`.
    pub reference_type: String,
    /// Source document id.
    pub reference_id: Option<Uuid>,
    /// Source document number.
    pub reference_number: Option<String>,
}

impl DocumentReference {
    /// Creates a reference to a document.
    #[must_use]
    pub fn new(
        reference_type: impl Into<String>,
        reference_id: Uuid,
        reference_number: impl Into<String>,
    ) -> Self {
        Self {
            reference_type: reference_type.into(),
            reference_id: Some(reference_id),
            reference_number: Some(reference_number.into()),
        }
    }

    /// A reference with a type only (manual journals).
    #[must_use]
    pub fn manual(reference_type: impl Into<String>) -> Self {
        Self {
            reference_type: reference_type.into(),
            reference_id: None,
            reference_number: None,
        }
    }
}

/// Everything needed to post one voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDraft {
    /// Voucher type code (e.g. `SV`, `RV`, `JV`).
    pub voucher_type_code: String,
    /// Accounting date.
    pub voucher_date: NaiveDate,
    /// Source document link.
    pub reference: DocumentReference,
    /// Narration.
    pub narration: Option<String>,
    /// Document currency.
    pub currency: String,
    /// Units of base currency per unit of `currency`.
    pub exchange_rate: Decimal,
    /// Ordered legs.
    pub legs: Vec<PostingLeg>,
}

/// Information about a resolved account needed for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: Uuid,
    /// Account type (decides the normal side).
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
}

/// A voucher line with its account resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
    /// 1-based, dense line number.
    pub line_no: i32,
    /// Concrete account.
    pub account_id: Uuid,
    /// Debit in base currency (zero on credit lines).
    pub debit: Decimal,
    /// Credit in base currency (zero on debit lines).
    pub credit: Decimal,
    /// Line description.
    pub description: Option<String>,
    /// Tax carried by this line.
    pub tax_amount: Option<Decimal>,
}

/// Voucher totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
    /// Whether debits equal credits exactly.
    pub is_balanced: bool,
}

impl VoucherTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }
}
