//! Party types and the naming rules for auto-provisioned party accounts.
//!
//! Customers and patients get a receivable account under the asset group,
//! suppliers get a payable account under the liability group. Other party
//! types must be mapped to an existing account by the tenant.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::AccountRole;

/// Kind of counterparty a document or payment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    /// Sales customer.
    Customer,
    /// Goods or services supplier.
    Supplier,
    /// Clinic or diagnostics patient.
    Patient,
    /// Employee (never auto-provisioned).
    Employee,
    /// Bank (never auto-provisioned).
    Bank,
    /// Anything else (never auto-provisioned).
    Other,
}

impl PartyType {
    /// Returns the stored code for this party type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Supplier => "SUPPLIER",
            Self::Patient => "PATIENT",
            Self::Employee => "EMPLOYEE",
            Self::Bank => "BANK",
            Self::Other => "OTHER",
        }
    }

    /// Returns the provisioning rule for this party type, if it has one.
    #[must_use]
    pub const fn account_spec(self) -> Option<PartyAccountSpec> {
        match self {
            Self::Customer => Some(PartyAccountSpec {
                system_prefix: "CUSTOMER_AR",
                code_prefix: "AR-C",
                group_code: "ASET",
                side: PartySide::Receivable,
            }),
            Self::Patient => Some(PartyAccountSpec {
                system_prefix: "PATIENT_AR",
                code_prefix: "AR-P",
                group_code: "ASET",
                side: PartySide::Receivable,
            }),
            Self::Supplier => Some(PartyAccountSpec {
                system_prefix: "SUPPLIER_AP",
                code_prefix: "AP-S",
                group_code: "LIAB",
                side: PartySide::Payable,
            }),
            Self::Employee | Self::Bank | Self::Other => None,
        }
    }

    /// Returns true if an account can be created on demand for this party type.
    #[must_use]
    pub const fn is_auto_provisioned(self) -> bool {
        self.account_spec().is_some()
    }

    /// Synthetic `system_code` of the party's account.
    ///
    /// Types without a provisioning rule use their own code as prefix; the
    /// tenant creates those accounts by hand.
    #[must_use]
    pub fn system_code(self, party_id: Uuid) -> String {
        match self.account_spec() {
            Some(spec) => spec.system_code(party_id),
            None => format!("{}_{}", self.as_str(), party_id),
        }
    }

    /// Role holding advances exchanged with parties of this type.
    #[must_use]
    pub const fn advance_role(self) -> Option<AccountRole> {
        match self {
            Self::Customer => Some(AccountRole::CustomerAdvance),
            Self::Patient => Some(AccountRole::PatientAdvance),
            Self::Supplier => Some(AccountRole::SupplierAdvance),
            Self::Employee | Self::Bank | Self::Other => None,
        }
    }
}

impl std::fmt::Display for PartyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the party account is something we are owed or something we owe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartySide {
    /// Accounts receivable semantics.
    Receivable,
    /// Accounts payable semantics.
    Payable,
}

/// Naming and grouping rule for one provisioned party type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartyAccountSpec {
    /// Prefix of the synthetic `system_code`.
    pub system_prefix: &'static str,
    /// Prefix of the human-facing account code.
    pub code_prefix: &'static str,
    /// Account group the account is created under.
    pub group_code: &'static str,
    /// Receivable or payable.
    pub side: PartySide,
}

impl PartyAccountSpec {
    /// Synthetic key identifying the party's account: `{PREFIX}_{party_id}`.
    #[must_use]
    pub fn system_code(&self, party_id: Uuid) -> String {
        format!("{}_{}", self.system_prefix, party_id)
    }

    /// Account code: `{ACC_PREFIX}-{party_no:06}`.
    #[must_use]
    pub fn account_code(&self, party_no: i64) -> String {
        format!("{}-{:06}", self.code_prefix, party_no)
    }

    /// Display name for the provisioned account.
    #[must_use]
    pub fn account_name(&self, party_name: &str) -> String {
        match self.side {
            PartySide::Receivable => format!("{party_name} (Receivable)"),
            PartySide::Payable => format!("{party_name} (Payable)"),
        }
    }
}

/// A concrete party: its type and identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyRef {
    /// Party type.
    pub party_type: PartyType,
    /// Party identifier.
    pub party_id: Uuid,
}

impl PartyRef {
    /// Creates a party reference.
    #[must_use]
    pub const fn new(party_type: PartyType, party_id: Uuid) -> Self {
        Self {
            party_type,
            party_id,
        }
    }
}
