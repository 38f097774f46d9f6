//! Semantic account roles.
//!
//! Posting never names a concrete account code. It names a role, and the
//! tenant's account configuration binds each role to an account.

use serde::{Deserialize, Serialize};

use super::balance::AccountType;

/// A logical role an account plays in postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    /// Sales revenue.
    Sales,
    /// Purchases (expense side of purchase invoices).
    Purchase,
    /// Diagnostic test revenue.
    DiagnosticRevenue,
    /// Accounts receivable control account.
    AccountsReceivable,
    /// Accounts payable control account.
    AccountsPayable,
    /// Inventory / stock in hand.
    Inventory,
    /// Cost of goods sold.
    Cogs,
    /// Cash in hand.
    Cash,
    /// Bank account used for every non-cash instrument.
    Bank,
    /// Output CGST payable.
    GstOutputCgst,
    /// Output SGST payable.
    GstOutputSgst,
    /// Output IGST payable.
    GstOutputIgst,
    /// Output cess payable.
    GstOutputCess,
    /// Input CGST credit.
    GstInputCgst,
    /// Input SGST credit.
    GstInputSgst,
    /// Input IGST credit.
    GstInputIgst,
    /// Input cess credit.
    GstInputCess,
    /// Advances received from customers.
    CustomerAdvance,
    /// Advances received from patients.
    PatientAdvance,
    /// Advances paid to suppliers.
    SupplierAdvance,
    /// Waste and spoilage expense.
    WasteExpense,
    /// TDS deducted by customers.
    TdsReceivable,
    /// TDS deducted on supplier payments.
    TdsPayable,
}

impl AccountRole {
    /// Every role, in catalog order.
    pub const ALL: [Self; 23] = [
        Self::Sales,
        Self::Purchase,
        Self::DiagnosticRevenue,
        Self::AccountsReceivable,
        Self::AccountsPayable,
        Self::Inventory,
        Self::Cogs,
        Self::Cash,
        Self::Bank,
        Self::GstOutputCgst,
        Self::GstOutputSgst,
        Self::GstOutputIgst,
        Self::GstOutputCess,
        Self::GstInputCgst,
        Self::GstInputSgst,
        Self::GstInputIgst,
        Self::GstInputCess,
        Self::CustomerAdvance,
        Self::PatientAdvance,
        Self::SupplierAdvance,
        Self::WasteExpense,
        Self::TdsReceivable,
        Self::TdsPayable,
    ];

    /// Configuration key code stored in `account_configuration_keys.code`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Purchase => "PURCHASE",
            Self::DiagnosticRevenue => "DIAGNOSTIC_REVENUE",
            Self::AccountsReceivable => "ACCOUNTS_RECEIVABLE",
            Self::AccountsPayable => "ACCOUNTS_PAYABLE",
            Self::Inventory => "INVENTORY",
            Self::Cogs => "COGS",
            Self::Cash => "CASH",
            Self::Bank => "BANK",
            Self::GstOutputCgst => "GST_OUTPUT_CGST",
            Self::GstOutputSgst => "GST_OUTPUT_SGST",
            Self::GstOutputIgst => "GST_OUTPUT_IGST",
            Self::GstOutputCess => "GST_OUTPUT_CESS",
            Self::GstInputCgst => "GST_INPUT_CGST",
            Self::GstInputSgst => "GST_INPUT_SGST",
            Self::GstInputIgst => "GST_INPUT_IGST",
            Self::GstInputCess => "GST_INPUT_CESS",
            Self::CustomerAdvance => "CUSTOMER_ADVANCE",
            Self::PatientAdvance => "PATIENT_ADVANCE",
            Self::SupplierAdvance => "SUPPLIER_ADVANCE",
            Self::WasteExpense => "WASTE_EXPENSE",
            Self::TdsReceivable => "TDS_RECEIVABLE",
            Self::TdsPayable => "TDS_PAYABLE",
        }
    }

    /// Parses a configuration key code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.code() == code)
    }

    /// Human readable description for the key catalog.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Sales => "Sales revenue",
            Self::Purchase => "Purchases",
            Self::DiagnosticRevenue => "Diagnostic test revenue",
            Self::AccountsReceivable => "Accounts receivable control",
            Self::AccountsPayable => "Accounts payable control",
            Self::Inventory => "Inventory",
            Self::Cogs => "Cost of goods sold",
            Self::Cash => "Cash in hand",
            Self::Bank => "Bank",
            Self::GstOutputCgst => "Output CGST",
            Self::GstOutputSgst => "Output SGST",
            Self::GstOutputIgst => "Output IGST",
            Self::GstOutputCess => "Output cess",
            Self::GstInputCgst => "Input CGST",
            Self::GstInputSgst => "Input SGST",
            Self::GstInputIgst => "Input IGST",
            Self::GstInputCess => "Input cess",
            Self::CustomerAdvance => "Customer advances",
            Self::PatientAdvance => "Patient advances",
            Self::SupplierAdvance => "Supplier advances",
            Self::WasteExpense => "Waste and spoilage",
            Self::TdsReceivable => "TDS receivable",
            Self::TdsPayable => "TDS payable",
        }
    }

    /// Account type of the default account bootstrapped for this role.
    #[must_use]
    pub const fn default_account_type(self) -> AccountType {
        match self {
            Self::AccountsReceivable
            | Self::Inventory
            | Self::Cash
            | Self::Bank
            | Self::GstInputCgst
            | Self::GstInputSgst
            | Self::GstInputIgst
            | Self::GstInputCess
            | Self::SupplierAdvance
            | Self::TdsReceivable => AccountType::Asset,
            Self::AccountsPayable
            | Self::GstOutputCgst
            | Self::GstOutputSgst
            | Self::GstOutputIgst
            | Self::GstOutputCess
            | Self::CustomerAdvance
            | Self::PatientAdvance
            | Self::TdsPayable => AccountType::Liability,
            Self::Sales | Self::DiagnosticRevenue => AccountType::Revenue,
            Self::Purchase | Self::Cogs | Self::WasteExpense => AccountType::Expense,
        }
    }

    /// Chart code of the default account bootstrapped for this role.
    #[must_use]
    pub const fn default_account_code(self) -> &'static str {
        match self {
            Self::Cash => "1100",
            Self::Bank => "1110",
            Self::AccountsReceivable => "1200",
            Self::Inventory => "1300",
            Self::GstInputCgst => "1401",
            Self::GstInputSgst => "1402",
            Self::GstInputIgst => "1403",
            Self::GstInputCess => "1404",
            Self::SupplierAdvance => "1500",
            Self::TdsReceivable => "1600",
            Self::AccountsPayable => "2100",
            Self::GstOutputCgst => "2201",
            Self::GstOutputSgst => "2202",
            Self::GstOutputIgst => "2203",
            Self::GstOutputCess => "2204",
            Self::CustomerAdvance => "2301",
            Self::PatientAdvance => "2302",
            Self::TdsPayable => "2400",
            Self::Sales => "4100",
            Self::DiagnosticRevenue => "4200",
            Self::Purchase => "5100",
            Self::Cogs => "5200",
            Self::WasteExpense => "5300",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
