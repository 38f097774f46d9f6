//! The posting rule table.

use crate::ledger::{AccountRole, EntryType};

use super::event::{EventAmounts, EventKind};

use AccountRole as R;
use AmountField as A;
use LegTarget::{Instruments, Party, PartyAdvance, Role};

/// Where a rule posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegTarget {
    /// A configured role.
    Role(AccountRole),
    /// The event party's receivable/payable account.
    Party,
    /// The advance role matching the event party's type.
    PartyAdvance,
    /// One leg per payment instrument, CASH or BANK by mode. The rule's
    /// amount field is ignored; each instrument carries its own amount.
    Instruments,
}

/// Which event amount a rule posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    /// `amounts.total`.
    Total,
    /// `amounts.subtotal`.
    Subtotal,
    /// `amounts.cogs`.
    Cogs,
    /// `amounts.cgst`.
    Cgst,
    /// `amounts.sgst`.
    Sgst,
    /// `amounts.igst`.
    Igst,
    /// `amounts.cess`.
    Cess,
    /// `amounts.tds`.
    Tds,
}

impl AmountField {
    /// Picks this field from `amounts`.
    #[must_use]
    pub const fn pick(self, amounts: &EventAmounts) -> rust_decimal::Decimal {
        match self {
            Self::Total => amounts.total,
            Self::Subtotal => amounts.subtotal,
            Self::Cogs => amounts.cogs,
            Self::Cgst => amounts.cgst,
            Self::Sgst => amounts.sgst,
            Self::Igst => amounts.igst,
            Self::Cess => amounts.cess,
            Self::Tds => amounts.tds,
        }
    }

    /// Whether lines posted from this field carry it as `tax_amount`.
    #[must_use]
    pub const fn is_tax(self) -> bool {
        matches!(self, Self::Cgst | Self::Sgst | Self::Igst | Self::Cess)
    }
}

/// One row of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegRule {
    /// Target account.
    pub target: LegTarget,
    /// Debit or credit.
    pub side: EntryType,
    /// Amount source.
    pub amount: AmountField,
}

const fn dr(target: LegTarget, amount: AmountField) -> LegRule {
    LegRule {
        target,
        side: EntryType::Debit,
        amount,
    }
}

const fn cr(target: LegTarget, amount: AmountField) -> LegRule {
    LegRule {
        target,
        side: EntryType::Credit,
        amount,
    }
}

const SALE: &[LegRule] = &[
    dr(Role(R::AccountsReceivable), A::Total),
    cr(Role(R::Sales), A::Subtotal),
    cr(Role(R::GstOutputCgst), A::Cgst),
    cr(Role(R::GstOutputSgst), A::Sgst),
    cr(Role(R::GstOutputIgst), A::Igst),
    cr(Role(R::GstOutputCess), A::Cess),
    dr(Role(R::Cogs), A::Cogs),
    cr(Role(R::Inventory), A::Cogs),
];

const PURCHASE: &[LegRule] = &[
    dr(Role(R::Inventory), A::Subtotal),
    dr(Role(R::GstInputCgst), A::Cgst),
    dr(Role(R::GstInputSgst), A::Sgst),
    dr(Role(R::GstInputIgst), A::Igst),
    dr(Role(R::GstInputCess), A::Cess),
    cr(Role(R::AccountsPayable), A::Total),
];

const SALES_INVOICE: &[LegRule] = &[
    dr(Party, A::Total),
    cr(Role(R::Sales), A::Subtotal),
    cr(Role(R::GstOutputCgst), A::Cgst),
    cr(Role(R::GstOutputSgst), A::Sgst),
    cr(Role(R::GstOutputIgst), A::Igst),
    cr(Role(R::GstOutputCess), A::Cess),
];

const TEST_INVOICE: &[LegRule] = &[
    dr(Party, A::Total),
    cr(Role(R::DiagnosticRevenue), A::Subtotal),
    cr(Role(R::GstOutputCgst), A::Cgst),
    cr(Role(R::GstOutputSgst), A::Sgst),
    cr(Role(R::GstOutputIgst), A::Igst),
    cr(Role(R::GstOutputCess), A::Cess),
];

const PURCHASE_INVOICE: &[LegRule] = &[
    dr(Role(R::Purchase), A::Subtotal),
    dr(Role(R::GstInputCgst), A::Cgst),
    dr(Role(R::GstInputSgst), A::Sgst),
    dr(Role(R::GstInputIgst), A::Igst),
    dr(Role(R::GstInputCess), A::Cess),
    cr(Party, A::Total),
];

const RECEIPT: &[LegRule] = &[
    dr(Instruments, A::Total),
    dr(Role(R::TdsReceivable), A::Tds),
    cr(Party, A::Total),
];

const PAYMENT: &[LegRule] = &[
    dr(Party, A::Total),
    cr(Instruments, A::Total),
    cr(Role(R::TdsPayable), A::Tds),
];

const ADVANCE_RECEIPT: &[LegRule] = &[dr(Instruments, A::Total), cr(PartyAdvance, A::Total)];

const ADVANCE_PAYMENT: &[LegRule] = &[dr(PartyAdvance, A::Total), cr(Instruments, A::Total)];

const ADVANCE_APPLIED_RECEIVABLE: &[LegRule] = &[dr(PartyAdvance, A::Total), cr(Party, A::Total)];

const ADVANCE_APPLIED_PAYABLE: &[LegRule] = &[dr(Party, A::Total), cr(PartyAdvance, A::Total)];

const CREDIT_NOTE: &[LegRule] = &[
    dr(Role(R::Sales), A::Subtotal),
    dr(Role(R::GstOutputCgst), A::Cgst),
    dr(Role(R::GstOutputSgst), A::Sgst),
    dr(Role(R::GstOutputIgst), A::Igst),
    dr(Role(R::GstOutputCess), A::Cess),
    cr(Party, A::Total),
];

const DEBIT_NOTE: &[LegRule] = &[
    dr(Party, A::Total),
    cr(Role(R::Purchase), A::Subtotal),
    cr(Role(R::GstInputCgst), A::Cgst),
    cr(Role(R::GstInputSgst), A::Sgst),
    cr(Role(R::GstInputIgst), A::Igst),
    cr(Role(R::GstInputCess), A::Cess),
];

const WASTE_WRITE_OFF: &[LegRule] = &[
    dr(Role(R::WasteExpense), A::Total),
    cr(Role(R::Inventory), A::Total),
];

/// Rules and default voucher type for one event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingTemplate {
    /// Event kind.
    pub kind: EventKind,
    /// Voucher type code used unless the event overrides it.
    pub voucher_type_code: &'static str,
    /// Ordered rules. Empty for journals, whose legs come from the event.
    pub rules: &'static [LegRule],
}

impl PostingTemplate {
    /// Looks up the template for `kind`.
    #[must_use]
    pub const fn for_kind(kind: EventKind) -> Self {
        let (voucher_type_code, rules): (&'static str, &'static [LegRule]) = match kind {
            EventKind::Sale => ("SV", SALE),
            EventKind::Purchase => ("PV", PURCHASE),
            EventKind::SalesInvoice => ("SV", SALES_INVOICE),
            EventKind::TestInvoice => ("SV", TEST_INVOICE),
            EventKind::PurchaseInvoice => ("PV", PURCHASE_INVOICE),
            EventKind::Receipt => ("RV", RECEIPT),
            EventKind::Payment => ("PY", PAYMENT),
            EventKind::AdvanceReceipt => ("RV", ADVANCE_RECEIPT),
            EventKind::AdvancePayment => ("PY", ADVANCE_PAYMENT),
            EventKind::AdvanceAppliedReceivable => ("JV", ADVANCE_APPLIED_RECEIVABLE),
            EventKind::AdvanceAppliedPayable => ("JV", ADVANCE_APPLIED_PAYABLE),
            EventKind::CreditNote => ("CN", CREDIT_NOTE),
            EventKind::DebitNote => ("DN", DEBIT_NOTE),
            EventKind::WasteWriteOff => ("JV", WASTE_WRITE_OFF),
            EventKind::Journal => ("JV", &[]),
        };
        Self {
            kind,
            voucher_type_code,
            rules,
        }
    }

    /// Every role a template can hit directly, without party resolution.
    #[must_use]
    pub fn roles(&self) -> Vec<AccountRole> {
        self.rules
            .iter()
            .filter_map(|rule| match rule.target {
                LegTarget::Role(role) => Some(role),
                _ => None,
            })
            .collect()
    }
}
