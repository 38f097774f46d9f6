//! Document domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use hisaab_shared::types::round_money;

use super::error::DocumentError;
use crate::gst::{GstComponent, GstService};
use crate::party::PartyType;
use crate::payment::PaymentType;
use crate::posting::EventKind;

/// Kind of invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceKind {
    /// Sales invoice to a customer.
    Sales,
    /// Purchase invoice from a supplier.
    Purchase,
    /// Diagnostic test invoice to a patient.
    Test,
}

impl InvoiceKind {
    /// Reference type stored on vouchers and allocations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "SALES_INVOICE",
            Self::Purchase => "PURCHASE_INVOICE",
            Self::Test => "TEST_INVOICE",
        }
    }

    /// Parses a reference type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SALES_INVOICE" => Some(Self::Sales),
            "PURCHASE_INVOICE" => Some(Self::Purchase),
            "TEST_INVOICE" => Some(Self::Test),
            _ => None,
        }
    }

    /// The party type an invoice of this kind is raised against.
    #[must_use]
    pub const fn party_type(self) -> PartyType {
        match self {
            Self::Sales => PartyType::Customer,
            Self::Purchase => PartyType::Supplier,
            Self::Test => PartyType::Patient,
        }
    }

    /// Payment type that settles invoices of this kind.
    #[must_use]
    pub const fn settled_by(self) -> PaymentType {
        match self {
            Self::Sales | Self::Test => PaymentType::Receipt,
            Self::Purchase => PaymentType::Payment,
        }
    }

    /// Posting template used when the invoice is posted.
    #[must_use]
    pub const fn event_kind(self) -> EventKind {
        match self {
            Self::Sales => EventKind::SalesInvoice,
            Self::Purchase => EventKind::PurchaseInvoice,
            Self::Test => EventKind::TestInvoice,
        }
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice lifecycle status.
///
/// - Draft → Posted (voucher created)
/// - Posted → PartiallyPaid / Paid (allocations)
/// - Draft / Posted (unpaid) → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Editable, not yet posted.
    Draft,
    /// Posted to the ledger, nothing paid.
    Posted,
    /// Partly settled.
    PartiallyPaid,
    /// Fully settled.
    Paid,
    /// Cancelled.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns true once the invoice has a voucher and has not been cancelled.
    #[must_use]
    pub const fn is_posted(self) -> bool {
        matches!(self, Self::Posted | Self::PartiallyPaid | Self::Paid)
    }

    /// Lifecycle status after the payment status changed.
    ///
    /// Draft and cancelled invoices keep their status.
    #[must_use]
    pub const fn after_payment(self, payment_status: InvoicePaymentStatus) -> Self {
        if !self.is_posted() {
            return self;
        }
        match payment_status {
            InvoicePaymentStatus::Unpaid => Self::Posted,
            InvoicePaymentStatus::Partial => Self::PartiallyPaid,
            InvoicePaymentStatus::Paid | InvoicePaymentStatus::Overpaid => Self::Paid,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoicePaymentStatus {
    /// Nothing paid.
    Unpaid,
    /// Partly paid.
    Partial,
    /// Paid exactly.
    Paid,
    /// Paid more than the total.
    Overpaid,
}

impl InvoicePaymentStatus {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Overpaid => "OVERPAID",
        }
    }
}

/// Credit or debit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteType {
    /// Sales return / allowance, issued against a sales invoice.
    Credit,
    /// Purchase return, issued against a purchase invoice.
    Debit,
}

impl NoteType {
    /// Reference type stored on vouchers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "CREDIT_NOTE",
            Self::Debit => "DEBIT_NOTE",
        }
    }

    /// Invoice kind this note may be issued against.
    #[must_use]
    pub const fn invoice_kind(self) -> InvoiceKind {
        match self {
            Self::Credit => InvoiceKind::Sales,
            Self::Debit => InvoiceKind::Purchase,
        }
    }

    /// Posting template for the note.
    #[must_use]
    pub const fn event_kind(self) -> EventKind {
        match self {
            Self::Credit => EventKind::CreditNote,
            Self::Debit => EventKind::DebitNote,
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts of an invoice or note, tax split already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAmounts {
    /// Taxable value.
    pub subtotal: Decimal,
    /// CGST amount.
    pub cgst_amount: Decimal,
    /// SGST amount.
    pub sgst_amount: Decimal,
    /// IGST amount.
    pub igst_amount: Decimal,
    /// Cess amount.
    pub cess_amount: Decimal,
    /// Sum of every tax component.
    pub tax_amount: Decimal,
    /// Subtotal plus tax.
    pub total_amount: Decimal,
}

impl InvoiceAmounts {
    /// Computes amounts for `subtotal` at `gst_rate` percent plus a flat cess.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` for invalid amounts or rates.
    pub fn compute(
        subtotal: Decimal,
        gst_rate: Decimal,
        is_interstate: bool,
        cess_amount: Decimal,
    ) -> Result<Self, DocumentError> {
        if cess_amount.is_sign_negative() && !cess_amount.is_zero() {
            return Err(DocumentError::InvalidAmount(cess_amount));
        }
        if subtotal <= Decimal::ZERO {
            return Err(DocumentError::InvalidAmount(subtotal));
        }
        let gst = GstService::calculate_gst(subtotal, gst_rate, is_interstate)?;
        let cess_amount = round_money(cess_amount);
        let tax_amount = gst.total_gst + cess_amount;

        Ok(Self {
            subtotal: gst.subtotal,
            cgst_amount: gst.cgst_amount,
            sgst_amount: gst.sgst_amount,
            igst_amount: gst.igst_amount,
            cess_amount,
            tax_amount,
            total_amount: gst.subtotal + tax_amount,
        })
    }

    /// Non-zero tax components, cess included.
    #[must_use]
    pub fn tax_components(&self) -> Vec<(GstComponent, Decimal)> {
        [
            (GstComponent::Cgst, self.cgst_amount),
            (GstComponent::Sgst, self.sgst_amount),
            (GstComponent::Igst, self.igst_amount),
            (GstComponent::Cess, self.cess_amount),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .collect()
    }
}
