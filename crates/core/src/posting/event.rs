//! Business events handed to the posting engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{DocumentReference, PostingLeg};
use crate::party::PartyRef;
use crate::payment::PaymentMode;

/// Named event types the engine knows how to post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Cash-less sale against the receivable control account.
    Sale,
    /// Stock purchase against the payable control account.
    Purchase,
    /// Posted sales invoice.
    SalesInvoice,
    /// Posted purchase invoice.
    PurchaseInvoice,
    /// Posted diagnostic test invoice.
    TestInvoice,
    /// Money received against invoices.
    Receipt,
    /// Money paid against invoices.
    Payment,
    /// Advance received from a customer or patient.
    AdvanceReceipt,
    /// Advance paid to a supplier.
    AdvancePayment,
    /// Customer/patient advance applied to their invoices.
    AdvanceAppliedReceivable,
    /// Supplier advance applied to their invoices.
    AdvanceAppliedPayable,
    /// Sales return.
    CreditNote,
    /// Purchase return.
    DebitNote,
    /// Stock written off as waste.
    WasteWriteOff,
    /// Caller-supplied legs.
    Journal,
}

impl EventKind {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Purchase => "PURCHASE",
            Self::SalesInvoice => "SALES_INVOICE",
            Self::PurchaseInvoice => "PURCHASE_INVOICE",
            Self::TestInvoice => "TEST_INVOICE",
            Self::Receipt => "RECEIPT",
            Self::Payment => "PAYMENT",
            Self::AdvanceReceipt => "ADVANCE_RECEIPT",
            Self::AdvancePayment => "ADVANCE_PAYMENT",
            Self::AdvanceAppliedReceivable => "ADVANCE_APPLIED_RECEIVABLE",
            Self::AdvanceAppliedPayable => "ADVANCE_APPLIED_PAYABLE",
            Self::CreditNote => "CREDIT_NOTE",
            Self::DebitNote => "DEBIT_NOTE",
            Self::WasteWriteOff => "WASTE_WRITE_OFF",
            Self::Journal => "JOURNAL",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount fields a template rule can pick from. Zero means "no line".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAmounts {
    /// Document or payment total.
    pub total: Decimal,
    /// Taxable value.
    pub subtotal: Decimal,
    /// Cost of goods sold on a sale.
    pub cogs: Decimal,
    /// CGST.
    pub cgst: Decimal,
    /// SGST.
    pub sgst: Decimal,
    /// IGST.
    pub igst: Decimal,
    /// Cess.
    pub cess: Decimal,
    /// TDS deducted.
    pub tds: Decimal,
}

/// One payment instrument line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentLeg {
    /// Instrument mode (decides CASH vs BANK).
    pub mode: PaymentMode,
    /// Amount in base currency.
    pub amount: Decimal,
    /// Line description.
    pub description: Option<String>,
}

/// A validated business event ready for posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessEvent {
    /// Which template applies.
    pub kind: EventKind,
    /// Overrides the template's voucher type.
    pub voucher_type_code: Option<String>,
    /// Accounting date.
    pub voucher_date: NaiveDate,
    /// Source document.
    pub reference: DocumentReference,
    /// Narration.
    pub narration: Option<String>,
    /// Document currency.
    pub currency: String,
    /// Units of base currency per unit of `currency`.
    pub exchange_rate: Decimal,
    /// Counterparty for party and advance legs.
    pub party: Option<PartyRef>,
    /// Amounts.
    pub amounts: EventAmounts,
    /// Payment instruments for receipt/payment templates.
    pub instruments: Vec<InstrumentLeg>,
    /// Legs for `Journal` events.
    pub journal_legs: Vec<PostingLeg>,
}

impl BusinessEvent {
    /// Creates an event in base currency with no instruments.
    #[must_use]
    pub fn new(
        kind: EventKind,
        voucher_date: NaiveDate,
        reference: DocumentReference,
        base_currency: &str,
        amounts: EventAmounts,
    ) -> Self {
        Self {
            kind,
            voucher_type_code: None,
            voucher_date,
            reference,
            narration: None,
            currency: base_currency.to_string(),
            exchange_rate: Decimal::ONE,
            party: None,
            amounts,
            instruments: Vec::new(),
            journal_legs: Vec::new(),
        }
    }

    /// Sets the party.
    #[must_use]
    pub const fn with_party(mut self, party: PartyRef) -> Self {
        self.party = Some(party);
        self
    }

    /// Sets the narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    /// Sets the instruments.
    #[must_use]
    pub fn with_instruments(mut self, instruments: Vec<InstrumentLeg>) -> Self {
        self.instruments = instruments;
        self
    }

    /// Sets currency and exchange rate.
    #[must_use]
    pub fn with_currency(mut self, currency: &str, exchange_rate: Decimal) -> Self {
        self.currency = currency.to_uppercase();
        self.exchange_rate = exchange_rate;
        self
    }
}
