//! `SeaORM` active enums and their mapping onto the core domain types.

use hisaab_core::document::{InvoiceKind as CoreInvoiceKind, InvoicePaymentStatus as CorePaymentState};
use hisaab_core::document::{InvoiceStatus as CoreInvoiceStatus, NoteType as CoreNoteType};
use hisaab_core::ledger::AccountType as CoreAccountType;
use hisaab_core::party::PartyType as CorePartyType;
use hisaab_core::payment::{PaymentStatus as CorePaymentStatus, PaymentType as CorePaymentType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "party_type")]
pub enum PartyType {
    #[sea_orm(string_value = "CUSTOMER")]
    Customer,
    #[sea_orm(string_value = "SUPPLIER")]
    Supplier,
    #[sea_orm(string_value = "PATIENT")]
    Patient,
    #[sea_orm(string_value = "EMPLOYEE")]
    Employee,
    #[sea_orm(string_value = "BANK")]
    Bank,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_kind")]
pub enum InvoiceKind {
    #[sea_orm(string_value = "SALES_INVOICE")]
    SalesInvoice,
    #[sea_orm(string_value = "PURCHASE_INVOICE")]
    PurchaseInvoice,
    #[sea_orm(string_value = "TEST_INVOICE")]
    TestInvoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "PARTIALLY_PAID")]
    PartiallyPaid,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_payment_status")]
pub enum InvoicePaymentStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "OVERPAID")]
    Overpaid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "note_type")]
pub enum NoteType {
    #[sea_orm(string_value = "CREDIT_NOTE")]
    CreditNote,
    #[sea_orm(string_value = "DEBIT_NOTE")]
    DebitNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_type")]
pub enum PaymentType {
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    #[sea_orm(string_value = "PAYMENT")]
    Payment,
    #[sea_orm(string_value = "CONTRA")]
    Contra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "RECONCILED")]
    Reconciled,
}

/// Generates `From` conversions both ways between a stored enum and its
/// core counterpart.
macro_rules! mirror_enum {
    ($db:ident => $core:ident { $($variant:ident => $core_variant:ident),+ $(,)? }) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => $core::$core_variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$core_variant => $db::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType => CoreAccountType {
    Asset => Asset,
    Liability => Liability,
    Equity => Equity,
    Revenue => Revenue,
    Expense => Expense,
});

mirror_enum!(PartyType => CorePartyType {
    Customer => Customer,
    Supplier => Supplier,
    Patient => Patient,
    Employee => Employee,
    Bank => Bank,
    Other => Other,
});

mirror_enum!(InvoiceKind => CoreInvoiceKind {
    SalesInvoice => Sales,
    PurchaseInvoice => Purchase,
    TestInvoice => Test,
});

mirror_enum!(InvoiceStatus => CoreInvoiceStatus {
    Draft => Draft,
    Posted => Posted,
    PartiallyPaid => PartiallyPaid,
    Paid => Paid,
    Cancelled => Cancelled,
});

mirror_enum!(InvoicePaymentStatus => CorePaymentState {
    Unpaid => Unpaid,
    Partial => Partial,
    Paid => Paid,
    Overpaid => Overpaid,
});

mirror_enum!(NoteType => CoreNoteType {
    CreditNote => Credit,
    DebitNote => Debit,
});

mirror_enum!(PaymentType => CorePaymentType {
    Receipt => Receipt,
    Payment => Payment,
    Contra => Contra,
});

mirror_enum!(PaymentStatus => CorePaymentStatus {
    Draft => Draft,
    Posted => Posted,
    Cancelled => Cancelled,
    Reconciled => Reconciled,
});
