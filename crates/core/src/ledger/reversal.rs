//! Voucher reversal.
//!
//! A reversal is a new voucher whose lines mirror the original with debit and
//! credit swapped. The original voucher is never touched apart from the
//! link to its reversal.

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{AccountRef, DocumentReference, PostingLeg, ResolvedLine, VoucherDraft};

/// Suffix appended to the reference type of reversal vouchers.
pub const REVERSAL_SUFFIX: &str = "_REVERSAL";

/// The parts of an original voucher needed to reverse it.
#[derive(Debug, Clone)]
pub struct ReversibleVoucher {
    /// Voucher id.
    pub id: Uuid,
    /// Voucher number, used in the narration.
    pub voucher_number: String,
    /// Voucher type code.
    pub voucher_type_code: String,
    /// Original reference.
    pub reference: DocumentReference,
    /// Currency.
    pub currency: String,
    /// Exchange rate.
    pub exchange_rate: rust_decimal::Decimal,
    /// Set when this voucher is itself a reversal.
    pub is_reversal: bool,
    /// Set when this voucher already has a reversal.
    pub reversal_voucher_id: Option<Uuid>,
    /// Original lines in line order.
    pub lines: Vec<ResolvedLine>,
}

/// Builds reversal vouchers.
pub struct ReversalService;

impl ReversalService {
    /// Checks the voucher may be reversed.
    ///
    /// # Errors
    ///
    /// `AlreadyReversed` if a reversal exists, `CannotReverseReversal` for reversal vouchers.
    pub fn validate_can_reverse(voucher: &ReversibleVoucher) -> Result<(), LedgerError> {
        if voucher.is_reversal {
            return Err(LedgerError::CannotReverseReversal(voucher.id));
        }
        if voucher.reversal_voucher_id.is_some() {
            return Err(LedgerError::AlreadyReversed(voucher.id));
        }
        Ok(())
    }

    /// Builds the offsetting draft dated `reversal_date`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_can_reverse`].
    pub fn build_reversal(
        voucher: &ReversibleVoucher,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<VoucherDraft, LedgerError> {
        Self::validate_can_reverse(voucher)?;

        let legs = voucher
            .lines
            .iter()
            .map(|line| {
                // A line has exactly one non-zero side; swap it.
                let leg = if line.debit.is_zero() {
                    PostingLeg::debit(AccountRef::Account(line.account_id), line.credit)
                } else {
                    PostingLeg::credit(AccountRef::Account(line.account_id), line.debit)
                };
                PostingLeg {
                    description: line.description.clone(),
                    tax_amount: line.tax_amount,
                    ..leg
                }
            })
            .collect();

        let narration = match reason {
            Some(reason) => format!("Reversal of {}: {reason}", voucher.voucher_number),
            None => format!("Reversal of {}", voucher.voucher_number),
        };

        Ok(VoucherDraft {
            voucher_type_code: voucher.voucher_type_code.clone(),
            voucher_date: reversal_date,
            reference: DocumentReference {
                reference_type: Self::reversal_reference_type(&voucher.reference.reference_type),
                reference_id: voucher.reference.reference_id,
                reference_number: voucher.reference.reference_number.clone(),
            },
            narration: Some(narration),
            currency: voucher.currency.clone(),
            exchange_rate: voucher.exchange_rate,
            legs,
        })
    }

    /// `SALES_INVOICE` -> `SALES_INVOICE_REVERSAL`.
    #[must_use]
    pub fn reversal_reference_type(reference_type: &str) -> String {
        format!("{reference_type}{REVERSAL_SUFFIX}")
    }
}
