//! Forward and reverse GST split.

use hisaab_shared::types::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GST calculation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GstError {
    /// Amounts must not be negative.
    #[error("GST base amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Rates must lie between 0 and 100 percent.
    #[error("GST rate must be between 0 and 100, got {0}")]
    InvalidRate(Decimal),
}

/// One GST component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GstComponent {
    /// Central GST.
    Cgst,
    /// State GST.
    Sgst,
    /// Integrated GST.
    Igst,
    /// Compensation cess.
    Cess,
}

/// Result of a GST split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstBreakdown {
    /// Taxable value.
    pub subtotal: Decimal,
    /// CGST rate in percent.
    pub cgst_rate: Decimal,
    /// CGST amount.
    pub cgst_amount: Decimal,
    /// SGST rate in percent.
    pub sgst_rate: Decimal,
    /// SGST amount.
    pub sgst_amount: Decimal,
    /// IGST rate in percent.
    pub igst_rate: Decimal,
    /// IGST amount.
    pub igst_amount: Decimal,
    /// CGST + SGST + IGST.
    pub total_gst: Decimal,
    /// Subtotal + total GST.
    pub total_amount: Decimal,
}

impl GstBreakdown {
    /// Non-zero components in CGST, SGST, IGST order.
    #[must_use]
    pub fn components(&self) -> Vec<(GstComponent, Decimal)> {
        [
            (GstComponent::Cgst, self.cgst_amount),
            (GstComponent::Sgst, self.sgst_amount),
            (GstComponent::Igst, self.igst_amount),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .collect()
    }
}

/// Stateless GST calculator.
pub struct GstService;

impl GstService {
    /// Splits GST on `subtotal` at `rate` percent.
    ///
    /// # Errors
    ///
    /// Returns `GstError` for negative subtotals or rates outside 0..=100.
    pub fn calculate_gst(
        subtotal: Decimal,
        rate: Decimal,
        is_interstate: bool,
    ) -> Result<GstBreakdown, GstError> {
        if subtotal.is_sign_negative() && !subtotal.is_zero() {
            return Err(GstError::NegativeAmount(subtotal));
        }
        Self::validate_rate(rate)?;

        let subtotal = round_money(subtotal);
        let hundred = Decimal::ONE_HUNDRED;

        let (cgst_rate, sgst_rate, igst_rate) = if is_interstate {
            (Decimal::ZERO, Decimal::ZERO, rate)
        } else {
            let half = rate / Decimal::TWO;
            (half, half, Decimal::ZERO)
        };

        let cgst_amount = round_money(subtotal * cgst_rate / hundred);
        let sgst_amount = round_money(subtotal * sgst_rate / hundred);
        let igst_amount = round_money(subtotal * igst_rate / hundred);
        let total_gst = cgst_amount + sgst_amount + igst_amount;

        Ok(GstBreakdown {
            subtotal,
            cgst_rate,
            cgst_amount,
            sgst_rate,
            sgst_amount,
            igst_rate,
            igst_amount,
            total_gst,
            total_amount: subtotal + total_gst,
        })
    }

    /// Back-computes the taxable value from a GST-inclusive total, then
    /// splits it forward.
    ///
    /// The forward split of the recovered subtotal may not reproduce
    /// `total_with_gst` exactly because of per-component rounding.
    ///
    /// # Errors
    ///
    /// Returns `GstError` for negative totals or rates outside 0..=100.
    pub fn calculate_reverse_gst(
        total_with_gst: Decimal,
        rate: Decimal,
        is_interstate: bool,
    ) -> Result<GstBreakdown, GstError> {
        if total_with_gst.is_sign_negative() && !total_with_gst.is_zero() {
            return Err(GstError::NegativeAmount(total_with_gst));
        }
        Self::validate_rate(rate)?;

        let divisor = Decimal::ONE + rate / Decimal::ONE_HUNDRED;
        let subtotal = round_money(total_with_gst / divisor);
        Self::calculate_gst(subtotal, rate, is_interstate)
    }

    fn validate_rate(rate: Decimal) -> Result<(), GstError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(GstError::InvalidRate(rate));
        }
        Ok(())
    }
}
