//! Voucher numbering.
//!
//! Numbers come from a per-(tenant, voucher type) counter that the repository
//! locks for the duration of the posting transaction.

/// Formats a voucher number as `{PREFIX}-{sequence}` zero-padded to `width`.
#[must_use]
pub fn format_voucher_number(prefix: &str, sequence: i64, width: usize) -> String {
    format!("{prefix}-{sequence:0width$}")
}
