//! Payment domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::AccountRole;
use crate::posting::EventKind;

/// Payment status.
///
/// The valid transitions are:
/// - Draft → Posted (offline creation or gateway success)
/// - Draft / Posted → Reconciled
/// - Draft / Posted → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting gateway confirmation; no voucher yet.
    Draft,
    /// Voucher posted.
    Posted,
    /// Cancelled.
    Cancelled,
    /// Matched against the bank statement.
    Reconciled,
}

impl PaymentStatus {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Posted => "POSTED",
            Self::Cancelled => "CANCELLED",
            Self::Reconciled => "RECONCILED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Money received.
    Receipt,
    /// Money paid out.
    Payment,
    /// Transfer between own cash and bank accounts.
    Contra,
}

impl PaymentType {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "RECEIPT",
            Self::Payment => "PAYMENT",
            Self::Contra => "CONTRA",
        }
    }

    /// Template posting a payment of this type.
    ///
    /// Advances go to the party's advance account instead of the party
    /// account. Contra transfers have no template.
    #[must_use]
    pub const fn posting_kind(self, is_advance: bool) -> Option<EventKind> {
        match (self, is_advance) {
            (Self::Receipt, false) => Some(EventKind::Receipt),
            (Self::Receipt, true) => Some(EventKind::AdvanceReceipt),
            (Self::Payment, false) => Some(EventKind::Payment),
            (Self::Payment, true) => Some(EventKind::AdvancePayment),
            (Self::Contra, _) => None,
        }
    }

    /// Template moving an advance onto the party account once it is allocated.
    #[must_use]
    pub const fn advance_applied_kind(self) -> Option<EventKind> {
        match self {
            Self::Receipt => Some(EventKind::AdvanceAppliedReceivable),
            Self::Payment => Some(EventKind::AdvanceAppliedPayable),
            Self::Contra => None,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrument used for one payment detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Cash.
    Cash,
    /// Direct bank transfer recorded manually.
    Bank,
    /// Cheque.
    Cheque,
    /// UPI.
    Upi,
    /// Generic online gateway.
    Online,
    /// Card.
    Card,
    /// Wallet.
    Wallet,
    /// NEFT.
    Neft,
    /// RTGS.
    Rtgs,
    /// IMPS.
    Imps,
}

impl PaymentMode {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Bank => "BANK",
            Self::Cheque => "CHEQUE",
            Self::Upi => "UPI",
            Self::Online => "ONLINE",
            Self::Card => "CARD",
            Self::Wallet => "WALLET",
            Self::Neft => "NEFT",
            Self::Rtgs => "RTGS",
            Self::Imps => "IMPS",
        }
    }

    /// Parses a stored code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Some(Self::Cash),
            "BANK" => Some(Self::Bank),
            "CHEQUE" => Some(Self::Cheque),
            "UPI" => Some(Self::Upi),
            "ONLINE" => Some(Self::Online),
            "CARD" => Some(Self::Card),
            "WALLET" => Some(Self::Wallet),
            "NEFT" => Some(Self::Neft),
            "RTGS" => Some(Self::Rtgs),
            "IMPS" => Some(Self::Imps),
            _ => None,
        }
    }

    /// Online modes wait for a gateway callback before posting.
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(
            self,
            Self::Upi
                | Self::Online
                | Self::Card
                | Self::Wallet
                | Self::Neft
                | Self::Rtgs
                | Self::Imps
        )
    }

    /// Role of the account the money moves through.
    #[must_use]
    pub const fn instrument_role(self) -> AccountRole {
        match self {
            Self::Cash => AccountRole::Cash,
            _ => AccountRole::Bank,
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by a payment gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    /// Funds captured.
    Success,
    /// Declined or errored.
    Failed,
    /// Anything else (pending, timeout, unknown).
    Pending,
}

impl GatewayStatus {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
        }
    }

    /// Parses a gateway status; unrecognised values count as pending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILED" | "FAILURE" => Self::Failed,
            _ => Self::Pending,
        }
    }
}
