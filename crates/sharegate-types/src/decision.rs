//! Compliance decisions and the transfer request they answer.
//!
//! Reason codes are a closed enumeration with stable numeric values; the
//! numbers are part of the audit contract (`CheckStatus.reason`).

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AssetId, Result, ShareGateError};

/// Outcome reason of a compliance evaluation, in evaluation order.
///
/// Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ReasonCode {
    /// All checks passed (or an issuer bypass applied).
    Approved = 0,
    /// Trading is globally locked for the asset.
    Locked = 1,
    /// Receiver holds nothing and new shareholders are not admitted.
    NewShareholdersNotAllowed = 2,
    /// Sender is on none of the attached whitelists.
    SenderNotWhitelisted = 3,
    /// Receiver is on none of the attached whitelists.
    ReceiverNotWhitelisted = 4,
    /// Receiver is a Regulation-D holder still inside the holding period.
    RegulationDHoldingPeriod = 5,
}

impl ReasonCode {
    /// Stable numeric code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Approved),
            1 => Some(Self::Locked),
            2 => Some(Self::NewShareholdersNotAllowed),
            3 => Some(Self::SenderNotWhitelisted),
            4 => Some(Self::ReceiverNotWhitelisted),
            5 => Some(Self::RegulationDHoldingPeriod),
            _ => None,
        }
    }
}

impl From<ReasonCode> for u8 {
    fn from(reason: ReasonCode) -> Self {
        reason.code()
    }
}

impl TryFrom<u8> for ReasonCode {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown reason code {code}"))
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::Locked => write!(f, "LOCKED"),
            Self::NewShareholdersNotAllowed => write!(f, "NEW_SHAREHOLDERS_NOT_ALLOWED"),
            Self::SenderNotWhitelisted => write!(f, "SENDER_NOT_WHITELISTED"),
            Self::ReceiverNotWhitelisted => write!(f, "RECEIVER_NOT_WHITELISTED"),
            Self::RegulationDHoldingPeriod => write!(f, "REGULATION_D_HOLDING_PERIOD"),
        }
    }
}

/// The immutable outcome of one compliance evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    reason: ReasonCode,
    allowed: bool,
}

impl Decision {
    #[must_use]
    pub fn approve() -> Self {
        Self {
            reason: ReasonCode::Approved,
            allowed: true,
        }
    }

    /// A decision for `reason`; allowed iff the reason is `Approved`.
    #[must_use]
    pub fn from_reason(reason: ReasonCode) -> Self {
        Self {
            reason,
            allowed: reason == ReasonCode::Approved,
        }
    }

    #[must_use]
    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    #[must_use]
    pub fn allowed(&self) -> bool {
        self.allowed
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "ALLOW" } else { "DENY" };
        write!(f, "{verdict}({}:{})", self.reason.code(), self.reason)
    }
}

/// A proposed movement of value, as seen by the compliance engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// The regulated asset.
    pub asset: AssetId,
    /// Who initiated the transfer (differs from `from` for delegated transfers).
    pub spender: Address,
    /// Holder the value leaves.
    pub from: Address,
    /// Holder the value arrives at.
    pub to: Address,
    /// Amount to move.
    pub amount: Decimal,
    /// `to`'s balance before the transfer, used for new-shareholder gating.
    pub receiver_balance: Decimal,
}

impl TransferRequest {
    /// A direct transfer (`spender == from`) to a receiver with no prior balance.
    #[must_use]
    pub fn new(asset: AssetId, from: Address, to: Address, amount: Decimal) -> Self {
        Self {
            asset,
            spender: from,
            from,
            to,
            amount,
            receiver_balance: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_spender(mut self, spender: Address) -> Self {
        self.spender = spender;
        self
    }

    #[must_use]
    pub fn with_receiver_balance(mut self, balance: Decimal) -> Self {
        self.receiver_balance = balance;
        self
    }

    /// Reject malformed input before evaluation begins.
    ///
    /// # Errors
    /// `ZeroAddress` for a null party, `InvalidAmount` for a negative amount
    /// or receiver balance.
    pub fn validate(&self) -> Result<()> {
        self.asset.address().ensure_non_zero("asset")?;
        self.spender.ensure_non_zero("spender")?;
        self.from.ensure_non_zero("from")?;
        self.to.ensure_non_zero("to")?;
        if self.amount.is_sign_negative() {
            return Err(ShareGateError::InvalidAmount(self.amount));
        }
        if self.receiver_balance.is_sign_negative() {
            return Err(ShareGateError::InvalidAmount(self.receiver_balance));
        }
        Ok(())
    }
}
