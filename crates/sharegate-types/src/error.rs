//! Error types for the ShareGate compliance layer.
//!
//! All errors use the `SG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by category:
//! - 1xx: Authorization errors
//! - 2xx: Invalid argument errors
//! - 3xx: Arbitration / execution errors
//! - 4xx: Ledger errors
//! - 9xx: General / internal errors
//!
//! A compliance denial is **not** an error. It is a normal
//! [`Decision`](crate::Decision) with `allowed == false`.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, AssetId, TransactionId};

/// The error taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller lacks the capability for the requested operation.
    Authorization,
    /// Malformed input, rejected before any state change.
    InvalidArgument,
    /// A multisig transaction could not be confirmed or executed.
    Execution,
    /// Value accounting failure in the ledger collaborator.
    Ledger,
    /// Configuration, serialization or internal failure.
    Internal,
}

/// Central error enum for all ShareGate operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareGateError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller holds none of the roles that may perform `action`.
    #[error("SG_ERR_100: {caller} is not authorized to {action}")]
    Unauthorized {
        caller: Address,
        action: &'static str,
    },

    /// The issuer is already set and the caller is neither owner nor issuer.
    #[error("SG_ERR_101: Issuer already set; only the owner or current issuer may replace it")]
    IssuerAlreadySet,

    /// A capability-gated read was attempted by an unregistered caller.
    #[error("SG_ERR_102: {caller} is not a verified caller of this whitelist")]
    NotVerifiedCaller { caller: Address },

    /// Caller is not one of the arbitration wallet owners.
    #[error("SG_ERR_103: {caller} is not an arbitration owner")]
    NotArbitrationOwner { caller: Address },

    // =================================================================
    // Invalid Argument Errors (2xx)
    // =================================================================
    /// A null address was supplied where a real one is required.
    #[error("SG_ERR_200: Zero address supplied for {what}")]
    ZeroAddress { what: &'static str },

    /// The target address does not host a deployed component of the
    /// expected kind.
    #[error("SG_ERR_201: {address} is not a deployed {expected}")]
    NotAContract {
        address: Address,
        expected: &'static str,
    },

    /// The asset is not governed by the resolved policy store.
    #[error("SG_ERR_202: Unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// A whitelist address could not be resolved.
    #[error("SG_ERR_203: Unknown whitelist: {0}")]
    UnknownWhitelist(Address),

    /// No arbitration transaction with this id exists.
    #[error("SG_ERR_204: Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The address is not a current member of the whitelist.
    #[error("SG_ERR_205: {0} is not a whitelist member")]
    NotAMember(Address),

    /// The whitelist is already attached to the policy store.
    #[error("SG_ERR_206: Whitelist already attached: {0}")]
    WhitelistAlreadyAttached(Address),

    /// The whitelist is not attached to the policy store.
    #[error("SG_ERR_207: Whitelist not attached: {0}")]
    WhitelistNotAttached(Address),

    /// Amount must not be negative.
    #[error("SG_ERR_208: Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// The owner set or threshold of an arbitration wallet is invalid.
    #[error("SG_ERR_209: Invalid arbitration setup: {reason}")]
    InvalidArbitrationSetup { reason: String },

    /// An address is already deployed in the directory.
    #[error("SG_ERR_210: Address already deployed: {0}")]
    AlreadyDeployed(Address),

    /// Operation only applies to a whitelist of another category.
    #[error("SG_ERR_211: Whitelist category does not support {operation}")]
    UnsupportedCategory { operation: &'static str },

    /// Component kinds held by the deployment must be deployed with their
    /// instance, not registered by address alone.
    #[error("SG_ERR_212: A {kind} must be deployed with its instance")]
    InstanceRequired { kind: &'static str },

    // =================================================================
    // Arbitration / Execution Errors (3xx)
    // =================================================================
    /// This owner has already confirmed the transaction.
    #[error("SG_ERR_300: {owner} already confirmed {id}")]
    AlreadyConfirmed { owner: Address, id: TransactionId },

    /// The transaction was already executed.
    #[error("SG_ERR_301: Transaction already executed: {0}")]
    AlreadyExecuted(TransactionId),

    /// Execution was requested before the threshold was met.
    #[error("SG_ERR_302: {id} has {confirmations} of {required} confirmations")]
    ThresholdNotMet {
        id: TransactionId,
        confirmations: usize,
        required: usize,
    },

    /// The downstream call failed.
    #[error("SG_ERR_303: Call execution failed: {reason}")]
    ExecutionFailed { reason: String },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// Not enough balance to move `needed`.
    #[error("SG_ERR_400: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Not enough allowance for the spender.
    #[error("SG_ERR_401: Insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: Decimal, available: Decimal },

    /// Minting has been permanently finished.
    #[error("SG_ERR_402: Minting finished")]
    MintingFinished,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SG_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl ShareGateError {
    /// Which taxonomy bucket this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. }
            | Self::IssuerAlreadySet
            | Self::NotVerifiedCaller { .. }
            | Self::NotArbitrationOwner { .. } => ErrorCategory::Authorization,
            Self::ZeroAddress { .. }
            | Self::NotAContract { .. }
            | Self::UnknownAsset(_)
            | Self::UnknownWhitelist(_)
            | Self::TransactionNotFound(_)
            | Self::NotAMember(_)
            | Self::WhitelistAlreadyAttached(_)
            | Self::WhitelistNotAttached(_)
            | Self::InvalidAmount(_)
            | Self::InvalidArbitrationSetup { .. }
            | Self::AlreadyDeployed(_)
            | Self::UnsupportedCategory { .. }
            | Self::InstanceRequired { .. } => ErrorCategory::InvalidArgument,
            Self::AlreadyConfirmed { .. }
            | Self::AlreadyExecuted(_)
            | Self::ThresholdNotMet { .. }
            | Self::ExecutionFailed { .. } => ErrorCategory::Execution,
            Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::MintingFinished => ErrorCategory::Ledger,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) => {
                ErrorCategory::Internal
            }
        }
    }

    #[must_use]
    pub fn is_authorization(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ShareGateError>;

impl From<serde_json::Error> for ShareGateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
