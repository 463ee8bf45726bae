//! Audit events and the per-component journal they are appended to.
//!
//! Event names and fields are part of the external contract: downstream
//! auditors and the ledger replay them. [`AuditEvent::name`] returns the
//! boundary name of each event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AssetId, EventId, PrivilegedAction, ReasonCode, TransactionId};

/// Every event a ShareGate component can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum AuditEvent {
    // --- Whitelist -------------------------------------------------------
    MemberAdded {
        member: Address,
    },
    MemberRemoved {
        member: Address,
    },
    ReleaseDateSet {
        member: Address,
        release_time: Option<DateTime<Utc>>,
    },
    WhitelistTypeSet {
        #[serde(rename = "type")]
        whitelist_type: String,
    },
    QualifierAdded {
        qualifier: Address,
    },
    QualifierRemoved {
        qualifier: Address,
    },
    VerifiedCallerAdded {
        caller: Address,
    },
    VerifiedCallerRemoved {
        caller: Address,
    },

    // --- Policy store ----------------------------------------------------
    WhitelistAdded {
        whitelist: Address,
    },
    WhitelistRemoved {
        whitelist: Address,
    },
    RegulationDWhitelistSet {
        asset: AssetId,
        whitelist: Address,
    },
    LogLockSet {
        asset: AssetId,
        locked: bool,
    },
    LogPartialTransferSet {
        asset: AssetId,
        allowed: bool,
    },
    NewShareholdersAllowance {
        asset: AssetId,
        allowed: bool,
    },
    InitialOfferEndDateSet {
        asset: AssetId,
        timestamp: Option<DateTime<Utc>>,
    },
    IssuerSet {
        asset: AssetId,
        issuer: Address,
    },
    IssuerRemoved {
        asset: AssetId,
    },
    MessagingAddressSet {
        asset: AssetId,
        value: String,
    },
    OfficerAdded {
        officer: Address,
    },
    OfficerRemoved {
        officer: Address,
    },
    OfficerPermissionSet {
        action: PrivilegedAction,
        allowed: bool,
    },

    // --- Compliance / indirection ---------------------------------------
    CheckStatus {
        spender: Address,
        from: Address,
        to: Address,
        value: Decimal,
        reason: ReasonCode,
    },
    ReplaceStorage {
        old_storage: Address,
        new_storage: Address,
    },
    ReplaceService {
        old_service: Address,
        new_service: Address,
    },

    // --- Arbitration wallet ---------------------------------------------
    Submission {
        transaction_id: TransactionId,
    },
    Confirmation {
        owner: Address,
        transaction_id: TransactionId,
    },
    Execution {
        transaction_id: TransactionId,
    },
    ExecutionFailure {
        transaction_id: TransactionId,
    },

    // --- Ledger ----------------------------------------------------------
    Transfer {
        from: Address,
        to: Address,
        value: Decimal,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: Decimal,
    },
    Mint {
        to: Address,
        amount: Decimal,
    },
    MintFinished,
    MultisigArbitratorSet {
        arbitrator: Address,
    },
    ForcedTransfer {
        arbitrator: Address,
        from: Address,
        to: Address,
        value: Decimal,
    },
}

impl AuditEvent {
    /// Boundary name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberAdded { .. } => "MemberAdded",
            Self::MemberRemoved { .. } => "MemberRemoved",
            Self::ReleaseDateSet { .. } => "ReleaseDateSet",
            Self::WhitelistTypeSet { .. } => "WhitelistTypeSet",
            Self::QualifierAdded { .. } => "QualifierAdded",
            Self::QualifierRemoved { .. } => "QualifierRemoved",
            Self::VerifiedCallerAdded { .. } => "VerifiedCallerAdded",
            Self::VerifiedCallerRemoved { .. } => "VerifiedCallerRemoved",
            Self::WhitelistAdded { .. } => "WhitelistAdded",
            Self::WhitelistRemoved { .. } => "WhitelistRemoved",
            Self::RegulationDWhitelistSet { .. } => "RegulationDWhitelistSet",
            Self::LogLockSet { .. } => "LogLockSet",
            Self::LogPartialTransferSet { .. } => "LogPartialTransferSet",
            Self::NewShareholdersAllowance { .. } => "NewShareholdersAllowance",
            Self::InitialOfferEndDateSet { .. } => "InitialOfferEndDateSet",
            Self::IssuerSet { .. } => "IssuerSet",
            Self::IssuerRemoved { .. } => "IssuerRemoved",
            Self::MessagingAddressSet { .. } => "MessagingAddressSet",
            Self::OfficerAdded { .. } => "OfficerAdded",
            Self::OfficerRemoved { .. } => "OfficerRemoved",
            Self::OfficerPermissionSet { .. } => "OfficerPermissionSet",
            Self::CheckStatus { .. } => "CheckStatus",
            Self::ReplaceStorage { .. } => "ReplaceStorage",
            Self::ReplaceService { .. } => "ReplaceService",
            Self::Submission { .. } => "Submission",
            Self::Confirmation { .. } => "Confirmation",
            Self::Execution { .. } => "Execution",
            Self::ExecutionFailure { .. } => "ExecutionFailure",
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::Mint { .. } => "Mint",
            Self::MintFinished => "MintFinished",
            Self::MultisigArbitratorSet { .. } => "MultisigArbitratorSet",
            Self::ForcedTransfer { .. } => "ForcedTransfer",
        }
    }
}

/// One emitted event with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: EventId,
    /// Address of the component that emitted the event.
    pub source: Address,
    pub emitted_at: DateTime<Utc>,
    pub event: AuditEvent,
}

/// Append-only event log owned by a single component.
#[derive(Debug, Clone)]
pub struct EventJournal {
    source: Address,
    records: Vec<AuditRecord>,
}

impl EventJournal {
    #[must_use]
    pub fn new(source: Address) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }

    /// Append an event, returning its id.
    pub fn emit(&mut self, event: AuditEvent) -> EventId {
        let id = EventId::new();
        self.records.push(AuditRecord {
            id,
            source: self.source,
            emitted_at: Utc::now(),
            event,
        });
        id
    }

    #[must_use]
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn events(&self) -> impl Iterator<Item = &AuditEvent> {
        self.records.iter().map(|r| &r.event)
    }

    #[must_use]
    pub fn last(&self) -> Option<&AuditEvent> {
        self.records.last().map(|r| &r.event)
    }

    /// Names of all events in emission order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().map(AuditEvent::name).collect()
    }

    /// Hand the accumulated records to an external sink.
    pub fn drain(&mut self) -> Vec<AuditRecord> {
        std::mem::take(&mut self.records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
