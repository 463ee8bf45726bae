//! Ledger calls as arbitration payloads.
//!
//! The wallet stores opaque bytes; [`LedgerCall`] is their JSON encoding
//! and [`LedgerExecutor`] decodes and dispatches them against a ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sharegate_arbitration::CallExecutor;
use sharegate_compliance::TransferVerifier;
use sharegate_types::{Address, Decision, Result, ShareGateError};

use crate::RegulatedLedger;

/// A ledger operation the wallet can queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum LedgerCall {
    Transfer {
        to: Address,
        value: Decimal,
    },
    Approve {
        spender: Address,
        value: Decimal,
    },
    TransferFrom {
        from: Address,
        to: Address,
        value: Decimal,
    },
    ForceTransfer {
        from: Address,
        to: Address,
        value: Decimal,
    },
}

impl LedgerCall {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Runs wallet calls against one ledger, with the wallet as caller.
pub struct LedgerExecutor<'a, V: TransferVerifier + ?Sized> {
    ledger: &'a mut RegulatedLedger,
    verifier: &'a V,
    now: DateTime<Utc>,
}

impl<'a, V: TransferVerifier + ?Sized> LedgerExecutor<'a, V> {
    pub fn new(ledger: &'a mut RegulatedLedger, verifier: &'a V, now: DateTime<Utc>) -> Self {
        Self {
            ledger,
            verifier,
            now,
        }
    }

    fn denied(decision: Decision) -> Result<()> {
        if decision.allowed() {
            Ok(())
        } else {
            Err(ShareGateError::ExecutionFailed {
                reason: format!("transfer denied: {decision}"),
            })
        }
    }
}

impl<V: TransferVerifier + ?Sized> CallExecutor for LedgerExecutor<'_, V> {
    fn execute_call(
        &mut self,
        origin: Address,
        target: Address,
        value: Decimal,
        payload: &[u8],
    ) -> Result<()> {
        if target != self.ledger.address() {
            return Err(ShareGateError::ExecutionFailed {
                reason: format!("no ledger at {target}"),
            });
        }
        if !value.is_zero() {
            return Err(ShareGateError::ExecutionFailed {
                reason: "ledger does not accept value".to_string(),
            });
        }

        match LedgerCall::decode(payload)? {
            LedgerCall::Transfer { to, value } => Self::denied(self.ledger.transfer(
                self.verifier,
                origin,
                to,
                value,
                self.now,
            )?),
            LedgerCall::Approve { spender, value } => self.ledger.approve(origin, spender, value),
            LedgerCall::TransferFrom { from, to, value } => Self::denied(
                self.ledger
                    .transfer_from(self.verifier, origin, from, to, value, self.now)?,
            ),
            LedgerCall::ForceTransfer { from, to, value } => {
                self.ledger.force_transfer(origin, from, to, value)
            }
        }
    }
}
