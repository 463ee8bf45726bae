//! Multi-signature arbitration wallet.
//!
//! # Lifecycle
//!
//! ```text
//! submit ──► Proposed ──confirm*──► threshold met ──► execute ──► Executed
//!                                        │
//!                                        └── call fails ──► still Proposed
//!                                                          (retry via execute_transaction)
//! ```
//!
//! # Invariants
//!
//! 1. Transaction ids are assigned monotonically and never reused.
//! 2. Confirmations only grow; there is no revocation.
//! 3. `executed` flips false → true at most once, and only after the
//!    executor returned `Ok`.
//! 4. Confirming an executed transaction is rejected, so a late
//!    confirmation can never run the call a second time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sharegate_types::{
    Address, ArbitrationConfig, AuditEvent, EventJournal, Result, ShareGateError, TransactionId,
};
use tracing::{info, warn};

use crate::CallExecutor;

/// A queued call and its confirmation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrationTransaction {
    pub id: TransactionId,
    pub target: Address,
    pub value: Decimal,
    pub payload: Vec<u8>,
    /// Hex SHA-256 of `payload`, for audit.
    pub payload_hash: String,
    pub submitter: Address,
    pub submitted_at: DateTime<Utc>,
    pub executed: bool,
    /// Owners in confirmation order.
    pub confirmations: Vec<Address>,
}

impl ArbitrationTransaction {
    #[must_use]
    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.contains(owner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Below threshold; nothing was attempted.
    Pending,
    /// The call ran and the transaction is now executed.
    Executed,
    /// The call was attempted and failed; the transaction stays open.
    Failed,
}

/// Outcome of a submit, confirm or execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrationReceipt {
    pub transaction_id: TransactionId,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone)]
pub struct MultiSigArbitration {
    address: Address,
    owners: Vec<Address>,
    required: usize,
    transactions: BTreeMap<TransactionId, ArbitrationTransaction>,
    next_id: TransactionId,
    journal: EventJournal,
}

impl MultiSigArbitration {
    /// # Errors
    /// [`ShareGateError::ZeroAddress`] for a zero wallet address, or
    /// [`ShareGateError::InvalidArbitrationSetup`] from
    /// [`ArbitrationConfig::validate`].
    pub fn new(address: Address, config: &ArbitrationConfig) -> Result<Self> {
        address.ensure_non_zero("arbitration wallet")?;
        config.validate()?;
        info!(
            wallet = %address.short(),
            owners = config.owners.len(),
            required = config.threshold,
            "Arbitration wallet deployed"
        );
        Ok(Self {
            address,
            owners: config.owners.clone(),
            required: config.threshold,
            transactions: BTreeMap::new(),
            next_id: TransactionId(0),
            journal: EventJournal::new(address),
        })
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        if self.is_owner(&caller) {
            Ok(())
        } else {
            warn!(wallet = %self.address.short(), caller = %caller.short(), "Non-owner refused");
            Err(ShareGateError::NotArbitrationOwner { caller })
        }
    }

    fn get(&self, id: TransactionId) -> Result<&ArbitrationTransaction> {
        self.transactions
            .get(&id)
            .ok_or(ShareGateError::TransactionNotFound(id))
    }

    // -----------------------------------------------------------------
    // Submit / confirm / execute
    // -----------------------------------------------------------------

    /// Queue a call and count the submitter's confirmation. With a
    /// threshold of one the call runs immediately.
    pub fn submit_transaction<E: CallExecutor + ?Sized>(
        &mut self,
        caller: Address,
        target: Address,
        value: Decimal,
        payload: Vec<u8>,
        executor: &mut E,
    ) -> Result<ArbitrationReceipt> {
        self.require_owner(caller)?;
        target.ensure_non_zero("target")?;
        if value.is_sign_negative() {
            return Err(ShareGateError::InvalidAmount(value));
        }

        let id = self.next_id;
        self.next_id = id.next();
        let payload_hash = hex::encode(Sha256::digest(&payload));
        info!(
            wallet = %self.address.short(),
            tx = %id,
            target = %target.short(),
            payload_hash = %payload_hash,
            "Transaction submitted"
        );
        self.transactions.insert(
            id,
            ArbitrationTransaction {
                id,
                target,
                value,
                payload,
                payload_hash,
                submitter: caller,
                submitted_at: Utc::now(),
                executed: false,
                confirmations: Vec::new(),
            },
        );
        self.journal
            .emit(AuditEvent::Submission { transaction_id: id });

        self.confirm_transaction(caller, id, executor)
    }

    /// Record `caller`'s confirmation and execute once the threshold is met.
    ///
    /// # Errors
    /// - [`ShareGateError::NotArbitrationOwner`] for a non-owner.
    /// - [`ShareGateError::TransactionNotFound`] for an unknown id.
    /// - [`ShareGateError::AlreadyExecuted`] once the call has run.
    /// - [`ShareGateError::AlreadyConfirmed`] on a repeat confirmation.
    ///
    /// A failing call is not an error here: the receipt reports
    /// [`ExecutionStatus::Failed`] and the confirmation stands.
    pub fn confirm_transaction<E: CallExecutor + ?Sized>(
        &mut self,
        caller: Address,
        id: TransactionId,
        executor: &mut E,
    ) -> Result<ArbitrationReceipt> {
        self.require_owner(caller)?;
        let tx = self
            .transactions
            .get_mut(&id)
            .ok_or(ShareGateError::TransactionNotFound(id))?;
        if tx.executed {
            return Err(ShareGateError::AlreadyExecuted(id));
        }
        if tx.is_confirmed_by(&caller) {
            return Err(ShareGateError::AlreadyConfirmed { owner: caller, id });
        }
        tx.confirmations.push(caller);
        let confirmations = tx.confirmations.len();
        self.journal.emit(AuditEvent::Confirmation {
            owner: caller,
            transaction_id: id,
        });
        info!(
            wallet = %self.address.short(),
            tx = %id,
            owner = %caller.short(),
            confirmations,
            required = self.required,
            "Transaction confirmed"
        );

        if confirmations < self.required {
            return Ok(ArbitrationReceipt {
                transaction_id: id,
                status: ExecutionStatus::Pending,
            });
        }
        Ok(self.run(id, executor))
    }

    /// Retry a confirmed transaction whose earlier execution failed.
    ///
    /// # Errors
    /// [`ShareGateError::ThresholdNotMet`] below threshold,
    /// [`ShareGateError::AlreadyExecuted`] after success.
    pub fn execute_transaction<E: CallExecutor + ?Sized>(
        &mut self,
        caller: Address,
        id: TransactionId,
        executor: &mut E,
    ) -> Result<ArbitrationReceipt> {
        self.require_owner(caller)?;
        let tx = self.get(id)?;
        if tx.executed {
            return Err(ShareGateError::AlreadyExecuted(id));
        }
        if tx.confirmations.len() < self.required {
            return Err(ShareGateError::ThresholdNotMet {
                id,
                confirmations: tx.confirmations.len(),
                required: self.required,
            });
        }
        Ok(self.run(id, executor))
    }

    fn run<E: CallExecutor + ?Sized>(
        &mut self,
        id: TransactionId,
        executor: &mut E,
    ) -> ArbitrationReceipt {
        let outcome = match self.transactions.get(&id) {
            Some(tx) => executor.execute_call(self.address, tx.target, tx.value, &tx.payload),
            None => Err(ShareGateError::TransactionNotFound(id)),
        };

        let status = match outcome {
            Ok(()) => {
                if let Some(tx) = self.transactions.get_mut(&id) {
                    tx.executed = true;
                }
                self.journal
                    .emit(AuditEvent::Execution { transaction_id: id });
                info!(wallet = %self.address.short(), tx = %id, "Transaction executed");
                ExecutionStatus::Executed
            }
            Err(err) => {
                self.journal
                    .emit(AuditEvent::ExecutionFailure { transaction_id: id });
                warn!(
                    wallet = %self.address.short(),
                    tx = %id,
                    error = %err,
                    "Transaction execution failed"
                );
                ExecutionStatus::Failed
            }
        };
        ArbitrationReceipt {
            transaction_id: id,
            status,
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub fn transaction(&self, id: TransactionId) -> Result<&ArbitrationTransaction> {
        self.get(id)
    }

    /// Has `id` reached the threshold?
    #[must_use]
    pub fn is_confirmed(&self, id: TransactionId) -> bool {
        self.confirmation_count(id) >= self.required
    }

    pub fn confirmations(&self, id: TransactionId) -> Result<&[Address]> {
        Ok(&self.get(id)?.confirmations)
    }

    /// Confirmations of `id`; zero for an unknown id.
    #[must_use]
    pub fn confirmation_count(&self, id: TransactionId) -> usize {
        self.transactions
            .get(&id)
            .map_or(0, |tx| tx.confirmations.len())
    }

    /// Count transactions, filtered by state.
    #[must_use]
    pub fn transaction_count(&self, pending: bool, executed: bool) -> usize {
        self.transactions
            .values()
            .filter(|tx| (pending && !tx.executed) || (executed && tx.executed))
            .count()
    }

    /// Ids in `[from, to)` matching the state filter, ascending.
    #[must_use]
    pub fn transaction_ids(
        &self,
        from: TransactionId,
        to: TransactionId,
        pending: bool,
        executed: bool,
    ) -> Vec<TransactionId> {
        if from >= to {
            return Vec::new();
        }
        self.transactions
            .range(from..to)
            .filter(|(_, tx)| (pending && !tx.executed) || (executed && tx.executed))
            .map(|(id, _)| *id)
            .collect()
    }

    #[must_use]
    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    #[must_use]
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    #[must_use]
    pub fn required(&self) -> usize {
        self.required
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}
