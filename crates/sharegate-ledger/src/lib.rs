//! # sharegate-ledger
//!
//! Reference ledger for a regulated share: balances, allowances and
//! minting, with every transfer routed through a
//! [`TransferVerifier`](sharegate_compliance::TransferVerifier) first.
//!
//! [`LedgerCall`] and [`LedgerExecutor`] let a
//! [`MultiSigArbitration`](sharegate_arbitration::MultiSigArbitration)
//! wallet drive the ledger, typically for forced transfers.

pub mod call;
pub mod ledger;

pub use call::{LedgerCall, LedgerExecutor};
pub use ledger::RegulatedLedger;
