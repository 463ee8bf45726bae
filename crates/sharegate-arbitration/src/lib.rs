//! # sharegate-arbitration
//!
//! M-of-N confirmation wallet for administrative overrides.
//!
//! Owners submit calls; each call executes once enough distinct owners
//! have confirmed it. The wallet never consults the compliance engine.
//! Its authority is purely the owner set and threshold fixed at
//! construction. Calls run through a [`CallExecutor`], so the wallet
//! stays independent of any particular ledger.

pub mod executor;
pub mod wallet;

pub use executor::{CallExecutor, RecordingExecutor};
pub use wallet::{ArbitrationReceipt, ArbitrationTransaction, ExecutionStatus, MultiSigArbitration};
