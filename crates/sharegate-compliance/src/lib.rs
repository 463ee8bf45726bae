//! # sharegate-compliance
//!
//! The transfer compliance engine and the indirection layer ledgers use
//! to reach it.
//!
//! - [`engine::evaluate`]: the ordered rule set producing a [`Decision`]
//!   (re-exported as [`evaluate`]).
//! - [`RegulatorService`] / [`ServiceRegistry`]: owner-swappable pointers
//!   to the policy store and the service.
//! - [`Deployment`]: the address-keyed set of deployed components,
//!   implementing [`TransferVerifier`] for ledgers.
//!
//! [`Decision`]: sharegate_types::Decision

pub mod deployment;
pub mod directory;
pub mod engine;
pub mod service;

pub use deployment::{Deployment, TransferVerifier};
pub use directory::{ContractDirectory, ContractKind};
pub use engine::evaluate;
pub use service::{RegulatorService, ServiceRegistry};
