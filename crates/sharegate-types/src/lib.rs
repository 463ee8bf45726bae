//! # sharegate-types
//!
//! Shared types, errors, and configuration for the **ShareGate** transfer
//! compliance layer.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`], [`TransactionId`], [`EventId`]
//! - **Decisions**: [`TransferRequest`], [`Decision`], [`ReasonCode`]
//! - **Authorization**: [`Role`], [`Capabilities`], [`PrivilegedAction`], [`PermissionMap`]
//! - **Audit trail**: [`AuditEvent`], [`AuditRecord`], [`EventJournal`]
//! - **Enumeration**: [`SlotList`] (tombstoned, index-stable)
//! - **Configuration**: [`PolicyConfig`], [`ArbitrationConfig`]
//! - **Errors**: [`ShareGateError`] with `SG_ERR_` prefix codes
//! - **Constants**: system-wide limits and labels

pub mod auth;
pub mod config;
pub mod constants;
pub mod decision;
pub mod error;
pub mod event;
pub mod ids;
pub mod slots;

pub use auth::*;
pub use config::*;
pub use decision::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use slots::*;

// Constants are accessed via `sharegate_types::constants::FOO`
// (not re-exported to avoid name collisions).
