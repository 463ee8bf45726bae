//! # sharegate-policy
//!
//! The [`PolicyStore`]: per-asset trading flags, issuer and officer
//! roles, the officer permission map, and the ordered set of attached
//! whitelists (with an optional Regulation-D designation).

pub mod store;

pub use store::PolicyStore;
