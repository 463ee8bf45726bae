//! # sharegate-whitelist
//!
//! Membership lists consulted by the compliance engine.
//!
//! A [`Whitelist`] tracks members with optional release times, a set of
//! qualifiers allowed to edit membership, and a [`WhitelistCategory`]
//! (general, Regulation-D, or qualified-institutional with
//! capability-gated reads). Enumeration keeps tombstones so indices stay
//! stable for off-ledger indexers.
//!
//! [`WhitelistBook`] owns deployed lists; other crates read them through
//! the [`WhitelistLookup`] trait.

pub mod book;
pub mod whitelist;

pub use book::{WhitelistBook, WhitelistLookup};
pub use whitelist::{Membership, Whitelist, WhitelistCategory};
