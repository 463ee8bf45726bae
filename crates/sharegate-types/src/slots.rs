//! Index-stable enumeration with tombstones.
//!
//! Removal clears a slot instead of compacting the list, so positions an
//! external indexer cached stay valid. Enumeration returns every slot in
//! insertion order; callers skip the `None` entries.

use serde::{Deserialize, Serialize};

use crate::Address;

/// Insertion-ordered list of addresses whose removed entries stay behind
/// as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotList {
    slots: Vec<Option<Address>>,
}

impl SlotList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `address` unless a live slot already holds it.
    /// Returns the slot index holding the address.
    pub fn insert(&mut self, address: Address) -> usize {
        if let Some(idx) = self.position(&address) {
            return idx;
        }
        self.slots.push(Some(address));
        self.slots.len() - 1
    }

    /// Tombstone the live slot holding `address`. Returns its index, or
    /// `None` if the address was not present.
    pub fn remove(&mut self, address: &Address) -> Option<usize> {
        let idx = self.position(address)?;
        self.slots[idx] = None;
        Some(idx)
    }

    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.position(address).is_some()
    }

    #[must_use]
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.slots.iter().position(|s| s.as_ref() == Some(address))
    }

    /// Every slot, tombstones included.
    #[must_use]
    pub fn slots(&self) -> &[Option<Address>] {
        &self.slots
    }

    /// Live entries in insertion order.
    pub fn live(&self) -> impl Iterator<Item = Address> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Total slots, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
