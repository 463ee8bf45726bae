//! Address-keyed registry of deployed whitelists.

use std::collections::HashMap;

use sharegate_types::{Address, Result, ShareGateError};
use tracing::info;

use crate::Whitelist;

/// Read access to whitelists by address.
pub trait WhitelistLookup {
    fn whitelist(&self, address: &Address) -> Option<&Whitelist>;

    /// Like [`whitelist`](Self::whitelist), but a missing entry is an error.
    fn resolve(&self, address: &Address) -> Result<&Whitelist> {
        self.whitelist(address)
            .ok_or(ShareGateError::UnknownWhitelist(*address))
    }
}

/// Owns every deployed whitelist.
#[derive(Debug, Default)]
pub struct WhitelistBook {
    lists: HashMap<Address, Whitelist>,
}

impl WhitelistBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `whitelist`, returning its address.
    ///
    /// # Errors
    /// [`ShareGateError::AlreadyDeployed`] if the address is taken.
    pub fn deploy(&mut self, whitelist: Whitelist) -> Result<Address> {
        let address = whitelist.address();
        if self.lists.contains_key(&address) {
            return Err(ShareGateError::AlreadyDeployed(address));
        }
        info!(whitelist = %address.short(), "Whitelist registered");
        self.lists.insert(address, whitelist);
        Ok(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Result<&mut Whitelist> {
        self.lists
            .get_mut(address)
            .ok_or(ShareGateError::UnknownWhitelist(*address))
    }

    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.lists.contains_key(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl WhitelistLookup for WhitelistBook {
    fn whitelist(&self, address: &Address) -> Option<&Whitelist> {
        self.lists.get(address)
    }
}
