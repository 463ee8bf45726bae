//! Which addresses host which kind of component.
//!
//! Pointer swaps consult the directory so that a plain account or the
//! zero address can never become a storage or service target.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use sharegate_types::{Address, Result, ShareGateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Whitelist,
    PolicyStore,
    RegulatorService,
    ServiceRegistry,
    Ledger,
    ArbitrationWallet,
}

impl ContractKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::PolicyStore => "policy store",
            Self::RegulatorService => "regulator service",
            Self::ServiceRegistry => "service registry",
            Self::Ledger => "ledger",
            Self::ArbitrationWallet => "arbitration wallet",
        }
    }

    /// Kinds whose instances live outside the deployment.
    #[must_use]
    pub fn is_external(self) -> bool {
        matches!(self, Self::Ledger | Self::ArbitrationWallet)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractDirectory {
    kinds: HashMap<Address, ContractKind>,
}

impl ContractDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`ShareGateError::ZeroAddress`] or [`ShareGateError::AlreadyDeployed`].
    pub fn register(&mut self, address: Address, kind: ContractKind) -> Result<()> {
        address.ensure_non_zero(kind.label())?;
        if self.kinds.contains_key(&address) {
            return Err(ShareGateError::AlreadyDeployed(address));
        }
        self.kinds.insert(address, kind);
        Ok(())
    }

    #[must_use]
    pub fn kind_of(&self, address: &Address) -> Option<ContractKind> {
        self.kinds.get(address).copied()
    }

    /// Require `address` to host a component of kind `expected`.
    ///
    /// # Errors
    /// - [`ShareGateError::ZeroAddress`] for the zero address.
    /// - [`ShareGateError::NotAContract`] for anything else that does not
    ///   match.
    pub fn require(&self, address: &Address, expected: ContractKind) -> Result<()> {
        address.ensure_non_zero(expected.label())?;
        match self.kind_of(address) {
            Some(kind) if kind == expected => Ok(()),
            _ => Err(ShareGateError::NotAContract {
                address: *address,
                expected: expected.label(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_matches_kind() {
        let mut dir = ContractDirectory::new();
        let store = Address::derive("store");
        dir.register(store, ContractKind::PolicyStore).unwrap();

        assert!(dir.require(&store, ContractKind::PolicyStore).is_ok());
        assert!(matches!(
            dir.require(&store, ContractKind::RegulatorService),
            Err(ShareGateError::NotAContract { .. })
        ));
        assert!(matches!(
            dir.require(&Address::derive("account"), ContractKind::PolicyStore),
            Err(ShareGateError::NotAContract { .. })
        ));
        assert!(matches!(
            dir.require(&Address::ZERO, ContractKind::PolicyStore),
            Err(ShareGateError::ZeroAddress { .. })
        ));
    }

    #[test]
    fn register_rejects_duplicates_and_zero() {
        let mut dir = ContractDirectory::new();
        let a = Address::derive("a");
        dir.register(a, ContractKind::Ledger).unwrap();
        assert!(dir.register(a, ContractKind::Whitelist).is_err());
        assert!(dir.register(Address::ZERO, ContractKind::Ledger).is_err());
        assert_eq!(dir.len(), 1);
    }
}
