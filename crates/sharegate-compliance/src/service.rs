//! Upgradeable indirections: the regulator service points at a policy
//! store, the service registry points at a regulator service.
//!
//! Ledgers hold a registry address. Swapping either pointer upgrades the
//! rules for every ledger behind it without redeploying them.

use chrono::{DateTime, Utc};
use sharegate_policy::PolicyStore;
use sharegate_types::{
    Address, AuditEvent, Capabilities, Decision, EventJournal, Result, Role, ShareGateError,
    TransferRequest,
};
use sharegate_whitelist::WhitelistLookup;
use tracing::info;

use crate::{ContractDirectory, ContractKind, engine};

/// Facade that evaluates transfers against its current policy store.
#[derive(Debug, Clone)]
pub struct RegulatorService {
    address: Address,
    owner: Address,
    storage: Address,
    journal: EventJournal,
}

impl RegulatorService {
    /// # Errors
    /// [`ShareGateError::NotAContract`] unless `storage` is a deployed
    /// policy store.
    pub fn new(
        address: Address,
        owner: Address,
        storage: Address,
        directory: &ContractDirectory,
    ) -> Result<Self> {
        address.ensure_non_zero("regulator service")?;
        owner.ensure_non_zero("owner")?;
        directory.require(&storage, ContractKind::PolicyStore)?;
        Ok(Self {
            address,
            owner,
            storage,
            journal: EventJournal::new(address),
        })
    }

    /// Point the service at another policy store. Owner-only.
    pub fn replace_storage(
        &mut self,
        caller: Address,
        new_storage: Address,
        directory: &ContractDirectory,
    ) -> Result<()> {
        Capabilities::of(caller)
            .with_if(Role::Owner, caller == self.owner)
            .require_any(&[Role::Owner], "replaceStorage")?;
        directory.require(&new_storage, ContractKind::PolicyStore)?;

        let old_storage = std::mem::replace(&mut self.storage, new_storage);
        self.journal.emit(AuditEvent::ReplaceStorage {
            old_storage,
            new_storage,
        });
        info!(
            service = %self.address.short(),
            old = %old_storage.short(),
            new = %new_storage.short(),
            "Storage replaced"
        );
        Ok(())
    }

    /// Run the compliance engine against `store`, which must be the
    /// store this service currently points at.
    ///
    /// # Errors
    /// [`ShareGateError::Internal`] if `store` is not the current storage,
    /// otherwise whatever [`engine::evaluate`] returns.
    pub fn check<L: WhitelistLookup + ?Sized>(
        &self,
        store: &PolicyStore,
        lists: &L,
        request: &TransferRequest,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        if store.address() != self.storage {
            return Err(ShareGateError::Internal(format!(
                "service {} was handed store {} but points at {}",
                self.address,
                store.address(),
                self.storage
            )));
        }
        engine::evaluate(store, lists, request, now)
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn storage(&self) -> Address {
        self.storage
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

/// Stable address ledgers hold; forwards to the current regulator service.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    address: Address,
    owner: Address,
    service: Address,
    journal: EventJournal,
}

impl ServiceRegistry {
    pub fn new(
        address: Address,
        owner: Address,
        service: Address,
        directory: &ContractDirectory,
    ) -> Result<Self> {
        address.ensure_non_zero("service registry")?;
        owner.ensure_non_zero("owner")?;
        directory.require(&service, ContractKind::RegulatorService)?;
        Ok(Self {
            address,
            owner,
            service,
            journal: EventJournal::new(address),
        })
    }

    /// Point the registry at another regulator service. Owner-only.
    pub fn replace_service(
        &mut self,
        caller: Address,
        new_service: Address,
        directory: &ContractDirectory,
    ) -> Result<()> {
        Capabilities::of(caller)
            .with_if(Role::Owner, caller == self.owner)
            .require_any(&[Role::Owner], "replaceService")?;
        directory.require(&new_service, ContractKind::RegulatorService)?;

        let old_service = std::mem::replace(&mut self.service, new_service);
        self.journal.emit(AuditEvent::ReplaceService {
            old_service,
            new_service,
        });
        info!(
            registry = %self.address.short(),
            old = %old_service.short(),
            new = %new_service.short(),
            "Service replaced"
        );
        Ok(())
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn service(&self) -> Address {
        self.service
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}
