//! The set of deployed compliance components, addressable by [`Address`].
//!
//! A ledger only knows its registry address. Verification walks
//! registry → service → policy store → whitelists through this directory.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sharegate_policy::PolicyStore;
use sharegate_types::{Address, Decision, Result, ShareGateError, TransferRequest, constants};
use sharegate_whitelist::{Whitelist, WhitelistBook, WhitelistLookup};
use tracing::info;

use crate::{ContractDirectory, ContractKind, RegulatorService, ServiceRegistry};

/// What a ledger needs from the compliance layer.
pub trait TransferVerifier {
    /// Decide `request` under the rules reachable from `registry`.
    ///
    /// # Errors
    /// Caller errors (bad addresses, unknown asset, unresolvable
    /// components). A denial is an `Ok` decision.
    fn verify_transfer(
        &self,
        registry: Address,
        request: &TransferRequest,
        now: DateTime<Utc>,
    ) -> Result<Decision>;
}

#[derive(Debug, Default)]
pub struct Deployment {
    directory: ContractDirectory,
    whitelists: WhitelistBook,
    stores: HashMap<Address, PolicyStore>,
    services: HashMap<Address, RegulatorService>,
    registries: HashMap<Address, ServiceRegistry>,
}

fn not_a(address: Address, kind: ContractKind) -> ShareGateError {
    ShareGateError::NotAContract {
        address,
        expected: kind.label(),
    }
}

impl Deployment {
    #[must_use]
    pub fn new() -> Self {
        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            "Compliance deployment created"
        );
        Self::default()
    }

    #[must_use]
    pub fn directory(&self) -> &ContractDirectory {
        &self.directory
    }

    // -----------------------------------------------------------------
    // Deploy
    // -----------------------------------------------------------------

    pub fn deploy_whitelist(&mut self, whitelist: Whitelist) -> Result<Address> {
        self.directory
            .register(whitelist.address(), ContractKind::Whitelist)?;
        self.whitelists.deploy(whitelist)
    }

    pub fn deploy_policy_store(&mut self, store: PolicyStore) -> Result<Address> {
        let address = store.address();
        self.directory.register(address, ContractKind::PolicyStore)?;
        self.stores.insert(address, store);
        Ok(address)
    }

    /// Deploy a regulator service pointing at the policy store `storage`.
    pub fn deploy_service(
        &mut self,
        address: Address,
        owner: Address,
        storage: Address,
    ) -> Result<Address> {
        let service = RegulatorService::new(address, owner, storage, &self.directory)?;
        self.directory
            .register(address, ContractKind::RegulatorService)?;
        self.services.insert(address, service);
        info!(service = %address.short(), storage = %storage.short(), "Regulator service deployed");
        Ok(address)
    }

    /// Deploy a registry pointing at the regulator service `service`.
    pub fn deploy_registry(
        &mut self,
        address: Address,
        owner: Address,
        service: Address,
    ) -> Result<Address> {
        let registry = ServiceRegistry::new(address, owner, service, &self.directory)?;
        self.directory
            .register(address, ContractKind::ServiceRegistry)?;
        self.registries.insert(address, registry);
        info!(registry = %address.short(), service = %service.short(), "Service registry deployed");
        Ok(address)
    }

    /// Record a component hosted elsewhere (a ledger, a wallet).
    ///
    /// # Errors
    /// [`ShareGateError::InstanceRequired`] for kinds the deployment
    /// holds itself, otherwise as [`ContractDirectory::register`].
    pub fn register_contract(&mut self, address: Address, kind: ContractKind) -> Result<()> {
        if !kind.is_external() {
            return Err(ShareGateError::InstanceRequired { kind: kind.label() });
        }
        self.directory.register(address, kind)
    }

    // -----------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------

    #[must_use]
    pub fn whitelists(&self) -> &WhitelistBook {
        &self.whitelists
    }

    pub fn whitelist(&self, address: &Address) -> Result<&Whitelist> {
        self.whitelists.resolve(address)
    }

    pub fn whitelist_mut(&mut self, address: &Address) -> Result<&mut Whitelist> {
        self.whitelists.get_mut(address)
    }

    pub fn store(&self, address: &Address) -> Result<&PolicyStore> {
        self.stores
            .get(address)
            .ok_or_else(|| not_a(*address, ContractKind::PolicyStore))
    }

    pub fn store_mut(&mut self, address: &Address) -> Result<&mut PolicyStore> {
        self.stores
            .get_mut(address)
            .ok_or_else(|| not_a(*address, ContractKind::PolicyStore))
    }

    pub fn service(&self, address: &Address) -> Result<&RegulatorService> {
        self.services
            .get(address)
            .ok_or_else(|| not_a(*address, ContractKind::RegulatorService))
    }

    pub fn registry(&self, address: &Address) -> Result<&ServiceRegistry> {
        self.registries
            .get(address)
            .ok_or_else(|| not_a(*address, ContractKind::ServiceRegistry))
    }

    /// The policy store currently behind `registry`.
    pub fn resolve_store(&self, registry: &Address) -> Result<&PolicyStore> {
        let service = self.service(&self.registry(registry)?.service())?;
        self.store(&service.storage())
    }

    // -----------------------------------------------------------------
    // Checked mutations
    // -----------------------------------------------------------------

    /// Attach a deployed whitelist to a policy store.
    ///
    /// # Errors
    /// [`ShareGateError::NotAContract`] if `whitelist` is not deployed,
    /// otherwise as [`PolicyStore::add_whitelist`].
    pub fn attach_whitelist(
        &mut self,
        store: &Address,
        caller: Address,
        whitelist: Address,
    ) -> Result<()> {
        self.directory.require(&whitelist, ContractKind::Whitelist)?;
        self.store_mut(store)?.add_whitelist(caller, whitelist)
    }

    pub fn replace_storage(
        &mut self,
        service: &Address,
        caller: Address,
        new_storage: Address,
    ) -> Result<()> {
        let Self {
            directory,
            services,
            ..
        } = self;
        services
            .get_mut(service)
            .ok_or_else(|| not_a(*service, ContractKind::RegulatorService))?
            .replace_storage(caller, new_storage, directory)
    }

    pub fn replace_service(
        &mut self,
        registry: &Address,
        caller: Address,
        new_service: Address,
    ) -> Result<()> {
        let Self {
            directory,
            registries,
            ..
        } = self;
        registries
            .get_mut(registry)
            .ok_or_else(|| not_a(*registry, ContractKind::ServiceRegistry))?
            .replace_service(caller, new_service, directory)
    }
}

impl TransferVerifier for Deployment {
    fn verify_transfer(
        &self,
        registry: Address,
        request: &TransferRequest,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let service = self.service(&self.registry(&registry)?.service())?;
        let store = self.store(&service.storage())?;
        service.check(store, &self.whitelists, request, now)
    }
}
