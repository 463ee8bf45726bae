//! Per-asset settings storage.
//!
//! Every setter resolves the caller's [`Capabilities`] once and runs a
//! single authorization check before touching state:
//!
//! ```text
//! owner  OR  issuer  OR  (officer AND permissions[action])
//! ```
//!
//! Exceptions: the issuer slot, once filled, can only be changed by the
//! owner or the current issuer, and the officer permission map itself is
//! owner-only.

use chrono::{DateTime, Utc};
use sharegate_types::{
    Address, AssetId, AuditEvent, Capabilities, EventJournal, PermissionMap, PolicyConfig,
    PrivilegedAction, Result, Role, ShareGateError, SlotList, authorize_policy_action,
};
use tracing::{info, warn};

/// Settings of one regulated asset.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    address: Address,
    owner: Address,
    asset: AssetId,

    locked: bool,
    partial_transfers: bool,
    new_shareholders_allowed: bool,
    offering_end: Option<DateTime<Utc>>,
    messaging_address: String,

    issuer: Option<Address>,
    officers: SlotList,
    permissions: PermissionMap,

    whitelists: SlotList,
    reg_d_whitelist: Option<Address>,

    journal: EventJournal,
}

impl PolicyStore {
    /// Deploy a store at `address` governing `asset`, seeded from `config`.
    ///
    /// # Errors
    /// [`ShareGateError::ZeroAddress`] for a zero store, owner or asset.
    pub fn new(
        address: Address,
        owner: Address,
        asset: AssetId,
        config: &PolicyConfig,
    ) -> Result<Self> {
        address.ensure_non_zero("policy store")?;
        owner.ensure_non_zero("owner")?;
        asset.address().ensure_non_zero("asset")?;
        info!(
            store = %address.short(),
            asset = %asset,
            locked = config.locked,
            "Policy store deployed"
        );
        Ok(Self {
            address,
            owner,
            asset,
            locked: config.locked,
            partial_transfers: config.partial_transfers,
            new_shareholders_allowed: config.new_shareholders_allowed,
            offering_end: config.offering_end,
            messaging_address: config.messaging_address.clone(),
            issuer: None,
            officers: SlotList::new(),
            permissions: PermissionMap::new(),
            whitelists: SlotList::new(),
            reg_d_whitelist: None,
            journal: EventJournal::new(address),
        })
    }

    fn capabilities(&self, caller: Address) -> Capabilities {
        Capabilities::of(caller)
            .with_if(Role::Owner, caller == self.owner)
            .with_if(Role::Issuer, self.issuer == Some(caller))
            .with_if(Role::Officer, self.officers.contains(&caller))
    }

    fn authorize(&self, caller: Address, action: PrivilegedAction) -> Result<()> {
        let result = authorize_policy_action(&self.capabilities(caller), action, &self.permissions);
        if result.is_err() {
            warn!(
                store = %self.address.short(),
                caller = %caller.short(),
                action = action.name(),
                "Policy action refused"
            );
        }
        result
    }

    // =================================================================
    // Trading flags
    // =================================================================

    pub fn set_locked(&mut self, caller: Address, locked: bool) -> Result<()> {
        self.authorize(caller, PrivilegedAction::SetLocked)?;
        self.locked = locked;
        self.journal.emit(AuditEvent::LogLockSet {
            asset: self.asset,
            locked,
        });
        info!(asset = %self.asset, locked, "Lock set");
        Ok(())
    }

    pub fn set_partial_transfers(&mut self, caller: Address, allowed: bool) -> Result<()> {
        self.authorize(caller, PrivilegedAction::SetPartialTransfers)?;
        self.partial_transfers = allowed;
        self.journal.emit(AuditEvent::LogPartialTransferSet {
            asset: self.asset,
            allowed,
        });
        Ok(())
    }

    pub fn allow_new_shareholders(&mut self, caller: Address, allowed: bool) -> Result<()> {
        self.authorize(caller, PrivilegedAction::AllowNewShareholders)?;
        self.new_shareholders_allowed = allowed;
        self.journal.emit(AuditEvent::NewShareholdersAllowance {
            asset: self.asset,
            allowed,
        });
        info!(asset = %self.asset, allowed, "New shareholder allowance set");
        Ok(())
    }

    /// `None` clears the offering end.
    pub fn set_initial_offer_end_date(
        &mut self,
        caller: Address,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.authorize(caller, PrivilegedAction::SetInitialOfferEndDate)?;
        self.offering_end = timestamp;
        self.journal.emit(AuditEvent::InitialOfferEndDateSet {
            asset: self.asset,
            timestamp,
        });
        Ok(())
    }

    pub fn set_messaging_address(&mut self, caller: Address, value: &str) -> Result<()> {
        self.authorize(caller, PrivilegedAction::SetMessagingAddress)?;
        self.messaging_address = value.to_string();
        self.journal.emit(AuditEvent::MessagingAddressSet {
            asset: self.asset,
            value: value.to_string(),
        });
        Ok(())
    }

    // =================================================================
    // Issuer and officers
    // =================================================================

    /// Set the issuer and enroll them as an officer.
    ///
    /// # Errors
    /// - [`ShareGateError::IssuerAlreadySet`] when an issuer exists and the
    ///   caller is neither owner nor that issuer.
    /// - [`ShareGateError::Unauthorized`] when no issuer exists and the
    ///   general rule refuses the caller.
    pub fn set_issuer(&mut self, caller: Address, issuer: Address) -> Result<()> {
        if self.issuer.is_some() {
            let caps = self.capabilities(caller);
            if !(caps.has(Role::Owner) || caps.has(Role::Issuer)) {
                warn!(
                    asset = %self.asset,
                    caller = %caller.short(),
                    "Issuer replacement refused"
                );
                return Err(ShareGateError::IssuerAlreadySet);
            }
        } else {
            self.authorize(caller, PrivilegedAction::SetIssuer)?;
        }
        issuer.ensure_non_zero("issuer")?;

        self.issuer = Some(issuer);
        self.journal.emit(AuditEvent::IssuerSet {
            asset: self.asset,
            issuer,
        });
        if !self.officers.contains(&issuer) {
            self.officers.insert(issuer);
            self.journal.emit(AuditEvent::OfficerAdded { officer: issuer });
        }
        info!(asset = %self.asset, issuer = %issuer.short(), "Issuer set");
        Ok(())
    }

    /// Clear the issuer slot. Owner or current issuer only. The former
    /// issuer keeps any officer enrollment.
    pub fn remove_issuer(&mut self, caller: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Issuer], PrivilegedAction::RemoveIssuer.name())?;
        if self.issuer.take().is_some() {
            self.journal
                .emit(AuditEvent::IssuerRemoved { asset: self.asset });
            info!(asset = %self.asset, "Issuer removed");
        }
        Ok(())
    }

    pub fn add_officer(&mut self, caller: Address, officer: Address) -> Result<()> {
        self.authorize(caller, PrivilegedAction::ManageOfficers)?;
        officer.ensure_non_zero("officer")?;
        if !self.officers.contains(&officer) {
            self.officers.insert(officer);
            self.journal.emit(AuditEvent::OfficerAdded { officer });
            info!(asset = %self.asset, officer = %officer.short(), "Officer added");
        }
        Ok(())
    }

    pub fn remove_officer(&mut self, caller: Address, officer: Address) -> Result<()> {
        self.authorize(caller, PrivilegedAction::ManageOfficers)?;
        if self.officers.remove(&officer).is_some() {
            self.journal.emit(AuditEvent::OfficerRemoved { officer });
            info!(asset = %self.asset, officer = %officer.short(), "Officer removed");
        }
        Ok(())
    }

    /// Grant or revoke `action` for officers. Owner-only.
    pub fn set_officer_permission(
        &mut self,
        caller: Address,
        action: PrivilegedAction,
        allowed: bool,
    ) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "setOfficerPermission")?;
        self.permissions.set(action, allowed);
        self.journal
            .emit(AuditEvent::OfficerPermissionSet { action, allowed });
        info!(asset = %self.asset, action = action.name(), allowed, "Officer permission set");
        Ok(())
    }

    // =================================================================
    // Attached whitelists
    // =================================================================

    /// Attach a whitelist. Resolution of the address is deferred to
    /// evaluation time.
    ///
    /// # Errors
    /// [`ShareGateError::WhitelistAlreadyAttached`] if it is attached.
    pub fn add_whitelist(&mut self, caller: Address, whitelist: Address) -> Result<()> {
        self.authorize(caller, PrivilegedAction::AddWhitelist)?;
        whitelist.ensure_non_zero("whitelist")?;
        if self.whitelists.contains(&whitelist) {
            return Err(ShareGateError::WhitelistAlreadyAttached(whitelist));
        }
        self.whitelists.insert(whitelist);
        self.journal.emit(AuditEvent::WhitelistAdded { whitelist });
        info!(asset = %self.asset, whitelist = %whitelist.short(), "Whitelist attached");
        Ok(())
    }

    /// Detach a whitelist, leaving a tombstone in its slot. A detached
    /// list stops being the Regulation-D designation.
    pub fn remove_whitelist(&mut self, caller: Address, whitelist: Address) -> Result<()> {
        self.authorize(caller, PrivilegedAction::RemoveWhitelist)?;
        if self.whitelists.remove(&whitelist).is_none() {
            return Err(ShareGateError::WhitelistNotAttached(whitelist));
        }
        if self.reg_d_whitelist == Some(whitelist) {
            self.reg_d_whitelist = None;
        }
        self.journal.emit(AuditEvent::WhitelistRemoved { whitelist });
        info!(asset = %self.asset, whitelist = %whitelist.short(), "Whitelist detached");
        Ok(())
    }

    /// Designate an attached whitelist as the asset's Regulation-D list.
    ///
    /// # Errors
    /// - [`ShareGateError::UnknownAsset`] if `asset` is not this store's.
    /// - [`ShareGateError::WhitelistNotAttached`] if `whitelist` is not
    ///   attached.
    pub fn set_reg_d_whitelist(
        &mut self,
        caller: Address,
        asset: AssetId,
        whitelist: Address,
    ) -> Result<()> {
        self.authorize(caller, PrivilegedAction::SetRegDWhitelist)?;
        if asset != self.asset {
            return Err(ShareGateError::UnknownAsset(asset));
        }
        if !self.whitelists.contains(&whitelist) {
            return Err(ShareGateError::WhitelistNotAttached(whitelist));
        }
        self.reg_d_whitelist = Some(whitelist);
        self.journal
            .emit(AuditEvent::RegulationDWhitelistSet { asset, whitelist });
        info!(asset = %asset, whitelist = %whitelist.short(), "Regulation-D whitelist set");
        Ok(())
    }

    // =================================================================
    // Reads
    // =================================================================

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn partial_transfers_allowed(&self) -> bool {
        self.partial_transfers
    }

    #[must_use]
    pub fn new_shareholders_allowed(&self) -> bool {
        self.new_shareholders_allowed
    }

    #[must_use]
    pub fn offering_end(&self) -> Option<DateTime<Utc>> {
        self.offering_end
    }

    #[must_use]
    pub fn messaging_address(&self) -> &str {
        &self.messaging_address
    }

    #[must_use]
    pub fn issuer(&self) -> Option<Address> {
        self.issuer
    }

    #[must_use]
    pub fn is_issuer(&self, address: &Address) -> bool {
        self.issuer.as_ref() == Some(address)
    }

    #[must_use]
    pub fn officers(&self) -> &[Option<Address>] {
        self.officers.slots()
    }

    #[must_use]
    pub fn is_officer(&self, address: &Address) -> bool {
        self.officers.contains(address)
    }

    #[must_use]
    pub fn permissions(&self) -> &PermissionMap {
        &self.permissions
    }

    /// Attached whitelist slots, tombstones included.
    #[must_use]
    pub fn whitelists(&self) -> &[Option<Address>] {
        self.whitelists.slots()
    }

    /// Live attached whitelists in attachment order.
    pub fn attached_whitelists(&self) -> impl Iterator<Item = Address> + '_ {
        self.whitelists.live()
    }

    #[must_use]
    pub fn reg_d_whitelist(&self) -> Option<Address> {
        self.reg_d_whitelist
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut EventJournal {
        &mut self.journal
    }
}
