//! Roles, capabilities, and the privileged-action permission map.
//!
//! Every mutating operation resolves the caller's [`Capabilities`] once
//! and hands them to a single check ([`Capabilities::require_any`] or
//! [`authorize_policy_action`]). Components never scatter per-field
//! ownership checks.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Address, Result, ShareGateError};

/// A role a principal may hold relative to one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    /// Deployer of the component. Holds every administrative right.
    Owner,
    /// The asset's issuer.
    Issuer,
    /// Operational officer; needs a permission grant per action.
    Officer,
    /// May manage whitelist membership.
    Qualifier,
    /// Component allowed to query a capability-gated whitelist.
    VerifiedCaller,
    /// Member of an arbitration wallet's owner set.
    ArbitrationOwner,
}

impl Role {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "OWNER"),
            Self::Issuer => write!(f, "ISSUER"),
            Self::Officer => write!(f, "OFFICER"),
            Self::Qualifier => write!(f, "QUALIFIER"),
            Self::VerifiedCaller => write!(f, "VERIFIED_CALLER"),
            Self::ArbitrationOwner => write!(f, "ARBITRATION_OWNER"),
        }
    }
}

/// The set of roles one caller holds on one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    caller: Address,
    roles: u8,
}

impl Capabilities {
    /// A caller with no roles.
    #[must_use]
    pub fn of(caller: Address) -> Self {
        Self { caller, roles: 0 }
    }

    /// Add `role` when `held` is true.
    #[must_use]
    pub fn with_if(mut self, role: Role, held: bool) -> Self {
        if held {
            self.roles |= role.bit();
        }
        self
    }

    #[must_use]
    pub fn caller(&self) -> Address {
        self.caller
    }

    #[must_use]
    pub fn has(&self, role: Role) -> bool {
        self.roles & role.bit() != 0
    }

    /// Succeed if the caller holds at least one of `roles`.
    ///
    /// # Errors
    /// [`ShareGateError::Unauthorized`] naming `action`.
    pub fn require_any(&self, roles: &[Role], action: &'static str) -> Result<()> {
        if roles.iter().any(|r| self.has(*r)) {
            Ok(())
        } else {
            Err(ShareGateError::Unauthorized {
                caller: self.caller,
                action,
            })
        }
    }
}

/// Privileged policy-store actions. Closed set; the permission map is
/// keyed by these rather than by free-text names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PrivilegedAction {
    SetLocked,
    SetPartialTransfers,
    AllowNewShareholders,
    SetInitialOfferEndDate,
    SetMessagingAddress,
    SetIssuer,
    RemoveIssuer,
    ManageOfficers,
    AddWhitelist,
    RemoveWhitelist,
    SetRegDWhitelist,
}

impl PrivilegedAction {
    pub const ALL: [Self; 11] = [
        Self::SetLocked,
        Self::SetPartialTransfers,
        Self::AllowNewShareholders,
        Self::SetInitialOfferEndDate,
        Self::SetMessagingAddress,
        Self::SetIssuer,
        Self::RemoveIssuer,
        Self::ManageOfficers,
        Self::AddWhitelist,
        Self::RemoveWhitelist,
        Self::SetRegDWhitelist,
    ];

    /// Operation name as it appears in errors and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SetLocked => "setLocked",
            Self::SetPartialTransfers => "setPartialTransfers",
            Self::AllowNewShareholders => "allowNewShareholders",
            Self::SetInitialOfferEndDate => "setInitialOfferEndDate",
            Self::SetMessagingAddress => "setMessagingAddress",
            Self::SetIssuer => "setIssuer",
            Self::RemoveIssuer => "removeIssuer",
            Self::ManageOfficers => "manageOfficers",
            Self::AddWhitelist => "addWhitelist",
            Self::RemoveWhitelist => "removeWhitelist",
            Self::SetRegDWhitelist => "setRegDWhitelist",
        }
    }
}

impl fmt::Display for PrivilegedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which privileged actions officers may invoke. Absent entries are denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMap {
    grants: BTreeMap<PrivilegedAction, bool>,
}

impl PermissionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, action: PrivilegedAction, allowed: bool) {
        self.grants.insert(action, allowed);
    }

    #[must_use]
    pub fn is_granted(&self, action: PrivilegedAction) -> bool {
        self.grants.get(&action).copied().unwrap_or(false)
    }

    /// Actions currently granted, in declaration order.
    pub fn granted(&self) -> impl Iterator<Item = PrivilegedAction> + '_ {
        self.grants
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(action, _)| *action)
    }
}

/// The policy-store rule: owner, or issuer, or an officer holding a grant
/// for `action`.
///
/// # Errors
/// [`ShareGateError::Unauthorized`] when none applies.
pub fn authorize_policy_action(
    caps: &Capabilities,
    action: PrivilegedAction,
    permissions: &PermissionMap,
) -> Result<()> {
    if caps.has(Role::Owner)
        || caps.has(Role::Issuer)
        || (caps.has(Role::Officer) && permissions.is_granted(action))
    {
        return Ok(());
    }
    Err(ShareGateError::Unauthorized {
        caller: caps.caller(),
        action: action.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(roles: &[Role]) -> Capabilities {
        roles
            .iter()
            .fold(Capabilities::of(Address::derive("caller")), |c, r| {
                c.with_if(*r, true)
            })
    }

    #[test]
    fn capabilities_track_roles() {
        let c = caps(&[Role::Owner, Role::Qualifier]);
        assert!(c.has(Role::Owner));
        assert!(c.has(Role::Qualifier));
        assert!(!c.has(Role::Issuer));
        let c = Capabilities::of(Address::ZERO).with_if(Role::Officer, false);
        assert!(!c.has(Role::Officer));
    }

    #[test]
    fn require_any_names_the_action() {
        let c = caps(&[Role::Officer]);
        assert!(c.require_any(&[Role::Owner, Role::Officer], "add").is_ok());
        let err = c.require_any(&[Role::Owner, Role::Qualifier], "add").unwrap_err();
        assert!(matches!(err, ShareGateError::Unauthorized { action: "add", .. }));
    }

    #[test]
    fn owner_and_issuer_bypass_permission_map() {
        let perms = PermissionMap::new();
        for role in [Role::Owner, Role::Issuer] {
            assert!(
                authorize_policy_action(&caps(&[role]), PrivilegedAction::SetLocked, &perms).is_ok()
            );
        }
    }

    #[test]
    fn officer_needs_grant() {
        let mut perms = PermissionMap::new();
        let officer = caps(&[Role::Officer]);
        assert!(authorize_policy_action(&officer, PrivilegedAction::SetLocked, &perms).is_err());

        perms.set(PrivilegedAction::SetLocked, true);
        assert!(authorize_policy_action(&officer, PrivilegedAction::SetLocked, &perms).is_ok());
        assert!(
            authorize_policy_action(&officer, PrivilegedAction::AddWhitelist, &perms).is_err()
        );

        perms.set(PrivilegedAction::SetLocked, false);
        assert!(authorize_policy_action(&officer, PrivilegedAction::SetLocked, &perms).is_err());
    }

    #[test]
    fn stranger_is_rejected() {
        let perms = PermissionMap::new();
        let err = authorize_policy_action(&caps(&[]), PrivilegedAction::SetIssuer, &perms)
            .unwrap_err();
        assert!(matches!(err, ShareGateError::Unauthorized { action: "setIssuer", .. }));
    }

    #[test]
    fn permission_map_serde_roundtrip() {
        let mut perms = PermissionMap::new();
        perms.set(PrivilegedAction::AddWhitelist, true);
        perms.set(PrivilegedAction::SetLocked, false);
        let json = serde_json::to_string(&perms).unwrap();
        let back: PermissionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(perms, back);
        assert_eq!(back.granted().collect::<Vec<_>>(), vec![PrivilegedAction::AddWhitelist]);
    }
}
