//! A single whitelist: members, release dates, qualifiers and category.
//!
//! Three categories share one container:
//!
//! - **General**: a labelled list (`"RegS"` by default). Release dates are
//!   recorded but the engine only consults them for Regulation-D lists.
//! - **Regulation-D**: members carry a holding-period release time.
//! - **Qualified institutional**: membership queries are restricted to
//!   registered verified callers. Everyone else gets
//!   [`ShareGateError::NotVerifiedCaller`].
//!
//! Qualifiers may add and remove members; only the owner manages the
//! qualifier set, the category, and the verified-caller set.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharegate_types::{
    Address, AuditEvent, Capabilities, EventJournal, Result, Role, ShareGateError, SlotList,
    constants,
};
use tracing::{debug, info, warn};

/// What kind of list this is. The QIB variant carries its own verified
/// caller set, so only it can hold one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhitelistCategory {
    General { label: String },
    RegulationD,
    QualifiedInstitutional { verified_callers: SlotList },
}

impl WhitelistCategory {
    /// Map a type label to a category. `"RegD"` and `"QIB"` are reserved;
    /// anything else is a general list carrying that label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            constants::REG_D_LABEL => Self::RegulationD,
            constants::QIB_LABEL => Self::QualifiedInstitutional {
                verified_callers: SlotList::new(),
            },
            other => Self::General {
                label: other.to_string(),
            },
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::General { label } => label,
            Self::RegulationD => constants::REG_D_LABEL,
            Self::QualifiedInstitutional { .. } => constants::QIB_LABEL,
        }
    }

    #[must_use]
    pub fn is_regulation_d(&self) -> bool {
        matches!(self, Self::RegulationD)
    }

    #[must_use]
    pub fn is_qualified_institutional(&self) -> bool {
        matches!(self, Self::QualifiedInstitutional { .. })
    }
}

impl Default for WhitelistCategory {
    fn default() -> Self {
        Self::General {
            label: constants::DEFAULT_WHITELIST_LABEL.to_string(),
        }
    }
}

/// Membership record. Absent entries read as "not present, no release time".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub present: bool,
    pub release_time: Option<DateTime<Utc>>,
}

/// A whitelist component.
#[derive(Debug, Clone)]
pub struct Whitelist {
    address: Address,
    owner: Address,
    category: WhitelistCategory,
    members: HashMap<Address, Membership>,
    buyers: SlotList,
    qualifiers: SlotList,
    journal: EventJournal,
}

impl Whitelist {
    /// Deploy a whitelist at `address`, owned by `owner`.
    ///
    /// # Errors
    /// [`ShareGateError::ZeroAddress`] if either address is zero.
    pub fn new(address: Address, owner: Address, category: WhitelistCategory) -> Result<Self> {
        address.ensure_non_zero("whitelist")?;
        owner.ensure_non_zero("owner")?;
        info!(
            whitelist = %address.short(),
            owner = %owner.short(),
            category = category.label(),
            "Whitelist deployed"
        );
        Ok(Self {
            address,
            owner,
            category,
            members: HashMap::new(),
            buyers: SlotList::new(),
            qualifiers: SlotList::new(),
            journal: EventJournal::new(address),
        })
    }

    pub fn general(address: Address, owner: Address) -> Result<Self> {
        Self::new(address, owner, WhitelistCategory::default())
    }

    pub fn regulation_d(address: Address, owner: Address) -> Result<Self> {
        Self::new(address, owner, WhitelistCategory::RegulationD)
    }

    pub fn qualified_institutional(address: Address, owner: Address) -> Result<Self> {
        Self::new(address, owner, WhitelistCategory::from_label(constants::QIB_LABEL))
    }

    // -----------------------------------------------------------------
    // Capabilities
    // -----------------------------------------------------------------

    fn capabilities(&self, caller: Address) -> Capabilities {
        let verified = match &self.category {
            WhitelistCategory::QualifiedInstitutional { verified_callers } => {
                verified_callers.contains(&caller)
            }
            _ => false,
        };
        Capabilities::of(caller)
            .with_if(Role::Owner, caller == self.owner)
            .with_if(Role::Qualifier, self.qualifiers.contains(&caller))
            .with_if(Role::VerifiedCaller, verified)
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Add or re-add `member`. Re-adding overwrites the release time.
    ///
    /// # Errors
    /// - [`ShareGateError::Unauthorized`] unless the caller is the owner
    ///   or a qualifier.
    /// - [`ShareGateError::ZeroAddress`] for a zero member.
    pub fn add(
        &mut self,
        caller: Address,
        member: Address,
        release_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Qualifier], "add")?;
        member.ensure_non_zero("member")?;
        self.insert_member(member, release_time);
        Ok(())
    }

    /// Add several members with no release time. All-or-nothing: a zero
    /// address anywhere in `members` rejects the whole batch.
    pub fn add_buyers(&mut self, caller: Address, members: &[Address]) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Qualifier], "addBuyers")?;
        for member in members {
            member.ensure_non_zero("member")?;
        }
        for member in members {
            self.insert_member(*member, None);
        }
        debug!(whitelist = %self.address.short(), count = members.len(), "Buyers added");
        Ok(())
    }

    fn insert_member(&mut self, member: Address, release_time: Option<DateTime<Utc>>) {
        self.members.insert(
            member,
            Membership {
                present: true,
                release_time,
            },
        );
        self.buyers.insert(member);
        self.journal.emit(AuditEvent::MemberAdded { member });
        info!(
            whitelist = %self.address.short(),
            member = %member.short(),
            release_time = ?release_time,
            "Member added"
        );
    }

    /// Remove `member`. Removing a non-member changes nothing but still
    /// records `MemberRemoved`.
    pub fn remove(&mut self, caller: Address, member: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Qualifier], "remove")?;
        self.members.remove(&member);
        self.buyers.remove(&member);
        self.journal.emit(AuditEvent::MemberRemoved { member });
        info!(whitelist = %self.address.short(), member = %member.short(), "Member removed");
        Ok(())
    }

    /// Change the release time of an existing member.
    ///
    /// # Errors
    /// [`ShareGateError::NotAMember`] if `member` is not on the list.
    pub fn set_release_date(
        &mut self,
        caller: Address,
        member: Address,
        release_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Qualifier], "setReleaseDate")?;
        let entry = self
            .members
            .get_mut(&member)
            .ok_or(ShareGateError::NotAMember(member))?;
        entry.release_time = release_time;
        self.journal.emit(AuditEvent::ReleaseDateSet {
            member,
            release_time,
        });
        Ok(())
    }

    /// Is `member` on the list, as seen by `caller`?
    ///
    /// Unrestricted for general and Regulation-D lists.
    ///
    /// # Errors
    /// [`ShareGateError::NotVerifiedCaller`] when a QIB list is queried by
    /// a caller outside its verified-caller set.
    pub fn verify(&self, caller: Address, member: &Address) -> Result<bool> {
        if self.category.is_qualified_institutional()
            && !self.capabilities(caller).has(Role::VerifiedCaller)
        {
            warn!(
                whitelist = %self.address.short(),
                caller = %caller.short(),
                "Unverified caller queried QIB whitelist"
            );
            return Err(ShareGateError::NotVerifiedCaller { caller });
        }
        Ok(self.membership(member).present)
    }

    /// Release time of `member`; `None` for non-members or members added
    /// without one.
    #[must_use]
    pub fn release_date(&self, member: &Address) -> Option<DateTime<Utc>> {
        self.membership(member).release_time
    }

    fn membership(&self, member: &Address) -> Membership {
        self.members.get(member).copied().unwrap_or_default()
    }

    /// Every member ever added, with removed entries left as `None`.
    #[must_use]
    pub fn buyers(&self) -> &[Option<Address>] {
        self.buyers.slots()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // -----------------------------------------------------------------
    // Qualifiers
    // -----------------------------------------------------------------

    /// Owner-only.
    pub fn add_qualifier(&mut self, caller: Address, qualifier: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "addQualifier")?;
        qualifier.ensure_non_zero("qualifier")?;
        self.qualifiers.insert(qualifier);
        self.journal.emit(AuditEvent::QualifierAdded { qualifier });
        info!(
            whitelist = %self.address.short(),
            qualifier = %qualifier.short(),
            "Qualifier added"
        );
        Ok(())
    }

    /// Owner-only. Removing an address that is not a qualifier records
    /// nothing.
    pub fn remove_qualifier(&mut self, caller: Address, qualifier: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "removeQualifier")?;
        if self.qualifiers.remove(&qualifier).is_some() {
            self.journal.emit(AuditEvent::QualifierRemoved { qualifier });
            info!(
                whitelist = %self.address.short(),
                qualifier = %qualifier.short(),
                "Qualifier removed"
            );
        }
        Ok(())
    }

    /// The qualifier slots, tombstones included. Visible to the owner
    /// and to qualifiers.
    pub fn qualifiers(&self, caller: Address) -> Result<&[Option<Address>]> {
        self.capabilities(caller)
            .require_any(&[Role::Owner, Role::Qualifier], "getQualifiers")?;
        Ok(self.qualifiers.slots())
    }

    #[must_use]
    pub fn is_qualifier(&self, address: &Address) -> bool {
        self.qualifiers.contains(address)
    }

    // -----------------------------------------------------------------
    // Category
    // -----------------------------------------------------------------

    /// Relabel the list. Setting `"QIB"` on a list that already is one
    /// keeps its verified callers.
    pub fn set_whitelist_type(&mut self, caller: Address, label: &str) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "setWhitelistType")?;
        let next = WhitelistCategory::from_label(label);
        if !(next.is_qualified_institutional() && self.category.is_qualified_institutional()) {
            self.category = next;
        }
        self.journal.emit(AuditEvent::WhitelistTypeSet {
            whitelist_type: label.to_string(),
        });
        info!(whitelist = %self.address.short(), category = label, "Whitelist type set");
        Ok(())
    }

    /// Register a component allowed to query this QIB list.
    ///
    /// # Errors
    /// [`ShareGateError::UnsupportedCategory`] on a non-QIB list.
    pub fn add_verified_caller(&mut self, caller: Address, verified: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "addVerifiedCaller")?;
        verified.ensure_non_zero("verified caller")?;
        self.verified_callers_mut("addVerifiedCaller")?.insert(verified);
        self.journal
            .emit(AuditEvent::VerifiedCallerAdded { caller: verified });
        info!(
            whitelist = %self.address.short(),
            verified = %verified.short(),
            "Verified caller added"
        );
        Ok(())
    }

    pub fn remove_verified_caller(&mut self, caller: Address, verified: Address) -> Result<()> {
        self.capabilities(caller)
            .require_any(&[Role::Owner], "removeVerifiedCaller")?;
        if self
            .verified_callers_mut("removeVerifiedCaller")?
            .remove(&verified)
            .is_some()
        {
            self.journal
                .emit(AuditEvent::VerifiedCallerRemoved { caller: verified });
        }
        Ok(())
    }

    /// Verified-caller slots of a QIB list; empty for other categories.
    #[must_use]
    pub fn verified_callers(&self) -> &[Option<Address>] {
        match &self.category {
            WhitelistCategory::QualifiedInstitutional { verified_callers } => {
                verified_callers.slots()
            }
            _ => &[],
        }
    }

    fn verified_callers_mut(&mut self, operation: &'static str) -> Result<&mut SlotList> {
        match &mut self.category {
            WhitelistCategory::QualifiedInstitutional { verified_callers } => {
                Ok(verified_callers)
            }
            _ => Err(ShareGateError::UnsupportedCategory { operation }),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn category(&self) -> &WhitelistCategory {
        &self.category
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut EventJournal {
        &mut self.journal
    }
}
