//! Policy model records: rules, rule axes, entities, and groups.
//!
//! A rule constrains access on three axes (user, host, service). Each
//! axis either covers everything (`Axis::All`, the wildcard category)
//! or an explicit member set. Modeling the axis as an enum makes
//! category-all and explicit membership mutually exclusive by
//! construction; the lifecycle manager additionally rejects writes
//! that would cross the two so callers get a diagnosable error.

use std::collections::BTreeSet;

use palisade_types::{EntityId, GroupId, Kind, MemberRef, RuleId, RuleType};
use serde::{Deserialize, Serialize};

// ============================================================================
// Axis
// ============================================================================

/// One axis of a rule: who/where/what the rule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Wildcard category: covers every entity of the axis kind,
    /// including identifiers the store has never seen.
    All,
    /// Explicit member references (entities and groups).
    Members(BTreeSet<MemberRef>),
}

impl Axis {
    /// An axis with no members; matches nothing until members are added.
    pub fn empty() -> Self {
        Axis::Members(BTreeSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Axis::All)
    }

    /// Explicit members, or `None` for the wildcard category.
    pub fn members(&self) -> Option<&BTreeSet<MemberRef>> {
        match self {
            Axis::All => None,
            Axis::Members(members) => Some(members),
        }
    }
}

impl Default for Axis {
    fn default() -> Self {
        Axis::empty()
    }
}

// ============================================================================
// Rule
// ============================================================================

/// A stored HBAC rule.
///
/// Rules are created through the lifecycle manager and are immutable
/// from the reader's perspective: every mutation produces a new store
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Opaque stable identifier.
    pub id: RuleId,
    /// Display name, unique within the rule-type namespace.
    pub name: String,
    /// Whether a match grants or refuses access.
    pub rule_type: RuleType,
    /// Disabled rules are skipped by evaluation entirely.
    pub enabled: bool,
    /// Free-text description for administrators.
    pub description: Option<String>,
    /// Which users the rule covers.
    pub users: Axis,
    /// Which hosts the rule covers.
    pub hosts: Axis,
    /// Which services the rule covers.
    pub services: Axis,
}

impl Rule {
    /// The axis constraining the given kind.
    pub fn axis(&self, kind: Kind) -> &Axis {
        match kind {
            Kind::User => &self.users,
            Kind::Host => &self.hosts,
            Kind::Service => &self.services,
        }
    }

    pub(crate) fn axis_mut(&mut self, kind: Kind) -> &mut Axis {
        match kind {
            Kind::User => &mut self.users,
            Kind::Host => &mut self.hosts,
            Kind::Service => &mut self.services,
        }
    }
}

// ============================================================================
// RuleSpec
// ============================================================================

/// Specification for creating a rule.
///
/// When `id` is `None` the lifecycle manager generates a fresh stable
/// identifier (the provisioning format's `autogenerate` placeholder
/// never reaches the store).
///
/// # Examples
///
/// ```
/// use palisade_store::RuleSpec;
/// use palisade_types::{MemberRef, RuleType};
///
/// let spec = RuleSpec::new("allow_systemd-user", RuleType::Allow)
///     .all_users()
///     .all_hosts()
///     .with_service_member(MemberRef::Entity("systemd-user".into()))
///     .with_description("Allow systemd-user session scopes");
/// assert!(spec.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Explicit identifier, or `None` to autogenerate.
    pub id: Option<RuleId>,
    /// Display name, unique within the rule-type namespace.
    pub name: String,
    pub rule_type: RuleType,
    /// Rules are enabled on creation unless stated otherwise.
    pub enabled: bool,
    pub description: Option<String>,
    pub users: Axis,
    pub hosts: Axis,
    pub services: Axis,
}

impl RuleSpec {
    /// Creates a spec with empty member axes, enabled.
    pub fn new(name: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            id: None,
            name: name.into(),
            rule_type,
            enabled: true,
            description: None,
            users: Axis::empty(),
            hosts: Axis::empty(),
            services: Axis::empty(),
        }
    }

    pub fn with_id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sets the user axis to the wildcard category, discarding any
    /// members previously added to it.
    pub fn all_users(mut self) -> Self {
        self.users = Axis::All;
        self
    }

    /// Sets the host axis to the wildcard category, discarding any
    /// members previously added to it.
    pub fn all_hosts(mut self) -> Self {
        self.hosts = Axis::All;
        self
    }

    /// Sets the service axis to the wildcard category, discarding any
    /// members previously added to it.
    pub fn all_services(mut self) -> Self {
        self.services = Axis::All;
        self
    }

    pub fn with_user_member(mut self, member: MemberRef) -> Self {
        push_member(&mut self.users, member);
        self
    }

    pub fn with_host_member(mut self, member: MemberRef) -> Self {
        push_member(&mut self.hosts, member);
        self
    }

    pub fn with_service_member(mut self, member: MemberRef) -> Self {
        push_member(&mut self.services, member);
        self
    }
}

/// Adds a member to an axis; a wildcard axis reverts to explicit
/// members first (builder convenience, write-time validation is the
/// lifecycle manager's job).
fn push_member(axis: &mut Axis, member: MemberRef) {
    match axis {
        Axis::All => {
            let mut members = BTreeSet::new();
            members.insert(member);
            *axis = Axis::Members(members);
        }
        Axis::Members(members) => {
            members.insert(member);
        }
    }
}

// ============================================================================
// Entity and Group
// ============================================================================

/// A user, host, or service known to the store.
///
/// Entities are reference data provisioned by the external identity
/// system; the engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Groups this entity is a direct member of.
    pub groups: BTreeSet<GroupId>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            groups: BTreeSet::new(),
        }
    }
}

/// A group of entities of one kind.
///
/// Groups nest within groups of the same kind; the nesting graph is
/// kept acyclic at write time. Both edge directions are stored: the
/// member lists are the authoritative declaration, `member_of` is the
/// upward adjacency the closure walk follows. The lifecycle manager
/// is the single writer and keeps the two in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Entities that are direct members.
    pub member_entities: BTreeSet<EntityId>,
    /// Groups that are direct members (nested groups).
    pub member_groups: BTreeSet<GroupId>,
    /// Groups this group is a direct member of.
    pub member_of: BTreeSet<GroupId>,
}

impl Group {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            member_entities: BTreeSet::new(),
            member_groups: BTreeSet::new(),
            member_of: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_default_is_empty_members() {
        let axis = Axis::default();
        assert!(!axis.is_all());
        assert!(axis.members().unwrap().is_empty());
    }

    #[test]
    fn test_spec_builder_wildcards() {
        let spec = RuleSpec::new("allow_all", RuleType::Allow)
            .all_users()
            .all_hosts()
            .all_services();

        assert!(spec.users.is_all());
        assert!(spec.hosts.is_all());
        assert!(spec.services.is_all());
        assert!(spec.enabled);
        assert!(spec.id.is_none());
    }

    #[test]
    fn test_spec_builder_member_replaces_wildcard() {
        let spec = RuleSpec::new("r", RuleType::Allow)
            .all_services()
            .with_service_member(MemberRef::Entity("sshd".into()));

        let members = spec.services.members().unwrap();
        assert_eq!(members.len(), 1);
        assert!(members.contains(&MemberRef::Entity("sshd".into())));
    }

    #[test]
    fn test_rule_spec_serde_roundtrip() {
        let spec = RuleSpec::new("allow_systemd-user", RuleType::Allow)
            .all_users()
            .all_hosts()
            .with_service_member(MemberRef::Entity("systemd-user".into()))
            .with_description("Allow systemd-user session scopes");

        let json = serde_json::to_string(&spec).unwrap();
        let back: RuleSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
