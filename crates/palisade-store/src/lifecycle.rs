//! Rule lifecycle management: the single write path into the store.
//!
//! `PolicyDomain` owns the authoritative store behind an
//! `Arc<RwLock<Arc<StoreSnapshot>>>`. A write clones the current
//! snapshot, mutates and validates the clone, and swaps it in
//! atomically; a rejected write swaps nothing, so the published store
//! is unchanged on error. Readers clone the inner `Arc` once and are
//! never exposed to a partially-applied write.
//!
//! Invariants enforced here, at write time:
//! - display names are unique within a rule-type namespace
//! - a wildcard axis cannot carry explicit members
//! - the nested-group graph stays acyclic

use std::sync::{Arc, RwLock};

use palisade_types::{EntityId, GroupId, Kind, MemberRef, RuleId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::model::{Axis, Entity, Group, Rule, RuleSpec};
use crate::store::StoreSnapshot;

/// An isolated policy domain: one rule set, one entity/group universe.
///
/// Explicitly owned and injectable -- evaluators take snapshots from a
/// domain handle rather than reading ambient global state, so multiple
/// isolated domains can coexist in one process.
///
/// # Thread safety
///
/// `PolicyDomain` is `Clone` and shareable across threads. Writes are
/// serialized by the inner lock; reads never block writes longer than
/// an `Arc` clone.
#[derive(Clone, Default)]
pub struct PolicyDomain {
    inner: Arc<RwLock<Arc<StoreSnapshot>>>,
}

impl PolicyDomain {
    /// Creates an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    ///
    /// A caller holding the returned snapshot sees one consistent
    /// point-in-time view for as long as it keeps it, regardless of
    /// concurrent writes.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still guards a fully-committed snapshot;
            // writes are validated before the swap.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Runs a validated mutation against a clone of the current
    /// snapshot and publishes the clone on success.
    fn write<T>(&self, mutate: impl FnOnce(&mut StoreSnapshot) -> Result<T>) -> Result<T> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut next = StoreSnapshot::clone(&guard);
        let out = mutate(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Creates a rule from a spec, generating a stable identifier when
    /// the spec carries none.
    pub fn create_rule(&self, spec: RuleSpec) -> Result<RuleId> {
        let id = spec
            .id
            .clone()
            .unwrap_or_else(|| RuleId::new(Uuid::new_v4().to_string()));

        let created = self.write(|store| {
            if store.rules.contains_key(&id) {
                return Err(StoreError::DuplicateRuleId(id.clone()));
            }
            if store.rule_by_name(spec.rule_type, &spec.name).is_some() {
                return Err(StoreError::DuplicateRuleName {
                    name: spec.name.clone(),
                    rule_type: spec.rule_type,
                });
            }

            store.rules.insert(
                id.clone(),
                Rule {
                    id: id.clone(),
                    name: spec.name.clone(),
                    rule_type: spec.rule_type,
                    enabled: spec.enabled,
                    description: spec.description.clone(),
                    users: spec.users.clone(),
                    hosts: spec.hosts.clone(),
                    services: spec.services.clone(),
                },
            );
            store.rule_order.push(id.clone());
            Ok(id.clone())
        })?;

        info!(
            rule = %created,
            name = %spec.name,
            rule_type = %spec.rule_type,
            enabled = spec.enabled,
            "rule created"
        );
        Ok(created)
    }

    /// Enables or disables a rule. Disabled rules are skipped by
    /// evaluation but keep their members.
    pub fn set_enabled(&self, id: &RuleId, enabled: bool) -> Result<()> {
        self.write(|store| {
            let rule = store
                .rules
                .get_mut(id)
                .ok_or_else(|| StoreError::RuleNotFound(id.clone()))?;
            rule.enabled = enabled;
            Ok(())
        })?;
        info!(rule = %id, enabled, "rule enablement changed");
        Ok(())
    }

    /// Deletes a rule. Evaluations already in flight keep their
    /// snapshot and still see the rule; missing ids are an error, not
    /// a no-op, so provisioning typos surface.
    pub fn delete_rule(&self, id: &RuleId) -> Result<()> {
        self.write(|store| {
            if store.rules.remove(id).is_none() {
                return Err(StoreError::RuleNotFound(id.clone()));
            }
            store.rule_order.retain(|r| r != id);
            Ok(())
        })?;
        info!(rule = %id, "rule deleted");
        Ok(())
    }

    /// Adds an explicit member reference to one axis of a rule.
    ///
    /// Rejected with `ConflictingCategory` when the axis is the
    /// wildcard category.
    pub fn add_member(&self, id: &RuleId, kind: Kind, member: MemberRef) -> Result<()> {
        self.write(|store| {
            let rule = store
                .rules
                .get_mut(id)
                .ok_or_else(|| StoreError::RuleNotFound(id.clone()))?;
            match rule.axis_mut(kind) {
                Axis::All => Err(StoreError::ConflictingCategory {
                    rule: id.clone(),
                    kind,
                }),
                Axis::Members(members) => {
                    members.insert(member.clone());
                    Ok(())
                }
            }
        })?;
        debug!(rule = %id, kind = %kind, member = %member, "rule member added");
        Ok(())
    }

    /// Removes an explicit member reference from one axis of a rule.
    /// Removing a reference that is not present is a no-op (set
    /// semantics); removing from a wildcard axis is the same category
    /// conflict as adding to it.
    pub fn remove_member(&self, id: &RuleId, kind: Kind, member: &MemberRef) -> Result<()> {
        self.write(|store| {
            let rule = store
                .rules
                .get_mut(id)
                .ok_or_else(|| StoreError::RuleNotFound(id.clone()))?;
            match rule.axis_mut(kind) {
                Axis::All => Err(StoreError::ConflictingCategory {
                    rule: id.clone(),
                    kind,
                }),
                Axis::Members(members) => {
                    members.remove(member);
                    Ok(())
                }
            }
        })?;
        debug!(rule = %id, kind = %kind, member = %member, "rule member removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reference data (entities and groups)
    // ------------------------------------------------------------------

    /// Provisions an entity. Entities are reference data owned by the
    /// external identity system; the engine only needs to know they
    /// exist and which groups they are in.
    pub fn add_entity(&self, kind: Kind, id: EntityId) -> Result<()> {
        self.write(|store| {
            let entities = store.entities.get_mut(kind);
            if entities.contains_key(&id) {
                return Err(StoreError::DuplicateIdentifier {
                    kind,
                    id: id.to_string(),
                });
            }
            entities.insert(id.clone(), Entity::new(id.clone()));
            Ok(())
        })?;
        debug!(kind = %kind, entity = %id, "entity provisioned");
        Ok(())
    }

    /// Deprovisions an entity, detaching it from its groups.
    pub fn remove_entity(&self, kind: Kind, id: &EntityId) -> Result<()> {
        self.write(|store| {
            let entity = store.entities.get_mut(kind).remove(id).ok_or_else(|| {
                StoreError::EntityNotFound {
                    kind,
                    id: id.clone(),
                }
            })?;
            for group_id in &entity.groups {
                if let Some(group) = store.groups.get_mut(kind).get_mut(group_id) {
                    group.member_entities.remove(id);
                }
            }
            Ok(())
        })?;
        debug!(kind = %kind, entity = %id, "entity removed");
        Ok(())
    }

    /// Provisions a group in the kind's namespace.
    pub fn add_group(&self, kind: Kind, id: GroupId) -> Result<()> {
        self.write(|store| {
            let groups = store.groups.get_mut(kind);
            if groups.contains_key(&id) {
                return Err(StoreError::DuplicateIdentifier {
                    kind,
                    id: id.to_string(),
                });
            }
            groups.insert(id.clone(), Group::new(id.clone()));
            Ok(())
        })?;
        debug!(kind = %kind, group = %id, "group provisioned");
        Ok(())
    }

    /// Adds an entity or a nested group to a group.
    ///
    /// Both endpoints must already be provisioned. Nesting is checked
    /// for cycles before the write commits; a rejected nesting leaves
    /// the store unchanged.
    pub fn add_group_member(&self, kind: Kind, group: &GroupId, member: MemberRef) -> Result<()> {
        let outcome = self.write(|store| {
            store.group(kind, group)?;
            match &member {
                MemberRef::Entity(entity_id) => {
                    store.entity(kind, entity_id)?;
                    store
                        .entities
                        .get_mut(kind)
                        .get_mut(entity_id)
                        .ok_or_else(|| StoreError::EntityNotFound {
                            kind,
                            id: entity_id.clone(),
                        })?
                        .groups
                        .insert(group.clone());
                    store
                        .groups
                        .get_mut(kind)
                        .get_mut(group)
                        .ok_or_else(|| StoreError::GroupNotFound {
                            kind,
                            id: group.clone(),
                        })?
                        .member_entities
                        .insert(entity_id.clone());
                }
                MemberRef::Group(child) => {
                    store.group(kind, child)?;
                    if child == group || reaches(store, kind, child, group) {
                        return Err(StoreError::CycleDetected {
                            kind,
                            group: group.clone(),
                            member: child.clone(),
                        });
                    }
                    store
                        .groups
                        .get_mut(kind)
                        .get_mut(group)
                        .ok_or_else(|| StoreError::GroupNotFound {
                            kind,
                            id: group.clone(),
                        })?
                        .member_groups
                        .insert(child.clone());
                    store
                        .groups
                        .get_mut(kind)
                        .get_mut(child)
                        .ok_or_else(|| StoreError::GroupNotFound {
                            kind,
                            id: child.clone(),
                        })?
                        .member_of
                        .insert(group.clone());
                }
            }
            Ok(())
        });

        match &outcome {
            Ok(()) => debug!(kind = %kind, group = %group, member = %member, "group member added"),
            Err(StoreError::CycleDetected { .. }) => {
                warn!(kind = %kind, group = %group, member = %member, "group nesting rejected: cycle");
            }
            Err(_) => {}
        }
        outcome
    }

    /// Removes an entity or nested group from a group, keeping both
    /// edge directions in sync.
    pub fn remove_group_member(
        &self,
        kind: Kind,
        group: &GroupId,
        member: &MemberRef,
    ) -> Result<()> {
        self.write(|store| {
            store.group(kind, group)?;
            match member {
                MemberRef::Entity(entity_id) => {
                    if let Some(entity) = store.entities.get_mut(kind).get_mut(entity_id) {
                        entity.groups.remove(group);
                    }
                    if let Some(record) = store.groups.get_mut(kind).get_mut(group) {
                        record.member_entities.remove(entity_id);
                    }
                }
                MemberRef::Group(child) => {
                    if let Some(record) = store.groups.get_mut(kind).get_mut(group) {
                        record.member_groups.remove(child);
                    }
                    if let Some(record) = store.groups.get_mut(kind).get_mut(child) {
                        record.member_of.remove(group);
                    }
                }
            }
            Ok(())
        })?;
        debug!(kind = %kind, group = %group, member = %member, "group member removed");
        Ok(())
    }
}

/// Depth-first search through `member_groups` (downward) edges:
/// whether `target` is reachable from `from`. Used to reject nestings
/// that would close a cycle.
fn reaches(store: &StoreSnapshot, kind: Kind, from: &GroupId, target: &GroupId) -> bool {
    let mut visited: std::collections::HashSet<&GroupId> = std::collections::HashSet::new();
    let mut stack: Vec<&GroupId> = vec![from];

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Ok(group) = store.group(kind, current) {
            for child in &group.member_groups {
                if !visited.contains(child) {
                    stack.push(child);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Axis;
    use palisade_types::RuleType;

    #[test]
    fn test_create_rule_autogenerates_id() {
        let domain = PolicyDomain::new();
        let id = domain
            .create_rule(RuleSpec::new("allow_all", RuleType::Allow).all_users())
            .unwrap();

        let snapshot = domain.snapshot();
        let rule = snapshot.rule(&id).unwrap();
        assert_eq!(rule.name, "allow_all");
        // Autogenerated ids are concrete tokens, never a placeholder.
        assert!(!rule.id.as_str().is_empty());
        assert_ne!(rule.id.as_str(), "autogenerate");
    }

    #[test]
    fn test_duplicate_name_same_namespace_rejected() {
        let domain = PolicyDomain::new();
        domain
            .create_rule(RuleSpec::new("ops", RuleType::Allow))
            .unwrap();

        let err = domain
            .create_rule(RuleSpec::new("ops", RuleType::Allow))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRuleName { .. }));

        // Same name in the deny namespace is a different rule.
        domain
            .create_rule(RuleSpec::new("ops", RuleType::Deny))
            .unwrap();
    }

    #[test]
    fn test_add_member_to_wildcard_axis_conflicts() {
        let domain = PolicyDomain::new();
        let id = domain
            .create_rule(RuleSpec::new("r", RuleType::Allow).all_users())
            .unwrap();

        let err = domain
            .add_member(&id, Kind::User, MemberRef::Entity("alice".into()))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::ConflictingCategory {
                rule: id.clone(),
                kind: Kind::User,
            }
        );

        // Other axes are unaffected.
        domain
            .add_member(&id, Kind::Service, MemberRef::Entity("sshd".into()))
            .unwrap();
    }

    #[test]
    fn test_rejected_write_leaves_store_unchanged() {
        let domain = PolicyDomain::new();
        domain.add_group(Kind::User, "a".into()).unwrap();
        domain.add_group(Kind::User, "b".into()).unwrap();
        domain
            .add_group_member(Kind::User, &"a".into(), MemberRef::Group("b".into()))
            .unwrap();

        let before = domain.snapshot();

        // a contains b; adding a under b closes the loop and must be
        // rejected.
        let err = domain
            .add_group_member(Kind::User, &"b".into(), MemberRef::Group("a".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::CycleDetected { .. }));

        let after = domain.snapshot();
        assert_eq!(
            before.group(Kind::User, &"b".into()).unwrap(),
            after.group(Kind::User, &"b".into()).unwrap()
        );
        assert!(after
            .group(Kind::User, &"b".into())
            .unwrap()
            .member_groups
            .is_empty());
    }

    #[test]
    fn test_self_nesting_rejected() {
        let domain = PolicyDomain::new();
        domain.add_group(Kind::Host, "g".into()).unwrap();

        let err = domain
            .add_group_member(Kind::Host, &"g".into(), MemberRef::Group("g".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::CycleDetected { .. }));
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        // a -> b -> c, then c -> a must fail.
        let domain = PolicyDomain::new();
        for g in ["a", "b", "c"] {
            domain.add_group(Kind::User, g.into()).unwrap();
        }
        domain
            .add_group_member(Kind::User, &"a".into(), MemberRef::Group("b".into()))
            .unwrap();
        domain
            .add_group_member(Kind::User, &"b".into(), MemberRef::Group("c".into()))
            .unwrap();

        let err = domain
            .add_group_member(Kind::User, &"c".into(), MemberRef::Group("a".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::CycleDetected { .. }));
    }

    #[test]
    fn test_delete_missing_rule_is_not_found() {
        let domain = PolicyDomain::new();
        let err = domain.delete_rule(&RuleId::new("nope")).unwrap_err();
        assert_eq!(err, StoreError::RuleNotFound(RuleId::new("nope")));
    }

    #[test]
    fn test_delete_rule_preserves_order_of_rest() {
        let domain = PolicyDomain::new();
        let a = domain
            .create_rule(RuleSpec::new("a", RuleType::Allow))
            .unwrap();
        let _b = domain
            .create_rule(RuleSpec::new("b", RuleType::Allow))
            .unwrap();
        let _c = domain
            .create_rule(RuleSpec::new("c", RuleType::Allow))
            .unwrap();

        domain.delete_rule(&a).unwrap();
        let snapshot = domain.snapshot();
        let names: Vec<&str> = snapshot
            .rules(RuleType::Allow)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn test_snapshot_isolation_across_writes() {
        let domain = PolicyDomain::new();
        let id = domain
            .create_rule(RuleSpec::new("r", RuleType::Allow))
            .unwrap();

        let old = domain.snapshot();
        domain.set_enabled(&id, false).unwrap();

        // The captured snapshot still sees the rule enabled; the
        // current one sees it disabled.
        assert!(old.rule(&id).unwrap().enabled);
        assert!(!domain.snapshot().rule(&id).unwrap().enabled);
    }

    #[test]
    fn test_remove_entity_detaches_from_groups() {
        let domain = PolicyDomain::new();
        domain.add_entity(Kind::User, "alice".into()).unwrap();
        domain.add_group(Kind::User, "devs".into()).unwrap();
        domain
            .add_group_member(Kind::User, &"devs".into(), MemberRef::Entity("alice".into()))
            .unwrap();

        domain.remove_entity(Kind::User, &"alice".into()).unwrap();

        let snapshot = domain.snapshot();
        assert!(snapshot
            .group(Kind::User, &"devs".into())
            .unwrap()
            .member_entities
            .is_empty());
    }

    #[test]
    fn test_axis_serializes_for_fixtures() {
        // Snapshot fixtures are exchanged as JSON in tooling.
        let axis = Axis::All;
        assert_eq!(serde_json::to_string(&axis).unwrap(), r#""all""#);
    }
}
