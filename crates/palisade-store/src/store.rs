//! The entity store: rules, entities, groups, one consistent snapshot.
//!
//! A [`StoreSnapshot`] is an immutable point-in-time view. Readers
//! obtain one from the lifecycle manager and keep it for the duration
//! of an evaluation; writers never mutate a published snapshot, they
//! replace it wholesale. All accessors here are pure.

use std::collections::HashMap;

use palisade_types::{EntityId, GroupId, Kind, RuleId, RuleType};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::{Entity, Group, Rule};

// ============================================================================
// PerKind
// ============================================================================

/// One value per entity kind (user, host, service).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerKind<T> {
    pub users: T,
    pub hosts: T,
    pub services: T,
}

impl<T> PerKind<T> {
    pub fn get(&self, kind: Kind) -> &T {
        match kind {
            Kind::User => &self.users,
            Kind::Host => &self.hosts,
            Kind::Service => &self.services,
        }
    }

    pub fn get_mut(&mut self, kind: Kind) -> &mut T {
        match kind {
            Kind::User => &mut self.users,
            Kind::Host => &mut self.hosts,
            Kind::Service => &mut self.services,
        }
    }
}

// ============================================================================
// StoreSnapshot
// ============================================================================

/// An immutable, consistent view of the policy store.
///
/// Rule listing order is creation order and stable across snapshots;
/// deleting a rule removes it from the order without renumbering the
/// rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub(crate) rules: HashMap<RuleId, Rule>,
    /// Creation-order index over `rules`.
    pub(crate) rule_order: Vec<RuleId>,
    pub(crate) entities: PerKind<HashMap<EntityId, Entity>>,
    pub(crate) groups: PerKind<HashMap<GroupId, Group>>,
}

impl StoreSnapshot {
    /// Looks up a rule by identifier.
    pub fn rule(&self, id: &RuleId) -> Result<&Rule> {
        self.rules
            .get(id)
            .ok_or_else(|| StoreError::RuleNotFound(id.clone()))
    }

    /// Rules of the given type, in creation order.
    pub fn rules(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rule_order
            .iter()
            .filter_map(|id| self.rules.get(id))
            .filter(move |rule| rule.rule_type == rule_type)
    }

    /// All rules in creation order, regardless of type.
    pub fn all_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rule_order.iter().filter_map(|id| self.rules.get(id))
    }

    /// Looks up a rule by display name within a rule-type namespace.
    pub fn rule_by_name(&self, rule_type: RuleType, name: &str) -> Option<&Rule> {
        self.rules(rule_type).find(|rule| rule.name == name)
    }

    /// Looks up an entity under the given kind.
    ///
    /// Distinguishes "absent everywhere" (`EntityNotFound`) from
    /// "present under another kind" (`KindMismatch`) so that a host id
    /// probed against the service graph is a diagnosable caller error.
    pub fn entity(&self, kind: Kind, id: &EntityId) -> Result<&Entity> {
        if let Some(entity) = self.entities.get(kind).get(id) {
            return Ok(entity);
        }
        for other in Kind::ALL {
            if other != kind && self.entities.get(other).contains_key(id) {
                return Err(StoreError::KindMismatch {
                    id: id.clone(),
                    probed: kind,
                    actual: other,
                });
            }
        }
        Err(StoreError::EntityNotFound {
            kind,
            id: id.clone(),
        })
    }

    /// Whether an entity exists under the given kind.
    pub fn contains_entity(&self, kind: Kind, id: &EntityId) -> bool {
        self.entities.get(kind).contains_key(id)
    }

    /// Looks up a group under the given kind.
    pub fn group(&self, kind: Kind, id: &GroupId) -> Result<&Group> {
        self.groups.get(kind).get(id).ok_or_else(|| {
            StoreError::GroupNotFound {
                kind,
                id: id.clone(),
            }
        })
    }

    /// Number of rules in the store.
    pub fn rule_count(&self) -> usize {
        self.rule_order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, Rule};

    fn rule(id: &str, name: &str, rule_type: RuleType) -> Rule {
        Rule {
            id: RuleId::new(id),
            name: name.to_string(),
            rule_type,
            enabled: true,
            description: None,
            users: Axis::All,
            hosts: Axis::All,
            services: Axis::All,
        }
    }

    fn snapshot_with_rules(rules: Vec<Rule>) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::default();
        for r in rules {
            snapshot.rule_order.push(r.id.clone());
            snapshot.rules.insert(r.id.clone(), r);
        }
        snapshot
    }

    #[test]
    fn test_rules_creation_order_stable() {
        let snapshot = snapshot_with_rules(vec![
            rule("a", "first", RuleType::Allow),
            rule("b", "second", RuleType::Deny),
            rule("c", "third", RuleType::Allow),
        ]);

        let names: Vec<&str> = snapshot
            .rules(RuleType::Allow)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["first", "third"]);

        let names: Vec<&str> = snapshot
            .rules(RuleType::Deny)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, ["second"]);
    }

    #[test]
    fn test_rule_not_found() {
        let snapshot = StoreSnapshot::default();
        let err = snapshot.rule(&RuleId::new("missing")).unwrap_err();
        assert_eq!(err, StoreError::RuleNotFound(RuleId::new("missing")));
    }

    #[test]
    fn test_entity_kind_mismatch() {
        let mut snapshot = StoreSnapshot::default();
        let id = EntityId::new("web01");
        snapshot
            .entities
            .get_mut(Kind::Host)
            .insert(id.clone(), Entity::new(id.clone()));

        // Probing a host id against the service graph is a kind
        // mismatch, not a plain not-found.
        let err = snapshot.entity(Kind::Service, &id).unwrap_err();
        assert_eq!(
            err,
            StoreError::KindMismatch {
                id: id.clone(),
                probed: Kind::Service,
                actual: Kind::Host,
            }
        );

        assert!(snapshot.entity(Kind::Host, &id).is_ok());
    }

    #[test]
    fn test_entity_not_found_anywhere() {
        let snapshot = StoreSnapshot::default();
        let err = snapshot
            .entity(Kind::User, &EntityId::new("ghost"))
            .unwrap_err();
        assert!(matches!(err, StoreError::EntityNotFound { .. }));
    }
}
