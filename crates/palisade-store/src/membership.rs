//! Membership resolution: "is X in group G" over one snapshot.
//!
//! The resolver answers membership probes by walking the nested-group
//! graph upward from an entity's direct memberships (breadth-first,
//! with a visited set as a guard against residual cycles -- write-time
//! validation should make cycles impossible, but the walk must not be
//! able to loop regardless). Computed closures are cached in a
//! [`MembershipIndex`]; the cache is scoped to the resolver's snapshot,
//! so a write -- which publishes a fresh snapshot -- structurally
//! invalidates it. First probe per entity costs O(closure size),
//! repeats are O(1) amortized.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use palisade_types::{EntityId, GroupId, Kind, MemberRef};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::StoreSnapshot;

/// Cached transitive group closures, keyed by entity.
///
/// Shared across evaluation threads; lookups take a read lock, a miss
/// computes outside the lock and inserts under a write lock. Never
/// persisted -- it is a performance cache over the snapshot, not a
/// source of truth.
type MembershipIndex = RwLock<HashMap<(Kind, EntityId), Arc<HashSet<GroupId>>>>;

/// Resolves group membership against one store snapshot.
pub struct MembershipResolver {
    snapshot: Arc<StoreSnapshot>,
    index: MembershipIndex,
}

impl MembershipResolver {
    pub fn new(snapshot: Arc<StoreSnapshot>) -> Self {
        Self {
            snapshot,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// The snapshot this resolver reads from.
    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Whether `entity` is covered by the explicit member reference
    /// `member`: either the reference names the entity itself, or it
    /// names a group in the entity's transitive closure.
    ///
    /// Fails with `EntityNotFound` if the entity does not exist, or
    /// `KindMismatch` if it exists under a different kind.
    pub fn is_member(&self, kind: Kind, entity: &EntityId, member: &MemberRef) -> Result<bool> {
        match member {
            MemberRef::Entity(id) => {
                // Direct reference; still validate the probed entity so
                // a nonexistent principal is an error, not a mismatch.
                self.snapshot.entity(kind, entity)?;
                Ok(id == entity)
            }
            MemberRef::Group(group) => Ok(self.closure(kind, entity)?.contains(group)),
        }
    }

    /// The transitive set of groups `entity` belongs to.
    pub fn closure(&self, kind: Kind, entity: &EntityId) -> Result<Arc<HashSet<GroupId>>> {
        let key = (kind, entity.clone());
        if let Some(hit) = self
            .index
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        let closure = Arc::new(self.walk_closure(kind, entity)?);
        debug!(
            kind = %kind,
            entity = %entity,
            groups = closure.len(),
            "membership closure computed"
        );

        self.index
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(key, Arc::clone(&closure));
        Ok(closure)
    }

    /// Breadth-first walk from the entity's direct groups through
    /// `member_of` edges.
    fn walk_closure(&self, kind: Kind, entity: &EntityId) -> Result<HashSet<GroupId>> {
        let record = self.snapshot.entity(kind, entity)?;

        let mut visited: HashSet<GroupId> = HashSet::new();
        let mut frontier: VecDeque<GroupId> = record.groups.iter().cloned().collect();

        while let Some(group_id) = frontier.pop_front() {
            if !visited.insert(group_id.clone()) {
                continue;
            }
            // Dangling member_of edges are a writer bug; skip rather
            // than fail a read.
            if let Ok(group) = self.snapshot.group(kind, &group_id) {
                for parent in &group.member_of {
                    if !visited.contains(parent) {
                        frontier.push_back(parent.clone());
                    }
                }
            }
        }

        Ok(visited)
    }
}
