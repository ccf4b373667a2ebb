//! Per-rule matching: does one rule cover a (user, host, service) tuple.
//!
//! A rule matches when all three of its axes accept the corresponding
//! entity. A wildcard axis accepts unconditionally, including entity
//! identifiers the store has never seen; an explicit axis accepts a
//! direct entity reference or membership in a referenced group's
//! closure. Axes are checked user, host, service, short-circuiting on
//! the first failure -- the order is conventional, the outcome does
//! not depend on it.

use palisade_store::{Axis, MembershipResolver, Result, Rule};
use palisade_types::{EntityId, Kind, MemberRef};

/// Whether `rule` covers the access tuple. Enablement is not
/// considered here; the evaluator filters disabled rules.
pub fn rule_matches(
    resolver: &MembershipResolver,
    rule: &Rule,
    user: &EntityId,
    host: &EntityId,
    service: &EntityId,
) -> Result<bool> {
    for (kind, entity) in [
        (Kind::User, user),
        (Kind::Host, host),
        (Kind::Service, service),
    ] {
        if !axis_matches(resolver, kind, rule.axis(kind), entity)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether one axis accepts the entity.
fn axis_matches(
    resolver: &MembershipResolver,
    kind: Kind,
    axis: &Axis,
    entity: &EntityId,
) -> Result<bool> {
    let members = match axis {
        Axis::All => return Ok(true),
        Axis::Members(members) => members,
    };

    // Direct entity references are pure identifier comparisons.
    if members.contains(&MemberRef::Entity(entity.clone())) {
        return Ok(true);
    }

    // One closure computation covers every group reference on the axis.
    let group_refs: Vec<_> = members
        .iter()
        .filter_map(|member| match member {
            MemberRef::Group(group) => Some(group),
            MemberRef::Entity(_) => None,
        })
        .collect();
    if group_refs.is_empty() {
        return Ok(false);
    }

    let closure = resolver.closure(kind, entity)?;
    Ok(group_refs.into_iter().any(|group| closure.contains(group)))
}
