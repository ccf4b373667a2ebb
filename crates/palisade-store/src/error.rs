//! Error taxonomy for store reads and lifecycle writes.
//!
//! Validation errors (`ConflictingCategory`, `CycleDetected`,
//! `DuplicateRuleName`) reject synchronously at write time and are
//! never stored. Read errors (`NotFound` variants, `KindMismatch`)
//! surface to the caller; they are never silently mapped to an allow
//! or deny outcome.

use palisade_types::{EntityId, GroupId, Kind, RuleId, RuleType};
use thiserror::Error;

/// Error type for store and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Referenced rule does not exist.
    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Referenced entity does not exist under the probed kind.
    #[error("{kind} entity not found: {id}")]
    EntityNotFound { kind: Kind, id: EntityId },

    /// Referenced group does not exist under the probed kind.
    #[error("{kind} group not found: {id}")]
    GroupNotFound { kind: Kind, id: GroupId },

    /// Identifier exists, but under a different kind than probed
    /// (e.g. a host id probed against the service graph).
    #[error("kind mismatch for {id}: probed as {probed}, exists as {actual}")]
    KindMismatch {
        id: EntityId,
        probed: Kind,
        actual: Kind,
    },

    /// Category-all and explicit members are mutually exclusive per
    /// axis; this write would have violated that.
    #[error("rule {rule} has {kind}category=all; explicit members conflict")]
    ConflictingCategory { rule: RuleId, kind: Kind },

    /// Group nesting would create a cycle.
    #[error("adding {member} to {kind} group {group} would create a cycle")]
    CycleDetected {
        kind: Kind,
        group: GroupId,
        member: GroupId,
    },

    /// Display names are unique within a rule-type namespace.
    #[error("a {rule_type} rule named {name:?} already exists")]
    DuplicateRuleName { name: String, rule_type: RuleType },

    /// A rule with this identifier already exists.
    #[error("rule already exists: {0}")]
    DuplicateRuleId(RuleId),

    /// An entity or group with this identifier already exists in the
    /// kind's namespace.
    #[error("{kind} identifier already provisioned: {id}")]
    DuplicateIdentifier { kind: Kind, id: String },

    /// A shared lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
