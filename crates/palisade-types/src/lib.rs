//! # palisade-types: Core types for `Palisade`
//!
//! Shared types used across the `Palisade` HBAC engine:
//! - Identifiers ([`EntityId`], [`GroupId`], [`RuleId`])
//! - Entity classification ([`Kind`])
//! - Rule classification ([`RuleType`])
//! - Membership references ([`MemberRef`])
//!
//! Identifiers are opaque stable tokens. The directory service that
//! feeds Palisade uses names and DN fragments as identifiers, so all
//! three identifier types wrap strings rather than integers.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user, host, or service entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for a group of entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for an access rule.
///
/// Provisioning input may request a freshly generated identifier via an
/// `autogenerate` placeholder; the importer substitutes a real token
/// before the rule reaches the store, so a `RuleId` always holds a
/// concrete value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Kind
// ============================================================================

/// The three entity kinds an HBAC rule constrains.
///
/// Every rule has one axis per kind; a tuple (user, host, service) is
/// granted access only when all three axes accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A person or service account requesting access.
    User,
    /// The machine being accessed.
    Host,
    /// The PAM service mediating the login (sshd, sudo, ...).
    Service,
}

impl Kind {
    /// All kinds, in the conventional axis-evaluation order.
    pub const ALL: [Kind; 3] = [Kind::User, Kind::Host, Kind::Service];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::User => "user",
            Kind::Host => "host",
            Kind::Service => "service",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RuleType
// ============================================================================

/// Whether a rule grants or refuses access when it matches.
///
/// Deny rules take precedence: a tuple matched by any enabled deny rule
/// is refused even if allow rules also match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Grant access on match.
    Allow,
    /// Refuse access on match.
    Deny,
}

impl Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Allow => write!(f, "allow"),
            RuleType::Deny => write!(f, "deny"),
        }
    }
}

// ============================================================================
// MemberRef
// ============================================================================

/// An explicit member reference on a rule axis.
///
/// A reference names either a single entity directly or a group, in
/// which case the rule covers the group's transitive membership
/// closure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRef {
    /// Direct reference to one entity.
    Entity(EntityId),
    /// Reference to a group; covers all transitive members.
    Group(GroupId),
}

impl Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Entity(id) => write!(f, "{id}"),
            MemberRef::Group(id) => write!(f, "group:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_roundtrip() {
        let id = EntityId::new("systemd-user");
        assert_eq!(id.to_string(), "systemd-user");
        assert_eq!(id.as_str(), "systemd-user");
        assert_eq!(EntityId::from("systemd-user"), id);
    }

    #[test]
    fn test_kind_axis_order() {
        // Conventional evaluation order: user, host, service.
        assert_eq!(Kind::ALL, [Kind::User, Kind::Host, Kind::Service]);
        assert_eq!(Kind::Service.to_string(), "service");
    }

    #[test]
    fn test_rule_type_display() {
        assert_eq!(RuleType::Allow.to_string(), "allow");
        assert_eq!(RuleType::Deny.to_string(), "deny");
    }

    #[test]
    fn test_member_ref_serde_shape() {
        let member = MemberRef::Group(GroupId::new("admins"));
        let json = serde_json::to_string(&member).unwrap();
        assert_eq!(json, r#"{"group":"admins"}"#);

        let back: MemberRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, member);
    }

    #[test]
    fn test_entity_id_serde_transparent() {
        let id: EntityId = serde_json::from_str(r#""alice""#).unwrap();
        assert_eq!(id, EntityId::new("alice"));
    }
}
