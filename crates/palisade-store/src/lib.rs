//! # palisade-store: Entity store and rule lifecycle
//!
//! The authoritative state of a Palisade policy domain:
//! - **Entity store** ([`StoreSnapshot`]) - rules, entities, groups,
//!   read through immutable point-in-time snapshots
//! - **Membership resolution** ([`MembershipResolver`]) - transitive
//!   group closure with a per-snapshot cache
//! - **Rule lifecycle** ([`PolicyDomain`]) - the single write path,
//!   enforcing name uniqueness, axis exclusivity, and group-graph
//!   acyclicity at write time
//!
//! # Snapshot isolation
//!
//! ```
//! use palisade_store::{PolicyDomain, RuleSpec};
//! use palisade_types::RuleType;
//!
//! let domain = PolicyDomain::new();
//! let id = domain.create_rule(RuleSpec::new("allow_all", RuleType::Allow))?;
//!
//! let snapshot = domain.snapshot();
//! domain.set_enabled(&id, false)?;
//!
//! // The captured snapshot is unaffected by the later write.
//! assert!(snapshot.rule(&id)?.enabled);
//! # Ok::<(), palisade_store::StoreError>(())
//! ```

pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod model;
pub mod store;

pub use error::{Result, StoreError};
pub use lifecycle::PolicyDomain;
pub use membership::MembershipResolver;
pub use model::{Axis, Entity, Group, Rule, RuleSpec};
pub use store::{PerKind, StoreSnapshot};
