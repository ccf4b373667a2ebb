//! # Palisade
//!
//! Host-based access control (HBAC) policy evaluation for
//! directory-backed identity systems.
//!
//! Given an access tuple (user, host, service), Palisade decides
//! whether any enabled rule grants it, with standard HBAC semantics:
//! wildcard "category" axes, explicit entity and group member
//! references with nested-group closure, and deny precedence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Palisade                           │
//! │  ┌───────────┐   ┌────────────┐   ┌─────────┐   ┌────────┐  │
//! │  │  Import   │ → │ PolicyDomain│ → │Snapshot │ → │Evaluate│  │
//! │  │ (update   │   │ (lifecycle, │   │ (RCU,   │   │ (deny  │  │
//! │  │  files)   │   │  invariants)│   │  cache) │   │  wins) │  │
//! │  └───────────┘   └────────────┘   └─────────┘   └────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```
//! use palisade::{Decision, Evaluator, Kind, PolicyDomain};
//!
//! let domain = PolicyDomain::new();
//! palisade::load_defaults(&domain)?;
//! domain.add_entity(Kind::User, "alice".into())?;
//! domain.add_entity(Kind::Host, "web01".into())?;
//! domain.add_entity(Kind::Service, "sshd".into())?;
//!
//! let evaluator = Evaluator::for_domain(&domain);
//! let decision = evaluator.evaluate(&"alice".into(), &"web01".into(), &"sshd".into())?;
//! assert!(decision.is_allowed()); // granted by the stock allow_all rule
//! # Ok::<(), palisade::PalisadeError>(())
//! ```
//!
//! # Crates
//!
//! - **Types**: [`palisade_types`] - identifiers and enums
//! - **Store**: [`palisade_store`] - snapshots, membership, lifecycle
//! - **Engine**: [`palisade_engine`] - matching and evaluation
//! - **Import**: [`palisade_import`] - provisioning documents

mod error;

pub use error::{EvalError, ImportError, PalisadeError, Result, StoreError};

// Core types
pub use palisade_types::{EntityId, GroupId, Kind, MemberRef, RuleId, RuleType};

// Store and lifecycle
pub use palisade_store::{Axis, PolicyDomain, Rule, RuleSpec, StoreSnapshot};

// Evaluation
pub use palisade_engine::{rule_matches, Decision, Evaluator, Simulation};

// Provisioning
pub use palisade_import::{
    import_document, load_defaults, parse_document, ImportReport, DEFAULT_HBAC_DOCUMENT,
};
