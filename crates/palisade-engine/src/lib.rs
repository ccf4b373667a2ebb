//! # palisade-engine: HBAC rule matching and evaluation
//!
//! Decides whether a (user, host, service) tuple is granted access:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  evaluate(user, host, service)               │
//! └──────────────────┬───────────────────────────┘
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │  Evaluator                                   │
//! │  ├─ enabled deny rules first (deny wins)     │
//! │  ├─ then enabled allow rules                 │
//! │  └─ otherwise NoApplicableRule               │
//! └──────────────────┬───────────────────────────┘
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │  rule_matches: all three axes must accept    │
//! │  (wildcard category, direct member, or       │
//! │   group-closure membership)                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use palisade_engine::Evaluator;
//! use palisade_store::{PolicyDomain, RuleSpec};
//! use palisade_types::{Kind, RuleType};
//!
//! let domain = PolicyDomain::new();
//! domain.add_entity(Kind::User, "alice".into())?;
//! domain.add_entity(Kind::Host, "web01".into())?;
//! domain.add_entity(Kind::Service, "sshd".into())?;
//! domain.create_rule(
//!     RuleSpec::new("allow_all", RuleType::Allow)
//!         .all_users()
//!         .all_hosts()
//!         .all_services(),
//! )?;
//!
//! let evaluator = Evaluator::for_domain(&domain).without_audit();
//! let decision = evaluator.evaluate(&"alice".into(), &"web01".into(), &"sshd".into())?;
//! assert!(decision.is_allowed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod evaluator;
pub mod matcher;

pub use evaluator::{Decision, EvalError, Evaluator, Result, Simulation};
pub use matcher::rule_matches;
