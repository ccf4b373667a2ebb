//! Policy evaluation: the overall allow/deny decision for a tuple.
//!
//! Evaluation considers enabled rules only. Deny takes precedence: a
//! tuple matched by any enabled deny rule is refused even when allow
//! rules also match it. When no allow rule matches, the result is
//! [`Decision::NoApplicableRule`] -- callers treat that as
//! deny-by-default; the engine itself never implicitly grants.
//!
//! The result depends only on the snapshot and the three identifiers:
//! no randomness, no ordering-dependent outcome. Evaluation is
//! side-effect-free and idempotent, safe to retry or abandon.

use std::sync::Arc;

use palisade_store::{MembershipResolver, PolicyDomain, Rule, StoreError, StoreSnapshot};
use palisade_types::{EntityId, Kind, RuleType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::matcher::rule_matches;

// ============================================================================
// Decision
// ============================================================================

/// The outcome of evaluating an access tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// An enabled allow rule matched and no enabled deny rule did.
    Allow {
        /// Display name of the granting rule, for audit.
        matched_rule: String,
    },
    /// An enabled deny rule matched; deny wins over any allow match.
    Deny {
        /// Display name of the refusing rule.
        matched_rule: String,
        /// Human-readable explanation of the refusal.
        reason: String,
    },
    /// No enabled allow rule matched. Not an error: the legitimate
    /// "nothing grants this" outcome, read as deny-by-default.
    NoApplicableRule,
}

impl Decision {
    /// Whether the tuple is granted access.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error type for evaluation.
///
/// An unknown principal is a caller error, deliberately distinct from
/// the `NoApplicableRule` decision: ambiguity between "entity does not
/// exist" and "no rule matches" must be explicit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// One of the three principals does not resolve in the store.
    #[error("unknown {kind} entity: {id}")]
    UnknownEntity { kind: Kind, id: EntityId },

    /// Underlying store failure (kind mismatch, poisoned lock).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluates access tuples against one store snapshot.
///
/// The evaluator owns a [`MembershipResolver`] (and with it the
/// membership cache), so repeated evaluations against the same
/// snapshot amortize closure computations. Build a fresh evaluator
/// after writes to observe them.
pub struct Evaluator {
    resolver: MembershipResolver,
    /// Whether to emit audit events for decisions.
    audit_enabled: bool,
}

impl Evaluator {
    /// Creates an evaluator over an explicit snapshot.
    pub fn new(snapshot: Arc<StoreSnapshot>) -> Self {
        Self {
            resolver: MembershipResolver::new(snapshot),
            audit_enabled: true,
        }
    }

    /// Creates an evaluator over the domain's current snapshot.
    pub fn for_domain(domain: &PolicyDomain) -> Self {
        Self::new(domain.snapshot())
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// The snapshot this evaluator reads from.
    pub fn snapshot(&self) -> &StoreSnapshot {
        self.resolver.snapshot()
    }

    /// Decides whether `user` may access `service` on `host`.
    ///
    /// # Errors
    ///
    /// Fails with [`EvalError::UnknownEntity`] when any principal does
    /// not resolve; a "no rule matches" outcome is a decision value,
    /// never an error.
    pub fn evaluate(
        &self,
        user: &EntityId,
        host: &EntityId,
        service: &EntityId,
    ) -> Result<Decision> {
        self.check_principals(user, host, service)?;

        // Deny precedence: any matching enabled deny rule wins.
        for rule in self.enabled_rules(RuleType::Deny) {
            if rule_matches(&self.resolver, rule, user, host, service)? {
                let decision = Decision::Deny {
                    matched_rule: rule.name.clone(),
                    reason: format!("denied by rule '{}'", rule.name),
                };
                if self.audit_enabled {
                    warn!(
                        user = %user,
                        host = %host,
                        service = %service,
                        rule = %rule.name,
                        "access denied"
                    );
                }
                return Ok(decision);
            }
        }

        for rule in self.enabled_rules(RuleType::Allow) {
            if rule_matches(&self.resolver, rule, user, host, service)? {
                if self.audit_enabled {
                    info!(
                        user = %user,
                        host = %host,
                        service = %service,
                        rule = %rule.name,
                        "access granted"
                    );
                }
                return Ok(Decision::Allow {
                    matched_rule: rule.name.clone(),
                });
            }
        }

        if self.audit_enabled {
            info!(
                user = %user,
                host = %host,
                service = %service,
                "no applicable rule"
            );
        }
        Ok(Decision::NoApplicableRule)
    }

    /// Evaluates a tuple and reports which enabled rules matched and
    /// which did not, for administrator diagnosis. The decision is
    /// identical to [`evaluate`](Self::evaluate) for the same inputs.
    pub fn simulate(
        &self,
        user: &EntityId,
        host: &EntityId,
        service: &EntityId,
    ) -> Result<Simulation> {
        let decision = self.evaluate(user, host, service)?;

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for rule in self.snapshot().all_rules().filter(|rule| rule.enabled) {
            if rule_matches(&self.resolver, rule, user, host, service)? {
                matched.push(rule.name.clone());
            } else {
                unmatched.push(rule.name.clone());
            }
        }

        Ok(Simulation {
            decision,
            matched,
            unmatched,
        })
    }

    fn enabled_rules(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.snapshot()
            .rules(rule_type)
            .filter(|rule| rule.enabled)
    }

    /// Resolves all three principals up front so a caller error never
    /// masquerades as a deny outcome.
    fn check_principals(
        &self,
        user: &EntityId,
        host: &EntityId,
        service: &EntityId,
    ) -> Result<()> {
        for (kind, id) in [
            (Kind::User, user),
            (Kind::Host, host),
            (Kind::Service, service),
        ] {
            match self.snapshot().entity(kind, id) {
                Ok(_) => {}
                Err(StoreError::EntityNotFound { .. }) => {
                    return Err(EvalError::UnknownEntity {
                        kind,
                        id: id.clone(),
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(())
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Diagnostic evaluation result: the decision plus which enabled rules
/// matched the tuple and which did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub decision: Decision,
    /// Display names of enabled rules matching the tuple, in creation
    /// order.
    pub matched: Vec<String>,
    /// Display names of enabled rules not matching the tuple.
    pub unmatched: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_store::RuleSpec;
    use palisade_types::MemberRef;

    fn provisioned_domain() -> PolicyDomain {
        let domain = PolicyDomain::new();
        domain.add_entity(Kind::User, "alice".into()).unwrap();
        domain.add_entity(Kind::User, "bob".into()).unwrap();
        domain.add_entity(Kind::Host, "web01".into()).unwrap();
        domain.add_entity(Kind::Service, "sshd".into()).unwrap();
        domain
            .add_entity(Kind::Service, "systemd-user".into())
            .unwrap();
        domain
    }

    fn evaluator(domain: &PolicyDomain) -> Evaluator {
        Evaluator::for_domain(domain).without_audit()
    }

    #[test]
    fn test_allow_when_rule_matches() {
        let domain = provisioned_domain();
        domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();

        let decision = evaluator(&domain)
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap();
        assert_eq!(
            decision,
            Decision::Allow {
                matched_rule: "allow_all".to_string()
            }
        );
    }

    #[test]
    fn test_no_applicable_rule_when_nothing_matches() {
        let domain = provisioned_domain();

        let decision = evaluator(&domain)
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap();
        assert_eq!(decision, Decision::NoApplicableRule);
    }

    #[test]
    fn test_deny_precedence_over_allow() {
        let domain = provisioned_domain();
        domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();
        domain
            .create_rule(
                RuleSpec::new("deny_bob", RuleType::Deny)
                    .with_user_member(MemberRef::Entity("bob".into()))
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();

        let evaluator = evaluator(&domain);
        let decision = evaluator
            .evaluate(&"bob".into(), &"web01".into(), &"sshd".into())
            .unwrap();
        assert!(matches!(decision, Decision::Deny { ref matched_rule, .. } if matched_rule == "deny_bob"));

        // Other users are unaffected by the deny rule.
        assert!(evaluator
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap()
            .is_allowed());
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let domain = provisioned_domain();
        let id = domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();

        assert!(evaluator(&domain)
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap()
            .is_allowed());

        domain.set_enabled(&id, false).unwrap();

        // Same tuple, all else constant: Allow becomes NoApplicableRule.
        let decision = evaluator(&domain)
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap();
        assert_eq!(decision, Decision::NoApplicableRule);
    }

    #[test]
    fn test_unknown_principal_is_error_not_deny() {
        let domain = provisioned_domain();
        domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();

        let err = evaluator(&domain)
            .evaluate(&"ghost".into(), &"web01".into(), &"sshd".into())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownEntity {
                kind: Kind::User,
                id: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let domain = provisioned_domain();
        domain
            .create_rule(
                RuleSpec::new("allow_systemd-user", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .with_service_member(MemberRef::Entity("systemd-user".into())),
            )
            .unwrap();

        let evaluator = evaluator(&domain);
        let first = evaluator
            .evaluate(&"alice".into(), &"web01".into(), &"systemd-user".into())
            .unwrap();
        let second = evaluator
            .evaluate(&"alice".into(), &"web01".into(), &"systemd-user".into())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_simulation_reports_rule_lists() {
        let domain = provisioned_domain();
        domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();
        domain
            .create_rule(
                RuleSpec::new("allow_systemd-user", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .with_service_member(MemberRef::Entity("systemd-user".into())),
            )
            .unwrap();

        let simulation = evaluator(&domain)
            .simulate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap();

        assert!(simulation.decision.is_allowed());
        assert_eq!(simulation.matched, ["allow_all"]);
        assert_eq!(simulation.unmatched, ["allow_systemd-user"]);
    }

    #[test]
    fn test_stale_evaluator_keeps_its_snapshot() {
        let domain = provisioned_domain();
        let id = domain
            .create_rule(
                RuleSpec::new("allow_all", RuleType::Allow)
                    .all_users()
                    .all_hosts()
                    .all_services(),
            )
            .unwrap();

        let stale = evaluator(&domain);
        domain.set_enabled(&id, false).unwrap();

        // The evaluator built before the write still grants; a fresh
        // one observes the disable.
        assert!(stale
            .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
            .unwrap()
            .is_allowed());
        assert_eq!(
            evaluator(&domain)
                .evaluate(&"alice".into(), &"web01".into(), &"sshd".into())
                .unwrap(),
            Decision::NoApplicableRule
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Two evaluations with identical inputs and no intervening
            /// writes return identical decisions.
            #[test]
            fn evaluation_is_deterministic(
                service_is_systemd in proptest::bool::ANY,
                user in prop_oneof!["alice", "bob"],
            ) {
                let domain = provisioned_domain();
                domain
                    .create_rule(
                        RuleSpec::new("allow_systemd-user", RuleType::Allow)
                            .all_users()
                            .all_hosts()
                            .with_service_member(MemberRef::Entity("systemd-user".into())),
                    )
                    .unwrap();

                let service: EntityId = if service_is_systemd {
                    "systemd-user".into()
                } else {
                    "sshd".into()
                };
                let evaluator = Evaluator::for_domain(&domain).without_audit();
                let first = evaluator
                    .evaluate(&user.as_str().into(), &"web01".into(), &service)
                    .unwrap();
                let second = evaluator
                    .evaluate(&user.as_str().into(), &"web01".into(), &service)
                    .unwrap();
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(first.is_allowed(), service_is_systemd);
            }
        }
    }
}
