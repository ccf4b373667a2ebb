//! Maps parsed add operations onto lifecycle calls.
//!
//! Three object classes are recognized: `ipahbacrule` becomes a rule,
//! `ipahbacsvc` a service entity, `ipahbacsvcgroup` a service group
//! (with its `member:` references). Anything else -- containers,
//! schema decorations, future extensions -- is skipped, matching how
//! the original provisioning loader treats its update files. The
//! `autogenerate` identifier placeholder is resolved by the lifecycle
//! manager to a fresh stable token and never enters the store.

use std::collections::BTreeSet;

use palisade_store::{Axis, PolicyDomain, RuleSpec};
use palisade_types::{EntityId, GroupId, Kind, MemberRef, RuleId, RuleType};
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::parser::{first_rdn_value, parse_document, AddOperation};

/// The `ipauniqueid` placeholder requesting a generated identifier.
const AUTOGENERATE: &str = "autogenerate";

/// What an import run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Identifiers of rules created, in document order.
    pub rules: Vec<RuleId>,
    /// Service entities provisioned.
    pub services: Vec<EntityId>,
    /// Service groups provisioned.
    pub service_groups: Vec<GroupId>,
}

/// Parses a provisioning document and applies it to the domain.
pub fn import_document(domain: &PolicyDomain, input: &str) -> Result<ImportReport> {
    let operations = parse_document(input)?;
    import_operations(domain, &operations)
}

/// Applies already-parsed add operations to the domain, in order.
pub fn import_operations(domain: &PolicyDomain, operations: &[AddOperation]) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for op in operations {
        if op.has_object_class("ipahbacrule") {
            let spec = rule_spec_from_operation(op)?;
            report.rules.push(domain.create_rule(spec)?);
        } else if op.has_object_class("ipahbacsvc") {
            let id = EntityId::new(entry_name(op)?);
            domain.add_entity(Kind::Service, id.clone())?;
            report.services.push(id);
        } else if op.has_object_class("ipahbacsvcgroup") {
            let id = GroupId::new(entry_name(op)?);
            domain.add_group(Kind::Service, id.clone())?;
            for member_dn in op.values("member") {
                domain.add_group_member(
                    Kind::Service,
                    &id,
                    member_ref_from_dn(member_dn),
                )?;
            }
            report.service_groups.push(id);
        } else {
            debug!(dn = %op.dn, "entry skipped: no recognized object class");
        }
    }

    info!(
        rules = report.rules.len(),
        services = report.services.len(),
        service_groups = report.service_groups.len(),
        "provisioning document imported"
    );
    Ok(report)
}

/// Maps one `ipahbacrule` entry onto a rule spec.
fn rule_spec_from_operation(op: &AddOperation) -> Result<RuleSpec> {
    let name = entry_name(op)?;

    let rule_type = match op.first("accessruletype") {
        Some(value) if value.eq_ignore_ascii_case("allow") => RuleType::Allow,
        Some(value) if value.eq_ignore_ascii_case("deny") => RuleType::Deny,
        Some(value) => {
            return Err(ImportError::InvalidAttribute {
                dn: op.dn.clone(),
                attribute: "accessruletype",
                value: value.to_string(),
            });
        }
        None => {
            return Err(ImportError::MissingAttribute {
                dn: op.dn.clone(),
                attribute: "accessruletype",
            });
        }
    };

    let enabled = match op.first("ipaenabledflag") {
        Some(value) if value.eq_ignore_ascii_case("true") => true,
        Some(value) if value.eq_ignore_ascii_case("false") => false,
        Some(value) => {
            return Err(ImportError::InvalidAttribute {
                dn: op.dn.clone(),
                attribute: "ipaenabledflag",
                value: value.to_string(),
            });
        }
        // Rules are enabled unless the entry says otherwise.
        None => true,
    };

    let id = match op.first("ipauniqueid") {
        Some(value) if value.eq_ignore_ascii_case(AUTOGENERATE) => None,
        Some(value) => Some(RuleId::new(value)),
        None => None,
    };

    Ok(RuleSpec {
        id,
        name: name.to_string(),
        rule_type,
        enabled,
        description: op.first("description").map(str::to_string),
        users: axis_from_operation(op, "usercategory", "memberuser")?,
        hosts: axis_from_operation(op, "hostcategory", "memberhost")?,
        services: axis_from_operation(op, "servicecategory", "memberservice")?,
    })
}

/// Builds one axis from its category attribute and member references.
/// Category `all` with explicit members is rejected; the mutual
/// exclusivity the store enforces holds for provisioning input too.
fn axis_from_operation(
    op: &AddOperation,
    category: &'static str,
    member: &'static str,
) -> Result<Axis> {
    let members: BTreeSet<MemberRef> = op.values(member).map(member_ref_from_dn).collect();

    match op.first(category) {
        Some(value) if value.eq_ignore_ascii_case("all") => {
            if members.is_empty() {
                Ok(Axis::All)
            } else {
                Err(ImportError::ConflictingCategory {
                    dn: op.dn.clone(),
                    category,
                    member,
                })
            }
        }
        Some(value) => Err(ImportError::InvalidAttribute {
            dn: op.dn.clone(),
            attribute: category,
            value: value.to_string(),
        }),
        None => Ok(Axis::Members(members)),
    }
}

/// Display name of an entry: its `cn` attribute, falling back to the
/// leading RDN of the DN.
fn entry_name(op: &AddOperation) -> Result<&str> {
    op.first("cn")
        .or_else(|| op.rdn_value())
        .ok_or_else(|| ImportError::MissingAttribute {
            dn: op.dn.clone(),
            attribute: "cn",
        })
}

/// Reduces a member DN to a typed reference. The container RDN decides
/// entity vs group: `cn=admins,cn=hbacservicegroups,...` is a group
/// reference, `cn=systemd-user,cn=hbacservices,...` an entity. A bare
/// name is taken as an entity identifier.
fn member_ref_from_dn(dn: &str) -> MemberRef {
    let name = first_rdn_value(dn).unwrap_or(dn).to_string();
    let container = dn
        .split(',')
        .nth(1)
        .and_then(|rdn| rdn.split_once('='))
        .map(|(_, value)| value.trim().to_ascii_lowercase());

    match container {
        Some(container) if container.ends_with("groups") => MemberRef::Group(GroupId::new(name)),
        _ => MemberRef::Entity(EntityId::new(name)),
    }
}
