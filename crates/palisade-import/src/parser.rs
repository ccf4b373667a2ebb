//! Parser for the declarative provisioning format.
//!
//! The format is line-oriented: entries are separated by blank lines,
//! each entry opens with a `dn:` line naming its directory location,
//! followed by `default:` attribute lines of the shape
//! `default:name: value` (a space after the operation prefix is also
//! accepted). `#` lines are comments. Attribute names are
//! case-insensitive and normalized to lowercase; values keep their
//! case. An attribute may repeat, yielding multiple values.

use crate::error::{ImportError, Result};

/// One declarative add operation: a target location plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOperation {
    /// Target directory location, verbatim (e.g.
    /// `cn=allow_all,cn=hbac,$SUFFIX`).
    pub dn: String,
    /// Attribute name/value pairs in document order; names lowercased.
    pub attributes: Vec<(String, String)>,
}

impl AddOperation {
    /// First value of an attribute, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values of an attribute, in document order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.attributes
            .iter()
            .filter(move |(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the entry declares the given object class.
    pub fn has_object_class(&self, class: &str) -> bool {
        self.values("objectclass")
            .any(|value| value.eq_ignore_ascii_case(class))
    }

    /// The value of the entry's first RDN (`cn=allow_all,...` ->
    /// `allow_all`).
    pub fn rdn_value(&self) -> Option<&str> {
        first_rdn_value(&self.dn)
    }
}

/// The value of the leading RDN of a DN; a bare name passes through.
pub(crate) fn first_rdn_value(dn: &str) -> Option<&str> {
    let rdn = dn.split(',').next()?.trim();
    if rdn.is_empty() {
        return None;
    }
    match rdn.split_once('=') {
        Some((_, value)) => Some(value.trim()),
        None => Some(rdn),
    }
}

/// Parses a provisioning document into its add operations.
pub fn parse_document(input: &str) -> Result<Vec<AddOperation>> {
    let mut operations = Vec::new();
    let mut current: Option<AddOperation> = None;

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        let line_no = index + 1;

        if line.is_empty() {
            if let Some(op) = current.take() {
                operations.push(op);
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if let Some(dn) = line.strip_prefix("dn:") {
            if let Some(op) = current.take() {
                operations.push(op);
            }
            current = Some(AddOperation {
                dn: dn.trim().to_string(),
                attributes: Vec::new(),
            });
            continue;
        }

        let Some(rest) = line.strip_prefix("default:") else {
            return Err(ImportError::MalformedLine {
                line: line_no,
                content: line.to_string(),
            });
        };
        let Some((name, value)) = rest.trim_start().split_once(':') else {
            return Err(ImportError::MalformedLine {
                line: line_no,
                content: line.to_string(),
            });
        };

        let Some(op) = current.as_mut() else {
            return Err(ImportError::AttributeBeforeDn {
                line: line_no,
                content: line.to_string(),
            });
        };
        op.attributes
            .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    if let Some(op) = current.take() {
        operations.push(op);
    }
    Ok(operations)
}
