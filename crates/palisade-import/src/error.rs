//! Error type for provisioning import.

use palisade_store::StoreError;
use thiserror::Error;

/// Error type for parsing and importing provisioning documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A line is neither a comment, a `dn:` line, nor a `default:`
    /// attribute line.
    #[error("malformed line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    /// An attribute line appeared before any `dn:` line.
    #[error("attribute before any dn at line {line}: {content:?}")]
    AttributeBeforeDn { line: usize, content: String },

    /// An entry lacks an attribute the mapping requires.
    #[error("entry {dn:?} is missing attribute {attribute}")]
    MissingAttribute { dn: String, attribute: &'static str },

    /// An attribute carries a value the mapping does not accept.
    #[error("entry {dn:?}: invalid {attribute} value {value:?}")]
    InvalidAttribute {
        dn: String,
        attribute: &'static str,
        value: String,
    },

    /// A category wildcard and explicit member values on the same axis.
    #[error("entry {dn:?}: {category} is \"all\" but explicit {member} values are present")]
    ConflictingCategory {
        dn: String,
        category: &'static str,
        member: &'static str,
    },

    /// The lifecycle write the operation mapped to was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
