//! # palisade-import: Provisioning importer
//!
//! Loads declarative provisioning documents -- the update-file format
//! directory deployments are seeded with -- into a policy domain:
//!
//! - [`parser`] turns the text format into [`AddOperation`]s
//! - [`importer`] maps operations onto rule lifecycle calls
//! - [`defaults`] ships the stock `allow_all` / `allow_systemd-user`
//!   entries
//!
//! # Example
//!
//! ```
//! use palisade_import::load_defaults;
//! use palisade_store::PolicyDomain;
//!
//! let domain = PolicyDomain::new();
//! let report = load_defaults(&domain)?;
//! assert_eq!(report.rules.len(), 2);
//! # Ok::<(), palisade_import::ImportError>(())
//! ```

pub mod defaults;
pub mod error;
pub mod importer;
pub mod parser;

pub use defaults::{load_defaults, DEFAULT_HBAC_DOCUMENT};
pub use error::{ImportError, Result};
pub use importer::{import_document, import_operations, ImportReport};
pub use parser::{parse_document, AddOperation};
