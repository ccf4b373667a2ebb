//! Unified error type for the top-level API.

use thiserror::Error;

pub use palisade_engine::EvalError;
pub use palisade_import::ImportError;
pub use palisade_store::StoreError;

/// Any error the Palisade API can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PalisadeError {
    /// Store read or lifecycle write failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Evaluation failure (unknown principal).
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Provisioning import failure.
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// Result type for Palisade operations.
pub type Result<T> = std::result::Result<T, PalisadeError>;
