//! Error types for tillsync-core.

use thiserror::Error;

use crate::types::{LineId, ProductId};

/// Errors raised by model operations.
///
/// The change-set engine itself never fails; these cover catalog lookups,
/// identifier parsing and order edits that refer to unknown lines.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("no line {0} in order")]
    UnknownLine(LineId),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
