//! Error types for cascade-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Weighted table must contain at least one entry")]
    EmptyTable,

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Grid has {actual} cells, expected {expected}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("Position bitset does not fit a {width}x{height} grid")]
    BitsetMismatch { width: usize, height: usize },
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
