//! Error types for cascade-engine

use cascade_core::{CoreError, SymbolId};
use thiserror::Error;

use crate::bonus::TierId;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Grid {width}x{height} is too small for clusters of {min_cluster}")]
    GridTooSmall {
        width: usize,
        height: usize,
        min_cluster: usize,
    },

    #[error("Symbol id {0} is not in the catalog")]
    UnknownSymbol(SymbolId),

    #[error("Symbol id 0 is reserved for empty cells")]
    ReservedSymbol,

    #[error("Duplicate symbol id {0}")]
    DuplicateSymbol(SymbolId),

    #[error("Catalog has no {0} symbol")]
    MissingSymbolKind(&'static str),

    #[error("Weighted table '{0}' has zero total weight")]
    ZeroWeight(&'static str),

    #[error("Unknown bonus tier {0} referenced in {1}")]
    UnknownTier(TierId, &'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Bonus session errors (programmer errors, never retried)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BonusError {
    #[error("Unknown bonus tier: {0}")]
    UnknownTier(TierId),

    #[error("A bonus session is already active (tier {0})")]
    SessionAlreadyActive(TierId),

    #[error("No bonus session is active")]
    NoActiveSession,
}

/// Rejected spin; engine state is left untouched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpinError {
    #[error("Bet {bet} outside allowed range {min}..={max}")]
    InvalidBet { bet: f64, min: f64, max: f64 },
}

/// Result type alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
