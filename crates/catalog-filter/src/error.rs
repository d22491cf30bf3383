//! Error types for the catalog-filter crate.
//!
//! Two families of errors exist here:
//! - `RuleError` describes why a single rule configuration was rejected.
//!   It is never returned from chain construction; the chain hands it to
//!   its observer and keeps going with the remaining rules.
//! - `ConfigError` covers loading a rule list from disk.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a rule configuration is excluded from the active rule set
#[derive(Error, Debug)]
pub enum RuleError {
    /// Target is not one of any/origin/source/metric
    #[error("unknown `{target}' filter target")]
    UnknownTarget { target: String },

    /// Pattern text is not a valid regular expression
    #[error("unable to compile filter pattern `{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur while loading a rule file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Rule file could not be read
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule file is not a valid rule document
    #[error("failed to parse rule file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ConfigError>;
