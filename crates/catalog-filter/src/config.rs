//! Loading rule lists from JSON files.
//!
//! Two document shapes are accepted:
//! - a bare array: `[{"pattern": "^test$", "target": "origin", "discard": true}]`
//! - an origin section: `{"filters": [ ... ]}`
//!
//! Loading only checks the document shape. Target and pattern validation
//! happens when the chain is built, where bad rules are skipped.

use crate::error::{ConfigError, Result};
use crate::rule::FilterRuleConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleDocument {
    List(Vec<FilterRuleConfig>),
    Section {
        #[serde(default)]
        filters: Vec<FilterRuleConfig>,
    },
}

/// Parse a rule document from a string.
pub fn parse_rules(content: &str) -> std::result::Result<Vec<FilterRuleConfig>, serde_json::Error> {
    let document: RuleDocument = serde_json::from_str(content)?;
    Ok(match document {
        RuleDocument::List(rules) => rules,
        RuleDocument::Section { filters } => filters,
    })
}

/// Read and parse a rule file.
pub fn load_rules(path: &Path) -> Result<Vec<FilterRuleConfig>> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rules = parse_rules(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Loaded {} filter rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}
