//! Filter rule configuration and compiled rules.
//!
//! A `FilterRuleConfig` is what a rule file contains. `FilterRule::compile`
//! validates its target and compiles its pattern once; the resulting
//! `FilterRule` is never mutated afterwards.

use crate::error::RuleError;
use crate::record::RecordField;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which record fields a rule is allowed to inspect and modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterTarget {
    #[default]
    Any,
    Origin,
    Source,
    Metric,
}

impl FilterTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTarget::Any => "any",
            FilterTarget::Origin => "origin",
            FilterTarget::Source => "source",
            FilterTarget::Metric => "metric",
        }
    }

    /// Whether this target selects the given field
    pub fn selects(&self, field: RecordField) -> bool {
        matches!(
            (self, field),
            (FilterTarget::Any, _)
                | (FilterTarget::Origin, RecordField::Origin)
                | (FilterTarget::Source, RecordField::Source)
                | (FilterTarget::Metric, RecordField::Metric)
        )
    }
}

impl FromStr for FilterTarget {
    type Err = RuleError;

    /// Empty string means `any`; names are matched exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "any" => Ok(FilterTarget::Any),
            "origin" => Ok(FilterTarget::Origin),
            "source" => Ok(FilterTarget::Source),
            "metric" => Ok(FilterTarget::Metric),
            _ => Err(RuleError::UnknownTarget {
                target: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub discard: bool,
    #[serde(default)]
    pub rewrite: String,
}

impl FilterRuleConfig {
    /// Rewrite rule: fields matching `pattern` are replaced using `rewrite`
    pub fn rewrite(
        target: impl Into<String>,
        pattern: impl Into<String>,
        rewrite: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
            discard: false,
            rewrite: rewrite.into(),
        }
    }

    /// Discard rule: records with a field matching `pattern` are dropped
    pub fn discard(target: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
            discard: true,
            rewrite: String::new(),
        }
    }
}

/// A validated rule holding both its pattern text and compiled form.
#[derive(Debug, Clone)]
pub struct FilterRule {
    target: FilterTarget,
    regex: Regex,
    discard: bool,
    rewrite: String,
}

impl FilterRule {
    /// Validate the target and compile the pattern.
    ///
    /// The target is checked first, so a rule with both a bad target and a
    /// bad pattern reports `UnknownTarget`.
    pub fn compile(config: &FilterRuleConfig) -> Result<Self, RuleError> {
        let target: FilterTarget = config.target.parse()?;

        let regex = Regex::new(&config.pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: config.pattern.clone(),
            source,
        })?;

        Ok(Self {
            target,
            regex,
            discard: config.discard,
            rewrite: config.rewrite.clone(),
        })
    }

    pub fn target(&self) -> FilterTarget {
        self.target
    }

    /// Source pattern text
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_discard(&self) -> bool {
        self.discard
    }

    pub fn rewrite_template(&self) -> &str {
        &self.rewrite
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Replace every match in `value` with the rewrite template.
    ///
    /// `$1`, `${name}` and `$$` are expanded against each match.
    pub fn apply_rewrite(&self, value: &str) -> String {
        self.regex
            .replace_all(value, self.rewrite.as_str())
            .into_owned()
    }
}
