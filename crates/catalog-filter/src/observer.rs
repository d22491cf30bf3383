//! Observability hooks for the filter chain.
//!
//! The chain never logs directly. It reports rule rejections and record
//! discards to a `FilterObserver`, so callers decide where diagnostics go.

use crate::error::RuleError;
use crate::record::{CatalogRecord, RecordField};
use crate::rule::FilterRule;

/// Receives structured events from a filter chain.
///
/// `Send + Sync` because the chain moves into its own worker task.
pub trait FilterObserver: Send + Sync {
    /// A rule configuration was excluded at construction time.
    ///
    /// `index` is the rule's position in the configuration list.
    fn rule_rejected(&self, index: usize, error: &RuleError);

    /// A record matched a discard rule and will not be forwarded.
    ///
    /// `record` carries any rewrites applied before the discard.
    fn record_discarded(&self, record: &CatalogRecord, field: RecordField, rule: &FilterRule);
}

/// Default observer emitting `tracing` events.
///
/// Unknown targets are errors, pattern failures are warnings and discards
/// are debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FilterObserver for TracingObserver {
    fn rule_rejected(&self, index: usize, error: &RuleError) {
        match error {
            RuleError::UnknownTarget { target } => {
                tracing::error!(rule = index, target = %target, "unknown `{}' filter target", target);
            }
            RuleError::InvalidPattern { pattern, source } => {
                tracing::warn!(
                    rule = index,
                    pattern = %pattern,
                    "unable to compile filter pattern: {}, discarding",
                    source
                );
            }
        }
    }

    fn record_discarded(&self, record: &CatalogRecord, field: RecordField, rule: &FilterRule) {
        tracing::debug!(
            record = %record,
            field = %field,
            pattern = %rule.pattern(),
            "discard record {}, as {} matches `{}' pattern",
            record,
            field,
            rule.pattern()
        );
    }
}
