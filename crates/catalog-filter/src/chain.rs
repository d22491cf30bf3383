//! The FilterChain applies an ordered rule list to catalog records.
//!
//! Rules run in declaration order. Each rule inspects the fields its target
//! selects, always in origin, source, metric order, and always against the
//! field's current value, so rewrites from earlier rules (and earlier fields
//! of the same rule) are visible to everything that follows.

use crate::observer::{FilterObserver, TracingObserver};
use crate::record::{CatalogRecord, RecordField};
use crate::rule::{FilterRule, FilterRuleConfig};
use std::sync::Arc;

/// Result of evaluating one record against the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record survived every rule, possibly rewritten
    Forward(CatalogRecord),
    /// Record matched a discard rule
    Discard,
}

/// Counters collected by a running chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    /// Records pulled from the inbound channel
    pub received: u64,
    /// Records pushed to the outbound channel
    pub forwarded: u64,
    /// Records dropped by a discard rule
    pub discarded: u64,
    /// Forwarded records with at least one field changed
    pub rewritten: u64,
}

/// Ordered, immutable set of compiled rules.
///
/// ## Usage
/// ```ignore
/// let chain = FilterChain::new(&[
///     FilterRuleConfig::rewrite("metric", r"^cpu\.(.+)", "cpu_$1"),
///     FilterRuleConfig::discard("origin", "^test$"),
/// ]);
///
/// match chain.evaluate(record) {
///     Outcome::Forward(record) => downstream.push(record),
///     Outcome::Discard => {}
/// }
/// ```
#[derive(Clone)]
pub struct FilterChain {
    rules: Vec<FilterRule>,
    observer: Arc<dyn FilterObserver>,
}

impl FilterChain {
    /// Build a chain reporting to `tracing`.
    pub fn new(configs: &[FilterRuleConfig]) -> Self {
        Self::with_observer(configs, Arc::new(TracingObserver))
    }

    /// Build a chain reporting to the given observer.
    ///
    /// Construction never fails. Each configuration whose target is unknown
    /// or whose pattern does not compile is reported to `observer` and left
    /// out; the remaining rules keep their relative order. A chain with no
    /// valid rules forwards every record unchanged.
    pub fn with_observer(configs: &[FilterRuleConfig], observer: Arc<dyn FilterObserver>) -> Self {
        let mut rules = Vec::with_capacity(configs.len());

        for (index, config) in configs.iter().enumerate() {
            match FilterRule::compile(config) {
                Ok(rule) => rules.push(rule),
                Err(err) => observer.rule_rejected(index, &err),
            }
        }

        tracing::debug!(
            "Filter chain built: {} active rule(s) out of {}",
            rules.len(),
            configs.len()
        );

        Self { rules, observer }
    }

    /// Active rules, in evaluation order
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run one record through every rule.
    pub fn evaluate(&self, record: CatalogRecord) -> Outcome {
        self.evaluate_counted(record).0
    }

    /// Same as `evaluate`, also returning how many field rewrites changed
    /// the record.
    ///
    /// ## Algorithm
    /// For each rule, for each field the rule targets:
    /// 1. Test the pattern against the field's current value
    /// 2. On a discard rule match, report and stop
    /// 3. On a rewrite rule match, replace the field in place
    pub(crate) fn evaluate_counted(&self, mut record: CatalogRecord) -> (Outcome, usize) {
        let mut fields_rewritten = 0;

        for rule in &self.rules {
            for field in RecordField::ALL {
                if !rule.target().selects(field) || !rule.is_match(record.field(field)) {
                    continue;
                }

                if rule.is_discard() {
                    self.observer.record_discarded(&record, field, rule);
                    return (Outcome::Discard, fields_rewritten);
                }

                let rewritten = rule.apply_rewrite(record.field(field));
                let value = record.field_mut(field);
                if *value != rewritten {
                    *value = rewritten;
                    fields_rewritten += 1;
                }
            }
        }

        (Outcome::Forward(record), fields_rewritten)
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(&[])
    }
}
