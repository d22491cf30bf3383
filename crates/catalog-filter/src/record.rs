//! Catalog record identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one observed metric stream.
///
/// Records are created upstream and moved into the filter chain, which
/// either rewrites them in place and forwards them, or drops them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Data source system (e.g. a collector name)
    pub origin: String,
    /// Host or entity within the origin
    pub source: String,
    /// Specific measurement
    pub metric: String,
}

impl CatalogRecord {
    pub fn new(
        origin: impl Into<String>,
        source: impl Into<String>,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            source: source.into(),
            metric: metric.into(),
        }
    }

    /// Current value of a field
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Origin => &self.origin,
            RecordField::Source => &self.source,
            RecordField::Metric => &self.metric,
        }
    }

    /// Mutable access to a field, for in-place rewriting
    pub fn field_mut(&mut self, field: RecordField) -> &mut String {
        match field {
            RecordField::Origin => &mut self.origin,
            RecordField::Source => &mut self.source,
            RecordField::Metric => &mut self.metric,
        }
    }
}

impl fmt::Display for CatalogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.origin, self.source, self.metric)
    }
}

/// One of the three record fields a rule can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Origin,
    Source,
    Metric,
}

impl RecordField {
    /// Evaluation order used by every rule
    pub const ALL: [RecordField; 3] = [RecordField::Origin, RecordField::Source, RecordField::Metric];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Origin => "origin",
            RecordField::Source => "source",
            RecordField::Metric => "metric",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
