//! Rule-based filtering stage for catalog records.
//!
//! This crate provides:
//! - CatalogRecord, the origin/source/metric identity of a metric stream
//! - FilterRule compilation from FilterRuleConfig
//! - FilterChain, which rewrites or discards records rule by rule
//! - An async worker that runs a chain between two channels
//!
//! ## Architecture
//! A record goes through every active rule in declaration order:
//! 1. Rewrite rules replace matching field values in place
//! 2. Later rules see those rewritten values
//! 3. The first discard rule that matches drops the record
//!
//! ## Example Usage
//! ```ignore
//! use catalog_filter::{load_rules, FilterChain};
//! use tokio::sync::mpsc;
//!
//! let rules = load_rules(Path::new("filters.json"))?;
//! let chain = FilterChain::new(&rules);
//!
//! let (out_tx, mut out_rx) = mpsc::channel(1);
//! let handle = chain.spawn(1, out_tx);
//!
//! handle.input.send(CatalogRecord::new("collectd", "web1", "cpu.idle")).await?;
//! drop(handle.input);
//!
//! while let Some(record) = out_rx.recv().await {
//!     println!("{record}");
//! }
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod observer;
pub mod record;
pub mod rule;
pub mod worker;

// Re-export main types
pub use chain::{ChainStats, FilterChain, Outcome};
pub use config::{load_rules, parse_rules};
pub use error::{ConfigError, Result, RuleError};
pub use observer::{FilterObserver, TracingObserver};
pub use record::{CatalogRecord, RecordField};
pub use rule::{FilterRule, FilterRuleConfig, FilterTarget};
pub use worker::{DEFAULT_CHANNEL_CAPACITY, FilterChainHandle};
