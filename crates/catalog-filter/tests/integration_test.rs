//! Integration tests for the filter chain.
//!
//! These tests drive a spawned chain through its channels, the way an
//! ingestion pipeline would use it.

use catalog_filter::{
    CatalogRecord, ChainStats, FilterChain, FilterChainHandle, FilterObserver, FilterRule,
    FilterRuleConfig, RecordField, RuleError, parse_rules,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Observer counting events by kind
#[derive(Default)]
struct CountingObserver {
    rejected: Mutex<Vec<usize>>,
    discarded: Mutex<Vec<(CatalogRecord, RecordField)>>,
}

impl FilterObserver for CountingObserver {
    fn rule_rejected(&self, index: usize, _error: &RuleError) {
        self.rejected.lock().unwrap().push(index);
    }

    fn record_discarded(&self, record: &CatalogRecord, field: RecordField, _rule: &FilterRule) {
        self.discarded.lock().unwrap().push((record.clone(), field));
    }
}

/// Push every record through a spawned chain and collect the output.
async fn run_chain(chain: FilterChain, records: Vec<CatalogRecord>) -> (Vec<CatalogRecord>, ChainStats) {
    let (out_tx, mut out_rx) = mpsc::channel(1);
    let FilterChainHandle { input, join } = chain.spawn(1, out_tx);

    let producer = tokio::spawn(async move {
        for record in records {
            input.send(record).await.unwrap();
        }
    });

    let mut output = Vec::new();
    while let Some(record) = out_rx.recv().await {
        output.push(record);
    }

    producer.await.unwrap();
    let stats = join.await.unwrap();
    (output, stats)
}

fn sample_records() -> Vec<CatalogRecord> {
    vec![
        CatalogRecord::new("collectd", "web1.example.net", "cpu.0.idle"),
        CatalogRecord::new("collectd", "web2.example.net", "memory.used"),
        CatalogRecord::new("test", "sandbox", "cpu.0.idle"),
        CatalogRecord::new("graphite", "db1", "disk.sda.reads"),
    ]
}

#[tokio::test]
async fn test_pass_through_preserves_order() {
    let records = sample_records();
    let (output, stats) = run_chain(FilterChain::default(), records.clone()).await;

    assert_eq!(output, records);
    assert_eq!(
        stats,
        ChainStats {
            received: 4,
            forwarded: 4,
            discarded: 0,
            rewritten: 0,
        }
    );
}

#[tokio::test]
async fn test_rejected_rules_degenerate_to_pass_through() {
    let observer = Arc::new(CountingObserver::default());
    let chain = FilterChain::with_observer(
        &[
            FilterRuleConfig::discard("hostname", "."),
            FilterRuleConfig::discard("any", "[a-"),
        ],
        observer.clone(),
    );

    let records = sample_records();
    let (output, _) = run_chain(chain, records.clone()).await;

    assert_eq!(output, records);
    assert_eq!(*observer.rejected.lock().unwrap(), vec![0, 1]);
}

#[tokio::test]
async fn test_normalization_pipeline() {
    let rules = parse_rules(
        r#"[
            {"target": "origin", "pattern": "^test$", "discard": true},
            {"target": "source", "pattern": "\\.example\\.net$", "rewrite": ""},
            {"target": "metric", "pattern": "^cpu\\.(\\d+)\\.(.+)", "rewrite": "cpu${1}_$2"},
            {"target": "source", "pattern": "^db", "rewrite": "database"}
        ]"#,
    )
    .unwrap();

    let observer = Arc::new(CountingObserver::default());
    let chain = FilterChain::with_observer(&rules, observer.clone());
    assert_eq!(chain.len(), 4);

    let (output, stats) = run_chain(chain, sample_records()).await;

    assert_eq!(
        output,
        vec![
            CatalogRecord::new("collectd", "web1", "cpu0_idle"),
            CatalogRecord::new("collectd", "web2", "memory.used"),
            CatalogRecord::new("graphite", "database1", "disk.sda.reads"),
        ]
    );
    assert_eq!(stats.received, 4);
    assert_eq!(stats.forwarded, 3);
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.rewritten, 3);

    let discarded = observer.discarded.lock().unwrap();
    assert_eq!(discarded.len(), 1);
    assert_eq!(discarded[0].0.origin, "test");
    assert_eq!(discarded[0].1, RecordField::Origin);
}

#[tokio::test]
async fn test_rewrite_then_discard() {
    let chain = FilterChain::new(&[
        FilterRuleConfig::rewrite("source", "^web", "www"),
        FilterRuleConfig::discard("source", "^www"),
    ]);

    let (output, stats) = run_chain(
        chain,
        vec![
            CatalogRecord::new("o", "web1", "m"),
            CatalogRecord::new("o", "db1", "m"),
        ],
    )
    .await;

    assert_eq!(output, vec![CatalogRecord::new("o", "db1", "m")]);
    assert_eq!(stats.discarded, 1);
}

#[tokio::test]
async fn test_discard_prevents_later_rewrite() {
    let observer = Arc::new(CountingObserver::default());
    let chain = FilterChain::with_observer(
        &[
            FilterRuleConfig::discard("metric", "^debug\\."),
            FilterRuleConfig::rewrite("origin", ".+", "rewritten"),
        ],
        observer.clone(),
    );

    let (output, _) = run_chain(
        chain,
        vec![
            CatalogRecord::new("collectd", "s", "debug.latency"),
            CatalogRecord::new("collectd", "s", "latency"),
        ],
    )
    .await;

    assert_eq!(output, vec![CatalogRecord::new("rewritten", "s", "latency")]);

    // Origin of the discarded record was never touched
    let discarded = observer.discarded.lock().unwrap();
    assert_eq!(discarded[0].0, CatalogRecord::new("collectd", "s", "debug.latency"));
    assert_eq!(discarded[0].1, RecordField::Metric);
}

#[tokio::test]
async fn test_many_records_keep_order() {
    let chain = FilterChain::new(&[FilterRuleConfig::rewrite("metric", "^m", "metric_")]);

    let records: Vec<CatalogRecord> = (0..200)
        .map(|i| CatalogRecord::new("o", format!("s{i}"), format!("m{i}")))
        .collect();

    let (output, stats) = run_chain(chain, records).await;

    assert_eq!(output.len(), 200);
    for (i, record) in output.iter().enumerate() {
        assert_eq!(record.source, format!("s{i}"));
        assert_eq!(record.metric, format!("metric_{i}"));
    }
    assert_eq!(stats.rewritten, 200);
}
