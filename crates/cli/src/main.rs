use anyhow::{Context, Result};
use catalog_filter::{
    CatalogRecord, ChainStats, DEFAULT_CHANNEL_CAPACITY, FilterChain, FilterChainHandle,
    FilterObserver, FilterRule, FilterRuleConfig, RecordField, RuleError, TracingObserver,
    load_rules,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// catalog-filter - rewrite or discard catalog records with pattern rules
#[derive(Parser)]
#[command(name = "catalog-filter")]
#[command(about = "Apply origin filter rules to a stream of catalog records", long_about = None)]
struct Cli {
    /// Path to the JSON rule file
    #[arg(short, long)]
    rules: PathBuf,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter JSON-lines records from a file or stdin to stdout
    Run {
        /// Input file (defaults to stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Inbound channel capacity
        #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
        capacity: usize,
    },

    /// Validate the rule file and list the active rules
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries records only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let rules = load_rules(&cli.rules)
        .with_context(|| format!("Failed to load rules from {}", cli.rules.display()))?;

    match cli.command {
        Commands::Run { input, capacity } => handle_run(&rules, input.as_deref(), capacity).await?,
        Commands::Check => handle_check(&rules),
    }

    Ok(())
}

/// Handle the 'run' command
async fn handle_run(rules: &[FilterRuleConfig], input: Option<&Path>, capacity: usize) -> Result<()> {
    anyhow::ensure!(capacity > 0, "--capacity must be at least 1");

    let start = Instant::now();
    let chain = FilterChain::new(rules);
    let stdout = tokio::io::stdout();

    let run = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            filter_stream(chain, BufReader::new(file), stdout, capacity).await?
        }
        None => filter_stream(chain, BufReader::new(tokio::io::stdin()), stdout, capacity).await?,
    };

    let StreamRun {
        stats,
        output: _stdout,
        read_result,
    } = run;
    print_stats(&stats, start);
    read_result
}

/// What a finished stream run produced
struct StreamRun<W> {
    stats: ChainStats,
    output: W,
    /// Input error that ended the run early, reported after the chain drained
    read_result: Result<()>,
}

/// Feed `reader` through a spawned chain into `writer`.
///
/// A read failure stops the input but not the run: the chain still drains
/// and forwards every record it was already given before the error is
/// handed back in `read_result`.
async fn filter_stream<R, W>(
    chain: FilterChain,
    reader: R,
    writer: W,
    capacity: usize,
) -> Result<StreamRun<W>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel(capacity);
    let FilterChainHandle { input, join } = chain.spawn(capacity, out_tx);
    let write_task = tokio::spawn(write_records(out_rx, writer));

    // Consumes `input`, closing the inbound channel when done
    let read_result = read_records(reader, input).await;

    let stats = join.await.context("Filter worker panicked")?;
    let output = write_task.await.context("Output writer panicked")??;

    Ok(StreamRun {
        stats,
        output,
        read_result,
    })
}

/// Parse JSON-lines records and push them into the chain.
///
/// Lines that are not valid UTF-8 or not valid records are logged and
/// skipped.
async fn read_records<R>(mut reader: R, input: mpsc::Sender<CatalogRecord>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(err) => {
                tracing::warn!("Skipping input line {}: {}", line_no, err);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let record: CatalogRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Skipping input line {}: {}", line_no, err);
                continue;
            }
        };

        if input.send(record).await.is_err() {
            tracing::warn!("Filter worker stopped before end of input");
            break;
        }
    }

    Ok(())
}

/// Write every forwarded record to `writer` as a JSON line.
async fn write_records<W>(mut output: mpsc::Receiver<CatalogRecord>, mut writer: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(record) = output.recv().await {
        let mut line = serde_json::to_string(&record).context("Failed to encode record")?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write output")?;
    }

    writer.flush().await.context("Failed to flush output")?;
    Ok(writer)
}

/// Observer that remembers rejections for the 'check' report and still
/// logs them.
#[derive(Default)]
struct CheckObserver {
    rejected: Mutex<Vec<(usize, String)>>,
}

impl FilterObserver for CheckObserver {
    fn rule_rejected(&self, index: usize, error: &RuleError) {
        TracingObserver.rule_rejected(index, error);
        if let Ok(mut rejected) = self.rejected.lock() {
            rejected.push((index, error.to_string()));
        }
    }

    fn record_discarded(&self, record: &CatalogRecord, field: RecordField, rule: &FilterRule) {
        TracingObserver.record_discarded(record, field, rule);
    }
}

/// Handle the 'check' command
fn handle_check(rules: &[FilterRuleConfig]) {
    let observer = Arc::new(CheckObserver::default());
    let chain = FilterChain::with_observer(rules, observer.clone());

    println!("{}", format!("{} rule(s) configured:", rules.len()).bold().blue());

    let rejected = observer
        .rejected
        .lock()
        .map(|rejected| rejected.clone())
        .unwrap_or_default();

    let mut active = chain.rules().iter();
    for (index, config) in rules.iter().enumerate() {
        if let Some((_, reason)) = rejected.iter().find(|(i, _)| *i == index) {
            println!("{}. {} {}", index + 1, "rejected".red(), reason);
            continue;
        }

        if let Some(rule) = active.next() {
            let action = if rule.is_discard() {
                "discard".yellow().to_string()
            } else {
                format!("rewrite to `{}'", rule.rewrite_template()).green().to_string()
            };
            println!(
                "{}. [{}] `{}' -> {}",
                index + 1,
                rule.target(),
                config.pattern,
                action
            );
        }
    }

    println!(
        "{} active, {} rejected",
        chain.len().to_string().green(),
        rejected.len().to_string().red()
    );
}

/// Helper function to print run statistics to stderr
fn print_stats(stats: &ChainStats, start: Instant) {
    eprintln!(
        "{} received {}, forwarded {}, discarded {}, rewritten {} in {:?}",
        "✓".green(),
        stats.received,
        stats.forwarded,
        stats.discarded,
        stats.rewritten,
        start.elapsed()
    );
}
