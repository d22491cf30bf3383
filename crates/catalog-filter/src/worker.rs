//! Running a FilterChain as an independent stage.
//!
//! ```text
//! [producers] ──→ mpsc::Sender ──→ [FilterChain worker] ──→ mpsc::Sender ──→ [consumer]
//! ```
//!
//! Both handoffs are bounded `tokio::sync::mpsc` channels, so a slow
//! consumer stalls the worker and a stalled worker stalls producers.
//! Capacity 1 is the closest tokio gets to an unbuffered rendezvous.

use crate::chain::{ChainStats, FilterChain, Outcome};
use crate::record::CatalogRecord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default inbound channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// A spawned filter worker.
///
/// Dropping every clone of `input` closes the inbound channel; the worker
/// then drains what is queued and exits, yielding its statistics.
pub struct FilterChainHandle {
    pub input: mpsc::Sender<CatalogRecord>,
    pub join: JoinHandle<ChainStats>,
}

impl FilterChain {
    /// Pull records from `inbound` until it is closed, pushing every
    /// surviving record to `outbound`.
    ///
    /// Each record is fully evaluated before the next one is pulled. The
    /// loop also ends early if the outbound receiver has been dropped; the
    /// record in hand at that point is lost.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<CatalogRecord>,
        outbound: mpsc::Sender<CatalogRecord>,
    ) -> ChainStats {
        let mut stats = ChainStats::default();
        tracing::debug!("Filter chain started with {} rule(s)", self.len());

        while let Some(record) = inbound.recv().await {
            stats.received += 1;

            match self.evaluate_counted(record) {
                (Outcome::Forward(record), fields_rewritten) => {
                    if outbound.send(record).await.is_err() {
                        tracing::warn!("Filter chain output closed, stopping");
                        break;
                    }
                    stats.forwarded += 1;
                    if fields_rewritten > 0 {
                        stats.rewritten += 1;
                    }
                }
                (Outcome::Discard, _) => stats.discarded += 1,
            }
        }

        tracing::debug!(
            "Filter chain stopped (received: {}, forwarded: {}, discarded: {}, rewritten: {})",
            stats.received,
            stats.forwarded,
            stats.discarded,
            stats.rewritten
        );
        stats
    }

    /// Create the inbound channel and spawn the worker on the current
    /// tokio runtime.
    ///
    /// # Arguments
    /// * `capacity` - Inbound channel capacity (must be > 0)
    /// * `outbound` - Where surviving records are sent
    pub fn spawn(self, capacity: usize, outbound: mpsc::Sender<CatalogRecord>) -> FilterChainHandle {
        let (input, inbound) = mpsc::channel(capacity);
        let join = tokio::spawn(self.run(inbound, outbound));
        FilterChainHandle { input, join }
    }
}
