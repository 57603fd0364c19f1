//! The two harvest passes and the loop that drives them.
//!
//! Pass A sweeps search keywords into the listing store; pass B hydrates each
//! stored listing into a course record. Items run with bounded concurrency, and
//! a failure on one item is logged and counted without stopping the pass. Only
//! persistence failures abort.

pub mod details;
pub mod listings;
pub mod summary;

pub use details::DetailHarvest;
pub use listings::ListingHarvest;
pub use summary::{ItemOutcome, RunSummary};

use crate::catalog::errors::HarvestError;
use futures::{StreamExt, stream};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Listings,
    Details,
}

impl Pass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Listings => "listings",
            Self::Details => "details",
        }
    }

    pub fn all() -> Vec<Pass> {
        vec![Pass::Listings, Pass::Details]
    }
}

/// Bounds shared by both passes.
#[derive(Debug, Clone)]
pub struct RunLimits {
    pub concurrency: usize,
    /// Wall-clock limit for one pass.
    pub budget: Option<Duration>,
    pub shutdown: CancellationToken,
}

impl RunLimits {
    pub fn new(concurrency: usize, budget: Option<Duration>, shutdown: CancellationToken) -> Self {
        Self {
            concurrency: concurrency.max(1),
            budget,
            shutdown,
        }
    }

    /// Resolves when the pass should stop taking new items.
    fn stopped(&self) -> impl Future<Output = ()> + 'static {
        let shutdown = self.shutdown.clone();
        let budget = self.budget;
        async move {
            match budget {
                Some(budget) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = tokio::time::sleep(budget) => {
                            warn!(budget = ?budget, "Run budget exhausted, stopping pass");
                        }
                    }
                }
                None => shutdown.cancelled().await,
            }
        }
    }
}

/// Run `process` over `items`, folding outcomes into a summary.
///
/// In-flight items are dropped when the pass is stopped; whatever they had
/// already persisted stays persisted.
async fn drive<I, F, Fut>(
    pass: Pass,
    items: I,
    limits: &RunLimits,
    process: F,
) -> Result<RunSummary, HarvestError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<ItemOutcome, HarvestError>>,
{
    info!(pass = pass.as_str(), concurrency = limits.concurrency, "Pass started");
    let mut summary = RunSummary::new(pass);

    let mut results = pin!(
        Box::pin(stream::iter(items).map(process))
            .buffer_unordered(limits.concurrency)
            .take_until(Box::pin(limits.stopped()))
    );

    while let Some(result) = results.next().await {
        match result {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                summary.finish(true);
                summary.log();
                return Err(e);
            }
        }
    }

    // The stop future only yields a result if it fired; exhausting the items drops it unresolved
    let interrupted = results.as_mut().take_result().is_some();
    summary.finish(interrupted);
    summary.log();
    Ok(summary)
}

/// Turn a per-item error into a recorded failure, unless it must abort the pass.
fn isolate(
    key: String,
    result: Result<ItemOutcome, HarvestError>,
) -> Result<ItemOutcome, HarvestError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let reason = format!("{:#}", anyhow::Error::from(e));
            warn!(key = %key, error = %reason, "Item failed, continuing");
            Ok(ItemOutcome::Failed { key, reason })
        }
    }
}
