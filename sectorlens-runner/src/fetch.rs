//! Bounded parallel fetching with a straggler timeout.
//!
//! Jobs run on a dedicated rayon pool and report back over a channel. The
//! collector waits until every job has answered or the deadline passes;
//! jobs still outstanding at that point are reported as `TimedOut` and their
//! late results are discarded.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sectorlens_core::domain::PriceSeries;

use crate::provider::{FetchError, FetchRequest, PriceProvider};

/// One universe member to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchJob {
    /// Display name; the fetched series is renamed to this.
    pub name: String,
    pub symbol: String,
    /// Tried when the primary symbol fails.
    pub alternate: Option<String>,
}

impl FetchJob {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            alternate: None,
        }
    }

    pub fn with_alternate(mut self, alternate: impl Into<String>) -> Self {
        self.alternate = Some(alternate.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub name: String,
    /// Symbol that produced the result (the alternate if the primary failed).
    pub symbol_used: String,
    pub result: Result<PriceSeries, FetchError>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fetch one job, falling back to its alternate symbol.
pub fn fetch_with_fallback(
    provider: &dyn PriceProvider,
    job: &FetchJob,
    request: &FetchRequest,
) -> FetchOutcome {
    let primary = provider.fetch(&job.symbol, request);
    let (symbol_used, result) = match (primary, &job.alternate) {
        (Ok(series), _) => (job.symbol.clone(), Ok(series)),
        (Err(err), Some(alternate)) => {
            warn!(name = %job.name, symbol = %job.symbol, %alternate, error = %err, "primary fetch failed, trying alternate");
            match provider.fetch(alternate, request) {
                Ok(series) => (alternate.clone(), Ok(series)),
                // Report the primary symbol's error.
                Err(_) => (job.symbol.clone(), Err(err)),
            }
        }
        (Err(err), None) => (job.symbol.clone(), Err(err)),
    };

    FetchOutcome {
        name: job.name.clone(),
        symbol_used,
        result: result.map(|series| series.with_entity_id(job.name.clone())),
    }
}

/// Fetch every job on a pool of `workers` threads.
///
/// Outcomes are returned in job order. Individual failures never abort the
/// batch; only a pool that cannot be built is an error.
pub fn fetch_all(
    provider: Arc<dyn PriceProvider>,
    jobs: &[FetchJob],
    request: &FetchRequest,
    workers: usize,
    timeout: Duration,
) -> Result<Vec<FetchOutcome>, FetchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("sectorlens-fetch-{i}"))
        .build()
        .map_err(|e| FetchError::Pool(e.to_string()))?;

    let (tx, rx) = mpsc::channel::<(usize, FetchOutcome)>();
    for (index, job) in jobs.iter().enumerate() {
        let tx = tx.clone();
        let provider = Arc::clone(&provider);
        let job = job.clone();
        let request = request.clone();
        pool.spawn(move || {
            let outcome = fetch_with_fallback(provider.as_ref(), &job, &request);
            // The collector may already have given up on us.
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    let mut slots: Vec<Option<FetchOutcome>> = vec![None; jobs.len()];
    let mut pending = jobs.len();
    let deadline = Instant::now() + timeout;

    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((index, outcome)) => {
                if let Err(err) = &outcome.result {
                    warn!(name = %outcome.name, symbol = %outcome.symbol_used, error = %err, "fetch failed");
                } else {
                    debug!(name = %outcome.name, symbol = %outcome.symbol_used, "fetched");
                }
                slots[index] = Some(outcome);
                pending -= 1;
            }
            Err(mpsc::RecvTimeoutError::Timeout | mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let outcomes = jobs
        .iter()
        .zip(slots)
        .map(|(job, slot)| {
            slot.unwrap_or_else(|| {
                warn!(name = %job.name, symbol = %job.symbol, "fetch timed out");
                FetchOutcome {
                    name: job.name.clone(),
                    symbol_used: job.symbol.clone(),
                    result: Err(FetchError::TimedOut {
                        symbol: job.symbol.clone(),
                        secs: timeout.as_secs(),
                    }),
                }
            })
        })
        .collect();
    Ok(outcomes)
}
