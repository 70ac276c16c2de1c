//! End-to-end run: fetch the benchmark and universe, then rank them.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use sectorlens_core::batch::{analyze_batch, BatchError, EntityFailure, RankTable};
use sectorlens_core::config::{AnalysisConfig, ConfigError};
use sectorlens_core::domain::PriceSeries;

use crate::fetch::{fetch_all, fetch_with_fallback};
use crate::provider::{FetchError, PriceProvider};
use crate::settings::RunSettings;
use crate::universe::Universe;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("benchmark fetch failed: {0}")]
    Benchmark(FetchError),

    #[error("fetch pool failed: {0}")]
    Pool(FetchError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a run produced, kept so trend and history reports can replay
/// the same data without refetching.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub table: RankTable,
    pub universe: Universe,
    /// Successfully fetched members, named by member name.
    pub series: Vec<PriceSeries>,
    pub benchmark: PriceSeries,
    pub config: AnalysisConfig,
}

impl AnalysisRun {
    pub fn series_for(&self, name: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.entity_id() == name)
    }
}

/// Fetch and rank the configured universe.
///
/// A benchmark that cannot be fetched aborts the run. Member fetch failures
/// are recorded on the table next to analysis failures.
pub fn run_analysis(
    settings: &RunSettings,
    provider: Arc<dyn PriceProvider>,
) -> Result<AnalysisRun, PipelineError> {
    settings.validate()?;
    let config = settings.analysis_config();
    let universe = settings.resolve_universe()?;
    let request = settings.fetch_request();

    info!(
        provider = provider.name(),
        members = universe.members.len(),
        interval = %request.interval,
        end = %request.end,
        "fetching universe"
    );

    let benchmark = fetch_with_fallback(provider.as_ref(), &universe.benchmark.job(), &request)
        .result
        .map_err(PipelineError::Benchmark)?;

    let outcomes = fetch_all(
        Arc::clone(&provider),
        &universe.jobs(),
        &request,
        settings.fetch_workers,
        settings.fetch_timeout(),
    )
    .map_err(PipelineError::Pool)?;

    let mut series = Vec::with_capacity(outcomes.len());
    let mut fetch_failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(s) => series.push(s),
            Err(e) => fetch_failures.push(EntityFailure {
                entity_id: outcome.name,
                reason: e.to_string(),
            }),
        }
    }

    if series.is_empty() {
        return Err(BatchError::EmptyBatch {
            failed: fetch_failures.len(),
        }
        .into());
    }

    let mut table = analyze_batch(&series, &benchmark, &config)?;
    table.extend_failures(fetch_failures);

    Ok(AnalysisRun {
        table,
        universe,
        series,
        benchmark,
        config,
    })
}
