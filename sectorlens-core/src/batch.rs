//! Batch driver: analyze every entity, then score the survivors together.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::{analyze_entity, AnalysisError, EntityResult, ReversalStatus};
use crate::config::AnalysisConfig;
use crate::domain::PriceSeries;
use crate::scoring::score_batch;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("no entity produced a valid result ({failed} failed)")]
    EmptyBatch { failed: usize },

    #[error("benchmark series is missing or unusable: {0}")]
    MissingBenchmark(AnalysisError),
}

/// An entity left out of the table, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFailure {
    pub entity_id: String,
    pub reason: String,
}

/// Aggregate view of one RankTable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub entities: usize,
    pub failed: usize,
    pub mean_momentum: f64,
    pub max_momentum: f64,
    /// Sum of CMF across entities; positive means net inflow.
    pub net_money_flow: f64,
    pub buy_div: usize,
    pub watch: usize,
}

/// The scored cross-section for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    entries: Vec<EntityResult>,
    benchmark: EntityResult,
    market_date: String,
    failures: Vec<EntityFailure>,
    leader_percentile: f64,
}

impl RankTable {
    /// Scored entities in the order they were supplied.
    pub fn entries(&self) -> &[EntityResult] {
        &self.entries
    }

    /// Benchmark row, analyzed like the others but never ranked.
    pub fn benchmark(&self) -> &EntityResult {
        &self.benchmark
    }

    pub fn market_date(&self) -> &str {
        &self.market_date
    }

    pub fn failures(&self) -> &[EntityFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityResult> {
        self.entries.iter().find(|e| e.entity_id == entity_id)
    }

    /// Record failures that happened before analysis (e.g. fetch errors).
    pub fn extend_failures(&mut self, failures: impl IntoIterator<Item = EntityFailure>) {
        self.failures.extend(failures);
    }

    /// Entities by Momentum_Score, highest first. Ties keep input order.
    pub fn sorted_by_momentum(&self) -> Vec<&EntityResult> {
        let mut sorted: Vec<&EntityResult> = self.entries.iter().collect();
        sorted.sort_by(|a, b| momentum(b).total_cmp(&momentum(a)));
        sorted
    }

    /// Eligible reversal candidates, best reversal score first.
    pub fn reversal_candidates(&self) -> Vec<&EntityResult> {
        let mut candidates: Vec<&EntityResult> = self
            .entries
            .iter()
            .filter(|e| e.reversal_status.is_eligible())
            .collect();
        candidates.sort_by(|a, b| {
            b.reversal_score
                .value()
                .total_cmp(&a.reversal_score.value())
        });
        candidates
    }

    /// Entities at or above the configured Momentum_Score percentile.
    pub fn momentum_leaders(&self) -> Vec<&EntityResult> {
        let scores: Vec<f64> = self.entries.iter().map(momentum).collect();
        let Some(cutoff) = percentile(&scores, self.leader_percentile) else {
            return Vec::new();
        };
        self.sorted_by_momentum()
            .into_iter()
            .filter(|e| momentum(e) >= cutoff)
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let scores: Vec<f64> = self.entries.iter().map(momentum).collect();
        let n = scores.len();
        let count = |status: ReversalStatus| {
            self.entries
                .iter()
                .filter(|e| e.reversal_status == status)
                .count()
        };

        BatchSummary {
            entities: n,
            failed: self.failures.len(),
            mean_momentum: if n == 0 {
                0.0
            } else {
                scores.iter().sum::<f64>() / n as f64
            },
            max_momentum: scores.iter().copied().fold(0.0, f64::max),
            net_money_flow: self.entries.iter().map(|e| e.snapshot.cmf.value).sum(),
            buy_div: count(ReversalStatus::BuyDiv),
            watch: count(ReversalStatus::Watch),
        }
    }
}

fn momentum(e: &EntityResult) -> f64 {
    e.momentum_score.unwrap_or(0.0)
}

/// Linear-interpolated percentile (0..=100) of `values`.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Analyze and score one cross-section.
///
/// Entities sharing the benchmark's id are skipped. Only the first series
/// per entity id is analyzed; repeats are recorded as failures. Per-entity
/// failures are logged and collected; only a bad benchmark or an empty
/// result set is an error.
pub fn analyze_batch(
    entities: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<RankTable, BatchError> {
    let benchmark_row =
        analyze_entity(benchmark, benchmark, config).map_err(BatchError::MissingBenchmark)?;

    let mut entries = Vec::with_capacity(entities.len());
    let mut failures = Vec::new();
    let mut seen: HashSet<&str> = HashSet::with_capacity(entities.len());

    for series in entities {
        if series.entity_id() == benchmark.entity_id() {
            continue;
        }
        if !seen.insert(series.entity_id()) {
            warn!(entity = series.entity_id(), "duplicate entity id excluded from batch");
            failures.push(EntityFailure {
                entity_id: series.entity_id().to_string(),
                reason: "duplicate entity id".to_string(),
            });
            continue;
        }
        match analyze_entity(series, benchmark, config) {
            Ok(result) => entries.push(result),
            Err(e) => {
                warn!(entity = series.entity_id(), error = %e, "entity excluded from batch");
                failures.push(EntityFailure {
                    entity_id: series.entity_id().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if entries.is_empty() {
        return Err(BatchError::EmptyBatch {
            failed: failures.len(),
        });
    }

    score_batch(&mut entries, config);

    let market_date = config.interval.market_date_label(benchmark_row.as_of);
    info!(
        entities = entries.len(),
        failed = failures.len(),
        market_date = %market_date,
        "batch scored"
    );

    Ok(RankTable {
        entries,
        benchmark: benchmark_row,
        market_date,
        failures,
        leader_percentile: config.leader_percentile,
    })
}
