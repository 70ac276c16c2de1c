//! Trend/Backtest Replayer.
//!
//! Rebuilds the full cross-section at each historical cut-off and rescores it
//! from scratch. Every series is truncated by timestamp (bars at or before
//! the cut-off), so the benchmark and all peers see the same point in time.
//! Each call recomputes everything; nothing is carried between calls.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analysis::{IndicatorSnapshot, ReversalScore, ReversalStatus};
use crate::batch::{analyze_batch, RankTable};
use crate::config::AnalysisConfig;
use crate::domain::PriceSeries;
use crate::scoring::{competition_rank, RankOrder};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("entity '{0}' is not in the universe")]
    UnknownEntity(String),

    #[error("entity '{entity}' has {bars} bars, need at least {required}")]
    TooShort {
        entity: String,
        bars: usize,
        required: usize,
    },
}

/// One point of a momentum trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumTrendPoint {
    pub label: String,
    pub timestamp: NaiveDateTime,
    pub snapshot: IndicatorSnapshot,
    pub momentum_score: f64,
    /// 1 = strongest momentum among the peers at this point.
    pub momentum_rank: usize,
    pub peers: usize,
}

/// One point of a reversal trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalTrendPoint {
    pub label: String,
    pub timestamp: NaiveDateTime,
    pub snapshot: IndicatorSnapshot,
    pub reversal_status: ReversalStatus,
    pub reversal_score: ReversalScore,
    /// Rank among eligible peers (1 = best); `None` when not eligible.
    pub reversal_rank: Option<usize>,
    pub eligible_peers: usize,
}

/// Forward return over `horizon` bars; `None` when that bar does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardReturn {
    pub horizon: usize,
    pub pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumPick {
    pub rank: usize,
    pub entity_id: String,
    pub momentum_score: f64,
    pub price: f64,
    pub forward_returns: Vec<ForwardReturn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub date: NaiveDateTime,
    pub picks: Vec<MomentumPick>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalPick {
    pub rank: usize,
    pub entity_id: String,
    pub reversal_score: f64,
    pub status: ReversalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalRow {
    pub date: NaiveDateTime,
    pub picks: Vec<ReversalPick>,
}

/// Periods below this many points produce no historical report.
pub const MIN_PERFORMANCE_POINTS: usize = 10;

/// Score the universe as it stood at `cutoff`.
///
/// Entities with fewer than `min_bars` bars at the cut-off sit the point out.
/// Returns `None` when no peer survives.
pub fn table_at(
    universe: &[PriceSeries],
    benchmark: &PriceSeries,
    cutoff: NaiveDateTime,
    min_bars: usize,
    config: &AnalysisConfig,
) -> Option<RankTable> {
    let bench = benchmark.truncate_at(cutoff);
    if bench.is_empty() {
        return None;
    }
    let peers: Vec<PriceSeries> = universe
        .iter()
        .map(|s| s.truncate_at(cutoff))
        .filter(|s| s.len() >= min_bars)
        .collect();

    match analyze_batch(&peers, &bench, config) {
        Ok(table) => Some(table),
        Err(e) => {
            debug!(cutoff = %cutoff, error = %e, "replay point skipped");
            None
        }
    }
}

/// Labels and cut-offs for the last `periods` bars of `target`, oldest first.
fn trend_cutoffs(target: &PriceSeries, periods: usize) -> Vec<(String, NaiveDateTime)> {
    let bars = target.bars();
    let start = bars.len().saturating_sub(periods);
    bars[start..]
        .iter()
        .enumerate()
        .map(|(pos, bar)| {
            let back = bars.len() - start - pos - 1;
            let date = bar.timestamp.format("%d-%b");
            let label = if back == 0 {
                format!("T ({date})")
            } else {
                format!("T-{back} ({date})")
            };
            (label, bar.timestamp)
        })
        .collect()
}

fn find_target<'a>(
    target: &str,
    universe: &'a [PriceSeries],
    periods: usize,
) -> Result<&'a PriceSeries, ReplayError> {
    let series = universe
        .iter()
        .find(|s| s.entity_id() == target)
        .ok_or_else(|| ReplayError::UnknownEntity(target.to_string()))?;
    if series.len() < periods {
        return Err(ReplayError::TooShort {
            entity: target.to_string(),
            bars: series.len(),
            required: periods,
        });
    }
    Ok(series)
}

/// Momentum_Score and rank of `target` at each of its last `periods` bars.
pub fn momentum_trend(
    target: &str,
    universe: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
    periods: usize,
) -> Result<Vec<MomentumTrendPoint>, ReplayError> {
    let series = find_target(target, universe, periods)?;
    let mut points = Vec::with_capacity(periods);

    for (label, cutoff) in trend_cutoffs(series, periods) {
        let Some(table) = table_at(universe, benchmark, cutoff, config.replay.min_history, config)
        else {
            continue;
        };
        let scores: Vec<f64> = table
            .entries()
            .iter()
            .map(|e| e.momentum_score.unwrap_or(0.0))
            .collect();
        let ranks = competition_rank(&scores, RankOrder::Descending);

        let Some(pos) = table.entries().iter().position(|e| e.entity_id == target) else {
            continue;
        };
        let entry = &table.entries()[pos];
        points.push(MomentumTrendPoint {
            label,
            timestamp: cutoff,
            snapshot: entry.snapshot.clone(),
            momentum_score: scores[pos],
            momentum_rank: ranks[pos],
            peers: table.len(),
        });
    }

    Ok(points)
}

/// Reversal status, score and eligible-pool rank of `target` over its last
/// `periods` bars.
pub fn reversal_trend(
    target: &str,
    universe: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
    periods: usize,
) -> Result<Vec<ReversalTrendPoint>, ReplayError> {
    let series = find_target(target, universe, periods)?;
    let mut points = Vec::with_capacity(periods);

    for (label, cutoff) in trend_cutoffs(series, periods) {
        let Some(table) = table_at(universe, benchmark, cutoff, config.replay.min_history, config)
        else {
            continue;
        };
        let Some(entry) = table.get(target) else {
            continue;
        };

        let candidates = table.reversal_candidates();
        let scores: Vec<f64> = candidates.iter().map(|e| e.reversal_score.value()).collect();
        let ranks = competition_rank(&scores, RankOrder::Descending);
        let reversal_rank = candidates
            .iter()
            .position(|e| e.entity_id == target)
            .map(|i| ranks[i]);

        points.push(ReversalTrendPoint {
            label,
            timestamp: cutoff,
            snapshot: entry.snapshot.clone(),
            reversal_status: entry.reversal_status,
            reversal_score: entry.reversal_score,
            reversal_rank,
            eligible_peers: candidates.len(),
        });
    }

    Ok(points)
}

/// Benchmark timestamps used as historical cut-offs, oldest first.
fn performance_cutoffs(benchmark: &PriceSeries, config: &AnalysisConfig) -> Vec<NaiveDateTime> {
    let lookback = config.interval.performance_lookback(benchmark.len());
    if lookback < MIN_PERFORMANCE_POINTS {
        return Vec::new();
    }
    let bars = benchmark.bars();
    bars[bars.len() - lookback..]
        .iter()
        .map(|b| b.timestamp)
        .collect()
}

fn forward_return(series: &PriceSeries, cutoff: NaiveDateTime, horizon: usize) -> Option<f64> {
    let idx = series.index_at(cutoff)?;
    let bars = series.bars();
    let now = bars[idx].close;
    let future = bars.get(idx + horizon)?.close;
    if now == 0.0 {
        return None;
    }
    Some((future - now) / now * 100.0)
}

/// Top momentum entities at each historical cut-off, with the forward
/// returns they went on to deliver.
pub fn historical_performance(
    universe: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
) -> Vec<PerformanceRow> {
    let top_n = config.replay.top_n.max(1);
    let mut rows = Vec::new();

    for cutoff in performance_cutoffs(benchmark, config) {
        let Some(table) = table_at(
            universe,
            benchmark,
            cutoff,
            config.replay.performance_min_history,
            config,
        ) else {
            continue;
        };
        let ranked = table.sorted_by_momentum();
        if ranked.len() < top_n {
            continue;
        }

        let picks = ranked
            .into_iter()
            .take(top_n)
            .enumerate()
            .filter_map(|(i, entry)| {
                let series = universe.iter().find(|s| s.entity_id() == entry.entity_id)?;
                let forward_returns = config
                    .replay
                    .forward_horizons
                    .iter()
                    .map(|&horizon| ForwardReturn {
                        horizon,
                        pct: forward_return(series, cutoff, horizon),
                    })
                    .collect();
                Some(MomentumPick {
                    rank: i + 1,
                    entity_id: entry.entity_id.clone(),
                    momentum_score: entry.momentum_score.unwrap_or(0.0),
                    price: entry.latest_price,
                    forward_returns,
                })
            })
            .collect();

        rows.push(PerformanceRow {
            date: cutoff,
            picks,
        });
    }

    rows
}

/// Top rank-based reversal candidates at each historical cut-off.
pub fn historical_reversals(
    universe: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
) -> Vec<ReversalRow> {
    let top_n = config.replay.top_n.max(1);
    let mut rows = Vec::new();

    for cutoff in performance_cutoffs(benchmark, config) {
        let Some(table) = table_at(
            universe,
            benchmark,
            cutoff,
            config.replay.performance_min_history,
            config,
        ) else {
            continue;
        };

        let picks: Vec<ReversalPick> = table
            .reversal_candidates()
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(i, e)| ReversalPick {
                rank: i + 1,
                entity_id: e.entity_id.clone(),
                reversal_score: e.reversal_score.value(),
                status: e.reversal_status,
            })
            .collect();

        if !picks.is_empty() {
            rows.push(ReversalRow {
                date: cutoff,
                picks,
            });
        }
    }

    rows
}
