//! SectorLens Core: indicators, per-entity analysis, cross-sectional scoring.
//!
//! This crate is pure computation over in-memory price series:
//! - Domain types (bars, validated price series, intervals, timestamp alignment)
//! - Indicator library (RSI, ADX/DI, CMF, Z-score, Mansfield RS)
//! - Entity analyzer with neutral defaults and computability flags
//! - Cross-sectional scorer (Momentum_Score, rank-based Reversal_Score)
//! - RankTable batch driver
//! - Trend/backtest replayer
//!
//! No I/O and no threads; fetching and caching live in `sectorlens-runner`.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod domain;
pub mod indicators;
pub mod replay;
pub mod scoring;

pub use analysis::{analyze_entity, AnalysisError, EntityResult, IndicatorSnapshot, Reading, ReversalScore, ReversalStatus};
pub use batch::{analyze_batch, BatchError, BatchSummary, EntityFailure, RankTable};
pub use config::{AnalysisConfig, ConfigError, MomentumWeights, ReversalThresholds, ReversalWeights};
pub use domain::{Bar, HistoryPeriod, Interval, PriceSeries, SeriesError};
pub use indicators::IndicatorError;
pub use replay::{
    historical_performance, historical_reversals, momentum_trend, reversal_trend,
    MomentumTrendPoint, PerformanceRow, ReplayError, ReversalRow, ReversalTrendPoint,
};

/// Minimum bars a fetched series needs before it is worth analyzing.
pub const MIN_DATA_POINTS: usize = 50;
