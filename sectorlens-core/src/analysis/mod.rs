//! Per-entity analysis: indicator snapshot, relative strength, reversal
//! classification, and the unscored result row.

pub mod entity;
pub mod relative_strength;
pub mod reversal;
pub mod snapshot;

pub use entity::{analyze_entity, AnalysisError, EntityResult, ReversalScore};
pub use relative_strength::{rating_from_relative_perf, relative_strength_rating, rs_rating_for};
pub use reversal::{absolute_reversal_score, classify, ReversalStatus, BUY_DIV_TIER, WATCH_TIER};
pub use snapshot::{IndicatorSnapshot, Reading};
