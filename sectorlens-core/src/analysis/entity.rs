//! Entity Analyzer: one PriceSeries + benchmark → one unscored EntityResult.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::relative_strength::{rs_rating_for, NEUTRAL_RS_RATING};
use super::reversal::{absolute_reversal_score, classify, ReversalStatus};
use super::snapshot::{IndicatorSnapshot, Reading};
use crate::config::AnalysisConfig;
use crate::domain::{PriceSeries, SeriesError};
use crate::indicators::mansfield::NEUTRAL_MANSFIELD;
use crate::indicators::rsi::NEUTRAL_RSI;
use crate::indicators::{mansfield_rs, z_score, Adx, AdxLine, Cmf, Indicator, IndicatorError, Rsi};

/// Why one entity could not be analyzed. The entity is dropped from the
/// batch; the rest carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

/// Which reversal score an entity carries.
///
/// Every entity starts with the absolute score. Eligible entities have it
/// replaced by their rank-based score once the batch is scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ReversalScore {
    Absolute(f64),
    Ranked(f64),
}

impl ReversalScore {
    pub fn value(self) -> f64 {
        match self {
            ReversalScore::Absolute(v) | ReversalScore::Ranked(v) => v,
        }
    }

    pub fn is_ranked(self) -> bool {
        matches!(self, ReversalScore::Ranked(_))
    }
}

/// One row of the cross-sectional table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub entity_id: String,
    pub latest_price: f64,
    pub pct_change: f64,
    pub as_of: NaiveDateTime,
    pub snapshot: IndicatorSnapshot,
    /// `None` until the entity has been ranked against its batch.
    pub momentum_score: Option<f64>,
    pub reversal_score: ReversalScore,
    pub reversal_status: ReversalStatus,
}

impl EntityResult {
    /// Build a result from a ready snapshot, deriving the reversal fields.
    pub fn from_snapshot(
        entity_id: impl Into<String>,
        latest_price: f64,
        pct_change: f64,
        as_of: NaiveDateTime,
        snapshot: IndicatorSnapshot,
        config: &AnalysisConfig,
    ) -> Self {
        let (rsi, adx_z, cmf) = (snapshot.rsi.value, snapshot.adx_z.value, snapshot.cmf.value);
        let absolute = absolute_reversal_score(
            rsi,
            adx_z,
            cmf,
            snapshot.rs_rating.value,
            &config.reversal_weights,
        );
        let status = classify(rsi, adx_z, cmf, config.reversal_thresholds.as_ref());

        Self {
            entity_id: entity_id.into(),
            latest_price,
            pct_change,
            as_of,
            snapshot,
            momentum_score: None,
            reversal_score: ReversalScore::Absolute(absolute),
            reversal_status: status,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.momentum_score.is_some()
    }
}

/// Analyze one entity against the benchmark.
///
/// Short history never fails here: each indicator that cannot be evaluated
/// falls back to its neutral default with `computed == false`. Only a
/// structurally unusable series (empty, non-finite prices) is an error.
pub fn analyze_entity(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<EntityResult, AnalysisError> {
    series.validate_finite()?;
    let bars = series.bars();
    let last = series.last().ok_or(SeriesError::Empty)?;
    let id = series.entity_id();

    let rsi = Reading::or_neutral(
        log_fallback(id, Rsi::new(config.periods.rsi).latest(bars)),
        NEUTRAL_RSI,
    );

    let adx_lines = Adx::new(config.periods.adx).components(bars);
    let adx = Reading::or_neutral(log_fallback(id, adx_lines.latest(AdxLine::Adx)), 0.0);
    let plus_di = Reading::or_neutral(adx_lines.latest(AdxLine::PlusDi), 0.0);
    let minus_di = Reading::or_neutral(adx_lines.latest(AdxLine::MinusDi), 0.0);
    let di_spread = Reading::or_neutral(adx_lines.latest(AdxLine::DiSpread), 0.0);
    let adx_z = if adx.computed {
        Reading::computed(z_score(&adx_lines.adx))
    } else {
        Reading::neutral(0.0)
    };

    let cmf = Reading::or_neutral(
        log_fallback(id, Cmf::new(config.periods.cmf).latest(bars)),
        0.0,
    );

    let mansfield = Reading::or_neutral(
        log_fallback(id, mansfield_rs(series, benchmark, config.mansfield_period())),
        NEUTRAL_MANSFIELD,
    );

    let rs_rating = match rs_rating_for(series, benchmark) {
        Some(v) => Reading::computed(v),
        None => {
            debug!(entity = id, "RS_Rating defaulted to neutral: too few shared returns");
            Reading::neutral(NEUTRAL_RS_RATING)
        }
    };

    let snapshot = IndicatorSnapshot {
        rsi,
        adx,
        plus_di,
        minus_di,
        di_spread,
        adx_z,
        cmf,
        mansfield_rs: mansfield,
        rs_rating,
    };

    Ok(EntityResult::from_snapshot(
        id,
        last.close,
        series.pct_change(),
        last.timestamp,
        snapshot,
        config,
    ))
}

fn log_fallback(entity: &str, result: Result<f64, IndicatorError>) -> Result<f64, IndicatorError> {
    if let Err(e) = &result {
        debug!(entity, error = %e, "indicator defaulted to neutral");
    }
    result
}
