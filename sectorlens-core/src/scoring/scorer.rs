//! Cross-Sectional Scorer.
//!
//! Momentum: every entity is ranked ascending on ADX_Z, RS_Rating, RSI and
//! DI_Spread; score = Σ rank × weight / 100 (weights are not renormalized).
//!
//! Reversal: only eligible entities (status ≠ No) are ranked, ascending on
//! RS_Rating, RSI and ADX_Z and descending on CMF; score = Σ rank × weight /
//! total × 100. Ineligible entities keep their absolute score.
//!
//! Both passes are pure functions of the snapshot values, so scoring twice
//! gives bit-identical output.

use crate::analysis::{EntityResult, ReversalScore};
use crate::config::{AnalysisConfig, MomentumWeights, ReversalWeights};

use super::rank::{competition_rank, RankOrder};

/// Attach Momentum_Score to every entity.
pub fn score_momentum(results: &mut [EntityResult], weights: &MomentumWeights) {
    let column = |f: fn(&EntityResult) -> f64| -> Vec<usize> {
        let values: Vec<f64> = results.iter().map(f).collect();
        competition_rank(&values, RankOrder::Ascending)
    };

    let adx_z = column(|r| r.snapshot.adx_z.value);
    let rs = column(|r| r.snapshot.rs_rating.value);
    let rsi = column(|r| r.snapshot.rsi.value);
    let spread = column(|r| r.snapshot.di_spread.value);

    for (i, result) in results.iter_mut().enumerate() {
        let score = adx_z[i] as f64 * weights.adx_z / 100.0
            + rs[i] as f64 * weights.rs_rating / 100.0
            + rsi[i] as f64 * weights.rsi / 100.0
            + spread[i] as f64 * weights.di_spread / 100.0;
        result.momentum_score = Some(score);
    }
}

/// Replace the reversal score of eligible entities with their rank-based
/// score among the eligible pool. Returns the pool size.
pub fn score_reversal(results: &mut [EntityResult], weights: &ReversalWeights) -> usize {
    let eligible: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.reversal_status.is_eligible())
        .map(|(i, _)| i)
        .collect();

    let total = weights.total();
    if eligible.is_empty() || total <= 0.0 {
        return eligible.len();
    }

    let column = |f: fn(&EntityResult) -> f64, order: RankOrder| -> Vec<usize> {
        let values: Vec<f64> = eligible.iter().map(|&i| f(&results[i])).collect();
        competition_rank(&values, order)
    };

    let rs = column(|r| r.snapshot.rs_rating.value, RankOrder::Ascending);
    let cmf = column(|r| r.snapshot.cmf.value, RankOrder::Descending);
    let rsi = column(|r| r.snapshot.rsi.value, RankOrder::Ascending);
    let adx_z = column(|r| r.snapshot.adx_z.value, RankOrder::Ascending);

    for (k, &i) in eligible.iter().enumerate() {
        let score = rs[k] as f64 * weights.rs_rating / total * 100.0
            + cmf[k] as f64 * weights.cmf / total * 100.0
            + rsi[k] as f64 * weights.rsi / total * 100.0
            + adx_z[k] as f64 * weights.adx_z / total * 100.0;
        results[i].reversal_score = ReversalScore::Ranked(score);
    }

    eligible.len()
}

/// Run both scoring passes over a batch.
pub fn score_batch(results: &mut [EntityResult], config: &AnalysisConfig) {
    score_momentum(results, &config.momentum_weights);
    score_reversal(results, &config.reversal_weights);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{IndicatorSnapshot, ReversalStatus};
    use chrono::NaiveDate;

    fn row(id: &str, rsi: f64, adx_z: f64, cmf: f64, rs: f64, spread: f64) -> EntityResult {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        EntityResult::from_snapshot(
            id,
            100.0,
            0.0,
            as_of,
            IndicatorSnapshot::from_values(rsi, adx_z, cmf, rs, spread),
            &AnalysisConfig::default(),
        )
    }

    #[test]
    fn momentum_uses_literal_percentages() {
        let mut rows = vec![
            row("A", 60.0, 1.0, 0.0, 8.0, 5.0),
            row("B", 40.0, -1.0, 0.0, 2.0, -5.0),
        ];
        score_momentum(&mut rows, &MomentumWeights::default());
        // A ranks 2 everywhere: 2 * (20 + 40 + 30 + 10) / 100
        assert!((rows[0].momentum_score.unwrap() - 2.0).abs() < 1e-12);
        assert!((rows[1].momentum_score.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn momentum_weights_are_not_renormalized() {
        let mut rows = vec![row("A", 60.0, 1.0, 0.0, 8.0, 5.0)];
        let half = MomentumWeights {
            adx_z: 10.0,
            rs_rating: 20.0,
            rsi: 15.0,
            di_spread: 5.0,
        };
        score_momentum(&mut rows, &half);
        assert!((rows[0].momentum_score.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reversal_ranks_only_eligible() {
        let mut rows = vec![
            row("BUY", 25.0, -1.0, 0.15, 3.0, 0.0),
            row("WATCH", 45.0, 0.0, 0.05, 6.0, 0.0),
            row("NO", 70.0, 2.0, 0.2, 9.0, 0.0),
        ];
        let absolute_no = rows[2].reversal_score;

        let pool = score_reversal(&mut rows, &ReversalWeights::default());

        assert_eq!(pool, 2);
        assert!(rows[0].reversal_score.is_ranked());
        assert!(rows[1].reversal_score.is_ranked());
        assert_eq!(rows[2].reversal_score, absolute_no);
        assert_eq!(rows[2].reversal_status, ReversalStatus::No);

        // BUY: rs 1, cmf 1 (highest), rsi 1, adx_z 1 → 100
        // WATCH: rs 2, cmf 2, rsi 2, adx_z 2 → 200
        assert!((rows[0].reversal_score.value() - 100.0).abs() < 1e-9);
        assert!((rows[1].reversal_score.value() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn no_eligible_leaves_absolute_scores() {
        let mut rows = vec![row("NO", 70.0, 2.0, 0.2, 9.0, 0.0)];
        assert_eq!(score_reversal(&mut rows, &ReversalWeights::default()), 0);
        assert!(!rows[0].reversal_score.is_ranked());
    }

    #[test]
    fn score_batch_is_idempotent() {
        let mut rows = vec![
            row("A", 25.0, -1.0, 0.15, 3.0, 1.0),
            row("B", 45.0, 0.2, -0.05, 5.0, 2.0),
            row("C", 60.0, 1.5, 0.3, 8.0, -3.0),
        ];
        let config = AnalysisConfig::default();
        score_batch(&mut rows, &config);
        let first = rows.clone();
        score_batch(&mut rows, &config);
        assert_eq!(rows, first);
    }
}
