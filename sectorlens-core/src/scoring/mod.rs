//! Cross-sectional ranking and composite scores.

pub mod rank;
pub mod scorer;

pub use rank::{competition_rank, RankOrder};
pub use scorer::{score_batch, score_momentum, score_reversal};
