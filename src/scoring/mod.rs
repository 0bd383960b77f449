pub mod band;
pub mod engine;

pub use band::{ParseBandError, ScoreBand};
pub use engine::{calculate_score, ScoreResult, MAX_POINTS};
