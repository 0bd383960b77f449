use serde::{Deserialize, Serialize};

use super::band::ScoreBand;
use crate::quiz::Answers;

/// Highest possible point total: nine scored questions worth at most 3 each
pub const MAX_POINTS: u32 = 27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub base_score: u8,
    pub score_band: ScoreBand,
    pub total_points: u32,
    pub max_points: u32,
}

/// Score a complete answer set.
///
/// Points are the raw answer values of q1..q9; q10 does not count. The total
/// is normalised to 0-100 and rounded half away from zero. No total in 9..=27
/// lands exactly on a .5, so rounding mode never changes the result.
pub fn calculate_score(answers: &Answers) -> ScoreResult {
    let total_points: u32 = answers
        .scored_values()
        .iter()
        .map(|&value| u32::from(value))
        .sum();

    ScoreResult::from_total(total_points)
}

impl ScoreResult {
    /// Build a result from a point total (clamped to the maximum)
    pub fn from_total(total_points: u32) -> Self {
        let total_points = total_points.min(MAX_POINTS);
        let base_score = base_score(total_points);
        ScoreResult {
            base_score,
            score_band: ScoreBand::from_base_score(base_score),
            total_points,
            max_points: MAX_POINTS,
        }
    }
}

fn base_score(total_points: u32) -> u8 {
    let ratio = f64::from(total_points) / f64::from(MAX_POINTS);
    // ratio is within [0, 1], so the rounded value fits in u8
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::LearningFormat;

    fn answers(values: [u8; 9]) -> Answers {
        Answers::new(values, LearningFormat::Lessons).unwrap()
    }

    #[test]
    fn test_all_threes_is_ready() {
        let result = calculate_score(&answers([3; 9]));
        assert_eq!(result.total_points, 27);
        assert_eq!(result.max_points, 27);
        assert_eq!(result.base_score, 100);
        assert_eq!(result.score_band, ScoreBand::Ready);
    }

    #[test]
    fn test_all_ones_is_early_stage() {
        let result = calculate_score(&answers([1; 9]));
        assert_eq!(result.total_points, 9);
        assert_eq!(result.base_score, 33);
        assert_eq!(result.score_band, ScoreBand::EarlyStage);
    }

    #[test]
    fn test_total_21_is_strong() {
        // 3+3+3+3+3+2+2+1+1 = 21
        let result = calculate_score(&answers([3, 3, 3, 3, 3, 2, 2, 1, 1]));
        assert_eq!(result.total_points, 21);
        assert_eq!(result.base_score, 78);
        assert_eq!(result.score_band, ScoreBand::Strong);
    }

    #[test]
    fn test_total_12_is_developing() {
        // 2+1+2+1+1+1+2+1+1 = 12
        let result = calculate_score(&answers([2, 1, 2, 1, 1, 1, 2, 1, 1]));
        assert_eq!(result.total_points, 12);
        assert_eq!(result.base_score, 44);
        assert_eq!(result.score_band, ScoreBand::Developing);
    }

    #[test]
    fn test_preference_does_not_score() {
        let a = Answers::new([3; 9], LearningFormat::Lessons).unwrap();
        let b = Answers::new([3; 9], LearningFormat::Conversations).unwrap();
        assert_eq!(calculate_score(&a), calculate_score(&b));
    }

    #[test]
    fn test_idempotent() {
        let a = answers([3, 1, 2, 2, 1, 3, 3, 1, 2]);
        assert_eq!(calculate_score(&a), calculate_score(&a));
    }

    #[test]
    fn test_base_score_table() {
        // Every reachable total, checked against round(t / 27 * 100)
        let expected = [
            (9, 33), (10, 37), (11, 41), (12, 44), (13, 48), (14, 52), (15, 56),
            (16, 59), (17, 63), (18, 67), (19, 70), (20, 74), (21, 78), (22, 81),
            (23, 85), (24, 89), (25, 93), (26, 96), (27, 100),
        ];
        for (total, score) in expected {
            assert_eq!(ScoreResult::from_total(total).base_score, score, "total {}", total);
        }
    }

    #[test]
    fn test_from_total_clamps() {
        let result = ScoreResult::from_total(40);
        assert_eq!(result.total_points, 27);
        assert_eq!(result.base_score, 100);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(calculate_score(&answers([1; 9]))).unwrap();
        assert_eq!(value["baseScore"], 33);
        assert_eq!(value["scoreBand"], "early-stage");
        assert_eq!(value["totalPoints"], 9);
        assert_eq!(value["maxPoints"], 27);
    }
}
