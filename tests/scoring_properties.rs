use founder_check::quiz::{self, Answers, LearningFormat, SCORED_QUESTION_COUNT};
use founder_check::scoring::{calculate_score, ScoreBand, ScoreResult, MAX_POINTS};
use proptest::prelude::*;

fn valid_answers() -> impl Strategy<Value = Answers> {
    let values = proptest::collection::vec(1u8..=3, SCORED_QUESTION_COUNT);
    let preference = proptest::sample::select(LearningFormat::ALL.to_vec());
    (values, preference).prop_filter_map("option outside a question's domain", |(values, preference)| {
        let mut scored = [0u8; SCORED_QUESTION_COUNT];
        scored.copy_from_slice(&values);
        Answers::new(scored, preference).ok()
    })
}

proptest! {
    #[test]
    fn base_score_is_within_range(answers in valid_answers()) {
        let result = calculate_score(&answers);
        prop_assert!(result.base_score <= 100);
        prop_assert_eq!(result.max_points, MAX_POINTS);
    }

    #[test]
    fn total_is_sum_of_values(answers in valid_answers()) {
        let expected: u32 = answers.scored_values().iter().map(|&v| u32::from(v)).sum();
        prop_assert_eq!(calculate_score(&answers).total_points, expected);
    }

    #[test]
    fn band_follows_base_score(answers in valid_answers()) {
        let result = calculate_score(&answers);
        prop_assert_eq!(result.score_band, ScoreBand::from_base_score(result.base_score));
    }

    #[test]
    fn scoring_is_idempotent(answers in valid_answers()) {
        prop_assert_eq!(calculate_score(&answers), calculate_score(&answers));
    }

    #[test]
    fn preference_never_changes_score(answers in valid_answers(), other in proptest::sample::select(LearningFormat::ALL.to_vec())) {
        let swapped = Answers::new(*answers.scored_values(), other).unwrap();
        prop_assert_eq!(calculate_score(&answers), calculate_score(&swapped));
    }

    #[test]
    fn band_is_monotonic(a in 0u32..=27, b in 0u32..=27) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = ScoreResult::from_total(low);
        let high = ScoreResult::from_total(high);
        prop_assert!(low.base_score <= high.base_score);
        prop_assert!(low.score_band <= high.score_band);
    }
}

#[test]
fn questionnaire_shape() {
    let questions = quiz::questions();
    assert_eq!(questions.len(), 10);
    assert_eq!(questions.iter().filter(|q| q.is_scored()).count(), SCORED_QUESTION_COUNT);
    assert_eq!(quiz::max_points(), MAX_POINTS);
}

#[test]
fn reference_totals() {
    for (total, base, band) in [
        (27, 100, ScoreBand::Ready),
        (9, 33, ScoreBand::EarlyStage),
        (21, 78, ScoreBand::Strong),
        (12, 44, ScoreBand::Developing),
    ] {
        let result = ScoreResult::from_total(total);
        assert_eq!(result.base_score, base, "total {}", total);
        assert_eq!(result.score_band, band, "total {}", total);
    }
}
