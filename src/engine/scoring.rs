// src/engine/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::question::Question;

/// The score tuple for one completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSheet {
    pub total_scored: i64,
    pub total_questions: i64,
}

/// Scores a submission against a quiz's question set.
///
/// Credit is awarded iff the submitted option for a question's id exactly
/// equals its correct option. Missing or out-of-range submissions simply
/// score zero for that question. `total_questions` is always the size of
/// the question set, independent of how many answers were submitted.
pub fn score(questions: &[Question], answers: &HashMap<i64, i64>) -> ScoreSheet {
    let total_scored = questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_option))
        .count() as i64;

    ScoreSheet {
        total_scored,
        total_questions: questions.len() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, correct_option: i64) -> Question {
        Question {
            id,
            quiz_id: 1,
            statement: format!("Question {}", id),
            option1: "A".to_string(),
            option2: "B".to_string(),
            option3: "C".to_string(),
            option4: "D".to_string(),
            correct_option,
        }
    }

    #[test]
    fn scores_exact_matches_only() {
        // Two questions, correct options 1 and 2; user gets the first.
        let questions = vec![question(1, 1), question(2, 2)];
        let answers = HashMap::from([(1, 1), (2, 3)]);

        let sheet = score(&questions, &answers);
        assert_eq!(sheet.total_scored, 1);
        assert_eq!(sheet.total_questions, 2);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let questions = vec![question(1, 1), question(2, 2), question(3, 3)];
        let answers = HashMap::from([(1, 1)]);

        let sheet = score(&questions, &answers);
        assert_eq!(sheet.total_scored, 1);
        assert_eq!(sheet.total_questions, 3);
    }

    #[test]
    fn out_of_range_answers_score_zero() {
        let questions = vec![question(1, 4)];
        let answers = HashMap::from([(1, 9), (99, 4)]);

        let sheet = score(&questions, &answers);
        assert_eq!(sheet.total_scored, 0);
        assert_eq!(sheet.total_questions, 1);
    }

    #[test]
    fn total_questions_is_independent_of_submission_size() {
        let questions: Vec<Question> = (1..=5).map(|i| question(i, 1)).collect();

        for answers in [
            HashMap::new(),
            HashMap::from([(1, 1)]),
            (1..=20).map(|i| (i, 1)).collect::<HashMap<_, _>>(),
        ] {
            assert_eq!(score(&questions, &answers).total_questions, 5);
        }
    }

    #[test]
    fn empty_question_set_scores_zero_of_zero() {
        let sheet = score(&[], &HashMap::from([(1, 1)]));
        assert_eq!(sheet.total_scored, 0);
        assert_eq!(sheet.total_questions, 0);
    }
}
