// src/scoring.rs

use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// The four trait categories every answer maps onto.
/// This set is closed; content and recommendations are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Category {
    Logic,
    Creative,
    Human,
    Systems,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Logic,
        Category::Creative,
        Category::Human,
        Category::Systems,
    ];
}

/// Per-category point totals.
///
/// Serialized with PascalCase keys ("Logic", "Creative", ...) so the wire
/// format matches the persisted tally object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreTally {
    pub logic: u32,
    pub creative: u32,
    pub human: u32,
    pub systems: u32,
}

impl ScoreTally {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Logic => self.logic,
            Category::Creative => self.creative,
            Category::Human => self.human,
            Category::Systems => self.systems,
        }
    }

    pub fn add(&mut self, category: Category, points: u32) {
        match category {
            Category::Logic => self.logic += points,
            Category::Creative => self.creative += points,
            Category::Human => self.human += points,
            Category::Systems => self.systems += points,
        }
    }

    /// The highest-scoring category. Ties resolve in declaration order
    /// (Logic, Creative, Human, Systems).
    pub fn top_category(&self) -> Category {
        let mut best = Category::Logic;
        for category in Category::ALL {
            if self.get(category) > self.get(best) {
                best = category;
            }
        }
        best
    }
}

/// Points granted to the category picked in the pre-quiz forced choice.
pub const PRE_QUIZ_BOOST: u32 = 3;

/// Points granted per answered main-sequence question.
pub const QUESTION_WEIGHT: u32 = 2;

/// Computes the final tally for a quiz run.
///
/// Starts from an all-zero tally, grants the pre-quiz boost, then walks the
/// answer sequence position by position. A position contributes points only
/// when a question exists at that index and the selected option index is in
/// range; anything else (unanswered slot, negative or out-of-range index,
/// answers longer than the bank) is skipped without contributing.
///
/// The lenient lookup covers stale persisted answers after the question bank
/// changed underneath a saved session.
pub fn compute_scores(
    pre_quiz_category: Category,
    answers: &[Option<i64>],
    question_bank: &[Question],
) -> ScoreTally {
    let mut tally = ScoreTally::default();

    tally.add(pre_quiz_category, PRE_QUIZ_BOOST);

    for (question_index, answer) in answers.iter().enumerate() {
        let Some(question) = question_bank.get(question_index) else {
            continue;
        };
        let Some(option_index) = answer else {
            continue;
        };
        if *option_index < 0 {
            continue;
        }
        if let Some(option) = question.options.get(*option_index as usize) {
            tally.add(option.category, QUESTION_WEIGHT);
        }
    }

    tally
}
