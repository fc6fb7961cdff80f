// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::scoring::Category;

/// One selectable answer option and the category it maps onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub category: Category,
}

/// Represents the 'questions' table: one main-sequence question belonging to
/// a flower's question set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub flower_id: String,

    /// 1-based position within the flower's sequence.
    pub position: i64,

    pub content: String,

    /// Option list, stored as a JSON array in the database.
    pub options: Json<Vec<QuizOption>>,
}

/// Represents the 'pre_quiz_options' table: the forced-choice answers to
/// "why did you pick this flower?". Each one maps directly to the category
/// that receives the pre-quiz boost.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PreQuizOption {
    pub id: i64,
    pub content: String,
    pub category: Category,
}
