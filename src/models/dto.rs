// src/models/dto.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::recommendation::Recommendation;
use crate::scoring::{Category, ScoreTally};

/// DTO for recording a flower selection in the gallery.
#[derive(Debug, Deserialize, Validate)]
pub struct SelectFlowerRequest {
    #[validate(length(min = 1, max = 64))]
    pub flower_id: String,
}

/// DTO for submitting a finished quiz run.
#[derive(Debug, Deserialize)]
pub struct CompleteQuizRequest {
    /// Category chosen in the pre-quiz forced choice.
    pub pre_quiz_category: Category,

    /// Selected option index per question position. `null` marks an
    /// unanswered slot; out-of-range values are tolerated by the scorer.
    pub answers: Vec<Option<i64>>,
}

/// DTO for the results page payload.
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub scores: ScoreTally,
    pub top_category: Category,
    pub recommendation: Recommendation,
}

/// Role tag on a transcript message, matching the upstream chat wire roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One message of the prior transcript, as kept by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: ChatRole,
    pub text: String,
}

/// DTO for one chat turn. `history` is the snapshot of all messages
/// exchanged before this turn; the just-typed message travels only in
/// `message` so it never appears twice in the upstream context.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub history: Vec<TranscriptMessage>,
}
