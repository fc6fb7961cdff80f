// src/session.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::question::Question;
use crate::scoring::{self, Category, ScoreTally};

/// Top-level application phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Gallery,
    Quiz,
    Results,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Gallery => "gallery",
            Phase::Quiz => "quiz",
            Phase::Results => "results",
        }
    }

    /// Parses a persisted phase string. Unknown values map to `None` so the
    /// caller can fall back to the default.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gallery" => Some(Phase::Gallery),
            "quiz" => Some(Phase::Quiz),
            "results" => Some(Phase::Results),
            _ => None,
        }
    }
}

/// The whole mutable session: phase, selected flower, and score tally.
/// Transitions never mutate in place; they return the successor state, and
/// the caller mirrors it to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub selected_flower_id: Option<String>,
    pub scores: ScoreTally,
}

/// A transition whose guard failed. The state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// `select`/`advance` outside the gallery phase.
    NotInGallery,
    /// `back`/`complete` outside the quiz phase.
    NotInQuiz,
    /// `advance` without a flower selected.
    NoSelection,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::NotInGallery => write!(f, "Not in the gallery phase"),
            TransitionError::NotInQuiz => write!(f, "Not in the quiz phase"),
            TransitionError::NoSelection => write!(f, "No flower selected"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Records a flower selection. Stays in the gallery phase.
pub fn select_flower(
    state: &SessionState,
    flower_id: &str,
) -> Result<SessionState, TransitionError> {
    if state.phase != Phase::Gallery {
        return Err(TransitionError::NotInGallery);
    }
    let mut next = state.clone();
    next.selected_flower_id = Some(flower_id.to_string());
    Ok(next)
}

/// gallery -> quiz. Requires a selection.
pub fn advance(state: &SessionState) -> Result<SessionState, TransitionError> {
    if state.phase != Phase::Gallery {
        return Err(TransitionError::NotInGallery);
    }
    if state.selected_flower_id.is_none() {
        return Err(TransitionError::NoSelection);
    }
    let mut next = state.clone();
    next.phase = Phase::Quiz;
    Ok(next)
}

/// quiz -> gallery. The selection is kept so the gallery can highlight it.
pub fn go_back(state: &SessionState) -> Result<SessionState, TransitionError> {
    if state.phase != Phase::Quiz {
        return Err(TransitionError::NotInQuiz);
    }
    let mut next = state.clone();
    next.phase = Phase::Gallery;
    Ok(next)
}

/// quiz -> results. Runs the scoring engine over the submitted answers and
/// the selected flower's question bank.
pub fn complete(
    state: &SessionState,
    pre_quiz_category: Category,
    answers: &[Option<i64>],
    question_bank: &[Question],
) -> Result<SessionState, TransitionError> {
    if state.phase != Phase::Quiz {
        return Err(TransitionError::NotInQuiz);
    }
    let mut next = state.clone();
    next.scores = scoring::compute_scores(pre_quiz_category, answers, question_bank);
    next.phase = Phase::Results;
    Ok(next)
}

/// Unconditional reset back to the defaults: gallery phase, no selection,
/// all-zero tally.
pub fn reset() -> SessionState {
    SessionState::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert_eq!(state.phase, Phase::Gallery);
        assert!(state.selected_flower_id.is_none());
        assert_eq!(state.scores, ScoreTally::default());
    }

    #[test]
    fn test_advance_requires_selection() {
        let state = SessionState::default();
        assert_eq!(advance(&state), Err(TransitionError::NoSelection));

        let state = select_flower(&state, "tulip").unwrap();
        let state = advance(&state).unwrap();
        assert_eq!(state.phase, Phase::Quiz);
        assert_eq!(state.selected_flower_id.as_deref(), Some("tulip"));
    }

    #[test]
    fn test_select_only_in_gallery() {
        let state = SessionState {
            phase: Phase::Quiz,
            ..Default::default()
        };
        assert_eq!(
            select_flower(&state, "lotus"),
            Err(TransitionError::NotInGallery)
        );
    }

    #[test]
    fn test_back_returns_to_gallery_keeping_selection() {
        let state = select_flower(&SessionState::default(), "lavender").unwrap();
        let state = advance(&state).unwrap();
        let state = go_back(&state).unwrap();
        assert_eq!(state.phase, Phase::Gallery);
        assert_eq!(state.selected_flower_id.as_deref(), Some("lavender"));
    }

    #[test]
    fn test_complete_guarded_on_quiz_phase() {
        let state = SessionState::default();
        let result = complete(&state, Category::Logic, &[], &[]);
        assert_eq!(result, Err(TransitionError::NotInQuiz));
    }

    #[test]
    fn test_complete_scores_and_moves_to_results() {
        let state = select_flower(&SessionState::default(), "tulip").unwrap();
        let state = advance(&state).unwrap();
        let state = complete(&state, Category::Systems, &[], &[]).unwrap();
        assert_eq!(state.phase, Phase::Results);
        assert_eq!(state.scores.systems, 3);
    }

    #[test]
    fn test_reset_yields_defaults() {
        let reset_state = reset();
        assert_eq!(reset_state.phase, Phase::Gallery);
        assert!(reset_state.selected_flower_id.is_none());
        assert_eq!(reset_state.scores, ScoreTally::default());
    }

    #[test]
    fn test_phase_round_trips_through_strings() {
        for phase in [Phase::Gallery, Phase::Quiz, Phase::Results] {
            assert_eq!(Phase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::parse("garbage"), None);
    }
}
