// src/handlers/results.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{dto::ResultsResponse, recommendation::Recommendation},
    session::Phase,
    store,
};

/// Returns the final tally plus the recommendation for the winning category.
/// Only meaningful once the quiz has been completed.
pub async fn get_results(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let state = store::load(&pool).await;

    if state.phase != Phase::Results {
        return Err(AppError::Conflict("Quiz not completed yet".to_string()));
    }

    let top_category = state.scores.top_category();

    let recommendation = sqlx::query_as::<_, Recommendation>(
        "SELECT category, title, description, majors, careers
         FROM recommendations
         WHERE category = ?1",
    )
    .bind(top_category)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| {
        AppError::InternalServerError(format!("Missing recommendation for {:?}", top_category))
    })?;

    Ok(Json(ResultsResponse {
        scores: state.scores,
        top_category,
        recommendation,
    }))
}
