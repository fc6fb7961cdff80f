// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::question::{PreQuizOption, Question},
};

/// Fetches a flower's question set ordered by position. Used by both the
/// quiz screen and the completion handler.
pub async fn question_bank(pool: &SqlitePool, flower_id: &str) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, flower_id, position, content, options
         FROM questions
         WHERE flower_id = ?1
         ORDER BY position",
    )
    .bind(flower_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// Returns the main question sequence for one flower.
pub async fn get_questions(
    State(pool): State<SqlitePool>,
    Path(flower_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM flowers WHERE id = ?1")
        .bind(&flower_id)
        .fetch_optional(&pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Flower not found".to_string()));
    }

    let questions = question_bank(&pool, &flower_id).await?;

    Ok(Json(questions))
}

/// Returns the pre-quiz forced-choice option list.
pub async fn get_pre_quiz_options(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let options = sqlx::query_as::<_, PreQuizOption>(
        "SELECT id, content, category FROM pre_quiz_options ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(options))
}
