// src/handlers/session.rs

//! HTTP surface of the phase state machine.
//!
//! Every handler follows the same shape: load the persisted state, apply a
//! pure transition, mirror the successor state back to the store, return it.
//! A guard failure maps to 409 and the store is left untouched.

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::quiz::question_bank,
    models::dto::{CompleteQuizRequest, SelectFlowerRequest},
    session, store,
};

/// Returns the current session state, defaults included.
pub async fn get_session(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store::load(&pool).await))
}

/// Records a flower selection while staying in the gallery.
pub async fn select_flower(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SelectFlowerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM flowers WHERE id = ?1")
        .bind(&payload.flower_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Flower not found".to_string()));
    }

    let state = store::load(&pool).await;
    let next = session::select_flower(&state, &payload.flower_id)?;
    store::save(&pool, &next).await;

    Ok(Json(next))
}

/// gallery -> quiz.
pub async fn advance(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let state = store::load(&pool).await;
    let next = session::advance(&state)?;
    store::save(&pool, &next).await;

    Ok(Json(next))
}

/// quiz -> gallery.
pub async fn back(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let state = store::load(&pool).await;
    let next = session::go_back(&state)?;
    store::save(&pool, &next).await;

    Ok(Json(next))
}

/// quiz -> results. Scores the submitted answers against the selected
/// flower's question bank.
pub async fn complete(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CompleteQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let state = store::load(&pool).await;

    let flower_id = state
        .selected_flower_id
        .clone()
        .ok_or(AppError::Conflict("No flower selected".to_string()))?;

    let bank = question_bank(&pool, &flower_id).await?;

    let next = session::complete(&state, payload.pre_quiz_category, &payload.answers, &bank)?;
    store::save(&pool, &next).await;

    Ok(Json(next))
}

/// Clears the store and returns to the gallery defaults. Allowed from any
/// phase.
pub async fn reset(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    store::clear(&pool).await;

    Ok(Json(session::reset()))
}
