// src/handlers/flowers.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{error::AppError, models::flower::Flower};

/// Lists the flower catalog in display order.
pub async fn list_flowers(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let flowers = sqlx::query_as::<_, Flower>(
        "SELECT id, name, tag, description, color, icon FROM flowers ORDER BY rowid",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(flowers))
}

/// Retrieves a single flower by ID.
pub async fn get_flower(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let flower = sqlx::query_as::<_, Flower>(
        "SELECT id, name, tag, description, color, icon FROM flowers WHERE id = ?1",
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Flower not found".to_string()))?;

    Ok(Json(flower))
}
