// src/models/flower.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'flowers' table: the symbolic catalog the user picks from.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Flower {
    pub id: String,

    /// Display name (Arabic).
    pub name: String,

    /// Short descriptive tag (e.g., "تقنية", "إبداع").
    pub tag: String,

    pub description: String,

    /// Styling token consumed by the frontend (e.g., "indigo").
    pub color: String,

    /// Emoji icon.
    pub icon: String,
}
