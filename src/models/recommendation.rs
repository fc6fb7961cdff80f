// src/models/recommendation.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

use crate::scoring::Category;

/// Represents the 'recommendations' table: the advisory text shown for the
/// winning category on the results page.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: Category,

    pub title: String,

    pub description: String,

    /// Suggested academic majors, stored as a JSON array.
    pub majors: Json<Vec<String>>,

    /// Suggested careers, stored as a JSON array.
    pub careers: Json<Vec<String>>,
}
