// src/store.rs

//! Durable session store.
//!
//! Three independent keys in the `session_store` table mirror the in-memory
//! `SessionState` (write-through on every mutation). Reads fall back to
//! defaults on any missing or unparseable value; writes are best-effort and
//! never surface an error to the caller.

use sqlx::SqlitePool;

use crate::scoring::ScoreTally;
use crate::session::{Phase, SessionState};

pub const KEY_PHASE: &str = "app_phase";
pub const KEY_SELECTED_FLOWER: &str = "selected_flower_id";
pub const KEY_SCORES: &str = "quiz_scores";

async fn read_key(pool: &SqlitePool, key: &str) -> Option<String> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM session_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(pool)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Session store read failed for '{}': {}", key, e);
                None
            });
    row.map(|(value,)| value)
}

/// Loads the persisted session, falling back to the default state for any
/// key that is absent or fails to parse.
pub async fn load(pool: &SqlitePool) -> SessionState {
    let phase = read_key(pool, KEY_PHASE)
        .await
        .and_then(|v| Phase::parse(&v))
        .unwrap_or_default();

    let selected_flower_id = read_key(pool, KEY_SELECTED_FLOWER).await;

    let scores = read_key(pool, KEY_SCORES)
        .await
        .and_then(|v| serde_json::from_str::<ScoreTally>(&v).ok())
        .unwrap_or_default();

    SessionState {
        phase,
        selected_flower_id,
        scores,
    }
}

/// Mirrors the given state into the store. Best-effort: failures are logged
/// and swallowed so a broken store never takes the session down with it.
pub async fn save(pool: &SqlitePool, state: &SessionState) {
    let scores_json = match serde_json::to_string(&state.scores) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize score tally: {}", e);
            return;
        }
    };

    let result = async {
        let mut tx = pool.begin().await?;

        upsert(&mut tx, KEY_PHASE, state.phase.as_str()).await?;
        match &state.selected_flower_id {
            Some(id) => upsert(&mut tx, KEY_SELECTED_FLOWER, id).await?,
            None => {
                sqlx::query("DELETE FROM session_store WHERE key = ?1")
                    .bind(KEY_SELECTED_FLOWER)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        upsert(&mut tx, KEY_SCORES, &scores_json).await?;

        tx.commit().await
    }
    .await;

    if let Err(e) = result {
        tracing::warn!("Session store write failed: {}", e);
    }
}

async fn upsert(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    key: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO session_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Removes all three keys in one statement, so no partially-cleared state is
/// ever observable.
pub async fn clear(pool: &SqlitePool) {
    let result = sqlx::query("DELETE FROM session_store WHERE key IN (?1, ?2, ?3)")
        .bind(KEY_PHASE)
        .bind(KEY_SELECTED_FLOWER)
        .bind(KEY_SCORES)
        .execute(pool)
        .await;

    if let Err(e) = result {
        tracing::warn!("Session store clear failed: {}", e);
    }
}
