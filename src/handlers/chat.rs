// src/handlers/chat.rs

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use validator::Validate;

use crate::{
    chat::{self, ChatEvent},
    error::AppError,
    models::dto::ChatRequest,
    state::AppState,
    store,
};

/// One chat turn with the advisor, streamed back as Server-Sent Events.
///
/// Emits `delta` events while the reply is arriving; on any upstream failure
/// a single `fallback` event carries the apology text instead. The stream
/// closes when the upstream reply does. A client that closes the chat simply
/// drops the connection, which drops the receiver and abandons the pump.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // The advisor context is the tally currently on record, whatever phase
    // the session is in.
    let session = store::load(&state.pool).await;

    let rx = chat::stream_advice(
        state.http.clone(),
        &state.config,
        &session.scores,
        &payload.history,
        &payload.message,
    )
    .await;

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok(match event {
            ChatEvent::Delta(text) => Event::default().event("delta").data(text),
            ChatEvent::Fallback => Event::default().event("fallback").data(chat::FALLBACK_MESSAGE),
        })
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
