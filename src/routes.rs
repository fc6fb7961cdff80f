// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{chat, flowers, quiz, results, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (flowers, quiz, session, results, chat).
/// * Applies global middleware (Trace, CORS) and rate limiting on the chat
///   route, the only one that fans out to the paid upstream.
/// * Injects global state (pool, config, HTTP client).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
        "http://localhost:5173".parse().unwrap(),
        "http://127.0.0.1:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(5)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let flower_routes = Router::new()
        .route("/", get(flowers::list_flowers))
        .route("/{id}", get(flowers::get_flower))
        .route("/{id}/questions", get(quiz::get_questions));

    let quiz_routes = Router::new().route("/pre-options", get(quiz::get_pre_quiz_options));

    let session_routes = Router::new()
        .route("/", get(session::get_session))
        .route("/select", post(session::select_flower))
        .route("/advance", post(session::advance))
        .route("/back", post(session::back))
        .route("/complete", post(session::complete))
        .route("/reset", post(session::reset));

    let results_routes = Router::new().route("/", get(results::get_results));

    let chat_routes = Router::new()
        .route("/", post(chat::chat))
        .layer(GovernorLayer::new(governor_conf));

    Router::new()
        .nest("/api/flowers", flower_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/session", session_routes)
        .nest("/api/results", results_routes)
        .nest("/api/chat", chat_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
