// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, questions},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the session and question sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (session store, question bank, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/", post(exam::create_session))
        .route("/{id}", get(exam::get_session).delete(exam::delete_session))
        .route(
            "/{id}/paper",
            put(exam::attach_paper).delete(exam::clear_paper),
        )
        .route("/{id}/start", post(exam::start_test))
        .route("/{id}/answers", post(exam::submit_answer))
        .route("/{id}/navigate", post(exam::navigate))
        .route("/{id}/section", post(exam::switch_section))
        .route("/{id}/submit", post(exam::submit_test))
        .route("/{id}/metrics", get(exam::get_metrics));

    let question_routes = Router::new().route("/", get(questions::list_questions));

    Router::new()
        .nest("/api/sessions", session_routes)
        .nest("/api/questions", question_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
