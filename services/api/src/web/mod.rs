pub mod auth;
pub mod documents;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod study;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the API router. CORS and Swagger UI are layered on by the server binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/documents", get(documents::list_documents_handler))
        .route("/api/documents/upload", post(documents::upload_document_handler))
        .route("/api/documents/{id}", get(documents::get_document_handler))
        .route("/api/study/summary", post(study::summary_handler))
        .route("/api/study/quiz", post(study::quiz_handler))
        .route("/api/study/quiz/score", post(study::score_quiz_handler))
        .route("/api/study/flashcards", post(study::flashcards_handler))
        .route("/api/study/chat", post(study::chat_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
