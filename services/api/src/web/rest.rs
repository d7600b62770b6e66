//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification and the
//! unauthenticated health endpoint.

use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use study_assistant_core::domain::{
    ChatRole, ChatTurn, Difficulty, Flashcard, QuizQuestion, SummaryLength,
};

use crate::error::ErrorBody;
use crate::web::{auth, documents, study};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        documents::upload_document_handler,
        documents::list_documents_handler,
        documents::get_document_handler,
        study::summary_handler,
        study::quiz_handler,
        study::score_quiz_handler,
        study::flashcards_handler,
        study::chat_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            auth::CredentialsRequest,
            auth::AuthResponse,
            documents::DocumentResponse,
            study::SummaryRequest,
            study::SummaryResponse,
            study::QuizRequest,
            study::ScoreQuizRequest,
            study::ScoreQuizResponse,
            study::FlashcardsRequest,
            study::ChatRequest,
            study::ChatResponse,
            QuizQuestion,
            Flashcard,
            ChatTurn,
            ChatRole,
            SummaryLength,
            Difficulty,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Study Assistant API", description = "Document upload and LLM-backed study tools.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/register",
            "/api/documents/upload",
            "/api/documents/{id}",
            "/api/study/quiz/score",
            "/api/study/chat",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        for schema in ["QuizQuestion", "Flashcard", "ChatTurn"] {
            assert!(components.schemas.contains_key(schema), "missing {}", schema);
        }
    }
}
