//! services/api/src/web/study.rs
//!
//! Handlers for the study operations. Every handler loads the document scoped to the
//! authenticated user before anything is sent upstream.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::{
    domain::{ChatTurn, Difficulty, Document, Flashcard, QuizQuestion, SummaryLength},
    study::score_quiz,
};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub document_id: Uuid,
    /// One of `short`, `medium`, `long`.
    #[serde(default)]
    pub length: SummaryLength,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub document_id: Uuid,
    /// One of `easy`, `medium`, `hard`.
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Deserialize, ToSchema)]
pub struct ScoreQuizRequest {
    pub questions: Vec<QuizQuestion>,
    /// The selected option index per question; `null` for unanswered.
    pub answers: Vec<Option<usize>>,
}

#[derive(Serialize, ToSchema)]
pub struct ScoreQuizResponse {
    pub score: usize,
    pub total: usize,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardsRequest {
    pub document_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub document_id: Uuid,
    pub question: String,
    /// Prior turns as `{role: "user" | "assistant", content}`; only the last five are used.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
}

async fn load_document(
    state: &AppState,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<Document, ApiError> {
    Ok(state.db.get_document_for_user(document_id, user_id).await?)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Summarize a document at the requested level of detail.
#[utoipa::path(
    post,
    path = "/api/study/summary",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "Generated summary", body = SummaryResponse),
        (status = 404, description = "No such document for this user", body = ErrorBody),
        (status = 500, description = "LLM request failed", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let document = load_document(&state, req.document_id, user_id).await?;
    info!("Summarizing document {} ({})", document.id, req.length);
    let summary = state
        .study
        .summarize(&document.text_content, req.length)
        .await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Generate a five-question multiple-choice quiz.
#[utoipa::path(
    post,
    path = "/api/study/quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Generated quiz", body = [QuizQuestion]),
        (status = 404, description = "No such document for this user", body = ErrorBody),
        (status = 500, description = "LLM request failed", body = ErrorBody),
        (status = 502, description = "LLM returned a malformed quiz", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
    let document = load_document(&state, req.document_id, user_id).await?;
    info!("Generating {} quiz for document {}", req.difficulty, document.id);
    let quiz = state
        .study
        .generate_quiz(&document.text_content, req.difficulty)
        .await?;
    Ok(Json(quiz))
}

/// Score a set of answers against a quiz.
#[utoipa::path(
    post,
    path = "/api/study/quiz/score",
    request_body = ScoreQuizRequest,
    responses(
        (status = 200, description = "Number of correct answers", body = ScoreQuizResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn score_quiz_handler(Json(req): Json<ScoreQuizRequest>) -> Json<ScoreQuizResponse> {
    let score = score_quiz(&req.questions, &req.answers);
    Json(ScoreQuizResponse {
        score,
        total: req.questions.len(),
    })
}

/// Generate ten flashcards.
#[utoipa::path(
    post,
    path = "/api/study/flashcards",
    request_body = FlashcardsRequest,
    responses(
        (status = 200, description = "Generated flashcards", body = [Flashcard]),
        (status = 404, description = "No such document for this user", body = ErrorBody),
        (status = 500, description = "LLM request failed", body = ErrorBody),
        (status = 502, description = "LLM returned malformed flashcards", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<FlashcardsRequest>,
) -> Result<Json<Vec<Flashcard>>, ApiError> {
    let document = load_document(&state, req.document_id, user_id).await?;
    let cards = state
        .study
        .generate_flashcards(&document.text_content)
        .await?;
    Ok(Json(cards))
}

/// Answer a question using only the document as context.
#[utoipa::path(
    post,
    path = "/api/study/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer", body = ChatResponse),
        (status = 400, description = "Empty question", body = ErrorBody),
        (status = 404, description = "No such document for this user", body = ErrorBody),
        (status = 500, description = "LLM request failed", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question must not be empty".to_string()));
    }
    let document = load_document(&state, req.document_id, user_id).await?;
    let answer = state
        .study
        .chat(&document.text_content, &req.question, &req.history)
        .await?;
    Ok(Json(ChatResponse { answer }))
}
