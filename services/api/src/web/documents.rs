//! services/api/src/web/documents.rs
//!
//! Upload, listing and retrieval of a user's documents.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use study_assistant_core::domain::{Document, NewDocument};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

/// The multipart field that carries the uploaded file.
const FILE_FIELD: &str = "file";

//=========================================================================================
// Response Types
//=========================================================================================

/// A stored document as returned to its owner.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    /// The owning user's id.
    pub user: Uuid,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub text_content: String,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            user: doc.user_id,
            filename: doc.filename,
            original_name: doc.original_name,
            path: doc.path,
            file_type: doc.file_type,
            uploaded_at: doc.uploaded_at,
            text_content: doc.text_content,
        }
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Upload a document and extract its text.
///
/// Accepts a multipart/form-data request with a `file` part. The part's content type
/// decides how text is extracted. If extraction or storage fails the file is discarded.
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    request_body(content_type = "multipart/form-data", description = "The document to upload in a `file` field."),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing file or text could not be extracted", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("untitled.txt").to_string();
        let mime_type = field.content_type().unwrap_or("text/plain").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((original_name, mime_type, data));
        break;
    }

    let (original_name, mime_type, data) = match upload {
        Some(upload) if !upload.2.is_empty() => upload,
        _ => return Err(ApiError::BadRequest("No file uploaded".to_string())),
    };

    let stored = state.storage.store(&original_name, &data).await?;

    let result = async {
        let text_content = state.extractor.extract_text(&data, &mime_type).await?;
        state
            .db
            .create_document(NewDocument {
                user_id,
                filename: stored.filename.clone(),
                original_name: original_name.clone(),
                path: stored.path.clone(),
                file_type: mime_type.clone(),
                text_content,
            })
            .await
    }
    .await;

    match result {
        Ok(document) => {
            info!(
                "Stored document {} ({}, {} bytes) for user {}",
                document.id,
                document.file_type,
                data.len(),
                user_id
            );
            Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
        }
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&stored).await {
                error!("Failed to discard upload {}: {}", stored.path, cleanup);
            }
            Err(e.into())
        }
    }
}

/// List the caller's documents, most recent first.
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let documents = state.db.list_documents_for_user(user_id).await?;
    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

/// Fetch one of the caller's documents.
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "No such document for this user", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state.db.get_document_for_user(document_id, user_id).await?;
    Ok(Json(document.into()))
}
