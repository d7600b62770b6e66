//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    CompletionRequest, Document, NewDocument, StoredFile, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Failed to extract text: {0}")]
    Extraction(String),
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live (unexpired) token to its user.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    /// Drops every session past its expiry and returns how many were removed.
    async fn delete_expired_auth_sessions(&self) -> PortResult<u64>;

    // --- Document Management ---
    async fn create_document(&self, document: NewDocument) -> PortResult<Document>;

    /// Returns the document only if it is owned by `user_id`; otherwise `NotFound`.
    async fn get_document_for_user(&self, document_id: Uuid, user_id: Uuid)
        -> PortResult<Document>;

    /// Most-recent-first.
    async fn list_documents_for_user(&self, user_id: Uuid) -> PortResult<Vec<Document>>;
}

/// Persists raw uploaded bytes.
#[async_trait]
pub trait FileStorageService: Send + Sync {
    async fn store(&self, original_name: &str, data: &[u8]) -> PortResult<StoredFile>;

    async fn remove(&self, file: &StoredFile) -> PortResult<()>;
}

/// Turns uploaded bytes into plain text according to their declared MIME type.
#[async_trait]
pub trait TextExtractionService: Send + Sync {
    async fn extract_text(&self, data: &[u8], mime_type: &str) -> PortResult<String>;
}

/// A single, non-streaming chat completion against the LLM provider.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> PortResult<String>;
}
