//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Persistence records live in the adapters; the study artifacts here carry
//! serde derives because they are parsed straight out of model output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user-uploaded file plus its extracted plain-text content.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The generated name the file was stored under.
    pub filename: String,
    pub original_name: String,
    pub path: String,
    /// The MIME type declared by the upload.
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub text_content: String,
}

/// Everything needed to insert a new document; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub file_type: String,
    pub text_content: String,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/register - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a bearer-token login session
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A file that has been written to upload storage.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: String,
}

//=========================================================================================
// Study Parameters
//=========================================================================================

/// The level of detail requested for a summary. Interpolated into the prompt only.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quiz difficulty hint.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Study Artifacts
//=========================================================================================

/// A single multiple-choice question.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correctParam", alias = "correct_option_index")]
    pub correct_option_index: usize,
}

#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// Who authored a chat turn. Clients may only replay user and assistant turns.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// One message of a completion request, as handed to the LLM provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMessage {
    System(String),
    User(String),
    Assistant(String),
}

impl PromptMessage {
    pub fn content(&self) -> &str {
        match self {
            PromptMessage::System(c) | PromptMessage::User(c) | PromptMessage::Assistant(c) => c,
        }
    }
}

impl From<ChatTurn> for PromptMessage {
    fn from(turn: ChatTurn) -> Self {
        match turn.role {
            ChatRole::User => PromptMessage::User(turn.content),
            ChatRole::Assistant => PromptMessage::Assistant(turn.content),
        }
    }
}

/// How the provider should shape its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Text,
    JsonObject,
}

/// A fully built request for a single completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub mode: ResponseMode,
}
