//! crates/study_assistant_core/src/study.rs
//!
//! The study operations: summarize, quiz, flashcards and chat. Each one bounds the
//! document text, builds a fixed prompt, and makes exactly one completion call
//! through the `CompletionService` port. Quiz and flashcard output is checked
//! against an explicit shape before it leaves the service.

use crate::domain::{
    ChatTurn, CompletionRequest, Difficulty, Flashcard, PromptMessage, QuizQuestion,
    ResponseMode, SummaryLength,
};
use crate::ports::{CompletionService, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Upper bound, in characters, on the document text placed into any prompt.
pub const MAX_CONTEXT_CHARS: usize = 15_000;
/// Number of prior chat turns replayed to the model.
pub const MAX_HISTORY_TURNS: usize = 5;
pub const QUIZ_QUESTION_COUNT: usize = 5;
pub const FLASHCARD_COUNT: usize = 10;
/// What the model is told to say when the document does not contain the answer.
pub const NOT_IN_CONTEXT_REPLY: &str = "I don't know based on the document.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful study assistant.";
const QUIZ_SYSTEM_PROMPT: &str = "You are a quiz generator. Output JSON only.";
const FLASHCARD_SYSTEM_PROMPT: &str = "You are a flashcard generator. Output JSON only.";

//=========================================================================================
// Prompt Helpers
//=========================================================================================

/// Cuts `text` down to at most `MAX_CONTEXT_CHARS` characters, on a char boundary.
pub fn truncate_context(text: &str) -> &str {
    match text.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// The most recent `MAX_HISTORY_TURNS` turns, oldest first.
pub fn recent_history(history: &[ChatTurn]) -> &[ChatTurn] {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    &history[start..]
}

pub fn summary_request(text: &str, length: SummaryLength) -> CompletionRequest {
    let prompt = format!(
        "Summarize the following text. Level of detail: {}.\n\nText:\n{}",
        length,
        truncate_context(text)
    );
    CompletionRequest {
        messages: vec![
            PromptMessage::System(SUMMARY_SYSTEM_PROMPT.to_string()),
            PromptMessage::User(prompt),
        ],
        mode: ResponseMode::Text,
    }
}

pub fn quiz_request(text: &str, difficulty: Difficulty) -> CompletionRequest {
    let prompt = format!(
        "Generate a quiz with {count} multiple choice questions based on the text below. Difficulty: {difficulty}.\n\
         Return the output strictly as a JSON object of the form {{\"questions\": [...]}} where each question \
         is an object with keys: question (string), options (array of strings), correctOptionIndex \
         (zero-based index of the correct option).\n\nText:\n{text}",
        count = QUIZ_QUESTION_COUNT,
        difficulty = difficulty,
        text = truncate_context(text),
    );
    CompletionRequest {
        messages: vec![
            PromptMessage::System(QUIZ_SYSTEM_PROMPT.to_string()),
            PromptMessage::User(prompt),
        ],
        mode: ResponseMode::JsonObject,
    }
}

pub fn flashcards_request(text: &str) -> CompletionRequest {
    let prompt = format!(
        "Generate {count} flashcards (Concept - Definition pairs) from the text.\n\
         Return the output strictly as a JSON object of the form {{\"flashcards\": [...]}} where each \
         flashcard is an object with keys: front, back.\n\nText:\n{text}",
        count = FLASHCARD_COUNT,
        text = truncate_context(text),
    );
    CompletionRequest {
        messages: vec![
            PromptMessage::System(FLASHCARD_SYSTEM_PROMPT.to_string()),
            PromptMessage::User(prompt),
        ],
        mode: ResponseMode::JsonObject,
    }
}

pub fn chat_request(text: &str, question: &str, history: &[ChatTurn]) -> CompletionRequest {
    let system = format!(
        "You are a helpful assistant. Answer the user's question based ONLY on the provided context. \
         If the answer is not in the context, say \"{}\"\n\nContext:\n{}",
        NOT_IN_CONTEXT_REPLY,
        truncate_context(text)
    );

    let mut messages = Vec::with_capacity(MAX_HISTORY_TURNS + 2);
    messages.push(PromptMessage::System(system));
    messages.extend(recent_history(history).iter().cloned().map(PromptMessage::from));
    messages.push(PromptMessage::User(question.to_string()));

    CompletionRequest {
        messages,
        mode: ResponseMode::Text,
    }
}

//=========================================================================================
// Model Output Validation
//=========================================================================================

/// Parses model output into exactly `expected` items of `T`, accepting either a bare JSON
/// array or an object wrapping one (preferably under `key`). Surplus items are dropped
/// before they are deserialized, so only the kept ones have to be well-formed.
fn parse_items<T: DeserializeOwned>(raw: &str, key: &str, expected: usize) -> PortResult<Vec<T>> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| PortError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let mut items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => {
                let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                });
                match (arrays.next(), arrays.next()) {
                    (Some(items), None) => items,
                    _ => {
                        return Err(PortError::MalformedResponse(format!(
                            "expected a \"{}\" array",
                            key
                        )))
                    }
                }
            }
        },
        _ => {
            return Err(PortError::MalformedResponse(
                "expected a JSON array or object".to_string(),
            ))
        }
    };

    if items.len() < expected {
        return Err(PortError::MalformedResponse(format!(
            "expected {} {}, got {}",
            expected,
            key,
            items.len()
        )));
    }
    if items.len() > expected {
        warn!("Model returned {} {}; keeping the first {}", items.len(), key, expected);
        items.truncate(expected);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| PortError::MalformedResponse(format!("item {}: {}", i, e)))
        })
        .collect()
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

pub fn parse_quiz(raw: &str) -> PortResult<Vec<QuizQuestion>> {
    let questions: Vec<QuizQuestion> = parse_items(raw, "questions", QUIZ_QUESTION_COUNT)?;

    for (i, q) in questions.iter().enumerate() {
        if q.question.trim().is_empty() {
            return Err(PortError::MalformedResponse(format!("question {} has no text", i)));
        }
        if q.options.len() < 2 {
            return Err(PortError::MalformedResponse(format!(
                "question {} has fewer than two options",
                i
            )));
        }
        if q.correct_option_index >= q.options.len() {
            return Err(PortError::MalformedResponse(format!(
                "question {} has correctOptionIndex {} but only {} options",
                i,
                q.correct_option_index,
                q.options.len()
            )));
        }
    }

    Ok(questions)
}

pub fn parse_flashcards(raw: &str) -> PortResult<Vec<Flashcard>> {
    let cards: Vec<Flashcard> = parse_items(raw, "flashcards", FLASHCARD_COUNT)?;

    if let Some(i) = cards
        .iter()
        .position(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
    {
        return Err(PortError::MalformedResponse(format!("flashcard {} is empty", i)));
    }

    Ok(cards)
}

/// Counts the questions whose selected option equals the correct one.
/// Missing answers count as wrong.
pub fn score_quiz(questions: &[QuizQuestion], answers: &[Option<usize>]) -> usize {
    questions
        .iter()
        .zip(answers.iter().copied().chain(std::iter::repeat(None)))
        .filter(|(q, answer)| *answer == Some(q.correct_option_index))
        .count()
}

//=========================================================================================
// The Study Service
//=========================================================================================

/// Stateless study operations over a document's stored text.
#[derive(Clone)]
pub struct StudyService {
    completions: Arc<dyn CompletionService>,
}

impl StudyService {
    pub fn new(completions: Arc<dyn CompletionService>) -> Self {
        Self { completions }
    }

    pub async fn summarize(&self, text: &str, length: SummaryLength) -> PortResult<String> {
        self.completions.complete(summary_request(text, length)).await
    }

    pub async fn generate_quiz(
        &self,
        text: &str,
        difficulty: Difficulty,
    ) -> PortResult<Vec<QuizQuestion>> {
        let raw = self.completions.complete(quiz_request(text, difficulty)).await?;
        parse_quiz(&raw)
    }

    pub async fn generate_flashcards(&self, text: &str) -> PortResult<Vec<Flashcard>> {
        let raw = self.completions.complete(flashcards_request(text)).await?;
        parse_flashcards(&raw)
    }

    pub async fn chat(
        &self,
        text: &str,
        question: &str,
        history: &[ChatTurn],
    ) -> PortResult<String> {
        self.completions
            .complete(chat_request(text, question, history))
            .await
    }
}
