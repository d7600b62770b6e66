//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_assistant_core::{
    ports::{DatabaseService, FileStorageService, TextExtractionService},
    StudyService,
};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub storage: Arc<dyn FileStorageService>,
    pub extractor: Arc<dyn TextExtractionService>,
    pub study: StudyService,
}
