pub mod domain;
pub mod ports;
pub mod study;

pub use domain::{
    AuthSession, ChatRole, ChatTurn, CompletionRequest, Difficulty, Document, Flashcard,
    NewDocument, PromptMessage, QuizQuestion, ResponseMode, StoredFile, SummaryLength, User,
    UserCredentials,
};
pub use ports::{
    CompletionService, DatabaseService, FileStorageService, PortError, PortResult,
    TextExtractionService,
};
pub use study::StudyService;
