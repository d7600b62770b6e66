pub mod db;
pub mod extract;
pub mod llm;
pub mod storage;

pub use db::DbAdapter;
pub use extract::DocumentTextExtractor;
pub use llm::OpenAiCompletionAdapter;
pub use storage::LocalFileStorage;
