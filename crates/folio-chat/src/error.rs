//! Error types for the chat core.

use folio_core::error::FolioError;

/// A malformed catalogue. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("topic '{0}' has no keywords")]
    EmptyKeywords(String),
    #[error("topic '{0}' has a blank keyword")]
    BlankKeyword(String),
    #[error("topic '{0}' has no responses")]
    EmptyResponses(String),
    #[error("follow-up of topic '{0}' has no trigger keywords")]
    EmptyTriggerKeywords(String),
    #[error("duplicate topic id: {0}")]
    DuplicateTopic(String),
    #[error("quiz question '{0}' has no answer keywords")]
    EmptyAnswerKeywords(String),
    #[error("quiz question '{0}' has a blank prompt")]
    BlankPrompt(String),
    #[error("duplicate quiz question id: {0}")]
    DuplicateQuestion(String),
    #[error("catalogue parse error: {0}")]
    Parse(String),
    #[error("catalogue I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CatalogueError {
    fn from(err: toml::de::Error) -> Self {
        CatalogueError::Parse(err.to_string())
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),
    #[error("LLM error: {0}")]
    LlmError(String),
    #[error("invalid guestbook entry: {0}")]
    InvalidGuestbookEntry(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<FolioError> for ChatError {
    fn from(err: FolioError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
