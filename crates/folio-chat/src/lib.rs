//! Conversational core of the portfolio terminal.
//!
//! Provides the keyword catalogue, the intent matcher, the per-session
//! state machine (follow-ups, quiz sub-mode, name capture, reserved
//! commands), and the orchestrator that wires sessions to the guestbook
//! and the external language model.

pub mod catalogue;
pub mod commands;
pub mod error;
pub mod guestbook;
pub mod llm;
pub mod matcher;
pub mod orchestrator;
pub mod session;
pub mod types;

pub use catalogue::{
    load_catalogue, BuiltinCatalogue, Catalogue, CatalogueSource, StaticCatalogue,
    TomlCatalogueFile,
};
pub use commands::LocalCommand;
pub use error::{CatalogueError, ChatError};
pub use guestbook::{GuestbookStore, InMemoryGuestbook};
pub use llm::{CompletionPrompt, GeminiClient, LanguageModel};
pub use matcher::{FixedSelector, IntentMatcher, MatchResult, RandomSelector, ResponseSelector};
pub use orchestrator::ChatOrchestrator;
pub use session::{ConversationEngine, PendingFollowUp, SessionState, SubMode};
pub use types::{
    ChatMessage, ChatReply, ConversationSession, FollowUp, GuestbookEntry, GuestbookRequest,
    MessageRole, QuizQuestion, ReplyKind, SessionSummary, TopicEntry, TurnOutcome,
};
