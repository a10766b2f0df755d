//! Shared data types for the chat core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::LocalCommand;
use crate::session::SessionState;

// =============================================================================
// Catalogue records
// =============================================================================

/// One row of the keyword-to-response catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    /// Identifier used for logging and tests, never shown to the visitor.
    pub topic: String,
    /// Lowercase trigger substrings.
    pub keywords: Vec<String>,
    /// Candidate replies; one is chosen per match.
    pub responses: Vec<String>,
    /// Question asked after replying, resolved on the next turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,
}

/// A single pending question and how to recognise the answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub prompt: String,
    pub trigger_keywords: Vec<String>,
    pub response: String,
}

/// A trivia question for the quiz sub-mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub prompt: String,
    pub answer_keywords: Vec<String>,
    pub correct_response: String,
    pub incorrect_response: String,
}

// =============================================================================
// Turn outcomes
// =============================================================================

/// Guestbook operations requested by the reserved commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GuestbookRequest {
    List,
    Sign { name: String, message: String },
}

/// Result of processing one visitor turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A catalogue, follow-up or name-capture reply.
    LocalReply {
        topic: String,
        text: String,
        follow_up_prompt: Option<String>,
    },
    /// A reserved command answered without the catalogue.
    CommandHandled { command: LocalCommand, text: String },
    /// The single answer accepted while a quiz question is open.
    QuizAnswered {
        question_id: String,
        correct: bool,
        text: String,
    },
    /// The caller must consult the guestbook store.
    Guestbook(GuestbookRequest),
    /// Nothing local matched; forward the input untouched.
    DelegateToLanguageModel { original_text: String },
}

impl TurnOutcome {
    /// Whether the caller has to reach an external collaborator.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            TurnOutcome::Guestbook(_) | TurnOutcome::DelegateToLanguageModel { .. }
        )
    }
}

// =============================================================================
// Orchestrator records
// =============================================================================

/// A conversation as tracked by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    /// Epoch seconds.
    pub started_at: i64,
    /// Epoch seconds.
    pub last_message_at: i64,
    pub message_count: u32,
    pub state: SessionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One line of a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Epoch seconds.
    pub created_at: i64,
}

/// How the front end should present a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Local,
    Command,
    Quiz,
    Guestbook,
    Assistant,
    Error,
}

/// Reply returned to the transport layer for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub kind: ReplyKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub message_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remembered_name: Option<String>,
}

/// A signed guestbook line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub id: Uuid,
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_entry_toml_without_follow_up() {
        let entry: TopicEntry = toml::from_str(
            r#"
topic = "greeting"
keywords = ["hi", "hello"]
responses = ["Hello!"]
"#,
        )
        .unwrap();
        assert_eq!(entry.topic, "greeting");
        assert!(entry.follow_up.is_none());
    }

    #[test]
    fn test_topic_entry_toml_with_follow_up() {
        let entry: TopicEntry = toml::from_str(
            r#"
topic = "rates"
keywords = ["rates"]
responses = ["Competitive."]

[follow_up]
prompt = "Want a quote?"
trigger_keywords = ["yes", "quote"]
response = "Email him."
"#,
        )
        .unwrap();
        let fu = entry.follow_up.unwrap();
        assert_eq!(fu.prompt, "Want a quote?");
        assert_eq!(fu.trigger_keywords, vec!["yes", "quote"]);
    }

    #[test]
    fn test_guestbook_request_serializes_tagged() {
        let req = GuestbookRequest::Sign {
            name: "Alex".to_string(),
            message: "nice site".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["op"], "sign");
        assert_eq!(json["name"], "Alex");
    }

    #[test]
    fn test_chat_reply_omits_empty_optionals() {
        let reply = ChatReply {
            session_id: Uuid::nil(),
            kind: ReplyKind::Assistant,
            text: "hi".to_string(),
            topic: None,
            follow_up_prompt: None,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["kind"], "assistant");
        assert!(json.get("topic").is_none());
        assert!(json.get("follow_up_prompt").is_none());
    }

    #[test]
    fn test_turn_outcome_is_external() {
        let delegate = TurnOutcome::DelegateToLanguageModel {
            original_text: "x".to_string(),
        };
        assert!(delegate.is_external());
        assert!(TurnOutcome::Guestbook(GuestbookRequest::List).is_external());
        let local = TurnOutcome::LocalReply {
            topic: "t".to_string(),
            text: "x".to_string(),
            follow_up_prompt: None,
        };
        assert!(!local.is_external());
    }
}
