//! Conversation session state machine.
//!
//! Sequences one visitor turn: an open quiz question overrides everything,
//! then a pending follow-up, then reserved commands, then name capture,
//! and finally the catalogue. Anything left over is handed back to the
//! caller for the language model.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalogue::Catalogue;
use crate::commands::{capture_name, time_greeting, LocalCommand, CLEAR_OUTPUT, LS_OUTPUT};
use crate::matcher::{contains_any, normalize, IntentMatcher, MatchResult, ResponseSelector};
use crate::types::{FollowUp, GuestbookRequest, QuizQuestion, TurnOutcome};

/// Topic reported for name-capture acknowledgements.
pub const IDENTITY_TOPIC: &str = "identity";

const ANONYMOUS: &str = "Anon";
const UNNAMED: &str = "friend";

// =============================================================================
// SessionState
// =============================================================================

/// A follow-up question waiting for the visitor's next turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFollowUp {
    pub topic: String,
    pub follow_up: FollowUp,
}

/// Active sub-mode of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "question", rename_all = "snake_case")]
pub enum SubMode {
    #[default]
    Default,
    Quiz(QuizQuestion),
}

/// Per-conversation state, owned exclusively by its session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub pending_follow_up: Option<PendingFollowUp>,
    pub remembered_name: Option<String>,
    pub mode: SubMode,
}

impl SessionState {
    pub fn in_quiz(&self) -> bool {
        matches!(self.mode, SubMode::Quiz(_))
    }
}

// =============================================================================
// ConversationEngine
// =============================================================================

/// Stateless turn processor shared by all sessions.
#[derive(Clone)]
pub struct ConversationEngine {
    catalogue: Arc<Catalogue>,
    matcher: IntentMatcher,
}

impl ConversationEngine {
    pub fn new(catalogue: Arc<Catalogue>, selector: Arc<dyn ResponseSelector>) -> Self {
        Self {
            catalogue,
            matcher: IntentMatcher::new(selector),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Process one visitor turn, updating `state` in place.
    pub fn process_turn(&self, state: &mut SessionState, input: &str) -> TurnOutcome {
        if let SubMode::Quiz(question) = std::mem::take(&mut state.mode) {
            return answer_quiz(&question, input);
        }

        if let Some(pending) = state.pending_follow_up.take() {
            if contains_any(&normalize(input), &pending.follow_up.trigger_keywords) {
                debug!(topic = %pending.topic, "Follow-up accepted");
                return TurnOutcome::LocalReply {
                    topic: pending.topic,
                    text: render(&pending.follow_up.response, state),
                    follow_up_prompt: None,
                };
            }
            debug!(topic = %pending.topic, "Follow-up dropped");
        }

        if let Some(command) = LocalCommand::parse(input) {
            return self.run_command(state, command);
        }

        if let Some(name) = capture_name(input) {
            debug!("Visitor name captured");
            let text = format!("Nice to meet you, {name}. Memory updated. 🔋");
            state.remembered_name = Some(name);
            return TurnOutcome::LocalReply {
                topic: IDENTITY_TOPIC.to_string(),
                text,
                follow_up_prompt: None,
            };
        }

        match self.matcher.match_input(input, self.catalogue.topics()) {
            MatchResult::Matched { entry, response } => {
                let follow_up_prompt = entry.follow_up.as_ref().map(|fu| {
                    state.pending_follow_up = Some(PendingFollowUp {
                        topic: entry.topic.clone(),
                        follow_up: fu.clone(),
                    });
                    fu.prompt.clone()
                });
                TurnOutcome::LocalReply {
                    topic: entry.topic.clone(),
                    text: render(response, state),
                    follow_up_prompt,
                }
            }
            MatchResult::Unmatched => TurnOutcome::DelegateToLanguageModel {
                original_text: input.to_string(),
            },
        }
    }

    /// Lines printed when a session opens.
    pub fn opening_lines(&self, state: &SessionState, hour: u32) -> Vec<String> {
        match &state.remembered_name {
            Some(name) => vec![format!("Welcome back, {name}. Systems optimized for you. 🔋")],
            None => vec![
                format!("Initializing terminal... {}.", time_greeting(hour)),
                "Who am I speaking with? (Type 'My name is...')".to_string(),
            ],
        }
    }

    fn run_command(&self, state: &mut SessionState, command: LocalCommand) -> TurnOutcome {
        debug!(command = ?command, "Reserved command");
        let text = match &command {
            LocalCommand::StartQuiz => match self.matcher.choose(self.catalogue.quiz_bank()) {
                Some(question) => {
                    let prompt = question.prompt.clone();
                    state.mode = SubMode::Quiz(question.clone());
                    prompt
                }
                None => "No trivia loaded. Try again later.".to_string(),
            },
            LocalCommand::Clear => CLEAR_OUTPUT.to_string(),
            LocalCommand::List => LS_OUTPUT.to_string(),
            LocalCommand::Date => now_string(),
            LocalCommand::Guestbook => return TurnOutcome::Guestbook(GuestbookRequest::List),
            LocalCommand::Sign(message) => {
                let name = state
                    .remembered_name
                    .clone()
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                return TurnOutcome::Guestbook(GuestbookRequest::Sign {
                    name,
                    message: message.clone(),
                });
            }
        };
        TurnOutcome::CommandHandled { command, text }
    }
}

fn answer_quiz(question: &QuizQuestion, input: &str) -> TurnOutcome {
    let correct = contains_any(&normalize(input), &question.answer_keywords);
    debug!(question = %question.id, correct, "Quiz answered");
    let text = if correct {
        &question.correct_response
    } else {
        &question.incorrect_response
    };
    TurnOutcome::QuizAnswered {
        question_id: question.id.clone(),
        correct,
        text: text.clone(),
    }
}

/// Fill `{name}` and `{date}` placeholders in a catalogue response.
fn render(template: &str, state: &SessionState) -> String {
    let mut text = template.replace(
        "{name}",
        state.remembered_name.as_deref().unwrap_or(UNNAMED),
    );
    if text.contains("{date}") {
        text = text.replace("{date}", &now_string());
    }
    text
}

fn now_string() -> String {
    Local::now().format("%a %b %d %Y %H:%M:%S %z").to_string()
}

// =============================================================================
// Tests
// =============================================================================
