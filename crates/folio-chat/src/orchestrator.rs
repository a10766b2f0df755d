//! Chat orchestrator: owns sessions and history, runs turns, and performs the
//! guestbook and language-model side effects a turn asks for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone, Timelike};
use folio_core::config::{ChatConfig, GuestbookConfig, LlmConfig};
use folio_core::FolioConfig;
use uuid::Uuid;

use crate::commands::{LocalCommand, CLEAR_OUTPUT};
use crate::error::ChatError;
use crate::guestbook::{format_entries, GuestbookStore};
use crate::llm::{CompletionPrompt, LanguageModel};
use crate::session::{ConversationEngine, SessionState};
use crate::types::{
    ChatMessage, ChatReply, ConversationSession, GuestbookRequest, MessageRole, ReplyKind,
    SessionSummary, TurnOutcome,
};

const DB_ERROR: &str = "DB Error.";
const SIGN_OK: &str = "Signature saved.";
const SIGN_FAILED: &str = "Save failed.";

/// Central coordinator between the conversation engine and its collaborators.
pub struct ChatOrchestrator {
    engine: ConversationEngine,
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
    messages: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    guestbook: Arc<dyn GuestbookStore>,
    config: ChatConfig,
    llm_config: LlmConfig,
    guestbook_config: GuestbookConfig,
}

impl ChatOrchestrator {
    pub fn new(
        engine: ConversationEngine,
        guestbook: Arc<dyn GuestbookStore>,
        config: &FolioConfig,
    ) -> Self {
        Self {
            engine,
            sessions: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            language_model: None,
            guestbook,
            config: config.chat.clone(),
            llm_config: config.llm.clone(),
            guestbook_config: config.guestbook.clone(),
        }
    }

    /// Attach the model used for unmatched input.
    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    pub fn guestbook(&self) -> &Arc<dyn GuestbookStore> {
        &self.guestbook
    }

    /// Handle an incoming chat message.
    ///
    /// Returns the reply and the session ID (new or existing).
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<(ChatReply, Uuid), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let sid = self.resolve_session(session_id)?;

        // The turn itself is synchronous; side effects run after the lock is released.
        let (outcome, remembered_name) = {
            let mut sessions = self.lock_sessions()?;
            let session = sessions
                .get_mut(&sid)
                .ok_or(ChatError::SessionNotFound(sid))?;
            let outcome = self.engine.process_turn(&mut session.state, message);
            session.last_message_at = Local::now().timestamp();
            session.message_count += 1;
            let name = session.state.remembered_name.clone();
            (outcome, name)
        };

        let cleared = matches!(
            outcome,
            TurnOutcome::CommandHandled {
                command: LocalCommand::Clear,
                ..
            }
        );
        let reply = self
            .complete_turn(sid, outcome, remembered_name.as_deref())
            .await;

        if cleared {
            self.reset_history(sid)?;
        } else {
            self.record_exchange(sid, message, &reply.text)?;
        }

        Ok((reply, sid))
    }

    /// Open a fresh session without sending a message.
    pub fn start_session(&self) -> Result<Uuid, ChatError> {
        self.resolve_session(None)
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: Uuid) -> Option<ConversationSession> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&session_id).cloned())
    }

    /// List all active sessions as summaries, oldest first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut list: Vec<&ConversationSession> = sessions.values().collect();
        list.sort_by_key(|s| s.started_at);
        list.into_iter()
            .map(|s| SessionSummary {
                id: s.id,
                started_at: format_epoch(s.started_at),
                last_message_at: format_epoch(s.last_message_at),
                message_count: s.message_count,
                remembered_name: s.state.remembered_name.clone(),
            })
            .collect()
    }

    /// Delete a session by ID.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.remove(&session_id).is_some() {
            if let Ok(mut msgs) = self.messages.lock() {
                msgs.remove(&session_id);
            }
            tracing::info!(session_id = %session_id, "Session deleted");
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Get message history for a session.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        {
            let sessions = self.lock_sessions()?;
            if !sessions.contains_key(&session_id) {
                return Err(ChatError::SessionNotFound(session_id));
            }
        }

        let msgs = self.lock_messages()?;
        Ok(msgs.get(&session_id).cloned().unwrap_or_default())
    }

    /// Greeting lines for a session, based on the local time of day.
    pub fn opening_lines(&self, session_id: Uuid) -> Result<Vec<String>, ChatError> {
        let sessions = self.lock_sessions()?;
        let session = sessions
            .get(&session_id)
            .ok_or(ChatError::SessionNotFound(session_id))?;
        Ok(self
            .engine
            .opening_lines(&session.state, Local::now().hour()))
    }

    // -- Private helpers --

    async fn complete_turn(
        &self,
        sid: Uuid,
        outcome: TurnOutcome,
        remembered_name: Option<&str>,
    ) -> ChatReply {
        let reply = |kind: ReplyKind, text: String| ChatReply {
            session_id: sid,
            kind,
            text,
            topic: None,
            follow_up_prompt: None,
        };

        match outcome {
            TurnOutcome::LocalReply {
                topic,
                text,
                follow_up_prompt,
            } => ChatReply {
                session_id: sid,
                kind: ReplyKind::Local,
                text,
                topic: Some(topic),
                follow_up_prompt,
            },
            TurnOutcome::CommandHandled { text, .. } => reply(ReplyKind::Command, text),
            TurnOutcome::QuizAnswered { text, .. } => reply(ReplyKind::Quiz, text),
            TurnOutcome::Guestbook(GuestbookRequest::List) => {
                match self.guestbook.list(self.guestbook_config.list_limit).await {
                    Ok(entries) => reply(ReplyKind::Guestbook, format_entries(&entries)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Guestbook listing failed");
                        reply(ReplyKind::Error, DB_ERROR.to_string())
                    }
                }
            }
            TurnOutcome::Guestbook(GuestbookRequest::Sign { name, message }) => {
                match self.guestbook.append(&name, &message).await {
                    Ok(_) => reply(ReplyKind::Guestbook, SIGN_OK.to_string()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Guestbook signing failed");
                        reply(ReplyKind::Error, SIGN_FAILED.to_string())
                    }
                }
            }
            TurnOutcome::DelegateToLanguageModel { original_text } => {
                match self.ask_language_model(remembered_name, &original_text).await {
                    Ok(text) => reply(ReplyKind::Assistant, text),
                    Err(e) => {
                        tracing::warn!(session_id = %sid, error = %e, "Language model fallback");
                        reply(ReplyKind::Error, self.config.fallback_message.clone())
                    }
                }
            }
        }
    }

    async fn ask_language_model(
        &self,
        remembered_name: Option<&str>,
        text: &str,
    ) -> Result<String, ChatError> {
        let model = self
            .language_model
            .as_ref()
            .filter(|_| self.llm_config.enabled)
            .ok_or_else(|| ChatError::LlmUnavailable("no model configured".to_string()))?;
        let prompt = CompletionPrompt::persona(&self.llm_config, remembered_name, text);
        model.complete(&prompt).await
    }

    /// Resolve or create a session ID. Expired sessions are replaced.
    fn resolve_session(&self, requested: Option<Uuid>) -> Result<Uuid, ChatError> {
        let mut sessions = self.lock_sessions()?;
        let now = Local::now().timestamp();

        if let Some(sid) = requested {
            if let Some(session) = sessions.get(&sid) {
                if !self.is_expired(session, now) {
                    return Ok(sid);
                }
                tracing::debug!(session_id = %sid, "Session expired");
                sessions.remove(&sid);
                if let Ok(mut msgs) = self.messages.lock() {
                    msgs.remove(&sid);
                }
            }
        }

        self.evict_sessions(&mut sessions, now);

        let session = ConversationSession {
            id: Uuid::new_v4(),
            started_at: now,
            last_message_at: now,
            message_count: 0,
            state: SessionState::default(),
        };
        let sid = session.id;
        sessions.insert(sid, session);
        tracing::info!(session_id = %sid, "Session created");
        Ok(sid)
    }

    /// Drop expired sessions, then the least recently active ones until a
    /// new session fits under `chat.max_sessions`.
    fn evict_sessions(&self, sessions: &mut HashMap<Uuid, ConversationSession>, now: i64) {
        let mut evicted: Vec<Uuid> = sessions
            .values()
            .filter(|s| self.is_expired(s, now))
            .map(|s| s.id)
            .collect();
        sessions.retain(|_, s| !self.is_expired(s, now));

        let max = self.config.max_sessions;
        if sessions.len() >= max {
            let mut by_activity: Vec<(i64, Uuid)> = sessions
                .values()
                .map(|s| (s.last_message_at, s.id))
                .collect();
            by_activity.sort();
            let excess = sessions.len() + 1 - max;
            for (_, id) in by_activity.into_iter().take(excess) {
                sessions.remove(&id);
                evicted.push(id);
            }
        }

        if evicted.is_empty() {
            return;
        }
        if let Ok(mut msgs) = self.messages.lock() {
            for id in &evicted {
                msgs.remove(id);
            }
        }
        tracing::debug!(count = evicted.len(), "Sessions evicted");
    }

    fn is_expired(&self, session: &ConversationSession, now: i64) -> bool {
        let timeout_secs = i64::from(self.config.session_timeout_minutes) * 60;
        now - session.last_message_at > timeout_secs
    }

    fn record_exchange(&self, sid: Uuid, user: &str, reply: &str) -> Result<(), ChatError> {
        let now = Local::now().timestamp();
        let mut msgs = self.lock_messages()?;
        let history = msgs.entry(sid).or_default();
        history.push(new_message(sid, MessageRole::User, user, now));
        history.push(new_message(sid, MessageRole::Assistant, reply, now));

        let limit = self.config.history_limit;
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
        Ok(())
    }

    fn reset_history(&self, sid: Uuid) -> Result<(), ChatError> {
        let now = Local::now().timestamp();
        let mut msgs = self.lock_messages()?;
        msgs.insert(
            sid,
            vec![new_message(sid, MessageRole::System, CLEAR_OUTPUT, now)],
        );
        Ok(())
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, ConversationSession>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }

    fn lock_messages(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Vec<ChatMessage>>>, ChatError> {
        self.messages
            .lock()
            .map_err(|e| ChatError::StorageError(format!("messages lock poisoned: {}", e)))
    }
}

fn new_message(session_id: Uuid, role: MessageRole, content: &str, at: i64) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        session_id,
        role,
        content: content.to_string(),
        created_at: at,
    }
}

/// Format epoch seconds as ISO 8601 string.
fn format_epoch(epoch: i64) -> String {
    chrono::Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

// =============================================================================
// Tests
// =============================================================================
