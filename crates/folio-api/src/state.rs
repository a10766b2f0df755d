//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use folio_chat::ChatOrchestrator;
use folio_core::FolioConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (read-only after startup).
    pub config: Arc<FolioConfig>,
    /// Chat sessions, catalogue and guestbook access.
    pub chat: Arc<ChatOrchestrator>,
    /// Bearer token for the session management routes.
    pub admin_token: Arc<str>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: FolioConfig, chat: ChatOrchestrator, admin_token: impl Into<Arc<str>>) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            admin_token: admin_token.into(),
            start_time: Instant::now(),
        }
    }
}
