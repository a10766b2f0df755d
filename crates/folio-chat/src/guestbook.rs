//! Guestbook store reached through the `guestbook` and `sign` commands.

use async_trait::async_trait;
use chrono::Utc;
use folio_core::config::GuestbookConfig;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::GuestbookEntry;

/// Storage for signed guestbook lines.
#[async_trait]
pub trait GuestbookStore: Send + Sync {
    /// Newest entries first, at most `limit`.
    async fn list(&self, limit: usize) -> Result<Vec<GuestbookEntry>, ChatError>;

    /// Validate and store a new entry.
    async fn append(&self, name: &str, message: &str) -> Result<GuestbookEntry, ChatError>;
}

/// Process-local guestbook, bounded to `max_entries` with the oldest dropped.
pub struct InMemoryGuestbook {
    entries: RwLock<Vec<GuestbookEntry>>,
    max_name_length: usize,
    max_message_length: usize,
    max_entries: usize,
}

impl InMemoryGuestbook {
    pub fn new(config: &GuestbookConfig) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_name_length: config.max_name_length,
            max_message_length: config.max_message_length,
            max_entries: config.max_entries,
        }
    }
}

#[async_trait]
impl GuestbookStore for InMemoryGuestbook {
    async fn list(&self, limit: usize) -> Result<Vec<GuestbookEntry>, ChatError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn append(&self, name: &str, message: &str) -> Result<GuestbookEntry, ChatError> {
        let name = name.trim();
        let message = message.trim();
        if name.is_empty() || message.is_empty() {
            return Err(ChatError::InvalidGuestbookEntry(
                "name and message required".to_string(),
            ));
        }
        if name.chars().count() > self.max_name_length {
            return Err(ChatError::InvalidGuestbookEntry(format!(
                "name exceeds {} characters",
                self.max_name_length
            )));
        }
        if message.chars().count() > self.max_message_length {
            return Err(ChatError::InvalidGuestbookEntry(format!(
                "message exceeds {} characters",
                self.max_message_length
            )));
        }

        let entry = GuestbookEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };
        let mut entries = self.entries.write().await;
        entries.push(entry.clone());
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
            tracing::debug!(dropped = excess, "Guestbook trimmed");
        }
        drop(entries);
        tracing::info!(entry_id = %entry.id, "Guestbook signed");
        Ok(entry)
    }
}

/// Render entries the way the terminal prints them.
pub fn format_entries(entries: &[GuestbookEntry]) -> String {
    if entries.is_empty() {
        return "Guestbook empty.".to_string();
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "[{}] {}: {}",
                e.created_at.format("%Y-%m-%d"),
                e.name,
                e.message
            )
        })
        .collect();
    format!("DATA:\n{}", lines.join("\n"))
}
