use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FolioError, Result};

/// Top-level configuration for the Folio service.
///
/// Loaded from `~/.folio/config.toml` by default. Each section corresponds
/// to one concern of the running service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub guestbook: GuestbookConfig,
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FolioConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(FolioError::Config(format!(
                "unknown log level '{}'",
                self.general.log_level
            )));
        }
        if self.server.rate_limit_per_sec == 0 {
            return Err(FolioError::Config(
                "server.rate_limit_per_sec must be greater than zero".to_string(),
            ));
        }
        if self.chat.max_message_length == 0 {
            return Err(FolioError::Config(
                "chat.max_message_length must be greater than zero".to_string(),
            ));
        }
        if self.chat.history_limit == 0 {
            return Err(FolioError::Config(
                "chat.history_limit must be greater than zero".to_string(),
            ));
        }
        if self.chat.max_sessions == 0 {
            return Err(FolioError::Config(
                "chat.max_sessions must be greater than zero".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(FolioError::Config(
                "llm.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.guestbook.list_limit == 0 {
            return Err(FolioError::Config(
                "guestbook.list_limit must be greater than zero".to_string(),
            ));
        }
        if self.guestbook.max_name_length == 0 || self.guestbook.max_entries == 0 {
            return Err(FolioError::Config(
                "guestbook.max_name_length and guestbook.max_entries must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port; 0 means "use the built-in default".
    pub port: u16,
    /// Requests per second accepted on the chat routes.
    pub rate_limit_per_sec: u64,
    /// Origins allowed by CORS (the portfolio front end).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit_per_sec: 20,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Terminal chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the chat endpoint answers at all.
    pub enabled: bool,
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Idle minutes after which a session is replaced.
    pub session_timeout_minutes: u32,
    /// Messages of history kept per session.
    pub history_limit: usize,
    /// Live sessions kept before the least recently active are evicted.
    pub max_sessions: usize,
    /// Optional TOML catalogue replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalogue_path: Option<String>,
    /// Reply shown when the language model cannot be reached.
    pub fallback_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_length: 500,
            session_timeout_minutes: 30,
            history_limit: 100,
            max_sessions: 1000,
            catalogue_path: None,
            fallback_message:
                "Unable to reach the assistant. Try a local command like help or start quiz."
                    .to_string(),
        }
    }
}

/// External language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether unmatched input is forwarded to the model.
    pub enabled: bool,
    /// Model name, e.g. "gemini-pro".
    pub model: String,
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Name of the site owner the assistant speaks for.
    pub owner_name: String,
    /// Contact address the assistant hands out.
    pub owner_email: String,
    /// One-line description of the owner's role.
    pub owner_role: String,
    /// Skills the assistant may mention.
    pub owner_skills: Vec<String>,
    /// Projects the assistant may mention; anything else is off limits.
    pub owner_projects: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_secs: 20,
            owner_name: "Edward Magejo".to_string(),
            owner_email: "edwardmagejo@gmail.com".to_string(),
            owner_role: "Technical Consultant, Full Stack Dev".to_string(),
            owner_skills: [
                "React",
                "Next.js",
                "Python",
                "Node.js",
                "Cybersecurity",
                "Cloud (Azure/GCP)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            owner_projects: vec![
                "FinSys 2.0 (Financial Dashboard, Real-time websockets)".to_string(),
                "SecureNet (VPN/Firewall Config Tool)".to_string(),
            ],
        }
    }
}

/// Guestbook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestbookConfig {
    /// Entries returned by a listing.
    pub list_limit: usize,
    /// Maximum message length in characters.
    pub max_message_length: usize,
    /// Maximum signer name length in characters.
    pub max_name_length: usize,
    /// Stored entries; the oldest are dropped past this.
    pub max_entries: usize,
}

impl Default for GuestbookConfig {
    fn default() -> Self {
        Self {
            list_limit: 5,
            max_message_length: 280,
            max_name_length: 40,
            max_entries: 500,
        }
    }
}
