//! Reserved terminal commands and identity capture.
//!
//! Commands are recognised on the trimmed, lowercased input and are handled
//! before the catalogue is consulted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A command answered locally without the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalCommand {
    StartQuiz,
    Clear,
    List,
    Date,
    Guestbook,
    /// `sign <message>`; the message keeps its original casing.
    Sign(String),
}

impl LocalCommand {
    /// Recognise a reserved command in `input`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "start quiz" => Some(LocalCommand::StartQuiz),
            "clear" => Some(LocalCommand::Clear),
            "ls" => Some(LocalCommand::List),
            "date" => Some(LocalCommand::Date),
            "guestbook" => Some(LocalCommand::Guestbook),
            _ if lower.starts_with("sign ") => {
                let message = trimmed.get(5..).unwrap_or_default().trim();
                Some(LocalCommand::Sign(message.to_string()))
            }
            _ => None,
        }
    }
}

/// Listing shown by `ls`.
pub const LS_OUTPUT: &str = "drwxr-xr-x  projects/\n-rw-r--r--  contact.txt";

/// Reply to `clear`; also the only history line left afterwards.
pub const CLEAR_OUTPUT: &str = "Console cleared.";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmy\s+name\s+is\s+(.+)").expect("Invalid name regex"));

/// Extract `X` from "my name is X", keeping the original casing.
pub fn capture_name(input: &str) -> Option<String> {
    let caps = NAME_RE.captures(input)?;
    let name = caps
        .get(1)?
        .as_str()
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';'))
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Greeting for an hour of the day (0-23).
pub fn time_greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}
