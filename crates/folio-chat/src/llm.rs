//! Language-model fallback for messages the catalogue cannot answer.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::config::LlmConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// A single completion request: persona instructions plus the visitor's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    pub system: String,
    pub message: String,
}

impl CompletionPrompt {
    /// Build the persona prompt for `message`, mentioning the visitor by name
    /// when one has been captured.
    pub fn persona(config: &LlmConfig, remembered_name: Option<&str>, message: &str) -> Self {
        let projects: String = config
            .owner_projects
            .iter()
            .enumerate()
            .map(|(i, p)| format!("\n  {}. {p}", i + 1))
            .collect();
        let mut system = format!(
            "You are the terminal interface of {owner}'s portfolio.\n\
             Persona: professional, concise, slightly witty system console.\n\
             CONTEXT:\n\
             - Creator: {owner} ({role}).\n\
             - Skills: {skills}.\n\
             - Projects:{projects}\n\
             INSTRUCTIONS:\n\
             - Keep answers short and terminal-like (\"Accessing...\", \"Verified.\").\n\
             - If asked about contact, provide: {email}.\n\
             - If asked about the guestbook, tell them to type 'guestbook' to view it or 'sign <message>' to sign it.\n\
             - Do NOT invent projects not listed above, or credentials.",
            owner = config.owner_name,
            role = config.owner_role,
            skills = config.owner_skills.join(", "),
            email = config.owner_email,
        );
        if let Some(name) = remembered_name {
            system.push_str(&format!("\n- The visitor's name is {name}. Address them by name."));
        }
        Self {
            system,
            message: message.to_string(),
        }
    }
}

/// Anything that can turn a prompt into reply text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, ChatError>;
}

// ---- Gemini wire format ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request(prompt: &CompletionPrompt) -> GenerateRequest<'_> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![RequestPart {
                text: &prompt.system,
            }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![RequestPart {
                text: &prompt.message,
            }],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ChatError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ChatError::LlmError("empty response".to_string()));
    }
    Ok(text)
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::LlmUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from config, reading the key from `llm.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ChatError::LlmUnavailable(format!("{} is not set", config.api_key_env))
            })?;
        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// The key travels in the `x-goog-api-key` header, never in the URL.
    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, ChatError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(|e| {
                ChatError::LlmUnavailable(format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::LlmError(format!("status {status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| {
                ChatError::LlmError(format!("failed to parse response: {}", e.without_url()))
            })?;
        extract_text(parsed)
    }
}
