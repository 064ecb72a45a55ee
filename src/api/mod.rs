use crate::config::{ProviderKind, ProviderProfile};
use crate::query::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod gemini;
pub mod openai_compat;

use crate::api::gemini::GeminiProvider;
use crate::api::openai_compat::OpenAiCompatibleProvider;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Outcome of a single provider attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, timeout or body read failure.
    #[error("{0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("{message}")]
    Status { code: u16, message: String },
    /// 2xx without usable text.
    #[error("no response received")]
    EmptyResponse,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Builds a status error from a response body, preferring the provider's own message.
    pub fn from_status(code: u16, body: &str) -> Self {
        let message = structured_error_message(body)
            .unwrap_or_else(|| format!("request failed with status {}", code));
        Self::Status { code, message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else {
            Self::Transport(format!("network error: {}", e))
        }
    }
}

impl From<ApiError> for QueryError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Transport(message) => QueryError::Transport(message),
            ApiError::Status { code, message } => QueryError::Provider {
                status: code,
                message,
            },
            ApiError::EmptyResponse => QueryError::EmptyResponse,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Pulls `error.message` (or a bare `error` string) out of a provider error body.
fn structured_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = match envelope.error {
        ErrorBody::Detailed { message } => message,
        ErrorBody::Plain(message) => message,
    };
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

/// A chat-completion backend. One call is one attempt; retries live in the dispatcher.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError>;
}

pub fn create_provider(profile: &ProviderProfile) -> Arc<dyn ChatProvider> {
    match profile.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            profile.name.clone(),
            profile.base_url.clone(),
        )),
        ProviderKind::OpenAiCompatible => Arc::new(OpenAiCompatibleProvider::new(
            profile.name.clone(),
            profile.base_url.clone(),
        )),
    }
}
