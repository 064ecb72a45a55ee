//! Request and result types shared by the controller, bridge and dispatcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    Explain,
    CustomQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub kind: QueryKind,
    pub text: String,
    pub question: Option<String>,
}

impl QueryRequest {
    pub fn explain(text: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Explain,
            text: text.into(),
            question: None,
        }
    }

    pub fn custom(text: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::CustomQuestion,
            text: text.into(),
            question: Some(question.into()),
        }
    }

    /// Checks the question/kind invariant before anything is loaded or sent.
    ///
    /// A custom question without a question fails as `QuestionRequired` whatever the text.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.kind == QueryKind::CustomQuestion {
            let blank = self
                .question
                .as_deref()
                .map(|q| q.trim().is_empty())
                .unwrap_or(true);
            if blank {
                return Err(QueryError::QuestionRequired);
            }
        }
        if self.text.trim().is_empty() {
            return Err(QueryError::EmptyText);
        }
        Ok(())
    }

    /// The question, trimmed, only for `CustomQuestion`.
    pub fn question(&self) -> Option<&str> {
        match self.kind {
            QueryKind::Explain => None,
            QueryKind::CustomQuestion => self.question.as_deref().map(str::trim),
        }
    }
}

/// Every way a dispatch can fail. Returned as data, never raised across the bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Missing credential or unreadable settings.
    #[error("{0}")]
    Config(String),
    /// Network failure or timeout.
    #[error("{0}")]
    Transport(String),
    /// Provider answered with a non-2xx status.
    #[error("{message}")]
    Provider { status: u16, message: String },
    #[error("no response received")]
    EmptyResponse,
    #[error("a question is required")]
    QuestionRequired,
    #[error("no text selected")]
    EmptyText,
    /// The worker could not be reached or dropped the reply.
    #[error("{0}")]
    Bridge(String),
}

impl QueryError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome delivered back to the page. Exactly one of `response`/`error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl QueryResult {
    pub fn success(response: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            error: None,
            model_used: Some(model.into()),
            status_code: None,
        }
    }

    pub fn failure(error: &QueryError) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.to_string()),
            model_used: None,
            status_code: error.status_code(),
        }
    }
}
