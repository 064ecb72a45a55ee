use crate::api::{ApiError, ChatProvider, Message};
use crate::constants::{AI_MAX_TOKENS, AI_REQUEST_TIMEOUT, AI_TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub struct OpenAiCompatibleProvider {
    client: Client,
    pub name: String,
    pub base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(AI_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            name,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub(crate) fn build_body(model: &str, messages: &[Message]) -> serde_json::Value {
    json!({
        "model": model,
        "messages": messages,
        "temperature": AI_TEMPERATURE,
        "max_tokens": AI_MAX_TOKENS
    })
}

/// Extracts `choices[0].message.content` from a 2xx body.
pub(crate) fn parse_completion(body: &str) -> Result<String, ApiError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|_| ApiError::EmptyResponse)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ApiError::EmptyResponse)
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&build_body(model, messages))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        parse_completion(&body)
    }
}
