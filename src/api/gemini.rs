use crate::api::{ApiError, ChatProvider, Message, MessageRole};
use crate::constants::{AI_MAX_TOKENS, AI_REQUEST_TIMEOUT, AI_TEMPERATURE};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct GeminiProvider {
    client: Client,
    pub name: String,
    pub base_url: String,
}

impl GeminiProvider {
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

// --- request ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

// --- response ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// System messages become `systemInstruction`; the rest map to user/model turns.
fn build_request(messages: &[Message]) -> GenerateRequest {
    let system: Vec<Part> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| Part {
            text: m.content.clone(),
        })
        .collect();

    let contents = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| Content {
            role: Some(match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            }),
            parts: vec![Part {
                text: m.content.clone(),
            }],
        })
        .collect();

    GenerateRequest {
        system_instruction: if system.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: system,
            })
        },
        contents,
        generation_config: GenerationConfig {
            temperature: AI_TEMPERATURE,
            max_output_tokens: AI_MAX_TOKENS,
        },
    }
}

pub(crate) fn parse_generation(body: &str) -> Result<String, ApiError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|_| ApiError::EmptyResponse)?;
    let text = parsed
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        Err(ApiError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ApiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&build_request(messages))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        parse_generation(&body)
    }
}
