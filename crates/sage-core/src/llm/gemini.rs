//! Gemini REST backend for the generative-text capability.
//!
//! Talks to `models/<id>:generateContent`. Tier selection picks the model
//! id; safety refusals surface as [`ModelError::Blocked`], both when the
//! prompt itself is rejected (`promptFeedback.blockReason`) and when the
//! candidate is cut off with a safety finish reason.

use std::time::Duration;

use serde::Deserialize;

use super::{ModelError, TextModel, TextRequest};

/// Finish reasons that mean the reply was withheld, not generated.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST"];

/// How much of an error body to keep in messages.
const ERROR_EXCERPT_CHARS: usize = 300;

/// Connection settings for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

/// Gemini client implementing [`TextModel`].
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn generate_url(&self, model_id: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/v1beta/models/{model_id}:generateContent")
    }
}

// ---------------------------------------------------------------------------
// Wire types (response side; the request body is assembled inline)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[async_trait::async_trait]
impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(&self, request: &TextRequest) -> Result<String, ModelError> {
        let model_id = request.tier.model_id();
        let url = self.generate_url(model_id);

        tracing::debug!(
            model = model_id,
            temperature = request.temperature,
            prompt_chars = request.prompt.system.len() + request.prompt.user.len(),
            "invoking gemini"
        );

        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": request.prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt.user }] }],
            "generationConfig": { "temperature": request.temperature },
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = excerpt(&response.text().await.unwrap_or_default());
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateReply = response.json().await.map_err(ModelError::Decode)?;

        if let Some(feedback) = &reply.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(ModelError::Blocked {
                    reason: reason.clone(),
                });
            }
        }

        let candidate = reply.candidates.into_iter().next().ok_or(ModelError::NoText)?;
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(ModelError::Blocked {
                    reason: reason.to_string(),
                });
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ModelError::NoText);
        }

        tracing::debug!(model = model_id, reply_chars = text.len(), "gemini replied");
        Ok(text)
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= ERROR_EXCERPT_CHARS {
        return text.to_string();
    }
    let kept: String = text.chars().take(ERROR_EXCERPT_CHARS).collect();
    format!("{kept}...")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
