//! HTTP client for the remote prompt store.
//!
//! The store addresses templates as `<repo>/<name>`, with `:<version>`
//! appended when a specific version is requested. `latest` (or no version)
//! means the unsuffixed path.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::template::PromptTemplate;

/// Connection settings for the prompt store.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL, e.g. `https://hub.internal.example`.
    pub base_url: String,
    /// Bearer token, if the store requires one.
    pub api_key: Option<String>,
    /// Repository handle that owns the templates.
    pub repo: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl HubConfig {
    pub const DEFAULT_REPO: &'static str = "sage/study-planner";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            repo: Self::DEFAULT_REPO.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Error talking to the prompt store.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("prompt store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("prompt store returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("prompt store payload was not a template: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct TemplatePayload {
    system: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct PushReceipt {
    version: String,
}

/// Client for one prompt store.
#[derive(Debug, Clone)]
pub struct PromptHub {
    http: reqwest::Client,
    config: HubConfig,
}

impl PromptHub {
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// `<base>/v1/prompts/<repo>/<name>[:<version>]`
    fn prompt_url(&self, name: &str, version: Option<&str>) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match version {
            Some(v) if v != "latest" => {
                format!("{base}/v1/prompts/{}/{name}:{v}", self.config.repo)
            }
            _ => format!("{base}/v1/prompts/{}/{name}", self.config.repo),
        }
    }

    /// Fetch one template version from the store.
    pub async fn fetch(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PromptTemplate, HubError> {
        let url = self.prompt_url(name, version);
        let mut request = self.http.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HubError::Status {
                status: response.status().as_u16(),
                path: url,
            });
        }

        let payload: TemplatePayload = response.json().await.map_err(HubError::Decode)?;
        Ok(PromptTemplate {
            system: payload.system,
            user: payload.user,
        })
    }

    /// Publish a new version of a template. Returns the version identifier
    /// the store assigned.
    pub async fn push(&self, name: &str, template: &PromptTemplate) -> Result<String, HubError> {
        let url = self.prompt_url(name, None);
        let mut request = self.http.post(&url).json(&TemplatePayload {
            system: template.system.clone(),
            user: template.user.clone(),
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HubError::Status {
                status: response.status().as_u16(),
                path: url,
            });
        }

        let receipt: PushReceipt = response.json().await.map_err(HubError::Decode)?;
        Ok(receipt.version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
