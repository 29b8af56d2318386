//! The generative-text capability: tiered, temperature-controlled
//! text-in/text-out.
//!
//! The pipeline only ever sees [`TextModel`]; the production backend is the
//! Gemini client in [`gemini`], and tests swap in scripted fakes.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::RenderedPrompt;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Capability tier a request runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Fast and cheap; the default for routine requests.
    Flash,
    /// Deeper reasoning for requests classified as hard.
    Pro,
}

impl ModelTier {
    /// Backend model identifier for this tier.
    pub fn model_id(self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::Pro => "gemini-2.5-pro",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Flash => "flash",
            Self::Pro => "pro",
        };
        f.write_str(s)
    }
}

impl FromStr for ModelTier {
    type Err = ModelTierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flash" => Ok(Self::Flash),
            "pro" => Ok(Self::Pro),
            other => Err(ModelTierParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ModelTier`] string.
#[derive(Debug, Clone)]
pub struct ModelTierParseError(pub String);

impl fmt::Display for ModelTierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid model tier: {:?}", self.0)
    }
}

impl std::error::Error for ModelTierParseError {}

// ---------------------------------------------------------------------------
// Requests and errors
// ---------------------------------------------------------------------------

/// One generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: RenderedPrompt,
    pub temperature: f64,
    pub tier: ModelTier,
}

/// Error from the generative backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("generative backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generative backend returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request blocked by the backend safety filter: {reason}")]
    Blocked { reason: String },
    #[error("generative backend reply was not decodable: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("generative backend reply contained no text")]
    NoText,
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Object-safe interface to a generative-text backend.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Generate a raw text reply for one request.
    async fn invoke(&self, request: &TextRequest) -> Result<String, ModelError>;
}

// Compile-time check that the trait stays object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextModel) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
