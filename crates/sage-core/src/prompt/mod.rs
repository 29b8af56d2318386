//! Versioned prompt templates: a remote store with a compiled-in fallback.
//!
//! Each generation stage has a named template in the store. Reads fall back
//! to the local catalog on any store failure, so resolution never fails;
//! writes go to the store or nowhere.

pub mod catalog;
pub mod hub;
pub mod resolver;
pub mod template;

pub use hub::{HubConfig, HubError, PromptHub};
pub use resolver::{PromptResolver, PushError};
pub use template::{PromptTemplate, RenderedPrompt, TemplateError};

use std::fmt;
use std::str::FromStr;

/// The five generation stages with templates in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Plan,
    Render,
    Judge,
    Refine,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Classify,
        Stage::Plan,
        Stage::Render,
        Stage::Judge,
        Stage::Refine,
    ];

    /// Name of this stage's template in the prompt store.
    pub fn store_name(self) -> &'static str {
        match self {
            Self::Classify => "router-classifier",
            Self::Plan => "study-planner",
            Self::Render => "html-generator",
            Self::Judge => "quality-judge",
            Self::Refine => "plan-refiner",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Classify => "classify",
            Self::Plan => "plan",
            Self::Render => "render",
            Self::Judge => "judge",
            Self::Refine => "refine",
        };
        f.write_str(s)
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classify" => Ok(Self::Classify),
            "plan" => Ok(Self::Plan),
            "render" => Ok(Self::Render),
            "judge" => Ok(Self::Judge),
            "refine" => Ok(Self::Refine),
            other => Err(StageParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Stage`] string.
#[derive(Debug, Clone)]
pub struct StageParseError(pub String);

impl fmt::Display for StageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid stage: {:?} (expected one of classify, plan, render, judge, refine)", self.0)
    }
}

impl std::error::Error for StageParseError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
