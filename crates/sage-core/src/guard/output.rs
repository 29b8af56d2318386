//! Output guard: recovers typed values from raw model text.
//!
//! Models are asked for bare JSON but reply with whatever they like:
//! markdown fences, prose around the object, stray commentary. The guard
//! runs an ordered recovery ladder over the reply and validates every
//! candidate against the target schema:
//!
//! 1. direct -- the trimmed reply parsed as-is
//! 2. fenced block -- each ```-fenced block, in order of appearance
//! 3. brace span -- the substring from the first `{` to the last `}`
//!
//! When every tier fails, the reported error is the one from the direct
//! tier. Later tiers fail on mangled fragments and their errors only
//! obscure what went wrong.

use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::schema::{RouterDecision, StudyPlan, Validate, ValidationError};

// ---------------------------------------------------------------------------
// Target schemas
// ---------------------------------------------------------------------------

/// A schema type the guard can recover from model text.
pub trait StructuredOutput: DeserializeOwned + Validate {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Compiled-in outline of the expected JSON shape.
    fn shape() -> &'static str;
}

const ROUTER_DECISION_SHAPE: &str = r#"{
  "complexity": "easy" or "hard",
  "confidence": number between 0.0 and 1.0,
  "reason": "one short sentence, at most 500 characters"
}"#;

const STUDY_PLAN_SHAPE: &str = r##"{
  "title": "plan title, 1-200 characters",
  "start_date": "YYYY-MM-DD",
  "end_date": "YYYY-MM-DD, not before start_date",
  "subjects": [
    {
      "name": "subject name, 1-100 characters",
      "priority": "high" or "medium" or "low",
      "total_hours": number greater than 0 and at most 100,
      "color": "#RRGGBB"
    }
  ],
  "schedule": [
    {
      "date": "YYYY-MM-DD",
      "day_of_week": "Monday",
      "sessions": [
        {
          "start_time": "HH:MM",
          "end_time": "HH:MM, after start_time",
          "subject": "which subject this session is for",
          "task": "what to do, 1-500 characters",
          "type": "study" or "review" or "practice" or "break",
          "notes": "optional, at most 500 characters"
        }
      ]
    }
  ],
  "milestones": [
    {
      "date": "YYYY-MM-DD",
      "title": "checkpoint, 1-200 characters",
      "description": "optional, at most 500 characters"
    }
  ],
  "tips": ["at most 10 short strings"]
}"##;

impl StructuredOutput for RouterDecision {
    const NAME: &'static str = "routing decision";

    fn shape() -> &'static str {
        ROUTER_DECISION_SHAPE
    }
}

impl StructuredOutput for StudyPlan {
    const NAME: &'static str = "study plan";

    fn shape() -> &'static str {
        STUDY_PLAN_SHAPE
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single candidate's decode failure: bad JSON or a schema violation.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Every recovery tier failed. Carries the direct tier's error, which
/// describes the reply the model actually gave.
#[derive(Debug, Error)]
#[error("could not recover a valid {target} from model output: {source}")]
pub struct ParseFailure {
    pub target: &'static str,
    #[source]
    pub source: DecodeError,
}

// ---------------------------------------------------------------------------
// Recovery ladder
// ---------------------------------------------------------------------------

/// Which ladder tier produced the accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Direct,
    FencedBlock,
    BraceSpan,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::FencedBlock => "fenced_block",
            Self::BraceSpan => "brace_span",
        };
        f.write_str(s)
    }
}

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("invalid fence pattern"));

/// All fenced-block bodies in order of appearance.
fn fenced_blocks(raw: &str) -> impl Iterator<Item = &str> {
    FENCE
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}

/// The widest `{`..`}` span, if the text contains one.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Schema-validating parser for one target type.
pub struct OutputGuard<T> {
    _target: PhantomData<T>,
}

impl<T> OutputGuard<T> {
    pub const fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for OutputGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StructuredOutput> OutputGuard<T> {
    /// Run the recovery ladder over a raw model reply.
    pub fn parse(&self, raw: &str) -> Result<T, ParseFailure> {
        let (value, tier) = self.parse_traced(raw)?;
        if tier != Recovery::Direct {
            tracing::debug!(schema = T::NAME, strategy = %tier, "recovered model output");
        }
        Ok(value)
    }

    /// Like [`parse`](Self::parse), but also reports which tier succeeded.
    pub fn parse_traced(&self, raw: &str) -> Result<(T, Recovery), ParseFailure> {
        let primary = match decode::<T>(raw.trim()) {
            Ok(value) => return Ok((value, Recovery::Direct)),
            Err(e) => e,
        };

        for block in fenced_blocks(raw) {
            if let Ok(value) = decode::<T>(block.trim()) {
                return Ok((value, Recovery::FencedBlock));
            }
        }

        if let Some(span) = brace_span(raw) {
            if let Ok(value) = decode::<T>(span) {
                return Ok((value, Recovery::BraceSpan));
            }
        }

        Err(ParseFailure {
            target: T::NAME,
            source: primary,
        })
    }

    /// Deterministic prompt text describing the JSON the guard will accept.
    pub fn format_instructions(&self) -> String {
        format!(
            "Reply with a single JSON object of this shape:\n\n{}\n\n\
             Output raw JSON only, with no commentary before or after the object.",
            T::shape()
        )
    }
}

/// One decode attempt: parse, then validate. Shared by every tier.
fn decode<T: StructuredOutput>(candidate: &str) -> Result<T, DecodeError> {
    let value: T = serde_json::from_str(candidate)?;
    value.validate()?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
