//! The classifier's routing decision: how hard is this request?

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Validate, ValidationError};

/// Complexity class assigned to a request. Decides the capability tier the
/// plan stage runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Easy,
    Hard,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Easy => "easy",
            Self::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Complexity {
    type Err = ComplexityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "hard" => Ok(Self::Hard),
            other => Err(ComplexityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Complexity`] string.
#[derive(Debug, Clone)]
pub struct ComplexityParseError(pub String);

impl fmt::Display for ComplexityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid complexity: {:?}", self.0)
    }
}

impl std::error::Error for ComplexityParseError {}

// ---------------------------------------------------------------------------

/// What the classify stage decided about a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterDecision {
    pub complexity: Complexity,
    pub confidence: f64,
    pub reason: String,
}

impl RouterDecision {
    /// The decision used when classification could not be recovered: easy
    /// complexity, zero confidence, with the degradation note as the reason.
    pub fn fallback(note: impl Into<String>) -> Self {
        Self {
            complexity: Complexity::Easy,
            confidence: 0.0,
            reason: note.into(),
        }
    }
}

impl Validate for RouterDecision {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::OutOfRange {
                field: "confidence",
                min: 0.0,
                max: 1.0,
                value: self.confidence,
            });
        }
        if self.reason.chars().count() > 500 {
            return Err(ValidationError::TooLong {
                field: "reason",
                max: 500,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_display_roundtrip() {
        for v in [Complexity::Easy, Complexity::Hard] {
            let parsed: Complexity = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
        assert!("medium".parse::<Complexity>().is_err());
    }

    #[test]
    fn decision_deserializes_snake_case() {
        let json = r#"{"complexity": "hard", "confidence": 0.85, "reason": "multi-subject"}"#;
        let decision: RouterDecision = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(decision.complexity, Complexity::Hard);
        assert!(decision.validate().is_ok());
    }

    #[test]
    fn unknown_complexity_fails_deserialization() {
        let json = r#"{"complexity": "medium", "confidence": 0.5, "reason": "?"}"#;
        assert!(serde_json::from_str::<RouterDecision>(json).is_err());
    }

    #[test]
    fn confidence_must_be_a_fraction() {
        let decision = RouterDecision {
            complexity: Complexity::Easy,
            confidence: 1.2,
            reason: "sure".to_string(),
        };
        assert!(matches!(
            decision.validate(),
            Err(ValidationError::OutOfRange {
                field: "confidence",
                ..
            })
        ));
    }

    #[test]
    fn reason_is_bounded() {
        let decision = RouterDecision {
            complexity: Complexity::Easy,
            confidence: 0.5,
            reason: "r".repeat(501),
        };
        assert!(matches!(
            decision.validate(),
            Err(ValidationError::TooLong { field: "reason", .. })
        ));
    }

    #[test]
    fn fallback_is_easy_with_zero_confidence() {
        let decision = RouterDecision::fallback("classifier output unrecoverable");
        assert_eq!(decision.complexity, Complexity::Easy);
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.validate().is_ok());
    }
}
