//! Typed data model for routing decisions and generated study plans.
//!
//! Model output is deserialized into these types and then validated. Enum
//! fields (complexity, priority, session kind) are enforced at
//! deserialization time; everything else goes through [`Validate`], which
//! reports the first violated constraint as a typed error.

pub mod plan;
pub mod router;

pub use plan::{DailySchedule, Milestone, Priority, SessionKind, StudyPlan, StudySession, Subject};
pub use router::{Complexity, RouterDecision};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A constraint violation found while validating a deserialized value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must look like {expected}, got {value:?}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{field} must be in {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} needs at least one entry")]
    MissingAny { field: &'static str },
    #[error("{field} allows at most {max} entries, got {len}")]
    TooMany {
        field: &'static str,
        max: usize,
        len: usize,
    },
    #[error("session ends at {end}, which is not after its start {start}")]
    SessionOrder { start: String, end: String },
    #[error("plan end date {end} is before its start date {start}")]
    DateOrder { start: String, end: String },
}

/// Post-deserialization constraint checking.
pub trait Validate {
    /// Check every constraint, returning the first violation.
    fn validate(&self) -> Result<(), ValidationError>;
}

// ---------------------------------------------------------------------------
// Shape helpers
// ---------------------------------------------------------------------------

/// `YYYY-MM-DD` with ASCII digits. Calendar plausibility is the model's
/// problem; the guard only pins the shape.
pub(crate) fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..].iter().all(u8::is_ascii_digit)
}

/// `HH:MM` with ASCII digits.
pub(crate) fn is_time(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[2] == b':'
        && b[3..].iter().all(u8::is_ascii_digit)
}

/// `#RRGGBB` with hex digits of either case.
pub(crate) fn is_hex_color(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 7 && b[0] == b'#' && b[1..].iter().all(u8::is_ascii_hexdigit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
