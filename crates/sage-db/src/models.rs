use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What the user did with a generated plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    Save,
    Regenerate,
    Share,
}

impl fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Save => "save",
            Self::Regenerate => "regenerate",
            Self::Share => "share",
        };
        f.write_str(s)
    }
}

impl FromStr for FeedbackAction {
    type Err = FeedbackActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(Self::Save),
            "regenerate" => Ok(Self::Regenerate),
            "share" => Ok(Self::Share),
            other => Err(FeedbackActionParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`FeedbackAction`] string.
#[derive(Debug, Clone)]
pub struct FeedbackActionParseError(pub String);

impl fmt::Display for FeedbackActionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid feedback action: {:?}", self.0)
    }
}

impl std::error::Error for FeedbackActionParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A stored plan, exactly as the `plans` table holds it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    /// The validated plan document as JSON.
    pub plan: serde_json::Value,
    pub html: Option<String>,
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The listing projection of a plan: everything except the heavy columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanSummary {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub model_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&PlanRecord> for PlanSummary {
    fn from(record: &PlanRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id.clone(),
            title: record.title.clone(),
            model_used: record.model_used.clone(),
            created_at: record.created_at,
        }
    }
}

/// One piece of user feedback on a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub action: FeedbackAction,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Fields the caller supplies when storing a plan.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub owner_id: String,
    pub title: String,
    pub plan: serde_json::Value,
    pub html: Option<String>,
    pub model_used: Option<String>,
}

/// Partial update of a stored plan. `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    pub title: Option<String>,
    pub plan: Option<serde_json::Value>,
    pub html: Option<String>,
}

/// Fields the caller supplies when recording feedback.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub plan_id: Uuid,
    pub action: FeedbackAction,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
