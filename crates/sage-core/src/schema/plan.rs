//! The study plan document: subjects, daily schedule, milestones, tips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Validate, ValidationError, is_date, is_hex_color, is_time};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Priority of a subject within the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(PriorityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Priority`] string.
#[derive(Debug, Clone)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid priority: {:?}", self.0)
    }
}

impl std::error::Error for PriorityParseError {}

// ---------------------------------------------------------------------------

/// What a study session is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Study,
    Review,
    Practice,
    Break,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Study => "study",
            Self::Review => "review",
            Self::Practice => "practice",
            Self::Break => "break",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionKind {
    type Err = SessionKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(Self::Study),
            "review" => Ok(Self::Review),
            "practice" => Ok(Self::Practice),
            "break" => Ok(Self::Break),
            other => Err(SessionKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`SessionKind`] string.
#[derive(Debug, Clone)]
pub struct SessionKindParseError(pub String);

impl fmt::Display for SessionKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid session kind: {:?}", self.0)
    }
}

impl std::error::Error for SessionKindParseError {}

// ---------------------------------------------------------------------------
// Plan structure
// ---------------------------------------------------------------------------

/// One timed block within a day.
///
/// Times are `HH:MM` strings; zero-padded times compare chronologically as
/// strings, which is how the end-after-start rule is checked. Crossing
/// midnight within a session is not supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub task: String,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for StudySession {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_time(&self.start_time) {
            return Err(ValidationError::Malformed {
                field: "session.start_time",
                expected: "HH:MM",
                value: self.start_time.clone(),
            });
        }
        if !is_time(&self.end_time) {
            return Err(ValidationError::Malformed {
                field: "session.end_time",
                expected: "HH:MM",
                value: self.end_time.clone(),
            });
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::SessionOrder {
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        if self.subject.is_empty() {
            return Err(ValidationError::Empty {
                field: "session.subject",
            });
        }
        if self.subject.chars().count() > 100 {
            return Err(ValidationError::TooLong {
                field: "session.subject",
                max: 100,
            });
        }
        if self.task.is_empty() {
            return Err(ValidationError::Empty {
                field: "session.task",
            });
        }
        if self.task.chars().count() > 500 {
            return Err(ValidationError::TooLong {
                field: "session.task",
                max: 500,
            });
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 500 {
                return Err(ValidationError::TooLong {
                    field: "session.notes",
                    max: 500,
                });
            }
        }
        Ok(())
    }
}

/// All sessions planned for a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySchedule {
    pub date: String,
    pub day_of_week: String,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
}

impl Validate for DailySchedule {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_date(&self.date) {
            return Err(ValidationError::Malformed {
                field: "schedule.date",
                expected: "YYYY-MM-DD",
                value: self.date.clone(),
            });
        }
        if self.day_of_week.is_empty() {
            return Err(ValidationError::Empty {
                field: "schedule.day_of_week",
            });
        }
        for session in &self.sessions {
            session.validate()?;
        }
        Ok(())
    }
}

/// A checkpoint the student should reach by a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for Milestone {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_date(&self.date) {
            return Err(ValidationError::Malformed {
                field: "milestone.date",
                expected: "YYYY-MM-DD",
                value: self.date.clone(),
            });
        }
        if self.title.is_empty() {
            return Err(ValidationError::Empty {
                field: "milestone.title",
            });
        }
        if self.title.chars().count() > 200 {
            return Err(ValidationError::TooLong {
                field: "milestone.title",
                max: 200,
            });
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > 500 {
                return Err(ValidationError::TooLong {
                    field: "milestone.description",
                    max: 500,
                });
            }
        }
        Ok(())
    }
}

/// A subject the plan allocates time to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub priority: Priority,
    pub total_hours: f64,
    pub color: String,
}

impl Validate for Subject {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::Empty {
                field: "subject.name",
            });
        }
        if self.name.chars().count() > 100 {
            return Err(ValidationError::TooLong {
                field: "subject.name",
                max: 100,
            });
        }
        if !(self.total_hours > 0.0 && self.total_hours <= 100.0) {
            return Err(ValidationError::OutOfRange {
                field: "subject.total_hours",
                min: 0.0,
                max: 100.0,
                value: self.total_hours,
            });
        }
        if !is_hex_color(&self.color) {
            return Err(ValidationError::Malformed {
                field: "subject.color",
                expected: "#RRGGBB",
                value: self.color.clone(),
            });
        }
        Ok(())
    }
}

/// The complete study plan document.
///
/// A plan spanning a single day (`end_date == start_date`) is valid; a plan
/// that ends before it starts is not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub subjects: Vec<Subject>,
    pub schedule: Vec<DailySchedule>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Validate for StudyPlan {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if self.title.chars().count() > 200 {
            return Err(ValidationError::TooLong {
                field: "title",
                max: 200,
            });
        }
        if !is_date(&self.start_date) {
            return Err(ValidationError::Malformed {
                field: "start_date",
                expected: "YYYY-MM-DD",
                value: self.start_date.clone(),
            });
        }
        if !is_date(&self.end_date) {
            return Err(ValidationError::Malformed {
                field: "end_date",
                expected: "YYYY-MM-DD",
                value: self.end_date.clone(),
            });
        }
        if self.end_date < self.start_date {
            return Err(ValidationError::DateOrder {
                start: self.start_date.clone(),
                end: self.end_date.clone(),
            });
        }
        if self.subjects.is_empty() {
            return Err(ValidationError::MissingAny { field: "subjects" });
        }
        if self.schedule.is_empty() {
            return Err(ValidationError::MissingAny { field: "schedule" });
        }
        if self.tips.len() > 10 {
            return Err(ValidationError::TooMany {
                field: "tips",
                max: 10,
                len: self.tips.len(),
            });
        }
        for subject in &self.subjects {
            subject.validate()?;
        }
        for day in &self.schedule {
            day.validate()?;
        }
        for milestone in &self.milestones {
            milestone.validate()?;
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

    fn sample_session() -> StudySession {
        StudySession {
            start_time: "09:00".to_string(),
            end_time: "10:30".to_string(),
            subject: "Physics".to_string(),
            task: "Review mechanics problem set".to_string(),
            kind: SessionKind::Review,
            notes: None,
        }
    }

    fn sample_plan() -> StudyPlan {
        StudyPlan {
            title: "Physics final prep".to_string(),
            start_date: "2026-03-01".to_string(),
            end_date: "2026-03-21".to_string(),
            subjects: vec![Subject {
                name: "Physics".to_string(),
                priority: Priority::High,
                total_hours: 40.0,
                color: "#3b82f6".to_string(),
            }],
            schedule: vec![DailySchedule {
                date: "2026-03-01".to_string(),
                day_of_week: "Sunday".to_string(),
                sessions: vec![sample_session()],
            }],
            milestones: vec![Milestone {
                date: "2026-03-10".to_string(),
                title: "Finish mechanics review".to_string(),
                description: None,
            }],
            tips: vec!["Sleep before the exam".to_string()],
        }
    }

    // -- enum roundtrips --

    #[test]
    fn priority_display_roundtrip() {
        for v in [Priority::High, Priority::Medium, Priority::Low] {
            let parsed: Priority = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn session_kind_display_roundtrip() {
        for v in [
            SessionKind::Study,
            SessionKind::Review,
            SessionKind::Practice,
            SessionKind::Break,
        ] {
            let parsed: SessionKind = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
        assert!("nap".parse::<SessionKind>().is_err());
    }

    #[test]
    fn session_kind_uses_type_on_the_wire() {
        let json = serde_json::to_value(sample_session()).expect("serialize");
        assert_eq!(json["type"], "review");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn unknown_session_kind_fails_deserialization() {
        let json = r#"{"start_time":"09:00","end_time":"10:00","subject":"x",
                       "task":"y","type":"siesta"}"#;
        assert!(serde_json::from_str::<StudySession>(json).is_err());
    }

    // -- session validation --

    #[test]
    fn valid_session_passes() {
        assert!(sample_session().validate().is_ok());
    }

    #[test]
    fn session_end_must_be_after_start() {
        let mut s = sample_session();
        s.end_time = "09:00".to_string();
        assert!(matches!(
            s.validate(),
            Err(ValidationError::SessionOrder { .. })
        ));

        s.end_time = "08:30".to_string();
        assert!(matches!(
            s.validate(),
            Err(ValidationError::SessionOrder { .. })
        ));
    }

    #[test]
    fn session_rejects_bad_time_shape() {
        let mut s = sample_session();
        s.start_time = "9am".to_string();
        assert!(matches!(
            s.validate(),
            Err(ValidationError::Malformed {
                field: "session.start_time",
                ..
            })
        ));
    }

    #[test]
    fn session_rejects_oversized_notes() {
        let mut s = sample_session();
        s.notes = Some("n".repeat(501));
        assert!(matches!(
            s.validate(),
            Err(ValidationError::TooLong {
                field: "session.notes",
                max: 500
            })
        ));
    }

    // -- subject validation --

    #[test]
    fn subject_hours_bounds() {
        let mut subject = sample_plan().subjects[0].clone();
        subject.total_hours = 0.0;
        assert!(matches!(
            subject.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));

        subject.total_hours = 100.5;
        assert!(matches!(
            subject.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));

        subject.total_hours = 100.0;
        assert!(subject.validate().is_ok());
    }

    #[test]
    fn subject_rejects_bad_color() {
        let mut subject = sample_plan().subjects[0].clone();
        subject.color = "blue".to_string();
        assert!(matches!(
            subject.validate(),
            Err(ValidationError::Malformed {
                field: "subject.color",
                ..
            })
        ));
    }

    // -- plan validation --

    #[test]
    fn valid_plan_passes() {
        assert!(sample_plan().validate().is_ok());
    }

    #[test]
    fn one_day_plan_is_valid() {
        let mut plan = sample_plan();
        plan.end_date = plan.start_date.clone();
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn plan_rejects_end_before_start() {
        let mut plan = sample_plan();
        plan.end_date = "2026-02-01".to_string();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn plan_requires_subjects_and_schedule() {
        let mut plan = sample_plan();
        plan.subjects.clear();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::MissingAny { field: "subjects" })
        ));

        let mut plan = sample_plan();
        plan.schedule.clear();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::MissingAny { field: "schedule" })
        ));
    }

    #[test]
    fn plan_caps_tips_at_ten() {
        let mut plan = sample_plan();
        plan.tips = (0..11).map(|i| format!("tip {i}")).collect();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::TooMany {
                field: "tips",
                max: 10,
                len: 11
            })
        ));
    }

    #[test]
    fn plan_surfaces_nested_session_violation() {
        let mut plan = sample_plan();
        plan.schedule[0].sessions[0].task = String::new();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::Empty {
                field: "session.task"
            })
        ));
    }

    #[test]
    fn plan_defaults_milestones_and_tips() {
        let json = r##"{
            "title": "Minimal",
            "start_date": "2026-03-01",
            "end_date": "2026-03-02",
            "subjects": [{"name": "Math", "priority": "low",
                          "total_hours": 5, "color": "#aabbcc"}],
            "schedule": [{"date": "2026-03-01", "day_of_week": "Sunday"}]
        }"##;
        let plan: StudyPlan = serde_json::from_str(json).expect("should deserialize");
        assert!(plan.milestones.is_empty());
        assert!(plan.tips.is_empty());
        assert!(plan.schedule[0].sessions.is_empty());
        assert!(plan.validate().is_ok());
    }
}
