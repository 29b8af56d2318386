//! Shared test doubles and fixtures for the workspace.
//!
//! [`ScriptedModel`] stands in for the generative backend: it pops one
//! canned reply per call and records every request it saw, so tests can
//! assert on temperatures, tiers and rendered prompts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use sage_core::llm::{ModelError, ModelTier, TextModel, TextRequest};
use sage_core::schema::{
    DailySchedule, Milestone, Priority, SessionKind, StudyPlan, StudySession, Subject,
};

/// One request the scripted model received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub tier: ModelTier,
}

/// Scripted [`TextModel`] for tests.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: ModelError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Everything the model has been asked so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: &TextRequest) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.prompt.system.clone(),
            user: request.prompt.user.clone(),
            temperature: request.temperature,
            tier: request.tier,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted model ran out of replies")
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A classifier reply as raw JSON.
pub fn router_json(complexity: &str) -> String {
    format!(r#"{{"complexity": "{complexity}", "confidence": 0.9, "reason": "scripted"}}"#)
}

/// A small valid plan as raw JSON, the way a model would emit it.
pub fn plan_json() -> String {
    r##"{
        "title": "Physics final prep",
        "start_date": "2026-03-01",
        "end_date": "2026-03-21",
        "subjects": [
            {"name": "Physics", "priority": "high", "total_hours": 40, "color": "#3b82f6"}
        ],
        "schedule": [
            {"date": "2026-03-01", "day_of_week": "Sunday", "sessions": [
                {"start_time": "09:00", "end_time": "10:30", "subject": "Physics",
                 "task": "Mechanics problem set", "type": "study"}
            ]}
        ],
        "milestones": [
            {"date": "2026-03-10", "title": "Finish mechanics"}
        ],
        "tips": ["Sleep well"]
    }"##
    .to_string()
}

/// The same plan as a typed value.
pub fn sample_plan() -> StudyPlan {
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
            sessions: vec![StudySession {
                start_time: "09:00".to_string(),
                end_time: "10:30".to_string(),
                subject: "Physics".to_string(),
                task: "Mechanics problem set".to_string(),
                kind: SessionKind::Study,
                notes: None,
            }],
        }],
        milestones: vec![Milestone {
            date: "2026-03-10".to_string(),
            title: "Finish mechanics".to_string(),
            description: None,
        }],
        tips: vec!["Sleep well".to_string()],
    }
}

/// Wrap text in a markdown code fence the way chatty models do.
pub fn fenced(text: &str) -> String {
    format!("Here is the result:\n```json\n{text}\n```\n")
}
