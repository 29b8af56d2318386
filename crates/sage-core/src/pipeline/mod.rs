//! The guarded generation pipeline: classify, plan, render.
//!
//! [`PlanPipeline::generate`] is the entry point for one request. The input
//! guard runs before anything leaves the process; classification picks the
//! capability tier for planning; the plan stage's output is parsed and
//! validated by the output guard. The render stage is separate and opaque.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::guard::input;
use crate::guard::{InputRejection, OutputGuard, ParseFailure};
use crate::llm::{ModelError, ModelTier, TextModel, TextRequest};
use crate::prompt::{PromptResolver, Stage, TemplateError};
use crate::schema::{Complexity, RouterDecision, StudyPlan};

/// Classification wants the most repeatable answer available.
pub const CLASSIFY_TEMPERATURE: f64 = 0.0;
/// Planning needs room to vary schedules between runs.
pub const PLAN_TEMPERATURE: f64 = 0.7;
/// Rendering sits in between.
pub const RENDER_TEMPERATURE: f64 = 0.5;

/// Accent color when the plan has no subjects to borrow one from.
const DEFAULT_ACCENT: &str = "#3b82f6";

/// Reason recorded on the default decision when classification degrades.
const DEGRADED_REASON: &str = "classifier output unrecoverable; defaulted to easy";

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// Schedule preferences accompanying a request.
#[derive(Debug, Clone)]
pub struct SchedulePrefs {
    /// Free-form daily budget like `"3-4"`, passed to the prompt verbatim.
    pub study_hours_per_day: String,
    /// Day names the student can study on.
    pub available_days: Vec<String>,
}

impl Default for SchedulePrefs {
    fn default() -> Self {
        Self {
            study_hours_per_day: "3-4".to_string(),
            available_days: [
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday",
            ]
            .iter()
            .map(|day| day.to_string())
            .collect(),
        }
    }
}

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub input: String,
    pub prefs: SchedulePrefs,
}

impl GenerateRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            prefs: SchedulePrefs::default(),
        }
    }
}

/// Styling knobs for the opaque render stage.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub theme: String,
    pub layout: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            layout: "calendar".to_string(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: StudyPlan,
    /// The routing decision the plan stage actually ran under.
    pub decision: RouterDecision,
    /// The capability tier the plan stage invoked.
    pub tier: ModelTier,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a generation call failed.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The input guard refused the text; nothing left the process.
    #[error("input rejected: {0}")]
    InputRejected(#[from] InputRejection),

    /// The backend refused the request on safety grounds.
    #[error("content blocked by the generative backend: {reason}")]
    ContentBlocked { reason: String },

    /// The plan stage exhausted the output guard's recovery ladder.
    #[error("plan generation failed: {0}")]
    GenerationFailed(#[from] ParseFailure),

    /// The backend was unreachable or returned an API error.
    #[error("generative backend unavailable: {0}")]
    ModelUnavailable(#[source] ModelError),

    /// A prompt template did not render.
    #[error("prompt for stage {stage} failed to render: {source}")]
    Template {
        stage: Stage,
        #[source]
        source: TemplateError,
    },

    /// The plan could not be serialized for the render prompt.
    #[error("plan could not be serialized: {0}")]
    PlanEncoding(#[from] serde_json::Error),
}

fn model_failure(error: ModelError) -> GenerateError {
    match error {
        ModelError::Blocked { reason } => GenerateError::ContentBlocked { reason },
        other => GenerateError::ModelUnavailable(other),
    }
}

fn tier_for(complexity: Complexity) -> ModelTier {
    match complexity {
        Complexity::Hard => ModelTier::Pro,
        Complexity::Easy => ModelTier::Flash,
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The three-stage pipeline over a generative-text capability.
pub struct PlanPipeline {
    model: Arc<dyn TextModel>,
    prompts: PromptResolver,
    router_guard: OutputGuard<RouterDecision>,
    plan_guard: OutputGuard<StudyPlan>,
}

impl PlanPipeline {
    pub fn new(model: Arc<dyn TextModel>, prompts: PromptResolver) -> Self {
        Self {
            model,
            prompts,
            router_guard: OutputGuard::new(),
            plan_guard: OutputGuard::new(),
        }
    }

    /// Run the whole pipeline for one request.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<PlanOutcome, GenerateError> {
        // 1. Gate the raw input before anything leaves the process.
        input::check(&request.input)?;
        tracing::info!(chars = request.input.chars().count(), "generation started");

        // 2. Classify, degrading to the default decision when the guard
        //    cannot recover the classifier's output.
        let decision = match self.classify(&request.input).await {
            Ok(decision) => decision,
            Err(GenerateError::GenerationFailed(failure)) => {
                tracing::warn!(error = %failure, "classification degraded");
                RouterDecision::fallback(DEGRADED_REASON)
            }
            Err(other) => return Err(other),
        };
        tracing::info!(
            complexity = %decision.complexity,
            confidence = decision.confidence,
            "request classified"
        );

        // 3. Build the plan on the tier the decision selected.
        let (plan, tier) = self.plan(&request.input, &request.prefs, &decision).await?;
        tracing::info!(
            tier = %tier,
            subjects = plan.subjects.len(),
            days = plan.schedule.len(),
            "plan generated"
        );

        Ok(PlanOutcome {
            plan,
            decision,
            tier,
        })
    }

    /// Stage one: decide how much model the request deserves.
    ///
    /// Always runs on the fast tier at temperature zero. Callers that want
    /// the degrade-to-easy behavior go through [`generate`](Self::generate).
    pub async fn classify(&self, user_input: &str) -> Result<RouterDecision, GenerateError> {
        let template = self.prompts.resolve(Stage::Classify, None).await;
        let instructions = self.router_guard.format_instructions();
        let prompt = template
            .render(&[
                ("format_instructions", instructions.as_str()),
                ("user_input", user_input),
            ])
            .map_err(|source| GenerateError::Template {
                stage: Stage::Classify,
                source,
            })?;

        let raw = self
            .model
            .invoke(&TextRequest {
                prompt,
                temperature: CLASSIFY_TEMPERATURE,
                tier: ModelTier::Flash,
            })
            .await
            .map_err(model_failure)?;

        Ok(self.router_guard.parse(&raw)?)
    }

    /// Stage two: build and validate the plan.
    pub async fn plan(
        &self,
        user_input: &str,
        prefs: &SchedulePrefs,
        decision: &RouterDecision,
    ) -> Result<(StudyPlan, ModelTier), GenerateError> {
        let tier = tier_for(decision.complexity);
        let template = self.prompts.resolve(Stage::Plan, None).await;
        let instructions = self.plan_guard.format_instructions();
        let current_date = Utc::now().format("%Y-%m-%d").to_string();
        let available_days = prefs.available_days.join(", ");
        let prompt = template
            .render(&[
                ("user_input", user_input),
                ("current_date", current_date.as_str()),
                ("study_hours_per_day", prefs.study_hours_per_day.as_str()),
                ("available_days", available_days.as_str()),
                ("format_instructions", instructions.as_str()),
            ])
            .map_err(|source| GenerateError::Template {
                stage: Stage::Plan,
                source,
            })?;

        let raw = self
            .model
            .invoke(&TextRequest {
                prompt,
                temperature: PLAN_TEMPERATURE,
                tier,
            })
            .await
            .map_err(model_failure)?;

        let plan = self.plan_guard.parse(&raw)?;
        Ok((plan, tier))
    }

    /// Stage three: have the model lay the plan out as an HTML page.
    ///
    /// The reply is returned as-is; HTML is not parsed or validated here.
    pub async fn render_html(
        &self,
        plan: &StudyPlan,
        style: &RenderStyle,
    ) -> Result<String, GenerateError> {
        let template = self.prompts.resolve(Stage::Render, None).await;
        let plan_json = serde_json::to_string_pretty(plan)?;
        let accent_color = plan
            .subjects
            .first()
            .map(|subject| subject.color.as_str())
            .unwrap_or(DEFAULT_ACCENT);
        let prompt = template
            .render(&[
                ("plan_json", plan_json.as_str()),
                ("theme", style.theme.as_str()),
                ("accent_color", accent_color),
                ("layout", style.layout.as_str()),
            ])
            .map_err(|source| GenerateError::Template {
                stage: Stage::Render,
                source,
            })?;

        self.model
            .invoke(&TextRequest {
                prompt,
                temperature: RENDER_TEMPERATURE,
                tier: ModelTier::Flash,
            })
            .await
            .map_err(model_failure)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
