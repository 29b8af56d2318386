//! Compiled-in prompt templates, one per stage.
//!
//! These are the fallback when the prompt store is unconfigured or
//! unreachable, and the seed content for first pushes. Placeholders follow
//! the template syntax of [`super::template`].

use super::Stage;
use super::template::PromptTemplate;

const CLASSIFY_SYSTEM: &str = "\
You classify requests for a study planning service. Decide whether a \
student's request needs the deep planning model.

Classify as \"hard\" when the request spans several subjects, covers a long \
time range, juggles competing constraints, or prepares for exams across \
topics. Otherwise classify as \"easy\". Report your confidence and a one \
sentence reason.

{format_instructions}";

const CLASSIFY_USER: &str = "Classify this request:\n\n{user_input}";

const PLAN_SYSTEM: &str = "\
You are an experienced study coach. Build a realistic, encouraging study \
plan for the student's request.

Rules:
- Plan from {current_date} onward; never schedule into the past.
- Only use the student's available days: {available_days}.
- Aim for {study_hours_per_day} hours of study per day, with breaks.
- Revisit every subject at least twice across the plan.
- Keep sessions between 25 and 120 minutes.

{format_instructions}";

const PLAN_USER: &str = "Request:\n\n{user_input}";

const RENDER_SYSTEM: &str = "\
You turn study plans into a single self-contained HTML page.

Style: {theme} theme, accent color {accent_color}, {layout} layout. Use \
semantic HTML with inline CSS only -- no external assets and no JavaScript. \
Reply with the HTML document and nothing else.";

const RENDER_USER: &str = "Render this plan:\n\n{plan_json}";

const JUDGE_SYSTEM: &str = "\
You review study plans for quality. Score realism, subject coverage and \
workload balance from 1 to 10, then list the concrete problems you found, \
worst first.";

const JUDGE_USER: &str = "Original request:\n\n{user_input}\n\nPlan under review:\n\n{plan_json}";

const REFINE_SYSTEM: &str = "\
You revise study plans. Apply the feedback while keeping everything that \
already works; do not rebuild the plan from scratch.

{format_instructions}";

const REFINE_USER: &str = "Current plan:\n\n{plan_json}\n\nFeedback to apply:\n\n{feedback}";

/// The compiled-in template for a stage.
pub fn local(stage: Stage) -> PromptTemplate {
    let (system, user) = match stage {
        Stage::Classify => (CLASSIFY_SYSTEM, CLASSIFY_USER),
        Stage::Plan => (PLAN_SYSTEM, PLAN_USER),
        Stage::Render => (RENDER_SYSTEM, RENDER_USER),
        Stage::Judge => (JUDGE_SYSTEM, JUDGE_USER),
        Stage::Refine => (REFINE_SYSTEM, REFINE_USER),
    };
    PromptTemplate {
        system: system.to_string(),
        user: user.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
