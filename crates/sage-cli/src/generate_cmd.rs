//! One-shot plan generation from the command line.
//!
//! Runs the full pipeline once and prints the plan as JSON on stdout so it
//! can be piped. Progress notes go to stderr.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use sage_core::llm::{GeminiClient, TextModel};
use sage_core::pipeline::{GenerateRequest, PlanPipeline, RenderStyle};
use sage_core::prompt::{PromptHub, PromptResolver};
use sage_core::render;

use crate::config::SageConfig;

/// Build the generation pipeline from resolved configuration.
pub fn build_pipeline(config: &SageConfig) -> Result<PlanPipeline> {
    let gemini = config.require_gemini()?;
    let model: Arc<dyn TextModel> = Arc::new(GeminiClient::new(gemini)?);
    let prompts = match config.hub.clone() {
        Some(hub) => PromptResolver::with_hub(PromptHub::new(hub)?),
        None => PromptResolver::local_only(),
    };
    Ok(PlanPipeline::new(model, prompts))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_generate(
    config: &SageConfig,
    input: Option<&str>,
    file: Option<&str>,
    hours: Option<&str>,
    days: Option<&str>,
    html_out: Option<&str>,
    styled_html_out: Option<&str>,
) -> Result<()> {
    let input = match (input, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read input file: {path}"))?,
        (None, None) => bail!("provide the request text as an argument or via --file"),
    };

    let pipeline = build_pipeline(config)?;

    let mut request = GenerateRequest::new(input);
    if let Some(hours) = hours {
        request.prefs.study_hours_per_day = hours.to_string();
    }
    if let Some(days) = days {
        request.prefs.available_days = parse_days(days);
    }

    let outcome = pipeline.generate(&request).await?;

    eprintln!(
        "Generated \"{}\" with {} (complexity {}, confidence {:.2})",
        outcome.plan.title,
        outcome.tier.model_id(),
        outcome.decision.complexity,
        outcome.decision.confidence,
    );
    println!("{}", serde_json::to_string_pretty(&outcome.plan)?);

    if let Some(path) = html_out {
        std::fs::write(path, render::plan_page(&outcome.plan))
            .with_context(|| format!("cannot write html file: {path}"))?;
        eprintln!("Wrote local render to {path}");
    }

    if let Some(path) = styled_html_out {
        let html = pipeline
            .render_html(&outcome.plan, &RenderStyle::default())
            .await?;
        std::fs::write(path, html).with_context(|| format!("cannot write html file: {path}"))?;
        eprintln!("Wrote model-styled render to {path}");
    }

    Ok(())
}

/// Split a comma-separated day list, dropping empty entries.
fn parse_days(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|day| day.trim().to_string())
        .filter(|day| !day.is_empty())
        .collect()
}
