//! CLI handlers for `sage prompt` subcommands.
//!
//! Implements:
//! - `sage prompt show <stage>`          -- print the template a stage resolves to
//! - `sage prompt push <stage> --file`   -- publish a new template version
//!
//! `show` prints the template as TOML, the same format `push` reads, so a
//! template can be pulled, edited and pushed back.

use anyhow::{Context, Result};

use sage_core::prompt::{PromptHub, PromptResolver, PromptTemplate, Stage};

use crate::PromptCommands;
use crate::config::SageConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_prompt_command(command: PromptCommands, config: &SageConfig) -> Result<()> {
    let resolver = build_resolver(config)?;
    match command {
        PromptCommands::Show { stage, version } => {
            cmd_show(&resolver, &stage, version.as_deref()).await
        }
        PromptCommands::Push { stage, file } => cmd_push(&resolver, &stage, &file).await,
    }
}

fn build_resolver(config: &SageConfig) -> Result<PromptResolver> {
    Ok(match config.hub.clone() {
        Some(hub) => PromptResolver::with_hub(PromptHub::new(hub)?),
        None => PromptResolver::local_only(),
    })
}

fn parse_stage(raw: &str) -> Result<Stage> {
    raw.parse().with_context(|| {
        let names = Stage::ALL.map(|s| s.to_string()).join(", ");
        format!("unknown stage {raw:?} (valid stages: {names})")
    })
}

// -----------------------------------------------------------------------
// sage prompt show <stage>
// -----------------------------------------------------------------------

async fn cmd_show(resolver: &PromptResolver, stage_str: &str, version: Option<&str>) -> Result<()> {
    let stage = parse_stage(stage_str)?;
    let template = resolver.resolve(stage, version).await;
    print!("{}", toml::to_string_pretty(&template)?);
    Ok(())
}

// -----------------------------------------------------------------------
// sage prompt push <stage> --file <path>
// -----------------------------------------------------------------------

async fn cmd_push(resolver: &PromptResolver, stage_str: &str, file: &str) -> Result<()> {
    let stage = parse_stage(stage_str)?;

    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read template file: {file}"))?;
    let template: PromptTemplate =
        toml::from_str(&raw).with_context(|| format!("failed to parse template file: {file}"))?;

    let version = resolver.push(stage, &template).await?;
    println!("Pushed {stage} ({}) as version {version}.", stage.store_name());

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stage_accepts_every_stage_name() {
        for stage in Stage::ALL {
            let parsed = parse_stage(&stage.to_string()).unwrap();
            assert_eq!(parsed, stage);
        }
    }

    #[test]
    fn parse_stage_lists_valid_names_on_error() {
        let err = parse_stage("compose").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("unknown stage"), "got: {message}");
        assert!(message.contains("classify"), "got: {message}");
    }

    #[test]
    fn template_toml_round_trips() {
        let template = PromptTemplate {
            system: "You are a planner.".to_string(),
            user: "Request: {input}".to_string(),
        };
        let raw = toml::to_string_pretty(&template).unwrap();
        let parsed: PromptTemplate = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, template);
    }
}
