//! Operator-mode CLI handlers for `sage plans` subcommands.
//!
//! Implements:
//! - `sage plans list`         -- list stored plans for an owner
//! - `sage plans show <id>`    -- show one stored plan with its feedback
//! - `sage plans delete <id>`  -- delete a stored plan

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use sage_db::queries::{feedback as feedback_queries, plans as plan_queries};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::List { owner, limit } => cmd_list(pool, &owner, limit).await,
        PlanCommands::Show { plan_id } => cmd_show(pool, &plan_id).await,
        PlanCommands::Delete { plan_id } => cmd_delete(pool, &plan_id).await,
    }
}

fn parse_plan_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("invalid plan ID: {raw:?}"))
}

// -----------------------------------------------------------------------
// sage plans list
// -----------------------------------------------------------------------

/// List stored plans for an owner, newest first.
async fn cmd_list(pool: &PgPool, owner: &str, limit: i64) -> Result<()> {
    let plans = plan_queries::list_plans_by_owner(pool, owner, limit).await?;

    if plans.is_empty() {
        println!("No plans found for {owner:?}. Use `sage generate` to create one.");
        return Ok(());
    }

    // Compute column widths for a clean table. ID is always 36 chars (UUID).
    let id_w = 36;
    let title_w = plans.iter().map(|p| p.title.len()).max().unwrap_or(5).max(5);
    let model_w = plans
        .iter()
        .map(|p| p.model_used.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<id_w$}  {:<title_w$}  {:<model_w$}  CREATED",
        "ID", "TITLE", "MODEL",
    );
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<title_w$}  {:<model_w$}  {}",
            plan.id,
            plan.title,
            plan.model_used.as_deref().unwrap_or("-"),
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// sage plans show <id>
// -----------------------------------------------------------------------

/// Show one stored plan: metadata header, the plan document as JSON, and
/// any feedback left on it.
async fn cmd_show(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;

    let record = plan_queries::get_plan(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;

    println!("Plan: {}", record.title);
    println!("  ID:       {}", record.id);
    println!("  Owner:    {}", record.owner_id);
    println!(
        "  Model:    {}",
        record.model_used.as_deref().unwrap_or("-")
    );
    println!(
        "  Created:  {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Updated:  {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&record.plan)?);

    let feedback = feedback_queries::list_feedback_for_plan(pool, plan_id).await?;
    if !feedback.is_empty() {
        println!();
        println!("Feedback:");
        for entry in &feedback {
            let rating = entry
                .rating
                .map(|r| format!("{r}/5"))
                .unwrap_or_else(|| "-".to_string());
            let comment = entry.comment.as_deref().unwrap_or("");
            println!(
                "  {}  {:<10}  {:<4} {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.action,
                rating,
                comment,
            );
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// sage plans delete <id>
// -----------------------------------------------------------------------

async fn cmd_delete(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;

    if !plan_queries::delete_plan(pool, plan_id).await? {
        bail!("plan {plan_id} not found");
    }
    println!("Plan {plan_id} deleted.");

    Ok(())
}
