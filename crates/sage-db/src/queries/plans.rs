//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewPlan, PlanChanges, PlanRecord, PlanSummary};

/// Insert a new plan row under a caller-chosen id. Returns the inserted row
/// with server-generated timestamps.
pub async fn insert_plan(pool: &PgPool, id: Uuid, new: &NewPlan) -> Result<PlanRecord> {
    let record = sqlx::query_as::<_, PlanRecord>(
        "INSERT INTO plans (id, owner_id, title, plan, html, model_used) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(id)
    .bind(&new.owner_id)
    .bind(&new.title)
    .bind(&new.plan)
    .bind(&new.html)
    .bind(&new.model_used)
    .fetch_one(pool)
    .await
    .context("failed to insert plan")?;

    Ok(record)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<PlanRecord>> {
    let record = sqlx::query_as::<_, PlanRecord>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(record)
}

/// Apply a partial update. Returns the updated row, or `None` when the plan
/// does not exist. Unset fields keep their stored values.
pub async fn update_plan(
    pool: &PgPool,
    id: Uuid,
    changes: &PlanChanges,
) -> Result<Option<PlanRecord>> {
    let record = sqlx::query_as::<_, PlanRecord>(
        "UPDATE plans \
         SET title = COALESCE($2, title), \
             plan = COALESCE($3, plan), \
             html = COALESCE($4, html), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.title)
    .bind(&changes.plan)
    .bind(&changes.html)
    .fetch_optional(pool)
    .await
    .context("failed to update plan")?;

    Ok(record)
}

/// Delete a plan. Returns whether a row was removed.
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    Ok(result.rows_affected() > 0)
}

/// List an owner's plans, newest first.
pub async fn list_plans_by_owner(
    pool: &PgPool,
    owner_id: &str,
    limit: i64,
) -> Result<Vec<PlanSummary>> {
    let summaries = sqlx::query_as::<_, PlanSummary>(
        "SELECT id, owner_id, title, model_used, created_at \
         FROM plans \
         WHERE owner_id = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(summaries)
}
