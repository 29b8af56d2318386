//! Database query functions for the `feedback` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{FeedbackRecord, NewFeedback};

/// Insert a feedback row under a caller-chosen id.
pub async fn insert_feedback(
    pool: &PgPool,
    id: Uuid,
    new: &NewFeedback,
) -> Result<FeedbackRecord> {
    let record = sqlx::query_as::<_, FeedbackRecord>(
        "INSERT INTO feedback (id, plan_id, action, rating, comment) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(id)
    .bind(new.plan_id)
    .bind(new.action)
    .bind(new.rating)
    .bind(&new.comment)
    .fetch_one(pool)
    .await
    .context("failed to insert feedback")?;

    Ok(record)
}

/// All feedback left on one plan, oldest first.
pub async fn list_feedback_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<FeedbackRecord>> {
    let records = sqlx::query_as::<_, FeedbackRecord>(
        "SELECT * FROM feedback WHERE plan_id = $1 ORDER BY created_at ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list feedback")?;

    Ok(records)
}
