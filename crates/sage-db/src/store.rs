//! Plan and feedback stores with a transparent in-memory fallback.
//!
//! Every operation tries the database first when a pool is present. A
//! failed call is logged and lands in an in-process map instead, so the
//! service answers even with no database or a broken one. Reads consult
//! the database first, then the map; fallback data lives only as long as
//! the process.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    FeedbackRecord, NewFeedback, NewPlan, PlanChanges, PlanRecord, PlanSummary,
};
use crate::queries;

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Stored plans, database-backed when possible.
pub struct PlanStore {
    pool: Option<PgPool>,
    memory: Mutex<HashMap<Uuid, PlanRecord>>,
}

impl PlanStore {
    /// Default number of rows a listing returns.
    pub const DEFAULT_LIST_LIMIT: i64 = 10;

    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Some(pool),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// A store with no database at all; everything lives in the map.
    pub fn in_memory() -> Self {
        Self {
            pool: None,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Store a plan under a fresh id.
    pub async fn save(&self, new: NewPlan) -> PlanRecord {
        let id = Uuid::new_v4();
        if let Some(pool) = &self.pool {
            match queries::plans::insert_plan(pool, id, &new).await {
                Ok(record) => return record,
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %id, "plan save fell back to memory");
                }
            }
        }

        let now = Utc::now();
        let record = PlanRecord {
            id,
            owner_id: new.owner_id,
            title: new.title,
            plan: new.plan,
            html: new.html,
            model_used: new.model_used,
            created_at: now,
            updated_at: now,
        };
        self.lock_memory().insert(id, record.clone());
        record
    }

    pub async fn get(&self, id: Uuid) -> Option<PlanRecord> {
        if let Some(pool) = &self.pool {
            match queries::plans::get_plan(pool, id).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %id, "plan fetch fell back to memory");
                }
            }
        }
        self.lock_memory().get(&id).cloned()
    }

    /// Apply a partial update. Returns `None` when the plan is nowhere.
    pub async fn update(&self, id: Uuid, changes: PlanChanges) -> Option<PlanRecord> {
        if let Some(pool) = &self.pool {
            match queries::plans::update_plan(pool, id, &changes).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %id, "plan update fell back to memory");
                }
            }
        }

        let mut memory = self.lock_memory();
        let record = memory.get_mut(&id)?;
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(plan) = changes.plan {
            record.plan = plan;
        }
        if let Some(html) = changes.html {
            record.html = Some(html);
        }
        record.updated_at = Utc::now();
        Some(record.clone())
    }

    /// Delete a plan everywhere it exists. Returns whether anything was
    /// removed.
    pub async fn delete(&self, id: Uuid) -> bool {
        let mut deleted = false;
        if let Some(pool) = &self.pool {
            match queries::plans::delete_plan(pool, id).await {
                Ok(hit) => deleted = hit,
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %id, "plan delete fell back to memory");
                }
            }
        }
        deleted | self.lock_memory().remove(&id).is_some()
    }

    /// An owner's plans, newest first, capped at `limit`.
    pub async fn list_by_owner(&self, owner_id: &str, limit: i64) -> Vec<PlanSummary> {
        let limit = limit.max(0);
        let mut summaries = if let Some(pool) = &self.pool {
            match queries::plans::list_plans_by_owner(pool, owner_id, limit).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(error = %e, owner_id, "plan listing fell back to memory");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // Fold in fallback rows the database never saw.
        let memory = self.lock_memory();
        for record in memory.values() {
            if record.owner_id == owner_id && !summaries.iter().any(|s| s.id == record.id) {
                summaries.push(PlanSummary::from(record));
            }
        }
        drop(memory);

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(limit as usize);
        summaries
    }

    fn lock_memory(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, PlanRecord>> {
        // A poisoned map still holds every record that was fully inserted.
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Recorded feedback, database-backed when possible.
pub struct FeedbackStore {
    pool: Option<PgPool>,
    memory: Mutex<Vec<FeedbackRecord>>,
}

impl FeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Some(pool),
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            pool: None,
            memory: Mutex::new(Vec::new()),
        }
    }

    /// Record one piece of feedback. Fails only on invalid input; storage
    /// trouble falls back to memory like the plan store.
    pub async fn save(&self, new: NewFeedback) -> Result<FeedbackRecord> {
        if let Some(rating) = new.rating {
            if !(1..=5).contains(&rating) {
                anyhow::bail!("feedback rating must be between 1 and 5, got {rating}");
            }
        }

        let id = Uuid::new_v4();
        if let Some(pool) = &self.pool {
            match queries::feedback::insert_feedback(pool, id, &new).await {
                Ok(record) => return Ok(record),
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %new.plan_id, "feedback fell back to memory");
                }
            }
        }

        let record = FeedbackRecord {
            id,
            plan_id: new.plan_id,
            action: new.action,
            rating: new.rating,
            comment: new.comment,
            created_at: Utc::now(),
        };
        self.lock_memory().push(record.clone());
        Ok(record)
    }

    /// All feedback left on one plan, oldest first.
    pub async fn list_for_plan(&self, plan_id: Uuid) -> Vec<FeedbackRecord> {
        let mut records = if let Some(pool) = &self.pool {
            match queries::feedback::list_feedback_for_plan(pool, plan_id).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(error = %e, plan_id = %plan_id, "feedback listing fell back to memory");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let memory = self.lock_memory();
        for record in memory.iter() {
            if record.plan_id == plan_id && !records.iter().any(|r| r.id == record.id) {
                records.push(record.clone());
            }
        }
        drop(memory);

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    fn lock_memory(&self) -> std::sync::MutexGuard<'_, Vec<FeedbackRecord>> {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
