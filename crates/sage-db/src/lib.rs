//! Persistence for sage: PostgreSQL-backed plan and feedback storage.
//!
//! The query layer in [`queries`] talks to the database directly; the
//! [`store`] layer wraps it with a transparent in-memory fallback so the
//! service keeps working when no database is configured or a call fails.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use config::DbConfig;
pub use models::{
    FeedbackAction, FeedbackRecord, NewFeedback, NewPlan, PlanChanges, PlanRecord, PlanSummary,
};
pub use store::{FeedbackStore, PlanStore};
