//! Core library for sage: a guarded generation pipeline that turns
//! free-form study requests into validated [`schema::StudyPlan`] values.
//!
//! The flow is classify, plan, render: an input guard screens the raw text,
//! a router decision picks the capability tier, and every structured model
//! reply passes through an output guard before anyone downstream sees it.

pub mod guard;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod schema;
