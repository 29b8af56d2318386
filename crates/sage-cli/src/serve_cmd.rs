use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use sage_core::llm::{GeminiClient, TextModel};
use sage_core::pipeline::{GenerateError, GenerateRequest, PlanPipeline};
use sage_core::prompt::{PromptHub, PromptResolver};
use sage_core::render;
use sage_core::schema::{StudyPlan, Validate};
use sage_db::models::{FeedbackAction, NewFeedback, NewPlan};
use sage_db::store::{FeedbackStore, PlanStore};
use sage_db::{DbConfig, pool};

use crate::config::SageConfig;

/// Owner recorded when a request carries no `owner_id`.
pub const DEFAULT_OWNER: &str = "anonymous";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API_ERROR",
            format!("{err:#}"),
        )
    }
}

/// Map pipeline failures onto stable error codes. Safety blocks and parse
/// failures keep their details in the server log only; clients get a
/// generic message.
impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::InputRejected(rejection) => Self::new(
                StatusCode::BAD_REQUEST,
                "INPUT_BLOCKED",
                rejection.to_string(),
            ),
            GenerateError::ContentBlocked { reason } => {
                tracing::warn!(reason = %reason, "generation blocked by safety filter");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "SAFETY_BLOCKED",
                    "the request was declined by the content safety filter",
                )
            }
            GenerateError::GenerationFailed(failure) => {
                tracing::error!(error = %failure, "plan generation failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_FAILED",
                    "the model did not produce a usable study plan",
                )
            }
            GenerateError::ModelUnavailable(source) => {
                tracing::error!(error = %source, "generative backend unavailable");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "API_ERROR",
                    "the generation backend is currently unavailable",
                )
            }
            other => Self::internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "success": false,
            "error": { "code": self.code, "message": self.message },
        });
        (self.status, Json(body)).into_response()
    }
}

/// Success envelope wrapper.
fn ok(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

// ---------------------------------------------------------------------------
// State and router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PlanPipeline>,
    pub plans: Arc<PlanStore>,
    pub feedback: Arc<FeedbackStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/generate", post(generate_plan))
        .route("/api/plans", post(save_plan).get(list_plans))
        .route("/api/plans/{id}", get(get_plan).delete(delete_plan))
        .route("/plans/{id}/page", get(plan_page))
        .route("/api/feedback", post(submit_feedback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: &SageConfig, bind_override: Option<&str>) -> Result<()> {
    let gemini = config.require_gemini()?;
    let model: Arc<dyn TextModel> = Arc::new(GeminiClient::new(gemini)?);

    let prompts = match config.hub.clone() {
        Some(hub) => PromptResolver::with_hub(PromptHub::new(hub)?),
        None => {
            tracing::debug!("no prompt store configured, serving built-in templates");
            PromptResolver::local_only()
        }
    };

    let (plans, feedback) = match connect_stores(&config.db_config).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::warn!(
                error = format!("{err:#}"),
                "database unavailable, storing plans in memory"
            );
            (PlanStore::in_memory(), FeedbackStore::in_memory())
        }
    };

    let state = AppState {
        pipeline: Arc::new(PlanPipeline::new(model, prompts)),
        plans: Arc::new(plans),
        feedback: Arc::new(feedback),
    };

    let app = build_router(state);
    let bind = bind_override.unwrap_or(&config.bind);
    let addr: SocketAddr = bind.parse()?;
    tracing::info!("sage serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("sage serve shut down");
    Ok(())
}

async fn connect_stores(config: &DbConfig) -> Result<(PlanStore, FeedbackStore)> {
    let pg_pool = pool::create_pool(config).await?;
    pool::run_migrations(&pg_pool).await?;
    Ok((
        PlanStore::new(pg_pool.clone()),
        FeedbackStore::new(pg_pool),
    ))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateBody {
    input: String,
    #[serde(default)]
    study_hours_per_day: Option<String>,
    #[serde(default)]
    available_days: Option<Vec<String>>,
    #[serde(default)]
    owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavePlanBody {
    plan: serde_json::Value,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FeedbackBody {
    plan_id: String,
    action: String,
    #[serde(default)]
    rating: Option<i32>,
    #[serde(default)]
    comment: Option<String>,
}

fn parse_plan_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("invalid plan id: {raw:?}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plans = state.plans.list_by_owner(DEFAULT_OWNER, 20).await;

    let rows = if plans.is_empty() {
        "<tr><td colspan=\"3\">No plans yet.</td></tr>".to_string()
    } else {
        plans
            .iter()
            .map(|p| {
                format!(
                    "<tr><td><a href=\"/plans/{id}/page\">{title}</a></td><td>{model}</td><td>{created}</td></tr>",
                    id = p.id,
                    title = render::escape(&p.title),
                    model = p.model_used.as_deref().unwrap_or("-"),
                    created = p.created_at.format("%Y-%m-%d %H:%M"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>sage</title></head><body>\
<h1>sage</h1>\
<p><a href=\"/api/plans\">/api/plans</a> | <a href=\"/api/health\">/api/health</a></p>\
<table><tr><th>Plan</th><th>Model</th><th>Created</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sage",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn generate_plan(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<axum::response::Response, AppError> {
    let started = Instant::now();

    let mut request = GenerateRequest::new(body.input);
    if let Some(hours) = body.study_hours_per_day {
        request.prefs.study_hours_per_day = hours;
    }
    if let Some(days) = body.available_days {
        request.prefs.available_days = days;
    }

    let outcome = state.pipeline.generate(&request).await?;

    let html = render::plan_page(&outcome.plan);
    let plan_value = serde_json::to_value(&outcome.plan).map_err(|e| AppError::internal(e.into()))?;

    let record = state
        .plans
        .save(NewPlan {
            owner_id: body.owner_id.unwrap_or_else(|| DEFAULT_OWNER.to_string()),
            title: outcome.plan.title.clone(),
            plan: plan_value.clone(),
            html: Some(html.clone()),
            model_used: Some(outcome.tier.model_id().to_string()),
        })
        .await;

    Ok(ok(serde_json::json!({
        "plan_id": record.id,
        "plan": plan_value,
        "html": html,
        "model_used": outcome.tier.model_id(),
        "router_decision": outcome.decision,
        "processing_ms": started.elapsed().as_millis() as u64,
    }))
    .into_response())
}

async fn save_plan(
    State(state): State<AppState>,
    Json(body): Json<SavePlanBody>,
) -> Result<axum::response::Response, AppError> {
    let plan: StudyPlan = serde_json::from_value(body.plan.clone())
        .map_err(|err| AppError::bad_request(format!("invalid plan document: {err}")))?;
    plan.validate()
        .map_err(|err| AppError::bad_request(format!("invalid plan document: {err}")))?;

    let record = state
        .plans
        .save(NewPlan {
            owner_id: body.owner_id.unwrap_or_else(|| DEFAULT_OWNER.to_string()),
            title: plan.title.clone(),
            plan: body.plan,
            html: body.html,
            model_used: None,
        })
        .await;

    Ok(ok(serde_json::json!({ "plan_id": record.id })).into_response())
}

async fn list_plans(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<axum::response::Response, AppError> {
    let owner = params.owner_id.as_deref().unwrap_or(DEFAULT_OWNER);
    let limit = params.limit.unwrap_or(PlanStore::DEFAULT_LIST_LIMIT);
    let summaries = state.plans.list_by_owner(owner, limit).await;
    let data = serde_json::to_value(summaries).map_err(|e| AppError::internal(e.into()))?;
    Ok(ok(data).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let id = parse_plan_id(&id)?;
    let record = state
        .plans
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    let data = serde_json::to_value(record).map_err(|e| AppError::internal(e.into()))?;
    Ok(ok(data).into_response())
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let id = parse_plan_id(&id)?;
    if !state.plans.delete(id).await {
        return Err(AppError::not_found(format!("plan {id} not found")));
    }
    Ok(ok(serde_json::json!({ "deleted": true })).into_response())
}

/// Serve a plan's stored HTML render, falling back to a fresh local render
/// when the stored record predates the html column.
async fn plan_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let id = parse_plan_id(&id)?;
    let record = state
        .plans
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    let html = match record.html {
        Some(html) => html,
        None => {
            let plan: StudyPlan = serde_json::from_value(record.plan)
                .map_err(|e| AppError::internal(e.into()))?;
            render::plan_page(&plan)
        }
    };
    Ok(Html(html).into_response())
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(body): Json<FeedbackBody>,
) -> Result<axum::response::Response, AppError> {
    let plan_id = parse_plan_id(&body.plan_id)?;
    let action: FeedbackAction = body
        .action
        .parse()
        .map_err(|_| AppError::bad_request(format!("unknown feedback action: {:?}", body.action)))?;

    if state.plans.get(plan_id).await.is_none() {
        return Err(AppError::not_found(format!("plan {plan_id} not found")));
    }

    let record = state
        .feedback
        .save(NewFeedback {
            plan_id,
            action,
            rating: body.rating,
            comment: body.comment,
        })
        .await
        .map_err(|err| AppError::bad_request(format!("{err:#}")))?;

    Ok(ok(serde_json::json!({ "feedback_id": record.id })).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
