//! End-to-end generation flow tests.
//!
//! Drive the full path a `sage generate` run takes: a real HTTP client
//! against a mocked Gemini endpoint, through classification, planning,
//! local rendering and storage. No scripted-model shortcuts here; the
//! wire format is the real one.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sage_core::llm::{GeminiClient, GeminiConfig, TextModel};
use sage_core::pipeline::{GenerateError, GenerateRequest, PlanPipeline};
use sage_core::prompt::PromptResolver;
use sage_core::render;
use sage_db::models::NewPlan;
use sage_db::store::PlanStore;
use sage_test_utils::{fenced, plan_json, router_json};

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn gemini_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

fn pipeline_against(server: &MockServer) -> PlanPipeline {
    let mut config = GeminiConfig::new("test-key");
    config.base_url = server.uri();
    let model: Arc<dyn TextModel> =
        Arc::new(GeminiClient::new(config).expect("client should build"));
    PlanPipeline::new(model, PromptResolver::local_only())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn easy_request_flows_through_flash_to_a_stored_plan() {
    let server = MockServer::start().await;

    // Classification goes to flash at temperature zero.
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(
            json!({ "generationConfig": { "temperature": 0.0 } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&router_json("easy"))))
        .expect(1)
        .mount(&server)
        .await;

    // Planning stays on flash for an easy request, at the plan temperature.
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(
            json!({ "generationConfig": { "temperature": 0.7 } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&plan_json())))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let request = GenerateRequest::new("Help me prepare for my physics final in three weeks");
    let outcome = pipeline
        .generate(&request)
        .await
        .expect("generation should succeed");

    assert_eq!(outcome.plan.title, "Physics final prep");
    assert_eq!(outcome.tier.model_id(), "gemini-2.5-flash");

    // Render and store, the way the serve and generate commands do.
    let html = render::plan_page(&outcome.plan);
    assert!(html.contains("Physics final prep"));

    let store = PlanStore::in_memory();
    let record = store
        .save(NewPlan {
            owner_id: "anonymous".to_string(),
            title: outcome.plan.title.clone(),
            plan: serde_json::to_value(&outcome.plan).unwrap(),
            html: Some(html),
            model_used: Some(outcome.tier.model_id().to_string()),
        })
        .await;

    let fetched = store
        .get(record.id)
        .await
        .expect("stored plan should be fetchable");
    assert_eq!(fetched.title, "Physics final prep");
    assert_eq!(fetched.model_used.as_deref(), Some("gemini-2.5-flash"));
}

#[tokio::test]
async fn hard_request_escalates_to_pro() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&router_json("hard"))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&plan_json())))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let outcome = pipeline
        .generate(&GenerateRequest::new(
            "Build a three month plan balancing five AP subjects with spaced repetition",
        ))
        .await
        .expect("generation should succeed");

    assert_eq!(outcome.tier.model_id(), "gemini-2.5-pro");
    assert_eq!(outcome.decision.complexity.to_string(), "hard");
}

#[tokio::test]
async fn fenced_plan_reply_is_recovered_over_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({ "generationConfig": { "temperature": 0.0 } }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(&router_json("easy"))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({ "generationConfig": { "temperature": 0.7 } }),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply(&fenced(&plan_json()))),
        )
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let outcome = pipeline
        .generate(&GenerateRequest::new("Plan two weeks of calculus revision"))
        .await
        .expect("fenced output should still parse");

    assert_eq!(outcome.plan.title, "Physics final prep");
}

#[tokio::test]
async fn backend_failure_surfaces_as_model_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let pipeline = pipeline_against(&server);
    let err = pipeline
        .generate(&GenerateRequest::new(
            "Plan my biology revision for next month",
        ))
        .await
        .expect_err("outage should fail the run");

    assert!(matches!(err, GenerateError::ModelUnavailable(_)));
}
