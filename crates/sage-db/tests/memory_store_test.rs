//! Store behavior on the in-memory path.
//!
//! These tests run the stores with no database at all, which is also the
//! code path taken when a configured database errors mid-call.

use std::time::Duration;

use sage_db::models::{FeedbackAction, NewFeedback, NewPlan, PlanChanges};
use sage_db::store::{FeedbackStore, PlanStore};
use uuid::Uuid;

fn physics_plan(owner_id: &str) -> NewPlan {
    NewPlan {
        owner_id: owner_id.to_string(),
        title: "Physics final prep".to_string(),
        plan: serde_json::json!({"title": "Physics final prep", "subjects": []}),
        html: None,
        model_used: Some("gemini-2.5-flash".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saved_plans_can_be_fetched() {
    let store = PlanStore::in_memory();
    let saved = store.save(physics_plan("anonymous")).await;

    let fetched = store.get(saved.id).await.expect("plan should exist");
    assert_eq!(fetched.title, "Physics final prep");
    assert_eq!(fetched.owner_id, "anonymous");
    assert_eq!(fetched.model_used.as_deref(), Some("gemini-2.5-flash"));
}

#[tokio::test]
async fn missing_plans_are_none() {
    let store = PlanStore::in_memory();
    assert!(store.get(Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn update_applies_only_set_fields() {
    let store = PlanStore::in_memory();
    let saved = store.save(physics_plan("anonymous")).await;

    let updated = store
        .update(
            saved.id,
            PlanChanges {
                html: Some("<html></html>".to_string()),
                ..PlanChanges::default()
            },
        )
        .await
        .expect("plan should exist");

    assert_eq!(updated.title, "Physics final prep", "title unchanged");
    assert_eq!(updated.html.as_deref(), Some("<html></html>"));
    assert!(updated.updated_at >= saved.updated_at);
}

#[tokio::test]
async fn update_of_missing_plan_is_none() {
    let store = PlanStore::in_memory();
    let result = store.update(Uuid::new_v4(), PlanChanges::default()).await;
    assert!(result.is_none());
}

#[tokio::test]
async fn delete_reports_whether_anything_was_removed() {
    let store = PlanStore::in_memory();
    let saved = store.save(physics_plan("anonymous")).await;

    assert!(store.delete(saved.id).await);
    assert!(!store.delete(saved.id).await, "second delete finds nothing");
    assert!(store.get(saved.id).await.is_none());
}

#[tokio::test]
async fn listing_is_newest_first_and_scoped_to_the_owner() {
    let store = PlanStore::in_memory();

    let mut first = physics_plan("alice");
    first.title = "Week one".to_string();
    store.save(first).await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut second = physics_plan("alice");
    second.title = "Week two".to_string();
    store.save(second).await;

    store.save(physics_plan("bob")).await;

    let listed = store.list_by_owner("alice", PlanStore::DEFAULT_LIST_LIMIT).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "Week two");
    assert_eq!(listed[1].title, "Week one");
}

#[tokio::test]
async fn listing_respects_the_limit() {
    let store = PlanStore::in_memory();
    for i in 0..12 {
        let mut new = physics_plan("anonymous");
        new.title = format!("Plan {i}");
        store.save(new).await;
    }

    let listed = store.list_by_owner("anonymous", 10).await;
    assert_eq!(listed.len(), 10);
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feedback_roundtrip_scoped_to_the_plan() {
    let store = FeedbackStore::in_memory();
    let plan_id = Uuid::new_v4();

    store
        .save(NewFeedback {
            plan_id,
            action: FeedbackAction::Save,
            rating: Some(5),
            comment: Some("worked great".to_string()),
        })
        .await
        .expect("valid feedback");
    store
        .save(NewFeedback {
            plan_id: Uuid::new_v4(),
            action: FeedbackAction::Share,
            rating: None,
            comment: None,
        })
        .await
        .expect("valid feedback");

    let listed = store.list_for_plan(plan_id).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].action, FeedbackAction::Save);
    assert_eq!(listed[0].rating, Some(5));
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected() {
    let store = FeedbackStore::in_memory();
    for rating in [0, 6, -1] {
        let result = store
            .save(NewFeedback {
                plan_id: Uuid::new_v4(),
                action: FeedbackAction::Regenerate,
                rating: Some(rating),
                comment: None,
            })
            .await;
        assert!(result.is_err(), "rating {rating} must be rejected");
    }
}

#[tokio::test]
async fn missing_rating_is_allowed() {
    let store = FeedbackStore::in_memory();
    let record = store
        .save(NewFeedback {
            plan_id: Uuid::new_v4(),
            action: FeedbackAction::Regenerate,
            rating: None,
            comment: Some("too dense".to_string()),
        })
        .await
        .expect("rating is optional");
    assert_eq!(record.rating, None);
}
