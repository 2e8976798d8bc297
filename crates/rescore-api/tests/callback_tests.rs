//! Callback reconciliation integration tests.
//!
//! These tests drive the handler directly against real backing services;
//! configure via `.env` and run with `cargo test -p rescore-api -- --ignored`.

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use rescore_api::handlers::callbacks::motion_callback;
use rescore_api::{ApiConfig, AppState};
use rescore_models::MotionStatus;
use rescore_motion::{CallbackData, CallbackEnvelope};

async fn test_state() -> AppState {
    dotenvy::dotenv().ok();
    AppState::new(ApiConfig::from_env())
        .await
        .expect("Failed to build app state")
}

fn failure_envelope(task_id: &str) -> CallbackEnvelope {
    CallbackEnvelope {
        code: Some(200),
        data: Some(CallbackData {
            task_id: Some(task_id.to_string()),
            state: Some("fail".to_string()),
            result_json: None,
            fail_msg: Some("face not detected".to_string()),
        }),
    }
}

#[tokio::test]
#[ignore = "requires Postgres, Redis and object storage"]
async fn test_unknown_external_id_is_acknowledged_without_writes() {
    let state = test_state().await;

    let envelope = failure_envelope(&format!("ext-{}", Uuid::new_v4()));
    let response = motion_callback(State(state), Json(envelope))
        .await
        .expect("handler must not error on unknown ids");
    assert_eq!(response.0.status, "unknown");
}

#[tokio::test]
#[ignore = "requires Postgres, Redis and object storage"]
async fn test_non_delivered_code_is_ignored() {
    let state = test_state().await;

    let envelope = CallbackEnvelope {
        code: Some(500),
        data: None,
    };
    let response = motion_callback(State(state), Json(envelope))
        .await
        .expect("non-delivered callbacks are acknowledged");
    assert_eq!(response.0.status, "ignored");
}

#[tokio::test]
#[ignore = "requires Postgres, Redis and object storage"]
async fn test_redelivered_callback_is_a_no_op() {
    let state = test_state().await;

    let external_id = format!("ext-{}", Uuid::new_v4());
    let job = state
        .motions
        .create_processing(Uuid::new_v4(), Uuid::new_v4(), &external_id)
        .await
        .expect("create motion job");

    let first = motion_callback(State(state.clone()), Json(failure_envelope(&external_id)))
        .await
        .expect("first delivery");
    assert_eq!(first.0.status, "ok");

    let second = motion_callback(State(state.clone()), Json(failure_envelope(&external_id)))
        .await
        .expect("second delivery");
    assert_eq!(second.0.status, "already-processed");

    let current = state
        .motions
        .get(job.id)
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(current.status, MotionStatus::Failed);
    assert_eq!(current.error_log.as_deref(), Some("face not detected"));
}
