//! Submission through the async callbacks.
//!
//! Callback failures are logged and reported as an outcome; they never
//! propagate and never alter the form.

use std::sync::Arc;

use cx_form::SubmitOutcome;
use cx_test_utils::{init_tracing, open_form, profile_schema};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn filled_profile() -> cx_form::Form {
    let mut form = open_form(profile_schema(), "submit");
    assert!(form.set_value_at("name", json!("Ada")));
    assert!(form.set_value_at("email", json!("ada@example.com")));
    form
}

#[tokio::test]
async fn valid_document_reaches_on_submit() {
    init_tracing();
    let form = filled_profile();
    let mut received: Option<Arc<Value>> = None;

    let outcome = form
        .handle_submit(|document| {
            received = Some(document);
            async { anyhow::Ok(()) }
        })
        .await;

    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert!(outcome.is_submitted());
    let received = received.unwrap();
    assert!(Arc::ptr_eq(&received, &form.value()));
    assert_eq!(received["name"], json!("Ada"));
}

#[tokio::test]
async fn invalid_document_skips_on_submit() {
    let form = open_form(profile_schema(), "invalid");
    let mut called = false;

    let outcome = form
        .handle_submit(|_| {
            called = true;
            async { anyhow::Ok(()) }
        })
        .await;

    assert!(!called);
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    let paths: Vec<String> = errors.iter().map(|e| e.path_string()).collect();
    assert!(paths.contains(&"name".to_owned()));
    assert!(paths.contains(&"email".to_owned()));
}

#[tokio::test]
async fn invalid_document_reaches_on_error() {
    let form = open_form(profile_schema(), "on-error");
    let mut reported = Vec::new();

    let outcome = form
        .handle_submit_or_else(
            |_| async { anyhow::Ok(()) },
            |errors| {
                reported = errors;
                async { anyhow::Ok(()) }
            },
        )
        .await;

    assert!(matches!(outcome, SubmitOutcome::Invalid(ref errors) if errors.len() == reported.len()));
    assert!(!reported.is_empty());
    assert!(reported.iter().all(|e| e.form_key.as_str() == "on-error"));
}

#[tokio::test]
async fn failing_callback_is_absorbed() {
    let form = filled_profile();
    let before = form.value();

    let outcome = form
        .handle_submit(|_| async { Err::<(), _>(anyhow::anyhow!("backend unavailable")) })
        .await;

    assert_eq!(outcome, SubmitOutcome::CallbackFailed);
    assert!(Arc::ptr_eq(&before, &form.value()));
}

#[tokio::test]
async fn failing_error_callback_is_absorbed() {
    let form = open_form(profile_schema(), "error-fails");
    let outcome = form
        .handle_submit_or_else(
            |_| async { anyhow::Ok(()) },
            |_| async { Err::<(), _>(anyhow::anyhow!("reporting failed")) },
        )
        .await;
    assert_eq!(outcome, SubmitOutcome::CallbackFailed);
}
