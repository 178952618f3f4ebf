//! Integration tests for cooperative cancellation

use super::test_utils::{engine_with_levels, level, EventRecorder};
use multilevel::{
    CancellationTokenSource, CompletionState, ErrorDetails, ErrorKind, FnProcessor,
};
use serde_json::json;

#[tokio::test]
async fn test_cancel_before_start_runs_no_phases() {
    let engine = engine_with_levels(vec![level("FULL", 2.0, &["analysis", "output"], 5000)]);
    let recorder = EventRecorder::attach(&engine);
    let source = CancellationTokenSource::new();
    let token = source.token();
    source.cancel();

    let err = engine
        .process(&json!({ "dimension": 2.0 }), Some(&token))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.message, "Operation was cancelled");
    assert_eq!(recorder.count("phaseCompleted"), 0);
    assert_eq!(recorder.count("phaseStarted"), 0);
    assert_eq!(recorder.count("processingFailed"), 1);

    let ctx = err.partial_context().unwrap();
    assert_eq!(ctx.completion_state(), CompletionState::Cancelled);
    assert_eq!(
        ctx.processing_journey.error.as_ref().unwrap().kind,
        ErrorKind::Cancelled
    );
}

#[tokio::test]
async fn test_cancel_mid_run_keeps_completed_phases() {
    let engine = engine_with_levels(vec![level(
        "FULL",
        2.0,
        &["analysis", "processing", "output"],
        5000,
    )]);
    let source = CancellationTokenSource::new();
    let trigger = source.clone();
    engine.register_processor(
        "analysis",
        FnProcessor::new(move |_| {
            trigger.cancel();
            Ok(json!({ "analysed": true }))
        }),
    );
    let recorder = EventRecorder::attach(&engine);

    let err = engine
        .process(&json!({ "dimension": 2.0 }), Some(&source.token()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    match &err.details {
        ErrorDetails::Cancelled {
            cancelled,
            cancel_time,
            ..
        } => {
            assert!(*cancelled);
            assert!(cancel_time.is_some());
        }
        other => panic!("unexpected details: {:?}", other),
    }

    let ctx = err.partial_context().unwrap();
    assert_eq!(ctx.artifacts.keys().collect::<Vec<_>>(), vec!["FULL_analysis"]);
    assert_eq!(
        recorder.labels(),
        vec![
            "processingStarted",
            "phaseStarted:analysis",
            "phaseCompleted:analysis",
            "phaseStarted:processing",
            "processingFailed",
        ]
    );
}

#[tokio::test]
async fn test_uncancelled_token_does_not_interfere() {
    let engine = engine_with_levels(vec![]);
    let source = CancellationTokenSource::new();
    let ctx = engine
        .process(&json!({}), Some(&source.token()))
        .await
        .unwrap();
    assert_eq!(ctx.completion_state(), CompletionState::Complete);
    assert!(!source.is_cancelled());
}
