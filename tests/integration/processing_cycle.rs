//! Integration tests for the processing cycle
//!
//! Tests cover:
//! - The STANDARD scenario
//! - Artifact keys, status, and final dimension after a run
//! - Input validation and pass-through fields
//! - Execution failures and partial contexts
//! - Processor registration and reset

use super::test_utils::{engine_with_levels, level, EventRecorder, FailingProcessor};
use multilevel::{
    CompletionState, CurrentPhase, Engine, ErrorDetails, ErrorKind, FnProcessor, Phase,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_standard_scenario() {
    let engine = Engine::new();

    let ctx = engine.process(&json!({ "dimension": 1.0 }), None).await.unwrap();

    assert_eq!(ctx.completion_state(), CompletionState::Complete);
    assert!(ctx.artifact("STANDARD_processing").is_some());
    assert_eq!(ctx.status.progress, 1.0);
    assert_eq!(ctx.status.current_phase, CurrentPhase::Complete);
    assert_eq!(ctx.status.completed_phases, vec![Phase::Processing]);
}

#[tokio::test]
async fn test_one_artifact_per_phase_and_level_dimension() {
    let engine = engine_with_levels(vec![level(
        "ADVANCED",
        2.0,
        &["analysis", "processing", "output"],
        10_000,
    )]);

    let ctx = engine.process(&json!({ "dimension": 2.3 }), None).await.unwrap();

    assert_eq!(
        ctx.artifacts.keys().collect::<Vec<_>>(),
        vec!["ADVANCED_analysis", "ADVANCED_processing", "ADVANCED_output"]
    );
    assert_eq!(ctx.dimension, 2.0);
    for artifact in ctx.artifacts.iter() {
        assert_eq!(artifact.dimension, 2.3);
    }

    let output = &ctx.artifact("ADVANCED_output").unwrap().content;
    assert_eq!(output["summary"]["artifactCount"], 2);
    assert_eq!(
        output["summary"]["processingChain"],
        json!(["analysis", "processing"])
    );
}

#[tokio::test]
async fn test_context_serializes_in_wire_shape() {
    let engine = Engine::new();
    let ctx = engine
        .process(&json!({ "dimension": 1.0, "requestId": "r-1" }), None)
        .await
        .unwrap();

    let value = ctx.to_value().unwrap();
    assert_eq!(value["requestId"], "r-1");
    assert_eq!(value["processingJourney"]["completionState"], "COMPLETE");
    assert_eq!(value["status"]["currentPhase"], "complete");
    assert!(value["dimensionalArtifacts"]["byLayer"]["STANDARD_processing"].is_object());
}

#[tokio::test]
async fn test_invalid_inputs_fail_validation_without_side_effects() {
    let engine = Engine::new();
    let recorder = EventRecorder::attach(&engine);

    for input in [
        Value::Null,
        json!("not an object"),
        json!({ "dimension": 0 }),
        json!({ "dimension": "big" }),
        json!({ "processingJourney": [] }),
        json!({ "dimensionalArtifacts": 3 }),
    ] {
        let err = engine.process(&input, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "input: {}", input);
        assert!(err.partial_context().is_none());
    }

    assert!(recorder.labels().is_empty());
    assert_eq!(engine.list_levels().len(), 1);
}

#[tokio::test]
async fn test_validation_collects_every_problem() {
    let engine = Engine::new();
    let err = engine
        .process(
            &json!({ "dimension": -1, "processingJourney": "x", "dimensionalArtifacts": [] }),
            None,
        )
        .await
        .unwrap_err();

    match err.details {
        ErrorDetails::Validation { errors } => assert_eq!(errors.len(), 3),
        other => panic!("unexpected details: {:?}", other),
    }
}

#[tokio::test]
async fn test_caller_bookkeeping_fields_are_replaced() {
    let engine = Engine::new();
    let ctx = engine
        .process(
            &json!({
                "processingJourney": { "completionState": "COMPLETE" },
                "dimensionalArtifacts": { "byLayer": { "fake": {} } },
                "status": "whatever",
            }),
            None,
        )
        .await
        .unwrap();

    assert_eq!(ctx.dimension, 1.0);
    assert_eq!(ctx.artifacts.len(), 1);
    assert!(ctx.artifact("fake").is_none());
    assert!(ctx.field("status").is_none());
}

#[tokio::test]
async fn test_execution_failure_includes_processor_message() {
    let engine = engine_with_levels(vec![level(
        "PIPE",
        3.0,
        &["analysis", "processing", "output"],
        10_000,
    )]);
    assert!(engine.register_processor("processing", FailingProcessor("disk full")));
    let recorder = EventRecorder::attach(&engine);

    let err = engine
        .process(&json!({ "dimension": 3.0 }), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.message.contains("disk full"));
    match &err.details {
        ErrorDetails::Execution {
            level_id, phase, ..
        } => {
            assert_eq!(level_id, "PIPE");
            assert_eq!(*phase, Some(Phase::Processing));
        }
        other => panic!("unexpected details: {:?}", other),
    }

    let ctx = err.partial_context().unwrap();
    assert_eq!(ctx.completion_state(), CompletionState::Rejected);
    assert_eq!(ctx.artifacts.keys().collect::<Vec<_>>(), vec!["PIPE_analysis"]);
    assert_eq!(ctx.dimension, 3.0);

    assert_eq!(recorder.count("phaseCompleted"), 1);
    assert_eq!(recorder.count("processingFailed"), 1);
    assert_eq!(recorder.count("processingCompleted"), 0);
}

#[tokio::test]
async fn test_custom_processor_then_reset() {
    let engine = Engine::new();
    assert!(engine.register_processor(
        "processing",
        FnProcessor::new(|ctx| Ok(json!({ "echo": ctx.field("payload").cloned() })))
    ));
    assert!(!engine.register_processor("render", FailingProcessor("unused")));

    let ctx = engine
        .process(&json!({ "payload": 42 }), None)
        .await
        .unwrap();
    assert_eq!(
        ctx.artifact("STANDARD_processing").unwrap().content,
        json!({ "echo": 42 })
    );

    assert!(engine.reset_processor("processing"));
    let ctx = engine.process(&json!({}), None).await.unwrap();
    assert_eq!(
        ctx.artifact("STANDARD_processing").unwrap().content["processed"],
        true
    );
}

#[tokio::test]
async fn test_repeated_phase_overwrites_artifact() {
    let engine = engine_with_levels(vec![level(
        "LOOP",
        5.0,
        &["processing", "processing"],
        5000,
    )]);

    let ctx = engine.process(&json!({ "dimension": 5.0 }), None).await.unwrap();
    assert_eq!(ctx.artifacts.len(), 1);
    assert_eq!(
        ctx.status.completed_phases,
        vec![Phase::Processing, Phase::Processing]
    );
}

#[tokio::test]
async fn test_concurrent_runs_own_their_contexts() {
    let engine = std::sync::Arc::new(engine_with_levels(vec![level(
        "ADVANCED",
        2.0,
        &["analysis", "output"],
        10_000,
    )]));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = std::sync::Arc::clone(&engine);
            tokio::spawn(async move {
                let dimension = if i % 2 == 0 { 1.0 } else { 2.0 };
                engine
                    .process(&json!({ "dimension": dimension, "run": i }), None)
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let ctx = handle.await.unwrap().unwrap();
        assert_eq!(ctx.field("run"), Some(&json!(i)));
        let expected = if i % 2 == 0 { 1 } else { 2 };
        assert_eq!(ctx.artifacts.len(), expected);
    }
}
