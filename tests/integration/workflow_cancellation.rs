//! Cancellation of a running workflow

use crate::integration::test_utils::{
    lesson_context, lesson_spec, options, ScriptedGenerator, ScriptedStore,
};
use coursegen::{NoProgress, Phase, WorkflowDriver, WorkflowError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn driver(store: &Arc<ScriptedStore>, generator: &Arc<ScriptedGenerator>) -> WorkflowDriver {
    WorkflowDriver::with_options(
        Arc::clone(store) as _,
        Arc::clone(generator) as _,
        options(Duration::from_secs(2), 100),
    )
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_poll_stops_polling_before_the_timeout() {
    let store = Arc::new(ScriptedStore::starting_at(101));
    let generator = Arc::new(ScriptedGenerator::new());
    let cancel = CancellationToken::new();
    generator.cancel_on_status_call(2, cancel.clone());

    let started = tokio::time::Instant::now();
    let err = driver(&store, &generator)
        .run(&lesson_spec(), &lesson_context(), &NoProgress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Cancelled {
            phase: Phase::Generating
        }
    ));
    assert!(!err.is_timeout());
    assert_eq!(generator.status_calls(), 2);
    assert!(started.elapsed() < Duration::from_secs(200));
    assert!(store.updates.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_status_calls_happen_after_cancellation() {
    let store = Arc::new(ScriptedStore::starting_at(101));
    let generator = Arc::new(ScriptedGenerator::new());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let err = driver(&store, &generator)
        .run(&lesson_spec(), &lesson_context(), &NoProgress, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());

    // Polls at 0s, 2s and 4s; the 6s poll never happens.
    let calls = generator.status_calls();
    assert_eq!(calls, 3);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(generator.status_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_creates_nothing() {
    let store = Arc::new(ScriptedStore::starting_at(101));
    let generator = Arc::new(ScriptedGenerator::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = driver(&store, &generator)
        .run(&lesson_spec(), &lesson_context(), &NoProgress, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Structuring);
    assert!(store.created_ids().is_empty());
    assert!(generator.submitted.lock().is_empty());
}
