//! Integration tests for stopping a container's task.

use berth::runtime::ProcessStatus;
use berth::{BackendOptions, BerthError, Container, ProcessIo, ProcessSpec, WorkerContainer};
use berth_test_utils::{Call, FakeContainer, Failpoint, Harness};
use nix::sys::signal::Signal;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn stop_without_task_delivers_no_signal() {
    let h = Harness::with_fake(FakeContainer::without_task("idle"));

    let err = h.container.stop(false).await.unwrap_err();

    assert!(matches!(err, BerthError::TaskUnavailable { ref container, .. } if container == "idle"));
    assert!(h.fake.kills().is_empty());
}

#[tokio::test]
async fn graceful_then_forceful_stop() {
    let h = Harness::new();
    let process = h
        .container
        .run(ProcessSpec::new("/bin/sleep").arg("3600"), ProcessIo::new())
        .await
        .unwrap();

    let stops = async {
        h.container.stop(false).await?;
        h.container.stop(true).await
    };
    tokio::time::timeout(Duration::from_secs(1), stops)
        .await
        .expect("stop does not wait for exit")
        .unwrap();

    assert_eq!(h.fake.kills(), vec![Signal::SIGTERM, Signal::SIGKILL]);
    // Signal delivery alone leaves the process to exit on its own.
    assert_eq!(h.task().status_of(process.id()), Some(ProcessStatus::Running));
}

#[tokio::test]
async fn stop_after_task_disappears() {
    let h = Harness::new();
    h.container.stop(false).await.unwrap();

    h.fake.remove_task();

    let err = h.container.stop(true).await.unwrap_err();
    assert!(matches!(err, BerthError::TaskUnavailable { .. }));
    assert_eq!(h.fake.kills(), vec![Signal::SIGTERM]);
}

#[tokio::test]
async fn undeliverable_signal_is_termination_failed() {
    let h = Harness::new();
    h.fake.fail(Failpoint::Kill);

    let err = h.container.stop(true).await.unwrap_err();

    match &err {
        BerthError::TerminationFailed { container, source } => {
            assert_eq!(container, "container-1");
            assert!(matches!(**source, BerthError::SignalDeliveryFailed { ref signal, .. } if signal == "SIGKILL"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.source().is_some());
    // No retry.
    assert_eq!(h.fake.kills(), vec![Signal::SIGKILL]);
}

#[tokio::test]
async fn configured_signals_are_used() {
    let fake = Arc::new(FakeContainer::new("c"));
    let options = BackendOptions::from_json_str(
        r#"{"killer": {"graceful_signal": "SIGINT", "ungraceful_signal": "SIGQUIT"}}"#,
    )
    .unwrap();
    let container = Container::from_options(fake.clone(), &options).unwrap();

    container.stop(false).await.unwrap();
    container.stop(true).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            Call::Task,
            Call::Kill(Signal::SIGINT),
            Call::Task,
            Call::Kill(Signal::SIGQUIT),
        ]
    );
}

#[tokio::test]
async fn unknown_configured_signal_is_rejected() {
    let fake = Arc::new(FakeContainer::new("c"));
    let options =
        BackendOptions::from_json_str(r#"{"killer": {"graceful_signal": "SIGBOGUS"}}"#).unwrap();

    let err = Container::from_options(fake, &options).unwrap_err();
    assert!(matches!(err, BerthError::InvalidInput(_)));
}
