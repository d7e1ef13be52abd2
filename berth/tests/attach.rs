//! Integration tests for attaching to existing processes.

use berth::runtime::ProcessStatus;
use berth::{BerthError, ProcessIo, ProcessSpec, ProcessState, WorkerContainer};
use berth_test_utils::{Call, FakeContainer, Failpoint, Harness};

#[tokio::test]
async fn empty_id_fails_before_any_runtime_call() {
    let h = Harness::new();

    let err = h.container.attach("", ProcessIo::new()).await.unwrap_err();

    assert!(matches!(err, BerthError::InvalidInput(_)));
    assert!(h.fake.calls().is_empty());
}

#[tokio::test]
async fn unknown_id_is_process_not_found() {
    let h = Harness::new();

    let err = h
        .container
        .attach("no-such-process", ProcessIo::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, BerthError::ProcessNotFound { ref process, .. } if process == "no-such-process")
    );
}

#[tokio::test]
async fn finished_process_is_not_running() {
    let h = Harness::new();
    h.task().insert_process("done", ProcessStatus::Stopped);

    let err = h.container.attach("done", ProcessIo::new()).await.unwrap_err();

    match err {
        BerthError::ProcessNotRunning { process, status } => {
            assert_eq!(process, "done");
            assert_eq!(status, "stopped");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Attach never resurrects a process.
    assert!(!h.fake.calls().contains(&Call::Start("done".into())));
}

#[tokio::test]
async fn created_or_paused_process_is_not_running() {
    let h = Harness::new();
    h.task().insert_process("created", ProcessStatus::Created);
    h.task().insert_process("paused", ProcessStatus::Paused);

    for id in ["created", "paused"] {
        let err = h.container.attach(id, ProcessIo::new()).await.unwrap_err();
        assert!(matches!(err, BerthError::ProcessNotRunning { .. }), "{}: {:?}", id, err);
    }
}

#[tokio::test]
async fn running_process_attaches_and_reports_exit() {
    let h = Harness::new();
    h.task().insert_process("step", ProcessStatus::Running);

    let process = h.container.attach("step", ProcessIo::new()).await.unwrap();
    assert_eq!(process.id(), "step");
    assert_eq!(process.state(), ProcessState::Running);

    h.task().finish("step", 5);
    assert_eq!(process.wait().await.unwrap(), 5);
}

#[tokio::test]
async fn attach_checks_status_before_registering() {
    let h = Harness::new();
    h.task().insert_process("step", ProcessStatus::Running);

    h.container.attach("step", ProcessIo::new()).await.unwrap();

    assert_eq!(
        h.fake.calls(),
        vec![
            Call::Task,
            Call::LoadProcess("step".into()),
            Call::Status("step".into()),
            Call::Wait("step".into()),
        ]
    );
}

#[tokio::test]
async fn attach_binds_streams_without_terminal() {
    let h = Harness::new();
    h.task().insert_process("step", ProcessStatus::Running);

    h.container
        .attach(
            "step",
            ProcessIo::new()
                .stdout(Box::new(tokio::io::sink()))
                .stderr(Box::new(tokio::io::sink())),
        )
        .await
        .unwrap();

    let io = h.task().take_io("step").unwrap();
    assert!(io.stdout.is_some());
    assert!(io.stderr.is_some());
    assert!(io.stdin.is_none());
    assert!(!io.terminal);
}

#[tokio::test]
async fn run_then_attach_share_exit_code() {
    let h = Harness::new();
    let running = h
        .container
        .run(ProcessSpec::new("/bin/sleep").id("long"), ProcessIo::new())
        .await
        .unwrap();

    let attached = h.container.attach("long", ProcessIo::new()).await.unwrap();
    h.task().finish("long", 9);

    assert_eq!(running.wait().await.unwrap(), 9);
    assert_eq!(attached.wait().await.unwrap(), 9);
}

#[tokio::test]
async fn attach_without_task_is_task_unavailable() {
    let h = Harness::with_fake(FakeContainer::without_task("c"));

    let err = h.container.attach("step", ProcessIo::new()).await.unwrap_err();
    assert!(matches!(err, BerthError::TaskUnavailable { .. }));
}

#[tokio::test]
async fn load_failure_is_io_setup_failed() {
    let h = Harness::new();
    h.task().insert_process("step", ProcessStatus::Running);
    h.fake.fail(Failpoint::LoadProcess);

    let err = h.container.attach("step", ProcessIo::new()).await.unwrap_err();
    assert!(matches!(err, BerthError::IoSetupFailed { op: "load process", .. }));
}

#[tokio::test]
async fn status_failure_is_reported() {
    let h = Harness::new();
    h.task().insert_process("step", ProcessStatus::Running);
    h.fake.fail(Failpoint::Status);

    let err = h.container.attach("step", ProcessIo::new()).await.unwrap_err();
    assert!(matches!(err, BerthError::Runtime { op: "proc status", .. }));
}
