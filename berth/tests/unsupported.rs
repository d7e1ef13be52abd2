//! The optional capability surface must fail explicitly and touch nothing.

use berth::capability::{NetOutRule, NetProtocol, StreamInSpec, StreamOutSpec};
use berth::{BerthResult, ProcessIo, ProcessSignal, ProcessSpec, WorkerContainer};
use berth_test_utils::{FakeContainer, Harness};
use std::fmt::Debug;
use std::time::Duration;

fn assert_not_implemented<T: Debug>(op: &str, result: BerthResult<T>) {
    match result {
        Err(e) => assert!(e.is_not_implemented(), "{}: {:?}", op, e),
        Ok(v) => panic!("{} unexpectedly succeeded: {:?}", op, v),
    }
}

fn rule() -> NetOutRule {
    NetOutRule {
        protocol: NetProtocol::Tcp,
        networks: Vec::new(),
        ports: Vec::new(),
        log: false,
    }
}

#[tokio::test]
async fn every_unsupported_operation_is_not_implemented() {
    let h = Harness::with_fake(FakeContainer::new("c").with_label("keep", "me"));
    let c = &h.container;

    assert_not_implemented("remove_property", c.remove_property("keep").await);
    assert_not_implemented("info", c.info().await);
    assert_not_implemented("metrics", c.metrics().await);
    assert_not_implemented(
        "stream_in",
        c.stream_in(StreamInSpec {
            path: "/tmp".into(),
            user: "root".into(),
            tar_stream: Box::new(tokio::io::empty()),
        })
        .await,
    );
    assert_not_implemented(
        "stream_out",
        c.stream_out(StreamOutSpec::default()).await.map(|_| ()),
    );
    assert_not_implemented("set_grace_time", c.set_grace_time(Duration::from_secs(300)).await);
    assert_not_implemented("current_bandwidth_limits", c.current_bandwidth_limits().await);
    assert_not_implemented("current_cpu_limits", c.current_cpu_limits().await);
    assert_not_implemented("current_disk_limits", c.current_disk_limits().await);
    assert_not_implemented("current_memory_limits", c.current_memory_limits().await);
    assert_not_implemented("net_in", c.net_in(8080, 80).await);
    assert_not_implemented("net_out", c.net_out(rule()).await);
    assert_not_implemented("bulk_net_out", c.bulk_net_out(vec![rule(), rule()]).await);

    // No side effects on the runtime.
    assert!(h.fake.calls().is_empty());
    assert_eq!(h.fake.label_store().get("keep").map(String::as_str), Some("me"));
}

#[tokio::test]
async fn unsupported_is_distinct_from_not_found() {
    let h = Harness::new();
    let err = h.container.remove_property("k").await.unwrap_err();
    assert!(err.is_not_implemented());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn per_process_signal_is_not_implemented() {
    let h = Harness::new();
    let process = h
        .container
        .run(ProcessSpec::new("/bin/sleep"), ProcessIo::new())
        .await
        .unwrap();
    h.fake.clear_calls();

    assert_not_implemented("signal", process.signal(ProcessSignal::Kill).await);
    assert!(h.fake.kills().is_empty());
}

#[test]
fn handle_is_container_id() {
    let h = Harness::with_fake(FakeContainer::new("build-42"));
    assert_eq!(h.container.handle(), "build-42");
}
