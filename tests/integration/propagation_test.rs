// tests/integration/propagation_test.rs

//! Integration tests for the propagation sink: record ordering, the
//! MULTI/EXEC bracket, DB-selector injection, and replica read-only
//! enforcement.

use super::test_helpers::{TestContext, ok, queued};
use bytes::Bytes;
use tokio::sync::broadcast;
use zircondb::config::Config;
use zircondb::core::RespValue;
use zircondb::core::events::PropagatedRecord;
use zircondb::core::state::replication::ReplicationRole;

/// Drains everything currently buffered on a replication subscription into
/// plain argv string vectors.
fn drain(rx: &mut broadcast::Receiver<PropagatedRecord>) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(
            record
                .argv
                .iter()
                .map(|a| String::from_utf8_lossy(a).into_owned())
                .collect(),
        );
    }
    records
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn test_single_write_propagates_with_db_selector() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut rx = ctx.state.sink.subscribe_for_replication();

    ctx.run(&mut c1, &["SET", "k", "v"]).await;
    ctx.run(&mut c1, &["GET", "k"]).await;

    // The first record on a fresh stream is the DB selector; reads are
    // never propagated.
    assert_eq!(
        drain(&mut rx),
        vec![argv(&["SELECT", "0"]), argv(&["SET", "k", "v"])]
    );
}

#[tokio::test]
async fn test_failed_conditional_write_is_not_propagated() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut rx = ctx.state.sink.subscribe_for_replication();

    ctx.run(&mut c1, &["SET", "k", "v"]).await;
    // NX against an existing key does not write and must not propagate.
    ctx.run(&mut c1, &["SET", "k", "other", "NX"]).await;

    assert_eq!(
        drain(&mut rx),
        vec![argv(&["SELECT", "0"]), argv(&["SET", "k", "v"])]
    );
}

#[tokio::test]
async fn test_exec_brackets_batch_with_multi_and_exec() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut rx = ctx.state.sink.subscribe_for_replication();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    ctx.run(&mut c1, &["GET", "a"]).await;
    ctx.run(&mut c1, &["INCR", "a"]).await;
    ctx.run(&mut c1, &["EXEC"]).await;

    // Only the writes are inside the bracket; the queued GET is absent.
    assert_eq!(
        drain(&mut rx),
        vec![
            argv(&["SELECT", "0"]),
            argv(&["MULTI"]),
            argv(&["SET", "a", "1"]),
            argv(&["INCR", "a"]),
            argv(&["EXEC"]),
        ]
    );
}

#[tokio::test]
async fn test_read_only_batch_propagates_nothing() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut rx = ctx.state.sink.subscribe_for_replication();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["GET", "a"]).await;
    ctx.run(&mut c1, &["PING"]).await;
    ctx.run(&mut c1, &["EXEC"]).await;

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_cas_failed_exec_propagates_nothing() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut c2 = ctx.session();

    ctx.run(&mut c1, &["WATCH", "k"]).await;
    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "k", "y"]).await;

    let mut rx = ctx.state.sink.subscribe_for_replication();
    ctx.run(&mut c2, &["SET", "k", "x"]).await;
    assert_eq!(ctx.run(&mut c1, &["EXEC"]).await, RespValue::NullArray);

    // Only the foreign SET reached the stream.
    assert_eq!(
        drain(&mut rx),
        vec![argv(&["SELECT", "0"]), argv(&["SET", "k", "x"])]
    );
}

#[tokio::test]
async fn test_db_selector_injected_on_db_change() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut rx = ctx.state.sink.subscribe_for_replication();

    ctx.run(&mut c1, &["SET", "k", "a"]).await;
    ctx.run(&mut c1, &["SELECT", "1"]).await;
    ctx.run(&mut c1, &["SET", "k", "b"]).await;
    ctx.run(&mut c1, &["SET", "k2", "c"]).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            argv(&["SELECT", "0"]),
            argv(&["SET", "k", "a"]),
            argv(&["SELECT", "1"]),
            argv(&["SET", "k", "b"]),
            argv(&["SET", "k2", "c"]),
        ]
    );
}

#[tokio::test]
async fn test_aof_and_replication_see_identical_order() {
    let mut config = Config::default();
    config.persistence.aof_enabled = true;
    let mut ctx = TestContext::with_config(config).await;
    let mut c1 = ctx.session();
    let mut repl_rx = ctx.state.sink.subscribe_for_replication();
    let mut aof_rx = ctx.aof_rx.take().expect("AOF channel must exist");

    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["INCR", "a"]).await;
    ctx.run(&mut c1, &["DEL", "a"]).await;
    ctx.run(&mut c1, &["EXEC"]).await;

    let repl: Vec<Vec<Bytes>> = {
        let mut out = Vec::new();
        while let Ok(r) = repl_rx.try_recv() {
            out.push(r.argv);
        }
        out
    };
    let aof: Vec<Vec<Bytes>> = {
        let mut out = Vec::new();
        while let Ok(r) = aof_rx.try_recv() {
            out.push(r.argv);
        }
        out
    };
    assert!(!repl.is_empty());
    assert_eq!(repl, aof);
}

#[tokio::test]
async fn test_backlog_offset_grows_with_writes() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    let before = ctx.state.replication.backlog.master_repl_offset();
    ctx.run(&mut c1, &["SET", "k", "v"]).await;
    let after = ctx.state.replication.backlog.master_repl_offset();
    assert!(after > before);
}

#[tokio::test]
async fn test_exec_write_batch_rejected_on_read_only_replica() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    assert_eq!(ctx.run(&mut c1, &["SET", "k", "v"]).await, queued());

    ctx.state.replication.set_role(ReplicationRole::Replica {
        primary_addr: "10.0.0.9:6379".into(),
    });

    let err = ctx.run_err(&mut c1, &["EXEC"]).await;
    assert!(err.starts_with("READONLY"));

    // The batch was discarded.
    ctx.state.replication.set_role(ReplicationRole::Primary);
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_direct_write_rejected_on_read_only_replica() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.state.replication.set_role(ReplicationRole::Replica {
        primary_addr: "10.0.0.9:6379".into(),
    });
    let err = ctx.run_err(&mut c1, &["SET", "k", "v"]).await;
    assert!(err.starts_with("READONLY"));

    // Reads still work on a replica.
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_mid_batch_demotion_terminates_backlog_bracket() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    // Demotes the instance between two queued writes.
    assert_eq!(
        ctx.run(&mut c1, &["REPLICAOF", "10.0.0.9", "6379"]).await,
        queued()
    );
    ctx.run(&mut c1, &["SET", "b", "2"]).await;

    let result = ctx.run(&mut c1, &["EXEC"]).await;
    // The batch continues locally; the replica's own read-only enforcement
    // only applies to later connections.
    assert_eq!(result, RespValue::Array(vec![ok(), ok(), ok()]));

    // The backlog stream must end with a literal EXEC so replicas never see
    // a dangling MULTI. The demotion path feeds one extra terminator.
    let snapshot = ctx.state.replication.backlog.snapshot();
    let tail = b"*1\r\n$4\r\nEXEC\r\n";
    assert!(snapshot.ends_with(tail));
    let occurrences = snapshot
        .windows(tail.len())
        .filter(|w| *w == tail)
        .count();
    assert_eq!(occurrences, 2);

    assert!(ctx.state.replication.is_replica());
}
