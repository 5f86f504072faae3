// tests/integration/slowlog_test.rs

//! Integration tests for the slow-query log, driven through the dispatcher.

use super::test_helpers::{TestContext, ok};
use zircondb::config::Config;
use zircondb::core::RespValue;

/// Unwraps a `SLOWLOG GET` reply into its per-entry element arrays.
fn entries(reply: RespValue) -> Vec<Vec<RespValue>> {
    let RespValue::Array(entries) = reply else {
        panic!("expected array from SLOWLOG GET");
    };
    entries
        .into_iter()
        .map(|e| match e {
            RespValue::Array(fields) => fields,
            other => panic!("expected entry array, got {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn test_slowlog_capture_and_retention() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["CONFIG", "SET", "slowlog-log-slower-than", "0"])
            .await,
        ok()
    );
    assert_eq!(
        ctx.run(&mut c1, &["CONFIG", "SET", "slowlog-max-len", "2"])
            .await,
        ok()
    );

    ctx.run(&mut c1, &["PING"]).await;
    ctx.run(&mut c1, &["PING"]).await;
    ctx.run(&mut c1, &["PING"]).await;

    assert_eq!(
        ctx.run(&mut c1, &["SLOWLOG", "LEN"]).await,
        RespValue::Integer(2)
    );

    let entries = entries(ctx.run(&mut c1, &["SLOWLOG", "GET", "10"]).await);
    assert_eq!(entries.len(), 2);

    // Reverse-chronological order with consecutive ids.
    let RespValue::Integer(id0) = entries[0][0] else {
        panic!("entry id must be an integer");
    };
    let RespValue::Integer(id1) = entries[1][0] else {
        panic!("entry id must be an integer");
    };
    assert_eq!(id0, id1 + 1);

    // Both retained entries are the most recent PINGs.
    for entry in &entries {
        assert_eq!(
            entry[3],
            RespValue::Array(vec![RespValue::BulkString("PING".into())])
        );
    }
}

#[tokio::test]
async fn test_slowlog_entry_shape() {
    let mut config = Config::default();
    config.slowlog.log_slower_than = 0;
    let ctx = TestContext::with_config(config).await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["CLIENT", "SETNAME", "auditor"]).await;
    ctx.run(&mut c1, &["SET", "k", "v"]).await;

    let entries = entries(ctx.run(&mut c1, &["SLOWLOG", "GET"]).await);
    // Find the SET entry (CLIENT SETNAME was also captured).
    let entry = entries
        .iter()
        .find(|e| {
            matches!(&e[3], RespValue::Array(args)
                if args.first() == Some(&RespValue::BulkString("SET".into())))
        })
        .expect("SET entry must be captured");

    assert_eq!(entry.len(), 6);
    assert!(matches!(entry[0], RespValue::Integer(_)));
    assert!(matches!(entry[1], RespValue::Integer(t) if t > 0));
    assert!(matches!(entry[2], RespValue::Integer(d) if d >= 0));
    assert_eq!(
        entry[3],
        RespValue::Array(vec![
            RespValue::BulkString("SET".into()),
            RespValue::BulkString("k".into()),
            RespValue::BulkString("v".into()),
        ])
    );
    assert!(matches!(&entry[4], RespValue::BulkString(addr) if addr.starts_with(b"127.0.0.1:")));
    assert_eq!(entry[5], RespValue::BulkString("auditor".into()));
}

#[tokio::test]
async fn test_slowlog_reset_and_default_count() {
    let mut config = Config::default();
    config.slowlog.log_slower_than = 0;
    let ctx = TestContext::with_config(config).await;
    let mut c1 = ctx.session();

    for _ in 0..15 {
        ctx.run(&mut c1, &["PING"]).await;
    }
    // Default GET count is 10.
    let listed = entries(ctx.run(&mut c1, &["SLOWLOG", "GET"]).await);
    assert_eq!(listed.len(), 10);

    assert_eq!(ctx.run(&mut c1, &["SLOWLOG", "RESET"]).await, ok());
    // The RESET itself runs before its own observation; only it can remain.
    let RespValue::Integer(len) = ctx.run(&mut c1, &["SLOWLOG", "LEN"]).await else {
        panic!("SLOWLOG LEN must return an integer");
    };
    assert!(len <= 2);
}

#[tokio::test]
async fn test_slowlog_disabled_by_negative_threshold() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["CONFIG", "SET", "slowlog-log-slower-than", "-1"])
        .await;
    ctx.run(&mut c1, &["PING"]).await;
    ctx.run(&mut c1, &["SET", "k", "v"]).await;

    assert_eq!(
        ctx.run(&mut c1, &["SLOWLOG", "LEN"]).await,
        RespValue::Integer(0)
    );
}

#[tokio::test]
async fn test_slowlog_observes_commands_inside_exec() {
    let mut config = Config::default();
    config.slowlog.log_slower_than = 0;
    let ctx = TestContext::with_config(config).await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    ctx.run(&mut c1, &["EXEC"]).await;

    let listed = entries(ctx.run(&mut c1, &["SLOWLOG", "GET", "50"]).await);
    let has_inner_set = listed.iter().any(|e| {
        matches!(&e[3], RespValue::Array(args)
            if args.first() == Some(&RespValue::BulkString("SET".into())))
    });
    let has_exec = listed.iter().any(|e| {
        matches!(&e[3], RespValue::Array(args)
            if args.first() == Some(&RespValue::BulkString("EXEC".into())))
    });
    assert!(has_inner_set, "queued command must be observed on execution");
    assert!(has_exec, "the EXEC itself must be observed");
}

#[tokio::test]
async fn test_slowlog_help() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    let RespValue::Array(lines) = ctx.run(&mut c1, &["SLOWLOG", "HELP"]).await else {
        panic!("SLOWLOG HELP must return an array");
    };
    assert!(!lines.is_empty());
}

#[tokio::test]
async fn test_slowlog_unknown_subcommand() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    let err = ctx.run_err(&mut c1, &["SLOWLOG", "BOGUS"]).await;
    assert!(err.contains("unknown command"));
}
