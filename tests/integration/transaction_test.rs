// tests/integration/transaction_test.rs

//! Integration tests for transaction commands
//! Tests: MULTI, EXEC, DISCARD, and batch semantics

use super::test_helpers::{TestContext, bulk, ok, queued};
use zircondb::core::RespValue;

// ===== MULTI/EXEC Basic Tests =====

#[tokio::test]
async fn test_basic_atomic_batch() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut c1, &["MULTI"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["SET", "a", "1"]).await, queued());
    assert_eq!(ctx.run(&mut c1, &["INCR", "a"]).await, queued());
    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, queued());

    let result = ctx.run(&mut c1, &["EXEC"]).await;
    assert_eq!(
        result,
        RespValue::Array(vec![ok(), RespValue::Integer(2), bulk("2")])
    );
    // Exact wire shape of the EXEC reply.
    assert_eq!(result.encode_to_vec(), b"*3\r\n+OK\r\n:2\r\n$1\r\n2\r\n");

    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, bulk("2"));
}

#[tokio::test]
async fn test_multi_exec_empty_transaction() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    let result = ctx.run(&mut c1, &["EXEC"]).await;
    assert_eq!(result, RespValue::Array(vec![]));
    assert_eq!(result.encode_to_vec(), b"*0\r\n");
}

#[tokio::test]
async fn test_nested_multi_rejected() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut c1, &["MULTI"]).await, ok());
    let err = ctx.run_err(&mut c1, &["MULTI"]).await;
    assert_eq!(err, "ERR MULTI calls can not be nested");

    // The nested-MULTI error is a state-precondition failure; it does not
    // poison the open transaction.
    let result = ctx.run(&mut c1, &["EXEC"]).await;
    assert_eq!(result, RespValue::Array(vec![]));
}

#[tokio::test]
async fn test_exec_without_multi() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    let err = ctx.run_err(&mut c1, &["EXEC"]).await;
    assert_eq!(err, "ERR EXEC without MULTI");
}

#[tokio::test]
async fn test_discard_without_multi() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    let err = ctx.run_err(&mut c1, &["DISCARD"]).await;
    assert_eq!(err, "ERR DISCARD without MULTI");
}

// ===== Queue-time error handling =====

#[tokio::test]
async fn test_queueing_error_aborts_exec() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut c1, &["MULTI"]).await, ok());

    let err = ctx.run_err(&mut c1, &["NOSUCHCMD"]).await;
    assert!(err.starts_with("ERR unknown command"));

    // Well-formed commands still queue after the error.
    assert_eq!(ctx.run(&mut c1, &["SET", "a", "1"]).await, queued());

    let err = ctx.run_err(&mut c1, &["EXEC"]).await;
    assert_eq!(
        err,
        "EXECABORT Transaction discarded because of previous errors."
    );

    // Nothing from the aborted batch ran.
    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, RespValue::Null);
    // The session is usable again.
    assert_eq!(ctx.run(&mut c1, &["SET", "a", "2"]).await, ok());
}

#[tokio::test]
async fn test_arity_error_during_queueing_aborts_exec() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    let err = ctx.run_err(&mut c1, &["GET"]).await;
    assert!(err.contains("wrong number of arguments"));

    let err = ctx.run_err(&mut c1, &["EXEC"]).await;
    assert!(err.starts_with("EXECABORT"));
}

#[tokio::test]
async fn test_select_queues_and_switches_db_mid_batch() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    // Only the five transaction-control commands bypass the queue; SELECT
    // queues like anything else and takes effect when the batch runs.
    ctx.run(&mut c1, &["MULTI"]).await;
    assert_eq!(ctx.run(&mut c1, &["SET", "k", "db0"]).await, queued());
    assert_eq!(ctx.run(&mut c1, &["SELECT", "1"]).await, queued());
    assert_eq!(ctx.run(&mut c1, &["SET", "k", "db1"]).await, queued());

    let result = ctx.run(&mut c1, &["EXEC"]).await;
    assert_eq!(result, RespValue::Array(vec![ok(), ok(), ok()]));

    // The session stays on the database the batch selected.
    assert_eq!(c1.current_db_index, 1);
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("db1"));
    ctx.run(&mut c1, &["SELECT", "0"]).await;
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("db0"));
}

#[tokio::test]
async fn test_queued_select_with_invalid_index_fails_inline() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    assert_eq!(ctx.run(&mut c1, &["SELECT", "99"]).await, queued());
    assert_eq!(ctx.run(&mut c1, &["SET", "k", "v"]).await, queued());

    let result = ctx.run(&mut c1, &["EXEC"]).await;
    // The bad SELECT reports inline and the batch continues on the
    // original database.
    assert_eq!(
        result,
        RespValue::Array(vec![
            RespValue::Error("ERR invalid DB index".into()),
            ok(),
        ])
    );
    assert_eq!(c1.current_db_index, 0);
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("v"));
}

// ===== Runtime error handling =====

#[tokio::test]
async fn test_runtime_error_does_not_abort_batch() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "a", "foo"]).await;

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["INCR", "a"]).await;
    ctx.run(&mut c1, &["SET", "b", "1"]).await;

    let result = ctx.run(&mut c1, &["EXEC"]).await;
    assert_eq!(
        result,
        RespValue::Array(vec![
            RespValue::Error("ERR value is not an integer or out of range".into()),
            ok(),
        ])
    );

    // The failing command changed nothing; the one after it still ran.
    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, bulk("foo"));
    assert_eq!(ctx.run(&mut c1, &["GET", "b"]).await, bulk("1"));
}

// ===== DISCARD =====

#[tokio::test]
async fn test_discard_drops_queued_commands() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    assert_eq!(ctx.run(&mut c1, &["DISCARD"]).await, ok());

    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, RespValue::Null);
    assert!(c1.tx_queue.is_empty());

    // Commands execute normally after DISCARD.
    assert_eq!(ctx.run(&mut c1, &["SET", "a", "value"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, bulk("value"));
}

#[tokio::test]
async fn test_queue_is_empty_outside_transaction() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    assert!(c1.tx_queue.is_empty());

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "2"]).await;
    assert_eq!(c1.tx_queue.len(), 1);
    ctx.run(&mut c1, &["EXEC"]).await;
    assert!(c1.tx_queue.is_empty());
}

// ===== Batch atomicity against other sessions =====

#[tokio::test]
async fn test_batch_is_not_interleaved_with_other_sessions() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();
    let mut c2 = ctx.session();

    ctx.run(&mut c1, &["SET", "counter", "0"]).await;

    ctx.run(&mut c1, &["MULTI"]).await;
    for _ in 0..10 {
        ctx.run(&mut c1, &["INCR", "counter"]).await;
    }

    // The batch runs as one unit; afterwards another session observes the
    // final value only.
    let result = ctx.run(&mut c1, &["EXEC"]).await;
    let RespValue::Array(replies) = result else {
        panic!("expected array from EXEC");
    };
    assert_eq!(replies.len(), 10);
    assert_eq!(replies.last(), Some(&RespValue::Integer(10)));

    assert_eq!(ctx.run(&mut c2, &["GET", "counter"]).await, bulk("10"));
}

// ===== RESET =====

#[tokio::test]
async fn test_reset_clears_transaction_state() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    assert_eq!(
        ctx.run(&mut c1, &["RESET"]).await,
        RespValue::SimpleString("RESET".into())
    );

    // The transaction is gone and the key untouched.
    assert!(c1.tx_queue.is_empty());
    assert_eq!(ctx.run(&mut c1, &["GET", "a"]).await, RespValue::Null);
    let err = ctx.run_err(&mut c1, &["EXEC"]).await;
    assert_eq!(err, "ERR EXEC without MULTI");
}
