// tests/integration/string_commands_test.rs

//! Integration tests for the data commands that exercise the keyspace:
//! strings, generic key commands, and one representative of each other type.

use super::test_helpers::{TestContext, bulk, ok};
use zircondb::core::RespValue;

// ===== Strings =====

#[tokio::test]
async fn test_set_get_roundtrip() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut c1, &["SET", "k", "value"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("value"));
    assert_eq!(ctx.run(&mut c1, &["GET", "missing"]).await, RespValue::Null);
}

#[tokio::test]
async fn test_set_nx_xx_conditions() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut c1, &["SET", "k", "a", "NX"]).await, ok());
    assert_eq!(
        ctx.run(&mut c1, &["SET", "k", "b", "NX"]).await,
        RespValue::Null
    );
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("a"));

    assert_eq!(ctx.run(&mut c1, &["SET", "k", "c", "XX"]).await, ok());
    assert_eq!(
        ctx.run(&mut c1, &["SET", "missing", "v", "XX"]).await,
        RespValue::Null
    );
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("c"));
}

#[tokio::test]
async fn test_set_with_get_option_returns_old_value() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["SET", "k", "new", "GET"]).await,
        RespValue::Null
    );
    assert_eq!(
        ctx.run(&mut c1, &["SET", "k", "newer", "GET"]).await,
        bulk("new")
    );
}

#[tokio::test]
async fn test_incr_decr_family() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["INCR", "n"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        ctx.run(&mut c1, &["INCRBY", "n", "9"]).await,
        RespValue::Integer(10)
    );
    assert_eq!(
        ctx.run(&mut c1, &["DECR", "n"]).await,
        RespValue::Integer(9)
    );
    assert_eq!(
        ctx.run(&mut c1, &["DECRBY", "n", "4"]).await,
        RespValue::Integer(5)
    );
}

#[tokio::test]
async fn test_incr_on_non_numeric_value() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "k", "foo"]).await;
    let err = ctx.run_err(&mut c1, &["INCR", "k"]).await;
    assert_eq!(err, "ERR value is not an integer or out of range");
}

#[tokio::test]
async fn test_append_and_strlen() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["APPEND", "k", "Hello"]).await,
        RespValue::Integer(5)
    );
    assert_eq!(
        ctx.run(&mut c1, &["APPEND", "k", " World"]).await,
        RespValue::Integer(11)
    );
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("Hello World"));
    assert_eq!(
        ctx.run(&mut c1, &["STRLEN", "k"]).await,
        RespValue::Integer(11)
    );
    assert_eq!(
        ctx.run(&mut c1, &["STRLEN", "missing"]).await,
        RespValue::Integer(0)
    );
}

// ===== Generic key commands =====

#[tokio::test]
async fn test_del_exists_type_dbsize() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    ctx.run(&mut c1, &["SET", "b", "2"]).await;

    assert_eq!(
        ctx.run(&mut c1, &["EXISTS", "a", "b", "c"]).await,
        RespValue::Integer(2)
    );
    assert_eq!(
        ctx.run(&mut c1, &["TYPE", "a"]).await,
        RespValue::SimpleString("string".into())
    );
    assert_eq!(
        ctx.run(&mut c1, &["TYPE", "missing"]).await,
        RespValue::SimpleString("none".into())
    );
    assert_eq!(
        ctx.run(&mut c1, &["DBSIZE"]).await,
        RespValue::Integer(2)
    );
    assert_eq!(
        ctx.run(&mut c1, &["DEL", "a", "c"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(
        ctx.run(&mut c1, &["EXISTS", "a"]).await,
        RespValue::Integer(0)
    );
}

#[tokio::test]
async fn test_expire_and_ttl() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "k", "v"]).await;
    assert_eq!(
        ctx.run(&mut c1, &["TTL", "k"]).await,
        RespValue::Integer(-1)
    );
    assert_eq!(
        ctx.run(&mut c1, &["EXPIRE", "k", "100"]).await,
        RespValue::Integer(1)
    );
    let RespValue::Integer(ttl) = ctx.run(&mut c1, &["TTL", "k"]).await else {
        panic!("TTL must return an integer");
    };
    assert!(ttl > 90 && ttl <= 100);

    assert_eq!(
        ctx.run(&mut c1, &["TTL", "missing"]).await,
        RespValue::Integer(-2)
    );
    // A non-positive ttl deletes the key.
    assert_eq!(
        ctx.run(&mut c1, &["EXPIRE", "k", "0"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(ctx.run(&mut c1, &["EXISTS", "k"]).await, RespValue::Integer(0));
}

#[tokio::test]
async fn test_select_isolates_databases() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "k", "db0"]).await;
    assert_eq!(ctx.run(&mut c1, &["SELECT", "1"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, RespValue::Null);
    ctx.run(&mut c1, &["SET", "k", "db1"]).await;
    assert_eq!(ctx.run(&mut c1, &["SELECT", "0"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["GET", "k"]).await, bulk("db0"));

    let err = ctx.run_err(&mut c1, &["SELECT", "99"]).await;
    assert!(err.contains("invalid DB index"));
}

#[tokio::test]
async fn test_flushall_clears_every_database() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "k", "v"]).await;
    ctx.run(&mut c1, &["SELECT", "1"]).await;
    ctx.run(&mut c1, &["SET", "k", "v"]).await;

    assert_eq!(ctx.run(&mut c1, &["FLUSHALL"]).await, ok());
    assert_eq!(ctx.run(&mut c1, &["DBSIZE"]).await, RespValue::Integer(0));
    ctx.run(&mut c1, &["SELECT", "0"]).await;
    assert_eq!(ctx.run(&mut c1, &["DBSIZE"]).await, RespValue::Integer(0));
}

// ===== Type errors =====

#[tokio::test]
async fn test_wrong_type_errors() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["LPUSH", "list", "x"]).await;
    let err = ctx.run_err(&mut c1, &["GET", "list"]).await;
    assert!(err.starts_with("WRONGTYPE"));

    ctx.run(&mut c1, &["SET", "str", "v"]).await;
    let err = ctx.run_err(&mut c1, &["LPUSH", "str", "x"]).await;
    assert!(err.starts_with("WRONGTYPE"));
}

// ===== Other data types =====

#[tokio::test]
async fn test_list_push_and_range() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["RPUSH", "l", "a", "b", "c"]).await,
        RespValue::Integer(3)
    );
    assert_eq!(
        ctx.run(&mut c1, &["LPUSH", "l", "z"]).await,
        RespValue::Integer(4)
    );
    assert_eq!(
        ctx.run(&mut c1, &["LLEN", "l"]).await,
        RespValue::Integer(4)
    );
    assert_eq!(
        ctx.run(&mut c1, &["LRANGE", "l", "0", "-1"]).await,
        RespValue::Array(vec![bulk("z"), bulk("a"), bulk("b"), bulk("c")])
    );
    assert_eq!(
        ctx.run(&mut c1, &["LRANGE", "l", "1", "2"]).await,
        RespValue::Array(vec![bulk("a"), bulk("b")])
    );
    assert_eq!(
        ctx.run(&mut c1, &["LRANGE", "l", "5", "9"]).await,
        RespValue::Array(vec![])
    );
}

#[tokio::test]
async fn test_set_hash_zset_basics() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["SADD", "s", "a", "b", "a"]).await,
        RespValue::Integer(2)
    );
    assert_eq!(
        ctx.run(&mut c1, &["SCARD", "s"]).await,
        RespValue::Integer(2)
    );
    let RespValue::Array(members) = ctx.run(&mut c1, &["SMEMBERS", "s"]).await else {
        panic!("SMEMBERS must return an array");
    };
    assert_eq!(members.len(), 2);

    assert_eq!(
        ctx.run(&mut c1, &["HSET", "h", "f1", "v1", "f2", "v2"]).await,
        RespValue::Integer(2)
    );
    assert_eq!(ctx.run(&mut c1, &["HGET", "h", "f1"]).await, bulk("v1"));
    assert_eq!(
        ctx.run(&mut c1, &["HGET", "h", "nope"]).await,
        RespValue::Null
    );

    assert_eq!(
        ctx.run(&mut c1, &["ZADD", "z", "1.5", "m"]).await,
        RespValue::Integer(1)
    );
    assert_eq!(ctx.run(&mut c1, &["ZSCORE", "z", "m"]).await, bulk("1.5"));
}

// ===== Introspection =====

#[tokio::test]
async fn test_object_encoding_reflects_content() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    ctx.run(&mut c1, &["SET", "n", "1234"]).await;
    assert_eq!(
        ctx.run(&mut c1, &["OBJECT", "ENCODING", "n"]).await,
        bulk("int")
    );

    ctx.run(&mut c1, &["SET", "s", "short string"]).await;
    assert_eq!(
        ctx.run(&mut c1, &["OBJECT", "ENCODING", "s"]).await,
        bulk("embstr")
    );

    let long = "x".repeat(100);
    ctx.run(&mut c1, &["SET", "long", long.as_str()]).await;
    assert_eq!(
        ctx.run(&mut c1, &["OBJECT", "ENCODING", "long"]).await,
        bulk("raw")
    );

    ctx.run(&mut c1, &["ZADD", "z", "1", "m"]).await;
    assert_eq!(
        ctx.run(&mut c1, &["OBJECT", "ENCODING", "z"]).await,
        bulk("skiplist")
    );

    let err = ctx.run_err(&mut c1, &["OBJECT", "ENCODING", "missing"]).await;
    assert!(err.contains("no such key"));
}

#[tokio::test]
async fn test_client_identity() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["CLIENT", "GETNAME"]).await,
        RespValue::Null
    );
    assert_eq!(
        ctx.run(&mut c1, &["CLIENT", "SETNAME", "worker-1"]).await,
        ok()
    );
    assert_eq!(
        ctx.run(&mut c1, &["CLIENT", "GETNAME"]).await,
        bulk("worker-1")
    );
    assert_eq!(
        ctx.run(&mut c1, &["CLIENT", "ID"]).await,
        RespValue::Integer(c1.handle.session_id as i64)
    );
}

#[tokio::test]
async fn test_ping_and_echo() {
    let ctx = TestContext::new().await;
    let mut c1 = ctx.session();

    assert_eq!(
        ctx.run(&mut c1, &["PING"]).await,
        RespValue::SimpleString("PONG".into())
    );
    assert_eq!(ctx.run(&mut c1, &["PING", "hello"]).await, bulk("hello"));
    assert_eq!(ctx.run(&mut c1, &["ECHO", "hi"]).await, bulk("hi"));
}

#[tokio::test]
async fn test_monitor_sees_commands_and_exec_replay_order() {
    let ctx = TestContext::new().await;
    let mut observer = ctx.session();
    let mut c1 = ctx.session();

    assert_eq!(ctx.run(&mut observer, &["MONITOR"]).await, ok());

    ctx.run(&mut c1, &["MULTI"]).await;
    ctx.run(&mut c1, &["SET", "a", "1"]).await;
    ctx.run(&mut c1, &["EXEC"]).await;

    let mut lines = Vec::new();
    let rx = observer.monitor_rx.as_mut().expect("monitor feed");
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }

    let commands: Vec<&str> = lines
        .iter()
        .map(|l| {
            if l.contains("\"MULTI\"") {
                "MULTI"
            } else if l.contains("\"SET\"") {
                "SET"
            } else if l.contains("\"EXEC\"") {
                "EXEC"
            } else {
                "?"
            }
        })
        .collect();
    // MULTI at dispatch, SET at queue time and again on execution, then the
    // replayed EXEC last.
    assert_eq!(commands, vec!["MULTI", "SET", "SET", "EXEC"]);
}
