// tests/property/invariants_test.rs

//! Property tests for transaction and watch invariants, driven through the
//! dispatcher.

use crate::test_helpers::TestContext;
use bytes::Bytes;
use proptest::prelude::*;
use zircondb::core::RespValue;
use zircondb::core::state::client::SessionFlags;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 25,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn set_get_consistency(
        key_value_pairs in prop::collection::hash_map(
            "[a-zA-Z0-9_]{1,32}",
            "[ -~]{0,64}",
            1..=16
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut session = ctx.session();

            for (key, value) in &key_value_pairs {
                let reply = ctx.run(&mut session, &["SET", key.as_str(), value.as_str()]).await;
                assert_eq!(reply, RespValue::SimpleString("OK".into()));
            }
            for (key, value) in &key_value_pairs {
                let reply = ctx.run(&mut session, &["GET", key.as_str()]).await;
                assert_eq!(reply, RespValue::BulkString(Bytes::from(value.clone())));
            }
        });
    }

    #[test]
    fn discarded_transaction_leaves_keyspace_untouched(
        initial in prop::collection::hash_map("[a-z]{1,8}", "[a-z0-9]{1,16}", 1..=8),
        queued_writes in prop::collection::vec(
            ("[a-z]{1,8}", "[a-z0-9]{1,16}"),
            1..=8
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut session = ctx.session();

            for (key, value) in &initial {
                ctx.run(&mut session, &["SET", key.as_str(), value.as_str()]).await;
            }

            ctx.run(&mut session, &["MULTI"]).await;
            for (key, value) in &queued_writes {
                ctx.run(&mut session, &["SET", key.as_str(), value.as_str()]).await;
            }
            ctx.run(&mut session, &["DISCARD"]).await;

            // Nothing queued ever ran.
            assert!(session.tx_queue.is_empty());
            assert!(!session.handle.has_flag(SessionFlags::IN_TX));
            let RespValue::Integer(size) = ctx.run(&mut session, &["DBSIZE"]).await else {
                panic!("DBSIZE must return an integer");
            };
            assert_eq!(size as usize, initial.len());
            for (key, value) in &initial {
                let reply = ctx.run(&mut session, &["GET", key.as_str()]).await;
                assert_eq!(reply, RespValue::BulkString(Bytes::from(value.clone())));
            }
        });
    }

    #[test]
    fn watch_bookkeeping_stays_symmetric(
        operations in prop::collection::vec(
            (any::<bool>(), "[a-e]"),
            1..=24
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut session = ctx.session();

            for (watch, key) in &operations {
                if *watch {
                    ctx.run(&mut session, &["WATCH", key.as_str()]).await;
                } else {
                    ctx.run(&mut session, &["UNWATCH"]).await;
                }

                // The session-side list and the keyspace-side watcher lists
                // must describe the same relation after every step.
                let db = ctx.state.get_db(0).unwrap();
                let keyspace = db.lock().await;
                assert_eq!(keyspace.watched_key_count(), session.watched.len());
                for entry in &session.watched {
                    assert_eq!(keyspace.watcher_count(&entry.key), 1);
                }
            }
        });
    }

    #[test]
    fn exec_applies_all_queued_writes(
        values in prop::collection::vec("[a-z0-9]{1,12}", 1..=10)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut session = ctx.session();

            ctx.run(&mut session, &["MULTI"]).await;
            for (i, value) in values.iter().enumerate() {
                let key = format!("k{i}");
                ctx.run(&mut session, &["SET", key.as_str(), value.as_str()]).await;
            }
            let RespValue::Array(replies) = ctx.run(&mut session, &["EXEC"]).await else {
                panic!("EXEC must return an array");
            };
            assert_eq!(replies.len(), values.len());

            for (i, value) in values.iter().enumerate() {
                let key = format!("k{i}");
                let reply = ctx.run(&mut session, &["GET", key.as_str()]).await;
                assert_eq!(reply, RespValue::BulkString(Bytes::from(value.clone())));
            }
        });
    }
}
