// tests/property/slowlog_props_test.rs

//! Property tests for the slow log: bounded length, strictly increasing ids,
//! and the argument truncation rules.

use bytes::Bytes;
use proptest::prelude::*;
use std::time::Duration;
use zircondb::core::slowlog::{
    SLOWLOG_MAX_ARG_LEN, SLOWLOG_MAX_RETAINED_ARGS, SlowLog,
};
use zircondb::core::state::client::ClientHandle;

fn handle() -> ClientHandle {
    ClientHandle::new(1, "127.0.0.1:6379".into())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn slowlog_never_exceeds_max_len(
        max_len in 0usize..16,
        observations in prop::collection::vec(0u64..200, 0..64)
    ) {
        let log = SlowLog::new(0, max_len);
        let handle = handle();
        for micros in observations {
            log.observe(
                &handle,
                &[Bytes::from_static(b"PING")],
                Duration::from_micros(micros),
            );
            prop_assert!(log.len() <= max_len);
        }
    }

    #[test]
    fn slowlog_ids_strictly_increase(
        count in 1usize..32
    ) {
        let log = SlowLog::new(0, 64);
        let handle = handle();
        for _ in 0..count {
            log.observe(&handle, &[Bytes::from_static(b"PING")], Duration::from_micros(1));
        }
        let entries = log.get(64);
        // Newest first; ids decrease by exactly one along the list.
        for pair in entries.windows(2) {
            prop_assert_eq!(pair[0].id, pair[1].id + 1);
        }
    }

    #[test]
    fn slowlog_threshold_filters_consistently(
        threshold in 0i64..10_000,
        durations in prop::collection::vec(0u64..20_000, 0..32)
    ) {
        let log = SlowLog::new(threshold, 1024);
        let handle = handle();
        let expected = durations
            .iter()
            .filter(|d| **d >= threshold as u64)
            .count();
        for micros in durations {
            log.observe(&handle, &[Bytes::from_static(b"GET")], Duration::from_micros(micros));
        }
        prop_assert_eq!(log.len(), expected);
    }

    #[test]
    fn slowlog_truncation_bounds_hold(
        args in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 0..400),
            1..80
        )
    ) {
        let log = SlowLog::new(0, 8);
        let handle = handle();
        let argv: Vec<Bytes> = args.into_iter().map(Bytes::from).collect();
        let argc = argv.len();
        log.observe(&handle, &argv, Duration::from_micros(1));

        let entry = &log.get(1)[0];
        prop_assert!(entry.argv.len() <= SLOWLOG_MAX_RETAINED_ARGS);
        if argc > SLOWLOG_MAX_RETAINED_ARGS {
            let marker = format!("... ({} more arguments)", argc - SLOWLOG_MAX_RETAINED_ARGS + 1);
            prop_assert_eq!(entry.argv.last().unwrap(), &Bytes::from(marker));
        }
        let kept = if argc > SLOWLOG_MAX_RETAINED_ARGS {
            SLOWLOG_MAX_RETAINED_ARGS - 1
        } else {
            argc
        };
        for (stored, original) in entry.argv[..kept].iter().zip(argv.iter()) {
            if original.len() > SLOWLOG_MAX_ARG_LEN {
                let marker = format!("... ({} more bytes)", original.len() - SLOWLOG_MAX_ARG_LEN);
                prop_assert!(stored.len() == SLOWLOG_MAX_ARG_LEN + marker.len());
                prop_assert!(stored.ends_with(marker.as_bytes()));
            }
        }
    }
}
