#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Scheme names the resolver accepts.
pub fn arb_scheme() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

/// The part after `scheme://`.
pub fn arb_rest() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._/-]{1,24}"
}

/// Absolute Unix-style paths.
pub fn arb_abs_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_.-]{1,8}", 0..4).prop_map(|parts| format!("/{}", parts.join("/")))
}
