//! Construction behavior against workers that never complete the handshake.

#![cfg(unix)]

use std::time::Duration;

use cryopool_core::{Coordinator, Error, PoolConfig};

#[test]
fn handshake_timeout_is_fatal_to_construction() {
    // `sleep` swallows the startup frame and never acknowledges.
    let sleep = which::which("sleep").expect("sleep not on PATH");
    let config = PoolConfig::default()
        .with_worker_path(sleep)
        .with_worker_args(["30".to_string()])
        .with_startup_timeout(Duration::from_millis(300));

    let err = Coordinator::with_config(2, config).unwrap_err();
    assert!(matches!(err, Error::HandshakeTimeout { .. }));
}

#[test]
fn worker_exiting_at_startup_fails_construction() {
    // `true` exits immediately; depending on timing the failure surfaces as
    // a broken command channel or a closed result channel, never success.
    let truth = which::which("true").expect("true not on PATH");
    let config = PoolConfig::default()
        .with_worker_path(truth)
        .with_startup_timeout(Duration::from_secs(2));

    assert!(Coordinator::with_config(1, config).is_err());
}
