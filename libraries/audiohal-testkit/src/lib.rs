#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

//! Shared test utilities for the audiohal workspace.
//!
//! [`FakeDevice`] opens [`FakeStream`]s that follow a [`StreamScript`]; the
//! matching probes let a test inspect recorded calls, force statuses, hold a
//! transfer in flight, and fire completion events from a driver thread.

pub mod device;
pub mod listener;
pub mod script;
pub mod stream;

use std::sync::Once;

pub use device::{DeviceProbe, FakeDevice};
pub use listener::{FakeEffect, RecordingListener};
pub use script::{Op, StreamScript};
pub use stream::{FakeStream, StreamProbe, READ_PATTERN};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}
