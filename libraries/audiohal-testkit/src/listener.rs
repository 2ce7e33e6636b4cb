//! Listener and effect doubles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use audiohal_core::{EffectHal, EffectHandle, StreamOutHalCallback};

/// Listener that counts the completion events it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    write_ready: AtomicUsize,
    drain_ready: AtomicUsize,
    errors: AtomicUsize,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn write_ready(&self) -> usize {
        self.write_ready.load(Ordering::SeqCst)
    }

    pub fn drain_ready(&self) -> usize {
        self.drain_ready.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.write_ready() + self.drain_ready() + self.errors()
    }
}

impl StreamOutHalCallback for RecordingListener {
    fn on_write_ready(&self) {
        self.write_ready.fetch_add(1, Ordering::SeqCst);
    }

    fn on_drain_ready(&self) {
        self.drain_ready.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Effect engine stand-in exposing a fixed handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeEffect(pub EffectHandle);

impl FakeEffect {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self(EffectHandle(id)))
    }
}

impl EffectHal for FakeEffect {
    fn handle(&self) -> EffectHandle {
        self.0
    }
}
