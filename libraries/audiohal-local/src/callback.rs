//! Completion callback bridging
//!
//! A driver accepts a single plain function plus an opaque [`Cookie`]. Every
//! output adapter owns a [`CallbackSlot`] registered here under a fresh cookie;
//! [`trampoline`] is the function handed to drivers and routes events back to
//! the slot's listener.
//!
//! The registry only holds weak references, so a slot whose adapter is gone
//! resolves to nothing and late events are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use audiohal_core::driver::{Cookie, StreamOutDriver};
use audiohal_core::status::{self, Status};
use audiohal_core::{Result, StreamCallbackEvent, StreamId, StreamOutHalCallback};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

static NEXT_COOKIE: AtomicU64 = AtomicU64::new(1);

static REGISTRY: Lazy<RwLock<HashMap<Cookie, Weak<CallbackSlot>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Listener slot of one output adapter
pub(crate) struct CallbackSlot {
    cookie: Cookie,
    stream: StreamId,
    trace: bool,
    /// Set once the trampoline has been accepted by the driver
    installed: Mutex<bool>,
    listener: RwLock<Option<Weak<dyn StreamOutHalCallback>>>,
}

impl CallbackSlot {
    /// Allocate a cookie and make the slot reachable from the trampoline
    pub(crate) fn register(stream: StreamId, trace: bool) -> Arc<Self> {
        let cookie = Cookie(NEXT_COOKIE.fetch_add(1, Ordering::Relaxed));
        let slot = Arc::new(Self {
            cookie,
            stream,
            trace,
            installed: Mutex::new(false),
            listener: RwLock::new(None),
        });
        REGISTRY.write().insert(cookie, Arc::downgrade(&slot));
        slot
    }

    pub(crate) fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Replace the listener, installing the trampoline on first use.
    ///
    /// The driver may fire events from inside `set_callback`; those only take
    /// the listener lock, never the install lock.
    pub(crate) fn set_listener(
        &self,
        driver: &dyn StreamOutDriver,
        listener: &Arc<dyn StreamOutHalCallback>,
    ) -> Result<()> {
        let mut installed = self.installed.lock();
        if !*installed {
            status::check(driver.set_callback(trampoline, self.cookie))?;
            *installed = true;
            debug!("Installed completion trampoline for {} ({:?})", self.stream, self.cookie);
        }
        *self.listener.write() = Some(Arc::downgrade(listener));
        Ok(())
    }

    fn dispatch(&self, raw: u32) {
        let Some(event) = StreamCallbackEvent::from_raw(raw) else {
            warn!("{} ignoring unknown driver callback event {}", self.stream, raw);
            return;
        };

        // Upgrade under the lock, call outside it
        let listener = self.listener.read().as_ref().and_then(Weak::upgrade);
        let Some(listener) = listener else {
            debug!("{} dropped {:?}: no live listener", self.stream, event);
            return;
        };

        if self.trace {
            debug!("{} dispatching {:?}", self.stream, event);
        }

        match event {
            StreamCallbackEvent::WriteReady => listener.on_write_ready(),
            StreamCallbackEvent::DrainReady => listener.on_drain_ready(),
            StreamCallbackEvent::Error => listener.on_error(),
        }
    }
}

impl Drop for CallbackSlot {
    fn drop(&mut self) {
        REGISTRY.write().remove(&self.cookie);
    }
}

/// Entry point installed with every driver stream.
///
/// Runs on a driver thread. Always reports success: the driver has no way to
/// act on a failed notification.
pub(crate) fn trampoline(event: u32, cookie: Cookie) -> Status {
    let slot = REGISTRY.read().get(&cookie).and_then(Weak::upgrade);
    match slot {
        Some(slot) => slot.dispatch(event),
        None => trace!("Completion event {} for released {:?}", event, cookie),
    }
    status::OK
}
