//! Completion callback bridging tests
//!
//! Events are fired by the fake driver, mostly from its own thread, and must
//! reach the most recently registered live listener exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use audiohal_core::status;
use audiohal_core::{
    DrainType, HalError, StreamCallbackEvent, StreamConfig, StreamKind, StreamOutHal,
    StreamOutHalCallback,
};
use audiohal_local::{DeviceHalLocal, StreamOutHalLocal};
use audiohal_testkit::{init_tracing, FakeDevice, RecordingListener, StreamProbe, StreamScript};
use mockall::mock;
use proptest::prelude::*;

mock! {
    pub Listener {}

    impl StreamOutHalCallback for Listener {
        fn on_write_ready(&self);
        fn on_drain_ready(&self);
        fn on_error(&self);
    }
}

/// Listener whose count outlives it
struct CountingListener(Arc<AtomicUsize>);

impl StreamOutHalCallback for CountingListener {
    fn on_write_ready(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn on_drain_ready(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn open(script: StreamScript) -> (Arc<StreamOutHalLocal>, StreamProbe) {
    init_tracing();
    let (driver, device) = FakeDevice::new(script);
    let stream = DeviceHalLocal::new(Box::new(driver))
        .open_output_stream(&StreamConfig::output_default())
        .unwrap();
    (stream, device.last_stream().unwrap())
}

fn fire(probe: &StreamProbe, event: StreamCallbackEvent) {
    assert_eq!(probe.fire(event).join().unwrap(), status::OK);
}

#[test]
fn events_reach_listener_from_driver_thread() {
    let (stream, probe) = open(StreamScript::default().full_output());

    let mut listener = MockListener::new();
    listener.expect_on_write_ready().times(1).return_const(());
    listener.expect_on_drain_ready().times(1).return_const(());
    listener.expect_on_error().never();
    let listener: Arc<dyn StreamOutHalCallback> = Arc::new(listener);

    stream.set_callback(Arc::clone(&listener)).unwrap();
    fire(&probe, StreamCallbackEvent::WriteReady);
    fire(&probe, StreamCallbackEvent::DrainReady);
}

#[test]
fn replacement_routes_to_latest_listener() {
    let (stream, probe) = open(StreamScript::default().full_output());

    let mut first = MockListener::new();
    first.expect_on_write_ready().never();
    let mut second = MockListener::new();
    second.expect_on_write_ready().times(1).return_const(());

    let first: Arc<dyn StreamOutHalCallback> = Arc::new(first);
    let second: Arc<dyn StreamOutHalCallback> = Arc::new(second);

    stream.set_callback(Arc::clone(&first)).unwrap();
    stream.set_callback(Arc::clone(&second)).unwrap();
    fire(&probe, StreamCallbackEvent::WriteReady);

    assert_eq!(probe.callback_installs(), 1);
}

#[test]
fn dropped_listener_gets_nothing() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let count = Arc::new(AtomicUsize::new(0));

    let listener: Arc<dyn StreamOutHalCallback> = Arc::new(CountingListener(Arc::clone(&count)));
    stream.set_callback(Arc::clone(&listener)).unwrap();
    fire(&probe, StreamCallbackEvent::WriteReady);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    drop(listener);
    fire(&probe, StreamCallbackEvent::WriteReady);
    fire(&probe, StreamCallbackEvent::DrainReady);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn error_event_reaches_listener() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let listener = RecordingListener::new();
    stream.set_callback(listener.clone()).unwrap();

    fire(&probe, StreamCallbackEvent::Error);
    assert_eq!(listener.errors(), 1);
    assert_eq!(listener.total(), 1);
}

#[test]
fn unknown_event_is_ignored() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let listener = RecordingListener::new();
    stream.set_callback(listener.clone()).unwrap();

    assert_eq!(probe.fire_raw_sync(77), status::OK);
    assert_eq!(listener.total(), 0);
}

#[test]
fn set_callback_unsupported() {
    let (stream, probe) = open(StreamScript::default());
    let listener = RecordingListener::new();

    let err = stream.set_callback(listener).unwrap_err();
    assert_eq!(err, HalError::Unsupported(status::INVALID_OPERATION));
    assert_eq!(probe.installed_cookie(), None);
}

#[test]
fn events_after_close_are_dropped() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let listener = RecordingListener::new();
    stream.set_callback(listener.clone()).unwrap();

    drop(stream);
    assert!(probe.dropped());

    // The fake still remembers the trampoline and cookie
    fire(&probe, StreamCallbackEvent::WriteReady);
    assert_eq!(listener.total(), 0);
}

#[test]
fn cookies_are_per_stream() {
    let (driver, device) = FakeDevice::new(StreamScript::default().full_output());
    let device_hal = DeviceHalLocal::new(Box::new(driver));
    let a = device_hal.open_default_output_stream().unwrap();
    let b = device_hal.open_default_output_stream().unwrap();
    let probes = device.streams();

    let la = RecordingListener::new();
    let lb = RecordingListener::new();
    a.set_callback(la.clone()).unwrap();
    b.set_callback(lb.clone()).unwrap();

    assert_ne!(probes[0].installed_cookie(), probes[1].installed_cookie());

    fire(&probes[1], StreamCallbackEvent::WriteReady);
    assert_eq!(la.total(), 0);
    assert_eq!(lb.write_ready(), 1);
}

#[test]
fn drain_ready_once_per_event() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let listener = RecordingListener::new();
    stream.set_callback(listener.clone()).unwrap();

    stream.drain(DrainType::All).unwrap();
    stream.drain(DrainType::EarlyNotify).unwrap();
    assert_eq!(probe.drains(), vec![DrainType::All, DrainType::EarlyNotify]);
    assert_eq!(listener.drain_ready(), 0);

    fire(&probe, StreamCallbackEvent::DrainReady);
    assert_eq!(listener.drain_ready(), 1);

    fire(&probe, StreamCallbackEvent::DrainReady);
    assert_eq!(listener.drain_ready(), 2);
    assert_eq!(listener.write_ready(), 0);
}

#[test]
fn registration_races_dispatch() {
    const EVENTS: usize = 2000;

    let (stream, probe) = open(StreamScript::default().full_output());
    let listeners: Vec<_> = (0..4).map(|_| RecordingListener::new()).collect();
    stream.set_callback(listeners[0].clone()).unwrap();

    let firing = {
        let probe = probe.clone();
        std::thread::spawn(move || {
            for _ in 0..EVENTS {
                assert_eq!(probe.fire_sync(StreamCallbackEvent::WriteReady), status::OK);
            }
        })
    };

    for i in 0..EVENTS {
        stream.set_callback(listeners[i % listeners.len()].clone()).unwrap();
    }
    firing.join().unwrap();

    // Every listener stays alive, so no event may be lost or doubled
    let delivered: usize = listeners.iter().map(|l| l.write_ready()).sum();
    assert_eq!(delivered, EVENTS);
    assert_eq!(probe.callback_installs(), 1);
}

#[test]
fn listener_teardown_races_dispatch() {
    const EVENTS: usize = 5000;

    let (stream, probe) = open(StreamScript::default().full_output());
    let delivered = Arc::new(AtomicUsize::new(0));
    let keep: Arc<dyn StreamOutHalCallback> = Arc::new(CountingListener(Arc::clone(&delivered)));
    stream.set_callback(Arc::clone(&keep)).unwrap();
    drop(keep);

    let firing = {
        let probe = probe.clone();
        std::thread::spawn(move || {
            for _ in 0..EVENTS {
                assert_eq!(probe.fire_sync(StreamCallbackEvent::WriteReady), status::OK);
            }
        })
    };

    for _ in 0..EVENTS {
        let listener: Arc<dyn StreamOutHalCallback> =
            Arc::new(CountingListener(Arc::clone(&delivered)));
        stream.set_callback(Arc::clone(&listener)).unwrap();
        drop(listener);
    }
    firing.join().unwrap();

    // Listeners die while events are in flight; some events find nobody
    assert!(delivered.load(Ordering::SeqCst) <= EVENTS);
    assert_eq!(probe.callback_installs(), 1);

    // Nothing alive is registered any more
    let before = delivered.load(Ordering::SeqCst);
    probe.fire_sync(StreamCallbackEvent::WriteReady);
    assert_eq!(delivered.load(Ordering::SeqCst), before);
}

/// Swaps in `next` on the first write-ready it sees
struct Handover {
    stream: Arc<StreamOutHalLocal>,
    next: Mutex<Option<Arc<dyn StreamOutHalCallback>>>,
    seen: AtomicUsize,
}

impl StreamOutHalCallback for Handover {
    fn on_write_ready(&self) {
        self.seen.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.next.lock().unwrap().take() {
            self.stream.set_callback(next).unwrap();
        }
    }

    fn on_drain_ready(&self) {}
}

#[test]
fn listener_reregisters_from_callback() {
    let (stream, probe) = open(StreamScript::default().full_output());
    let replacement = RecordingListener::new();
    let next: Arc<dyn StreamOutHalCallback> = replacement.clone();
    let handover = Arc::new(Handover {
        stream: Arc::clone(&stream),
        next: Mutex::new(Some(next)),
        seen: AtomicUsize::new(0),
    });
    stream.set_callback(handover.clone()).unwrap();

    fire(&probe, StreamCallbackEvent::WriteReady);
    assert_eq!(handover.seen.load(Ordering::SeqCst), 1);
    assert_eq!(replacement.write_ready(), 0);

    fire(&probe, StreamCallbackEvent::WriteReady);
    assert_eq!(handover.seen.load(Ordering::SeqCst), 1);
    assert_eq!(replacement.write_ready(), 1);
    assert_eq!(probe.callback_installs(), 1);
}

/// Holds the only strong reference to its stream until notified
struct LastOwner {
    stream: Mutex<Option<Arc<StreamOutHalLocal>>>,
}

impl StreamOutHalCallback for LastOwner {
    fn on_write_ready(&self) {
        drop(self.stream.lock().unwrap().take());
    }

    fn on_drain_ready(&self) {}
}

#[test]
fn last_release_inside_callback_closes_once() {
    init_tracing();
    let (driver, device) = FakeDevice::new(StreamScript::default().full_output());
    let hal = DeviceHalLocal::new(Box::new(driver));
    let stream = hal.open_output_stream(&StreamConfig::output_default()).unwrap();
    let probe = device.last_stream().unwrap();

    let owner = Arc::new(LastOwner {
        stream: Mutex::new(Some(Arc::clone(&stream))),
    });
    stream.set_callback(owner.clone()).unwrap();
    drop(stream);
    assert_eq!(device.closed(StreamKind::Output), 0);

    fire(&probe, StreamCallbackEvent::WriteReady);
    assert!(owner.stream.lock().unwrap().is_none());
    assert_eq!(device.closed(StreamKind::Output), 1);
    assert!(probe.dropped());
    assert_eq!(hal.open_streams(StreamKind::Output), 0);

    // The cookie is gone with the stream
    assert_eq!(probe.fire_sync(StreamCallbackEvent::WriteReady), status::OK);
    assert_eq!(device.closed(StreamKind::Output), 1);
}

#[derive(Debug, Clone)]
enum Step {
    Register(usize),
    Fire,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![(0..3usize).prop_map(Step::Register), Just(Step::Fire)]
}

proptest! {
    #[test]
    fn events_follow_last_registration(steps in prop::collection::vec(step(), 1..40)) {
        let (stream, probe) = open(StreamScript::default().full_output());
        let listeners: Vec<_> = (0..3).map(|_| RecordingListener::new()).collect();
        let mut expected = [0usize; 3];
        let mut current = None;

        for step in steps {
            match step {
                Step::Register(i) => {
                    stream.set_callback(listeners[i].clone()).unwrap();
                    current = Some(i);
                }
                Step::Fire => {
                    probe.fire_sync(StreamCallbackEvent::WriteReady);
                    if let Some(i) = current {
                        expected[i] += 1;
                    }
                }
            }
        }

        for (listener, want) in listeners.iter().zip(expected) {
            prop_assert_eq!(listener.write_ready(), want);
        }
        prop_assert!(probe.callback_installs() <= 1);
    }
}
