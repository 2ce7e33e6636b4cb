//! Fake device that opens [`FakeStream`]s

use std::sync::Arc;

use audiohal_core::driver::{AudioDeviceDriver, StreamInDriver, StreamOutDriver};
use audiohal_core::{Status, StreamConfig, StreamKind};
use parking_lot::Mutex;

use crate::script::StreamScript;
use crate::stream::{FakeStream, StreamProbe};

#[derive(Debug, Default)]
struct DeviceState {
    script: StreamScript,
    streams: Vec<StreamProbe>,
    opened: [usize; 2],
    closed: [usize; 2],
    fail_next_open: Option<Status>,
    last_open_config: Option<StreamConfig>,
}

fn slot(kind: StreamKind) -> usize {
    match kind {
        StreamKind::Output => 0,
        StreamKind::Input => 1,
    }
}

/// In-memory device driver
///
/// Every stream it opens follows the current script.
#[derive(Debug)]
pub struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
}

/// Test-side view of a [`FakeDevice`]
#[derive(Debug, Clone)]
pub struct DeviceProbe {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    pub fn new(script: StreamScript) -> (Self, DeviceProbe) {
        let state = Arc::new(Mutex::new(DeviceState {
            script,
            ..DeviceState::default()
        }));
        let probe = DeviceProbe {
            state: Arc::clone(&state),
        };
        (Self { state }, probe)
    }

    fn open(&self, kind: StreamKind, config: &StreamConfig) -> Result<FakeStream, Status> {
        let mut state = self.state.lock();
        state.last_open_config = Some(*config);
        if let Some(status) = state.fail_next_open.take() {
            return Err(status);
        }
        let (stream, probe) = FakeStream::new(state.script.clone());
        state.streams.push(probe);
        state.opened[slot(kind)] += 1;
        Ok(stream)
    }

    fn close(&self, kind: StreamKind) -> Status {
        let mut state = self.state.lock();
        state.closed[slot(kind)] += 1;
        state.script.close_status
    }
}

impl AudioDeviceDriver for FakeDevice {
    fn open_output_stream(&self, config: &StreamConfig) -> Result<Box<dyn StreamOutDriver>, Status> {
        let stream = self.open(StreamKind::Output, config)?;
        Ok(Box::new(stream))
    }

    fn close_output_stream(&self, stream: Box<dyn StreamOutDriver>) -> Status {
        drop(stream);
        self.close(StreamKind::Output)
    }

    fn open_input_stream(&self, config: &StreamConfig) -> Result<Box<dyn StreamInDriver>, Status> {
        let stream = self.open(StreamKind::Input, config)?;
        Ok(Box::new(stream))
    }

    fn close_input_stream(&self, stream: Box<dyn StreamInDriver>) -> Status {
        drop(stream);
        self.close(StreamKind::Input)
    }
}

impl DeviceProbe {
    pub fn opened(&self, kind: StreamKind) -> usize {
        self.state.lock().opened[slot(kind)]
    }

    pub fn closed(&self, kind: StreamKind) -> usize {
        self.state.lock().closed[slot(kind)]
    }

    /// Make the next open fail with `status`
    pub fn fail_next_open(&self, status: Status) {
        self.state.lock().fail_next_open = Some(status);
    }

    /// Script used for streams opened from now on
    pub fn set_script(&self, script: StreamScript) {
        self.state.lock().script = script;
    }

    pub fn last_open_config(&self) -> Option<StreamConfig> {
        self.state.lock().last_open_config
    }

    /// Probes of every stream opened so far
    pub fn streams(&self) -> Vec<StreamProbe> {
        self.state.lock().streams.clone()
    }

    pub fn last_stream(&self) -> Option<StreamProbe> {
        self.state.lock().streams.last().cloned()
    }
}
