//! Fake driver stream and its probe

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use audiohal_core::driver::{
    Cookie, OutEntry, StreamCallback, StreamDriver, StreamInDriver, StreamOutDriver,
};
use audiohal_core::status::{self, Status};
use audiohal_core::{AudioFormat, ChannelMask, DrainType, EffectHandle, StreamCallbackEvent};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::script::{Op, StreamScript};

/// Fill pattern for bytes handed out by `read`
pub const READ_PATTERN: u8 = 0x5A;

#[derive(Debug)]
struct StreamState {
    script: StreamScript,
    calls: Vec<Op>,
    bytes_written: usize,
    volume: Option<(f32, f32)>,
    gain: Option<f32>,
    parameters_set: Vec<String>,
    parameter_queries: Vec<String>,
    effects: BTreeSet<u64>,
    callback: Option<(StreamCallback, Cookie)>,
    callback_installs: usize,
    drains: Vec<DrainType>,
    dropped: bool,
}

/// Blocking gate shared by a stream (waiting side) and its probe
#[derive(Debug, Clone)]
struct Gate {
    entered_tx: Sender<()>,
    entered_rx: Receiver<()>,
    release_tx: Sender<()>,
    release_rx: Receiver<()>,
}

impl Gate {
    fn new() -> Self {
        let (entered_tx, entered_rx) = bounded(16);
        let (release_tx, release_rx) = bounded(16);
        Self {
            entered_tx,
            entered_rx,
            release_tx,
            release_rx,
        }
    }
}

/// In-memory driver stream implementing both output and input tables
#[derive(Debug)]
pub struct FakeStream {
    state: Arc<Mutex<StreamState>>,
    gate: Option<Gate>,
}

/// Test-side view of a [`FakeStream`]
#[derive(Debug, Clone)]
pub struct StreamProbe {
    state: Arc<Mutex<StreamState>>,
    gate: Option<Gate>,
}

impl FakeStream {
    pub fn new(script: StreamScript) -> (Self, StreamProbe) {
        let gate = script.gate_transfers.then(Gate::new);
        let state = Arc::new(Mutex::new(StreamState {
            script,
            calls: Vec::new(),
            bytes_written: 0,
            volume: None,
            gain: None,
            parameters_set: Vec::new(),
            parameter_queries: Vec::new(),
            effects: BTreeSet::new(),
            callback: None,
            callback_installs: 0,
            drains: Vec::new(),
            dropped: false,
        }));
        let probe = StreamProbe {
            state: Arc::clone(&state),
            gate: gate.clone(),
        };
        (Self { state, gate }, probe)
    }

    /// Record the call; `Err` carries a scripted failure.
    fn enter(&self, op: Op) -> Result<MutexGuard<'_, StreamState>, Status> {
        let mut state = self.state.lock();
        trace!("fake driver: {:?}", op);
        state.calls.push(op);
        match state.script.failures.get(&op).copied() {
            Some(forced) => Err(forced),
            None => Ok(state),
        }
    }

    fn optional(&self, op: Op, entry: OutEntry) -> Result<MutexGuard<'_, StreamState>, Status> {
        let state = self.enter(op)?;
        if state.script.provides.contains(&entry) {
            Ok(state)
        } else {
            Err(status::INVALID_OPERATION)
        }
    }

    fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            let _ = gate.entered_tx.send(());
            let _ = gate.release_rx.recv();
        }
    }

    fn transfer_len(&self, op: Op, requested: usize) -> isize {
        let cap = match self.enter(op) {
            Ok(state) => state.script.accept_at_most,
            Err(forced) => return forced as isize,
        };
        // Lock is released while blocked on the gate
        self.wait_gate();
        requested.min(cap.unwrap_or(usize::MAX)) as isize
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.state.lock().dropped = true;
    }
}

impl StreamDriver for FakeStream {
    fn get_sample_rate(&self, rate: &mut u32) -> Status {
        match self.enter(Op::GetSampleRate) {
            Ok(state) => {
                *rate = state.script.sample_rate;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_buffer_size(&self, bytes: &mut usize) -> Status {
        match self.enter(Op::GetBufferSize) {
            Ok(state) => {
                *bytes = state.script.buffer_size;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_channel_mask(&self, mask: &mut ChannelMask) -> Status {
        match self.enter(Op::GetChannelMask) {
            Ok(state) => {
                *mask = state.script.channel_mask;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_format(&self, format: &mut AudioFormat) -> Status {
        match self.enter(Op::GetFormat) {
            Ok(state) => {
                *format = state.script.format;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn set_parameters(&self, kv_pairs: &str) -> Status {
        match self.enter(Op::SetParameters) {
            Ok(mut state) => {
                state.parameters_set.push(kv_pairs.to_string());
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_parameters(&self, keys: &str, values: &mut String) -> Status {
        match self.enter(Op::GetParameters) {
            Ok(mut state) => {
                state.parameter_queries.push(keys.to_string());
                values.clone_from(&state.script.parameters_reply);
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn add_audio_effect(&self, effect: EffectHandle) -> Status {
        match self.enter(Op::AddEffect) {
            Ok(mut state) => {
                if state.effects.contains(&effect.0) {
                    status::ALREADY
                } else if state.effects.len() >= state.script.effect_capacity {
                    status::BUSY
                } else {
                    state.effects.insert(effect.0);
                    status::OK
                }
            }
            Err(forced) => forced,
        }
    }

    fn remove_audio_effect(&self, effect: EffectHandle) -> Status {
        match self.enter(Op::RemoveEffect) {
            Ok(mut state) => {
                if state.effects.remove(&effect.0) {
                    status::OK
                } else {
                    status::BAD_VALUE
                }
            }
            Err(forced) => forced,
        }
    }

    fn standby(&self) -> Status {
        match self.enter(Op::Standby) {
            Ok(_) => status::OK,
            Err(forced) => forced,
        }
    }

    fn dump(&self, out: &mut dyn Write) -> Status {
        let line = match self.enter(Op::Dump) {
            Ok(state) => format!(
                "fake stream: rate {} mask {:#x} format {:#x} effects {}\n",
                state.script.sample_rate,
                state.script.channel_mask.0,
                state.script.format.0,
                state.effects.len()
            ),
            Err(forced) => return forced,
        };
        match out.write_all(line.as_bytes()) {
            Ok(()) => status::OK,
            Err(_) => status::IO_ERROR,
        }
    }
}

impl StreamOutDriver for FakeStream {
    fn get_latency(&self, latency_ms: &mut u32) -> Status {
        match self.enter(Op::GetLatency) {
            Ok(state) => {
                *latency_ms = state.script.latency_ms;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn set_volume(&self, left: f32, right: f32) -> Status {
        match self.enter(Op::SetVolume) {
            Ok(mut state) => {
                state.volume = Some((left, right));
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn write(&self, buffer: &[u8]) -> isize {
        let written = self.transfer_len(Op::Write, buffer.len());
        if written > 0 {
            self.state.lock().bytes_written += written as usize;
        }
        written
    }

    fn get_render_position(&self, dsp_frames: &mut u32) -> Status {
        match self.enter(Op::GetRenderPosition) {
            Ok(state) => {
                *dsp_frames = state.script.render_position;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_next_write_timestamp(&self, timestamp_us: &mut i64) -> Status {
        match self.enter(Op::GetNextWriteTimestamp) {
            Ok(state) => {
                *timestamp_us = state.script.next_write_timestamp_us;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn provides(&self, entry: OutEntry) -> bool {
        let state = self.state.lock();
        match entry {
            OutEntry::PresentationPosition => state.script.presentation.is_some(),
            _ => state.script.provides.contains(&entry),
        }
    }

    fn set_callback(&self, callback: StreamCallback, cookie: Cookie) -> Status {
        match self.optional(Op::SetCallback, OutEntry::SetCallback) {
            Ok(mut state) => {
                state.callback = Some((callback, cookie));
                state.callback_installs += 1;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn pause(&self) -> Status {
        match self.optional(Op::Pause, OutEntry::Pause) {
            Ok(_) => status::OK,
            Err(forced) => forced,
        }
    }

    fn resume(&self) -> Status {
        match self.optional(Op::Resume, OutEntry::Resume) {
            Ok(_) => status::OK,
            Err(forced) => forced,
        }
    }

    fn drain(&self, drain_type: DrainType) -> Status {
        match self.optional(Op::Drain, OutEntry::Drain) {
            Ok(mut state) => {
                state.drains.push(drain_type);
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn flush(&self) -> Status {
        match self.optional(Op::Flush, OutEntry::Flush) {
            Ok(_) => status::OK,
            Err(forced) => forced,
        }
    }

    fn get_presentation_position(&self, frames: &mut u64, timestamp: &mut Duration) -> Status {
        match self.enter(Op::GetPresentationPosition) {
            Ok(state) => match state.script.presentation {
                Some(pos) => {
                    *frames = pos.frames;
                    *timestamp = pos.timestamp;
                    status::OK
                }
                None => status::INVALID_OPERATION,
            },
            Err(forced) => forced,
        }
    }
}

impl StreamInDriver for FakeStream {
    fn set_gain(&self, gain: f32) -> Status {
        match self.enter(Op::SetGain) {
            Ok(mut state) => {
                state.gain = Some(gain);
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn read(&self, buffer: &mut [u8]) -> isize {
        let filled = self.transfer_len(Op::Read, buffer.len());
        if filled > 0 {
            buffer[..filled as usize].fill(READ_PATTERN);
        }
        filled
    }

    fn get_input_frames_lost(&self, frames_lost: &mut u32) -> Status {
        match self.enter(Op::GetInputFramesLost) {
            Ok(state) => {
                *frames_lost = state.script.frames_lost;
                status::OK
            }
            Err(forced) => forced,
        }
    }

    fn get_capture_position(&self, frames: &mut i64, time_ns: &mut i64) -> Status {
        match self.enter(Op::GetCapturePosition) {
            Ok(state) => match state.script.capture {
                Some(pos) => {
                    *frames = pos.frames;
                    *time_ns = pos.time_ns;
                    status::OK
                }
                None => status::INVALID_OPERATION,
            },
            Err(forced) => forced,
        }
    }
}

impl StreamProbe {
    /// Every entry point called so far, in order
    pub fn calls(&self) -> Vec<Op> {
        self.state.lock().calls.clone()
    }

    /// Calls restricted to `ops`, in order
    pub fn calls_of(&self, ops: &[Op]) -> Vec<Op> {
        self.state
            .lock()
            .calls
            .iter()
            .copied()
            .filter(|op| ops.contains(op))
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state.lock().calls.iter().filter(|&&c| c == op).count()
    }

    pub fn bytes_written(&self) -> usize {
        self.state.lock().bytes_written
    }

    pub fn volume(&self) -> Option<(f32, f32)> {
        self.state.lock().volume
    }

    pub fn gain(&self) -> Option<f32> {
        self.state.lock().gain
    }

    pub fn parameters_set(&self) -> Vec<String> {
        self.state.lock().parameters_set.clone()
    }

    pub fn parameter_queries(&self) -> Vec<String> {
        self.state.lock().parameter_queries.clone()
    }

    /// Attached effect handles, sorted
    pub fn effects(&self) -> Vec<EffectHandle> {
        self.state.lock().effects.iter().map(|&h| EffectHandle(h)).collect()
    }

    pub fn callback_installs(&self) -> usize {
        self.state.lock().callback_installs
    }

    pub fn installed_cookie(&self) -> Option<Cookie> {
        self.state.lock().callback.map(|(_, cookie)| cookie)
    }

    pub fn drains(&self) -> Vec<DrainType> {
        self.state.lock().drains.clone()
    }

    /// Whether the driver stream has been released
    pub fn dropped(&self) -> bool {
        self.state.lock().dropped
    }

    /// Force `op` to return `status` from now on
    pub fn fail(&self, op: Op, status: Status) {
        self.state.lock().script.failures.insert(op, status);
    }

    pub fn clear_failure(&self, op: Op) {
        self.state.lock().script.failures.remove(&op);
    }

    /// Change what the format queries report
    pub fn set_properties(&self, sample_rate: u32, channel_mask: ChannelMask, format: AudioFormat) {
        let mut state = self.state.lock();
        state.script.sample_rate = sample_rate;
        state.script.channel_mask = channel_mask;
        state.script.format = format;
    }

    /// Invoke the installed callback on the current thread.
    ///
    /// Returns `NO_INIT` when nothing is installed.
    pub fn fire_raw_sync(&self, event: u32) -> Status {
        // Copy out so the callback runs without the stream lock
        let installed = self.state.lock().callback;
        match installed {
            Some((callback, cookie)) => callback(event, cookie),
            None => status::NO_INIT,
        }
    }

    pub fn fire_sync(&self, event: StreamCallbackEvent) -> Status {
        self.fire_raw_sync(event.as_raw())
    }

    /// Invoke the installed callback from a separate driver thread
    pub fn fire(&self, event: StreamCallbackEvent) -> JoinHandle<Status> {
        let probe = self.clone();
        thread::Builder::new()
            .name("fake-driver-callback".to_string())
            .spawn(move || probe.fire_sync(event))
            .unwrap()
    }

    /// Wait until a transfer is blocked on the gate
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        match &self.gate {
            Some(gate) => gate.entered_rx.recv_timeout(timeout).is_ok(),
            None => false,
        }
    }

    /// Let one blocked transfer complete
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            let _ = gate.release_tx.send(());
        }
    }
}
