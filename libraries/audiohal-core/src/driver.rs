//! Legacy driver boundary
//!
//! These traits are the operation tables a platform audio driver exposes for
//! an open device and its streams. They keep the legacy calling convention:
//! every entry point returns a raw [`Status`], queries fill an out-parameter,
//! and sized transfers return a signed byte count (negative = status).
//!
//! Optional entry points have default bodies returning
//! [`status::INVALID_OPERATION`]; a driver that implements one also reports it
//! through `provides`.

use std::io::Write;
use std::time::Duration;

use crate::status::{self, Status};
use crate::types::{AudioFormat, ChannelMask, DrainType, EffectHandle, StreamConfig};

/// Opaque token handed to the driver with the callback entry point
///
/// The driver passes it back unchanged on every callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cookie(pub u64);

/// Callback entry point installed with [`StreamOutDriver::set_callback`]
///
/// `event` is a raw [`StreamCallbackEvent`](crate::StreamCallbackEvent) value.
pub type StreamCallback = fn(event: u32, cookie: Cookie) -> Status;

/// Optional output entry points
///
/// The adapters consult [`StreamOutDriver::provides`] only for `Pause`,
/// `Resume` and `Drain`, to answer capability queries. The other entries are
/// still forwarded unconditionally; a driver lacking one reports
/// `INVALID_OPERATION` from the call itself. Drivers may use them for their own
/// bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutEntry {
    SetCallback,
    Pause,
    Resume,
    Drain,
    Flush,
    PresentationPosition,
}

/// Operations common to every driver stream
pub trait StreamDriver: Send + Sync {
    fn get_sample_rate(&self, rate: &mut u32) -> Status;

    fn get_buffer_size(&self, bytes: &mut usize) -> Status;

    fn get_channel_mask(&self, mask: &mut ChannelMask) -> Status;

    fn get_format(&self, format: &mut AudioFormat) -> Status;

    fn set_parameters(&self, kv_pairs: &str) -> Status;

    fn get_parameters(&self, keys: &str, values: &mut String) -> Status;

    fn add_audio_effect(&self, effect: EffectHandle) -> Status;

    fn remove_audio_effect(&self, effect: EffectHandle) -> Status;

    fn standby(&self) -> Status;

    fn dump(&self, out: &mut dyn Write) -> Status;
}

/// Output stream operation table
pub trait StreamOutDriver: StreamDriver {
    fn get_latency(&self, latency_ms: &mut u32) -> Status;

    fn set_volume(&self, left: f32, right: f32) -> Status;

    /// Blocking write; returns bytes accepted or a negative status
    fn write(&self, buffer: &[u8]) -> isize;

    fn get_render_position(&self, dsp_frames: &mut u32) -> Status;

    fn get_next_write_timestamp(&self, timestamp_us: &mut i64) -> Status;

    /// Whether an optional entry point is implemented
    fn provides(&self, entry: OutEntry) -> bool {
        let _ = entry;
        false
    }

    /// Install the single callback slot
    fn set_callback(&self, callback: StreamCallback, cookie: Cookie) -> Status {
        let _ = (callback, cookie);
        status::INVALID_OPERATION
    }

    fn pause(&self) -> Status {
        status::INVALID_OPERATION
    }

    fn resume(&self) -> Status {
        status::INVALID_OPERATION
    }

    fn drain(&self, drain_type: DrainType) -> Status {
        let _ = drain_type;
        status::INVALID_OPERATION
    }

    fn flush(&self) -> Status {
        status::INVALID_OPERATION
    }

    fn get_presentation_position(&self, frames: &mut u64, timestamp: &mut Duration) -> Status {
        let _ = (frames, timestamp);
        status::INVALID_OPERATION
    }
}

/// Input stream operation table
pub trait StreamInDriver: StreamDriver {
    fn set_gain(&self, gain: f32) -> Status;

    /// Blocking read; returns bytes filled or a negative status
    fn read(&self, buffer: &mut [u8]) -> isize;

    fn get_input_frames_lost(&self, frames_lost: &mut u32) -> Status;

    fn get_capture_position(&self, frames: &mut i64, time_ns: &mut i64) -> Status {
        let _ = (frames, time_ns);
        status::INVALID_OPERATION
    }
}

/// Device operation table: opens and closes driver streams
///
/// Every stream handed out by `open_*` must be returned exactly once through
/// the matching `close_*`.
pub trait AudioDeviceDriver: Send + Sync {
    fn open_output_stream(&self, config: &StreamConfig) -> Result<Box<dyn StreamOutDriver>, Status>;

    fn close_output_stream(&self, stream: Box<dyn StreamOutDriver>) -> Status;

    fn open_input_stream(&self, config: &StreamConfig) -> Result<Box<dyn StreamInDriver>, Status>;

    fn close_input_stream(&self, stream: Box<dyn StreamInDriver>) -> Status;
}
