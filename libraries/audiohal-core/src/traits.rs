/// Server-facing stream and effect capabilities
use crate::error::Result;
use crate::types::{
    AudioFormat, AudioProperties, CapturePosition, ChannelMask, DrainType, EffectHandle,
    PresentationPosition,
};
use std::io::Write;
use std::sync::Arc;

/// Effect capability
///
/// Implemented by the effect engine; streams only need the driver-level handle
/// to attach or detach the effect.
pub trait EffectHal: Send + Sync {
    /// Driver-level handle of the effect engine instance
    fn handle(&self) -> EffectHandle;
}

/// Operations common to output and input streams
pub trait StreamHal: Send + Sync {
    /// Sample rate in Hz, e.g. 44100
    fn sample_rate(&self) -> Result<u32>;

    /// Size of the driver buffer in bytes, e.g. 4800
    fn buffer_size(&self) -> Result<usize>;

    /// Channel mask of the stream
    fn channel_mask(&self) -> Result<ChannelMask>;

    /// Sample format of the stream
    fn format(&self) -> Result<AudioFormat>;

    /// Sample rate, channel mask and format in one call
    ///
    /// Fails with the first failing sub-query; no partially filled value is
    /// ever returned.
    fn audio_properties(&self) -> Result<AudioProperties> {
        let sample_rate = self.sample_rate()?;
        let channel_mask = self.channel_mask()?;
        let format = self.format()?;
        Ok(AudioProperties {
            sample_rate,
            channel_mask,
            format,
        })
    }

    /// Set stream parameters from a key/value string (forwarded verbatim)
    fn set_parameters(&self, kv_pairs: &str) -> Result<()>;

    /// Query stream parameters (forwarded verbatim)
    fn parameters(&self, keys: &str) -> Result<String>;

    /// Attach an effect to the stream
    fn add_effect(&self, effect: Arc<dyn EffectHal>) -> Result<()>;

    /// Detach an effect from the stream
    fn remove_effect(&self, effect: Arc<dyn EffectHal>) -> Result<()>;

    /// Put the stream into standby
    fn standby(&self) -> Result<()>;

    /// Write the driver's diagnostic state to `out`
    fn dump(&self, out: &mut dyn Write) -> Result<()>;
}

/// Completion listener for non-blocking writes and drains
///
/// Handlers run on a driver-owned thread and must not block for long.
pub trait StreamOutHalCallback: Send + Sync {
    /// The stream can accept more data
    fn on_write_ready(&self);

    /// A requested drain has completed
    fn on_drain_ready(&self);

    /// The driver reported an unrecoverable error
    fn on_error(&self) {}
}

/// Playback stream
pub trait StreamOutHal: StreamHal {
    /// Bytes per frame
    fn frame_size(&self) -> Result<usize>;

    /// Driver-estimated latency in milliseconds
    fn latency(&self) -> Result<u32>;

    /// Hardware volume, for streams mixed by the hardware
    fn set_volume(&self, left: f32, right: f32) -> Result<()>;

    /// Write a buffer to the driver, blocking until it is accepted
    ///
    /// Returns the number of bytes taken, which may be fewer than offered.
    fn write(&self, buffer: &[u8]) -> Result<usize>;

    /// Frames written by the DSP to the DAC since leaving standby
    fn render_position(&self) -> Result<u32>;

    /// Local time in microseconds at which the next write will be presented
    fn next_write_timestamp(&self) -> Result<i64>;

    /// Register the completion listener, replacing any previous one
    ///
    /// Only a weak reference is kept: dropping the listener silently stops
    /// delivery.
    fn set_callback(&self, callback: Arc<dyn StreamOutHalCallback>) -> Result<()>;

    /// Whether pause and resume are implemented, as `(pause, resume)`
    fn supports_pause_and_resume(&self) -> Result<(bool, bool)>;

    /// Suspend playback
    fn pause(&self) -> Result<()>;

    /// Continue playback after a pause
    fn resume(&self) -> Result<()>;

    /// Whether drain is implemented
    fn supports_drain(&self) -> Result<bool>;

    /// Request a drain-ready notification once buffered data has played
    fn drain(&self, drain_type: DrainType) -> Result<()>;

    /// Discard buffered data
    fn flush(&self) -> Result<()>;

    /// Frames presented to an external observer and when
    fn presentation_position(&self) -> Result<PresentationPosition>;
}

/// Capture stream
pub trait StreamInHal: StreamHal {
    /// Bytes per frame
    fn frame_size(&self) -> Result<usize>;

    /// Input gain applied by the driver
    fn set_gain(&self, gain: f32) -> Result<()>;

    /// Read from the driver into `buffer`, blocking until data is available
    ///
    /// Returns the number of bytes filled, which may be fewer than requested.
    fn read(&self, buffer: &mut [u8]) -> Result<usize>;

    /// Input frames lost by the driver since the last call
    fn input_frames_lost(&self) -> Result<u32>;

    /// Frames received and the clock time of the latest one
    fn capture_position(&self) -> Result<CapturePosition>;
}
