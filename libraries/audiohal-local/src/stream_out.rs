//! Output stream adapter
use std::sync::Arc;
use std::time::Duration;

use audiohal_core::driver::{OutEntry, StreamOutDriver};
use audiohal_core::status;
use audiohal_core::{
    DrainType, PresentationPosition, Result, StreamId, StreamOutHal, StreamOutHalCallback,
};
use tracing::trace;

use crate::callback::CallbackSlot;
use crate::device::DeviceHalLocal;
use crate::stream::{forward_stream_hal, StreamHalLocal};

/// Playback stream backed by an in-process driver stream
///
/// Created by [`DeviceHalLocal::open_output_stream`]. The driver stream is
/// closed when the last `Arc` is released.
pub struct StreamOutHalLocal {
    // Declared first: unregisters the cookie before the driver stream closes.
    callback: Arc<CallbackSlot>,
    common: StreamHalLocal<dyn StreamOutDriver>,
}

impl StreamOutHalLocal {
    pub(crate) fn new(raw: Box<dyn StreamOutDriver>, device: Arc<DeviceHalLocal>) -> Self {
        let trace_callbacks = device.config().trace_callbacks;
        let common = StreamHalLocal::new(raw, device);
        let callback = CallbackSlot::register(common.id(), trace_callbacks);
        Self { callback, common }
    }

    /// Process-unique id, as used in logs
    pub fn id(&self) -> StreamId {
        self.common.id()
    }

    /// Owning device
    pub fn device(&self) -> &DeviceHalLocal {
        self.common.device()
    }

    fn driver(&self) -> &dyn StreamOutDriver {
        self.common.driver()
    }
}

forward_stream_hal!(StreamOutHalLocal, common);

impl std::fmt::Debug for StreamOutHalLocal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamOutHalLocal")
            .field("id", &self.id())
            .field("module", &self.device().module())
            .field("cookie", &self.callback.cookie())
            .finish_non_exhaustive()
    }
}

impl StreamOutHal for StreamOutHalLocal {
    fn frame_size(&self) -> Result<usize> {
        self.common.frame_size()
    }

    fn latency(&self) -> Result<u32> {
        let mut latency_ms = 0;
        status::check(self.driver().get_latency(&mut latency_ms))?;
        Ok(latency_ms)
    }

    fn set_volume(&self, left: f32, right: f32) -> Result<()> {
        status::check(self.driver().set_volume(left, right))
    }

    fn write(&self, buffer: &[u8]) -> Result<usize> {
        let written = status::check_size(self.driver().write(buffer))?;
        trace!("{} wrote {}/{} bytes", self.id(), written, buffer.len());
        Ok(written)
    }

    fn render_position(&self) -> Result<u32> {
        let mut dsp_frames = 0;
        status::check(self.driver().get_render_position(&mut dsp_frames))?;
        Ok(dsp_frames)
    }

    fn next_write_timestamp(&self) -> Result<i64> {
        let mut timestamp_us = 0;
        status::check(self.driver().get_next_write_timestamp(&mut timestamp_us))?;
        Ok(timestamp_us)
    }

    fn set_callback(&self, callback: Arc<dyn StreamOutHalCallback>) -> Result<()> {
        self.callback.set_listener(self.driver(), &callback)
    }

    fn supports_pause_and_resume(&self) -> Result<(bool, bool)> {
        let driver = self.driver();
        Ok((driver.provides(OutEntry::Pause), driver.provides(OutEntry::Resume)))
    }

    fn pause(&self) -> Result<()> {
        status::check(self.driver().pause())
    }

    fn resume(&self) -> Result<()> {
        status::check(self.driver().resume())
    }

    fn supports_drain(&self) -> Result<bool> {
        Ok(self.driver().provides(OutEntry::Drain))
    }

    fn drain(&self, drain_type: DrainType) -> Result<()> {
        status::check(self.driver().drain(drain_type))
    }

    fn flush(&self) -> Result<()> {
        status::check(self.driver().flush())
    }

    fn presentation_position(&self) -> Result<PresentationPosition> {
        let mut frames = 0;
        let mut timestamp = Duration::ZERO;
        status::check(self.driver().get_presentation_position(&mut frames, &mut timestamp))?;
        Ok(PresentationPosition { frames, timestamp })
    }
}
