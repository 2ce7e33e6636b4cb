//! Input stream adapter
use std::sync::Arc;

use audiohal_core::driver::StreamInDriver;
use audiohal_core::status;
use audiohal_core::{CapturePosition, Result, StreamId, StreamInHal};
use tracing::trace;

use crate::device::DeviceHalLocal;
use crate::stream::{forward_stream_hal, StreamHalLocal};

/// Capture stream backed by an in-process driver stream
pub struct StreamInHalLocal {
    common: StreamHalLocal<dyn StreamInDriver>,
}

impl StreamInHalLocal {
    pub(crate) fn new(raw: Box<dyn StreamInDriver>, device: Arc<DeviceHalLocal>) -> Self {
        Self {
            common: StreamHalLocal::new(raw, device),
        }
    }

    pub fn id(&self) -> StreamId {
        self.common.id()
    }

    pub fn device(&self) -> &DeviceHalLocal {
        self.common.device()
    }
}

forward_stream_hal!(StreamInHalLocal, common);

impl std::fmt::Debug for StreamInHalLocal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamInHalLocal")
            .field("id", &self.id())
            .field("module", &self.device().module())
            .finish_non_exhaustive()
    }
}

impl StreamInHal for StreamInHalLocal {
    fn frame_size(&self) -> Result<usize> {
        self.common.frame_size()
    }

    fn set_gain(&self, gain: f32) -> Result<()> {
        status::check(self.common.driver().set_gain(gain))
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        let read = status::check_size(self.common.driver().read(buffer))?;
        trace!("{} read {}/{} bytes", self.id(), read, buffer.len());
        Ok(read)
    }

    fn input_frames_lost(&self) -> Result<u32> {
        let mut lost = 0;
        status::check(self.common.driver().get_input_frames_lost(&mut lost))?;
        Ok(lost)
    }

    fn capture_position(&self) -> Result<CapturePosition> {
        let mut frames = 0;
        let mut time_ns = 0;
        status::check(self.common.driver().get_capture_position(&mut frames, &mut time_ns))?;
        Ok(CapturePosition { frames, time_ns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiohal_core::status::{INVALID_OPERATION, IO_ERROR};
    use audiohal_core::{ChannelMask, HalError, StreamConfig};
    use audiohal_testkit::{FakeDevice, Op, StreamScript};

    fn open(script: StreamScript) -> Arc<StreamInHalLocal> {
        let (driver, _probe) = FakeDevice::new(script);
        DeviceHalLocal::new(Box::new(driver))
            .open_input_stream(&StreamConfig::input_default())
            .unwrap()
    }

    #[test]
    fn read_fills_buffer() {
        let stream = open(StreamScript::default().accept_at_most(256));
        let mut buf = [0u8; 1024];
        assert_eq!(stream.read(&mut buf).unwrap(), 256);
    }

    #[test]
    fn read_error_is_io() {
        let stream = open(StreamScript::default().fail(Op::Read, IO_ERROR));
        let mut buf = [0u8; 64];
        assert_eq!(stream.read(&mut buf), Err(HalError::Io(IO_ERROR)));
    }

    #[test]
    fn queries_forward() {
        let script = StreamScript {
            frames_lost: 12,
            capture: Some(CapturePosition {
                frames: 48_000,
                time_ns: 1_000_000_000,
            }),
            ..StreamScript::default()
        };
        let stream = open(script);
        assert_eq!(stream.input_frames_lost().unwrap(), 12);
        assert_eq!(stream.capture_position().unwrap().frames, 48_000);
        stream.set_gain(0.8).unwrap();
    }

    #[test]
    fn capture_position_unsupported_by_default() {
        let stream = open(StreamScript::default());
        assert_eq!(
            stream.capture_position(),
            Err(HalError::Unsupported(INVALID_OPERATION))
        );
    }

    #[test]
    fn debug_shows_id() {
        let stream = open(StreamScript::default());
        let text = format!("{:?}", stream);
        assert!(text.contains("StreamInHalLocal"));
        assert!(text.contains(&format!("{:?}", stream.id())));
    }

    #[test]
    fn frame_size_mono() {
        let stream = open(StreamScript::default().with_channel_mask(ChannelMask::IN_MONO));
        assert_eq!(stream.frame_size().unwrap(), 2);
    }
}
