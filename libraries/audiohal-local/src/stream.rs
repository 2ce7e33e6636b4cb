//! Common stream adapter
//!
//! `StreamHalLocal` owns a driver stream handle and forwards the operations
//! shared by both directions. The kind-specific adapters embed it.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use audiohal_core::driver::{AudioDeviceDriver, StreamDriver, StreamInDriver, StreamOutDriver};
use audiohal_core::status::{self, Status};
use audiohal_core::{
    frame_size, AudioFormat, ChannelMask, EffectHal, HalError, Result, StreamId, StreamKind,
};
use tracing::{debug, info, warn};

use crate::device::DeviceHalLocal;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// A driver stream that knows how to hand itself back to its device.
pub(crate) trait CloseOnDevice: StreamDriver {
    const KIND: StreamKind;

    fn close_on(self: Box<Self>, device: &dyn AudioDeviceDriver) -> Status;
}

impl CloseOnDevice for dyn StreamOutDriver {
    const KIND: StreamKind = StreamKind::Output;

    fn close_on(self: Box<Self>, device: &dyn AudioDeviceDriver) -> Status {
        device.close_output_stream(self)
    }
}

impl CloseOnDevice for dyn StreamInDriver {
    const KIND: StreamKind = StreamKind::Input;

    fn close_on(self: Box<Self>, device: &dyn AudioDeviceDriver) -> Status {
        device.close_input_stream(self)
    }
}

/// Owner of one driver stream handle.
///
/// The handle is closed through the owning device when this value drops, and
/// only then.
pub(crate) struct StreamHalLocal<D: ?Sized + CloseOnDevice> {
    raw: Option<Box<D>>,
    device: Arc<DeviceHalLocal>,
    id: StreamId,
}

impl<D: ?Sized + CloseOnDevice> StreamHalLocal<D> {
    pub(crate) fn new(raw: Box<D>, device: Arc<DeviceHalLocal>) -> Self {
        let id = StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed));
        info!("Opened {} {} on {}", D::KIND, id, device.module());
        Self {
            raw: Some(raw),
            device,
            id,
        }
    }

    pub(crate) fn id(&self) -> StreamId {
        self.id
    }

    pub(crate) fn device(&self) -> &DeviceHalLocal {
        &self.device
    }

    pub(crate) fn driver(&self) -> &D {
        match self.raw.as_deref() {
            Some(raw) => raw,
            // Only `Drop` takes the handle out.
            None => unreachable!("driver stream used after close"),
        }
    }

    pub(crate) fn frame_size(&self) -> Result<usize> {
        Ok(frame_size(self.format()?, self.channel_mask()?))
    }

    pub(crate) fn sample_rate(&self) -> Result<u32> {
        let mut rate = 0;
        status::check(self.driver().get_sample_rate(&mut rate))?;
        Ok(rate)
    }

    pub(crate) fn buffer_size(&self) -> Result<usize> {
        let mut bytes = 0;
        status::check(self.driver().get_buffer_size(&mut bytes))?;
        Ok(bytes)
    }

    pub(crate) fn channel_mask(&self) -> Result<ChannelMask> {
        let mut mask = ChannelMask::NONE;
        status::check(self.driver().get_channel_mask(&mut mask))?;
        Ok(mask)
    }

    pub(crate) fn format(&self) -> Result<AudioFormat> {
        let mut format = AudioFormat::DEFAULT;
        status::check(self.driver().get_format(&mut format))?;
        Ok(format)
    }

    pub(crate) fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        status::check(self.driver().set_parameters(kv_pairs))
    }

    pub(crate) fn parameters(&self, keys: &str) -> Result<String> {
        let mut values = String::new();
        status::check(self.driver().get_parameters(keys, &mut values))?;
        Ok(values)
    }

    pub(crate) fn add_effect(&self, effect: &dyn EffectHal) -> Result<()> {
        status::check(self.driver().add_audio_effect(effect.handle()))
    }

    pub(crate) fn remove_effect(&self, effect: &dyn EffectHal) -> Result<()> {
        status::check(self.driver().remove_audio_effect(effect.handle()))
    }

    pub(crate) fn standby(&self) -> Result<()> {
        let result = status::check(self.driver().standby());
        if let Err(err) = &result {
            debug!("{} standby refused: {}", self.id, err);
        }
        result
    }

    pub(crate) fn dump(&self, out: &mut dyn Write) -> Result<()> {
        let result = status::check(self.driver().dump(out));
        if let Err(err) = &result {
            debug!("{} dump failed: {}", self.id, err);
        }
        result
    }
}

impl<D: ?Sized + CloseOnDevice> Drop for StreamHalLocal<D> {
    fn drop(&mut self) {
        let Some(raw) = self.raw.take() else {
            return;
        };
        let status = raw.close_on(self.device.driver());
        self.device.stream_closed(D::KIND);
        match HalError::from_status(status) {
            None => info!("Closed {} {}", D::KIND, self.id),
            Some(err) => warn!("Driver failed to close {} {}: {}", D::KIND, self.id, err),
        }
    }
}

/// Implement `StreamHal` for an adapter by forwarding to its embedded
/// `StreamHalLocal` field.
macro_rules! forward_stream_hal {
    ($adapter:ty, $field:ident) => {
        impl audiohal_core::StreamHal for $adapter {
            fn sample_rate(&self) -> audiohal_core::Result<u32> {
                self.$field.sample_rate()
            }

            fn buffer_size(&self) -> audiohal_core::Result<usize> {
                self.$field.buffer_size()
            }

            fn channel_mask(&self) -> audiohal_core::Result<audiohal_core::ChannelMask> {
                self.$field.channel_mask()
            }

            fn format(&self) -> audiohal_core::Result<audiohal_core::AudioFormat> {
                self.$field.format()
            }

            fn set_parameters(&self, kv_pairs: &str) -> audiohal_core::Result<()> {
                self.$field.set_parameters(kv_pairs)
            }

            fn parameters(&self, keys: &str) -> audiohal_core::Result<String> {
                self.$field.parameters(keys)
            }

            fn add_effect(
                &self,
                effect: std::sync::Arc<dyn audiohal_core::EffectHal>,
            ) -> audiohal_core::Result<()> {
                self.$field.add_effect(effect.as_ref())
            }

            fn remove_effect(
                &self,
                effect: std::sync::Arc<dyn audiohal_core::EffectHal>,
            ) -> audiohal_core::Result<()> {
                self.$field.remove_effect(effect.as_ref())
            }

            fn standby(&self) -> audiohal_core::Result<()> {
                self.$field.standby()
            }

            fn dump(&self, out: &mut dyn std::io::Write) -> audiohal_core::Result<()> {
                self.$field.dump(out)
            }
        }
    };
}

pub(crate) use forward_stream_hal;
