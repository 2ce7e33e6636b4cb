/// Device adapter: opens driver streams and wraps them
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use audiohal_core::driver::AudioDeviceDriver;
use audiohal_core::{HalError, Result, Status, StreamConfig, StreamKind};
use tracing::warn;

use crate::config::DeviceConfig;
use crate::error::ConfigResult;
use crate::stream_in::StreamInHalLocal;
use crate::stream_out::StreamOutHalLocal;

/// In-process audio device
///
/// Streams opened here keep the device alive until they are closed.
pub struct DeviceHalLocal {
    driver: Box<dyn AudioDeviceDriver>,
    config: DeviceConfig,
    open_outputs: AtomicUsize,
    open_inputs: AtomicUsize,
}

impl DeviceHalLocal {
    /// Wrap a driver using the default configuration
    pub fn new(driver: Box<dyn AudioDeviceDriver>) -> Arc<Self> {
        Arc::new(Self::build(driver, DeviceConfig::default()))
    }

    /// Wrap a driver with an explicit configuration
    pub fn with_config(
        driver: Box<dyn AudioDeviceDriver>,
        config: DeviceConfig,
    ) -> ConfigResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self::build(driver, config)))
    }

    fn build(driver: Box<dyn AudioDeviceDriver>, config: DeviceConfig) -> Self {
        Self {
            driver,
            config,
            open_outputs: AtomicUsize::new(0),
            open_inputs: AtomicUsize::new(0),
        }
    }

    pub fn module(&self) -> &str {
        &self.config.module
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Open a playback stream
    pub fn open_output_stream(
        self: &Arc<Self>,
        config: &StreamConfig,
    ) -> Result<Arc<StreamOutHalLocal>> {
        let raw = self
            .driver
            .open_output_stream(config)
            .map_err(|status| self.open_failed(StreamKind::Output, status))?;
        self.open_outputs.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StreamOutHalLocal::new(raw, Arc::clone(self))))
    }

    /// Open a capture stream
    pub fn open_input_stream(
        self: &Arc<Self>,
        config: &StreamConfig,
    ) -> Result<Arc<StreamInHalLocal>> {
        let raw = self
            .driver
            .open_input_stream(config)
            .map_err(|status| self.open_failed(StreamKind::Input, status))?;
        self.open_inputs.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StreamInHalLocal::new(raw, Arc::clone(self))))
    }

    /// Open a playback stream with the configured defaults
    pub fn open_default_output_stream(self: &Arc<Self>) -> Result<Arc<StreamOutHalLocal>> {
        let config = self.config.output;
        self.open_output_stream(&config)
    }

    /// Open a capture stream with the configured defaults
    pub fn open_default_input_stream(self: &Arc<Self>) -> Result<Arc<StreamInHalLocal>> {
        let config = self.config.input;
        self.open_input_stream(&config)
    }

    /// Streams of the given kind currently open
    pub fn open_streams(&self, kind: StreamKind) -> usize {
        self.counter(kind).load(Ordering::SeqCst)
    }

    /// Write the module name and open stream counts
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Local audio device {}:", self.module())?;
        writeln!(out, "  open output streams: {}", self.open_streams(StreamKind::Output))?;
        writeln!(out, "  open input streams: {}", self.open_streams(StreamKind::Input))?;
        Ok(())
    }

    pub(crate) fn driver(&self) -> &dyn AudioDeviceDriver {
        self.driver.as_ref()
    }

    pub(crate) fn stream_closed(&self, kind: StreamKind) {
        self.counter(kind).fetch_sub(1, Ordering::SeqCst);
    }

    fn counter(&self, kind: StreamKind) -> &AtomicUsize {
        match kind {
            StreamKind::Output => &self.open_outputs,
            StreamKind::Input => &self.open_inputs,
        }
    }

    fn open_failed(&self, kind: StreamKind, status: Status) -> HalError {
        let err = HalError::from_status(status).unwrap_or(HalError::Unknown(status));
        warn!("{} failed to open {} stream: {}", self.module(), kind, err);
        err
    }
}

impl std::fmt::Debug for DeviceHalLocal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHalLocal")
            .field("module", &self.config.module)
            .field("open_outputs", &self.open_outputs)
            .field("open_inputs", &self.open_inputs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiohal_core::status;
    use audiohal_testkit::{FakeDevice, StreamScript};

    #[test]
    fn counts_open_streams() {
        let (driver, probe) = FakeDevice::new(StreamScript::default());
        let device = DeviceHalLocal::new(Box::new(driver));

        let out = device.open_default_output_stream().unwrap();
        let input = device.open_default_input_stream().unwrap();
        assert_eq!(device.open_streams(StreamKind::Output), 1);
        assert_eq!(device.open_streams(StreamKind::Input), 1);

        drop(out);
        assert_eq!(device.open_streams(StreamKind::Output), 0);
        assert_eq!(probe.closed(StreamKind::Output), 1);

        drop(input);
        assert_eq!(device.open_streams(StreamKind::Input), 0);
        assert_eq!(probe.closed(StreamKind::Input), 1);
    }

    #[test]
    fn open_failure_maps_status() {
        let (driver, probe) = FakeDevice::new(StreamScript::default());
        probe.fail_next_open(status::BUSY);
        let device = DeviceHalLocal::new(Box::new(driver));

        let err = device.open_default_output_stream().unwrap_err();
        assert_eq!(err, HalError::InvalidState(status::BUSY));
        assert_eq!(device.open_streams(StreamKind::Output), 0);

        probe.fail_next_open(status::NO_INIT);
        let err = device.open_default_input_stream().unwrap_err();
        assert_eq!(err, HalError::InvalidState(status::NO_INIT));
        assert_eq!(device.open_streams(StreamKind::Input), 0);
    }

    #[test]
    fn default_streams_use_config() {
        let (driver, probe) = FakeDevice::new(StreamScript::default());
        let mut config = DeviceConfig::default();
        config.output.sample_rate = 44_100;
        let device = DeviceHalLocal::with_config(Box::new(driver), config).unwrap();

        let _out = device.open_default_output_stream().unwrap();
        assert_eq!(probe.last_open_config().map(|c| c.sample_rate), Some(44_100));
    }

    #[test]
    fn invalid_config_rejected() {
        let (driver, _probe) = FakeDevice::new(StreamScript::default());
        let config = DeviceConfig {
            module: String::new(),
            ..DeviceConfig::default()
        };
        assert!(DeviceHalLocal::with_config(Box::new(driver), config).is_err());
    }

    #[test]
    fn dump_lists_counts() {
        let (driver, _probe) = FakeDevice::new(StreamScript::default());
        let device = DeviceHalLocal::new(Box::new(driver));
        let _out = device.open_default_output_stream().unwrap();

        let mut buf = Vec::new();
        device.dump(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("primary"));
        assert!(text.contains("open output streams: 1"));
        assert!(text.contains("open input streams: 0"));
    }
}
