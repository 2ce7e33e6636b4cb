//! In-process stream adapters
//!
//! This crate wraps a legacy audio driver loaded into the server process and
//! exposes its streams through the `audiohal_core` stream capabilities.
//!
//! # Features
//!
//! - Forwarding of every stream operation with status translation
//! - Completion callbacks bridged from a driver thread to a weakly held listener
//! - Driver streams closed exactly once, when the last reference goes away
//! - Device defaults loaded from `audiohal.toml` and `AUDIOHAL__*` variables
//!
//! # Example
//!
//! ```no_run
//! use audiohal_core::driver::AudioDeviceDriver;
//! use audiohal_core::StreamOutHal;
//! use audiohal_local::{DeviceConfig, DeviceHalLocal};
//!
//! # fn run(driver: Box<dyn AudioDeviceDriver>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeviceConfig::load(Some("audiohal.toml".as_ref()))?;
//! let device = DeviceHalLocal::with_config(driver, config)?;
//!
//! let stream = device.open_default_output_stream()?;
//! let frame = stream.frame_size()?;
//! let written = stream.write(&vec![0u8; frame * 480])?;
//! println!("driver took {written} bytes");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod callback;
mod config;
mod device;
mod error;
mod stream;
mod stream_in;
mod stream_out;

pub use self::config::{DeviceConfig, ENV_PREFIX};
pub use device::DeviceHalLocal;
pub use error::{ConfigError, ConfigResult};
pub use stream_in::StreamInHalLocal;
pub use stream_out::StreamOutHalLocal;
