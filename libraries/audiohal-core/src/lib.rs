//! audiohal core
//!
//! Interfaces shared by the stream adapters, their callers and the drivers
//! underneath them.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Server-facing capabilities**: `StreamHal`, `StreamOutHal`, `StreamInHal`,
//!   `StreamOutHalCallback`, `EffectHal`
//! - **Driver boundary**: the legacy operation tables (`StreamDriver`,
//!   `StreamOutDriver`, `StreamInDriver`, `AudioDeviceDriver`) and raw status codes
//! - **Error Handling**: `HalError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use audiohal_core::{status, HalError};
//!
//! let err = HalError::from_status(status::INVALID_OPERATION).unwrap();
//! assert!(err.is_unsupported());
//! assert_eq!(err.status(), status::INVALID_OPERATION);
//! ```

#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod status;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{HalError, Result};
pub use status::Status;
pub use traits::{EffectHal, StreamHal, StreamInHal, StreamOutHal, StreamOutHalCallback};

pub use types::{
    frame_size, AudioFormat, AudioProperties, CapturePosition, ChannelMask, DrainType,
    EffectHandle, PresentationPosition, StreamCallbackEvent, StreamConfig, StreamId, StreamKind,
};
