/// Stream domain types shared by the adapters and the driver boundary
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::audio::{AudioFormat, ChannelMask};

/// Direction of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Output,
    Input,
}

impl StreamKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Output => "output",
            Self::Input => "input",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-unique identifier of an open stream adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(pub u64);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Parameters a stream is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel mask
    pub channel_mask: ChannelMask,

    /// Sample format
    pub format: AudioFormat,

    /// Driver-defined stream flags, passed through untouched
    #[serde(default)]
    pub flags: u32,
}

impl StreamConfig {
    /// 48 kHz 16-bit stereo playback
    pub fn output_default() -> Self {
        Self {
            sample_rate: 48_000,
            channel_mask: ChannelMask::OUT_STEREO,
            format: AudioFormat::PCM_16_BIT,
            flags: 0,
        }
    }

    /// 48 kHz 16-bit mono capture
    pub fn input_default() -> Self {
        Self {
            sample_rate: 48_000,
            channel_mask: ChannelMask::IN_MONO,
            format: AudioFormat::PCM_16_BIT,
            flags: 0,
        }
    }
}

/// Which buffered data a drain request waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainType {
    /// Notify once all buffered data has been played
    All,
    /// Notify shortly before the end of the buffered data (gapless track switch)
    EarlyNotify,
}

impl DrainType {
    /// Raw value used by the driver ABI
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::All => 0,
            Self::EarlyNotify => 1,
        }
    }

    /// Parse a raw driver value
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::All),
            1 => Some(Self::EarlyNotify),
            _ => None,
        }
    }
}

/// Completion event reported by a driver through its callback entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamCallbackEvent {
    /// A non-blocking write can accept more data
    WriteReady,
    /// A requested drain has completed
    DrainReady,
    /// The driver hit an unrecoverable error
    Error,
}

impl StreamCallbackEvent {
    /// Raw value used by the driver ABI
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::WriteReady => 0,
            Self::DrainReady => 1,
            Self::Error => 2,
        }
    }

    /// Parse a raw driver value
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::WriteReady),
            1 => Some(Self::DrainReady),
            2 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Frames presented to an external observer at a monotonic timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentationPosition {
    /// Frames presented since the stream left standby
    pub frames: u64,

    /// Monotonic clock reading the frame count refers to
    pub timestamp: Duration,
}

/// Frames captured and the clock time of the latest one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturePosition {
    /// Total frames received
    pub frames: i64,

    /// Monotonic time in nanoseconds
    pub time_ns: i64,
}

/// Driver-level handle of an effect engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u64);
