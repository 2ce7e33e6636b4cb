/// Audio-related types
use serde::{Deserialize, Serialize};

/// Sample format as encoded by the legacy driver ABI
///
/// The top byte selects the main format (`0` for linear PCM), the lower bits
/// the PCM sub-format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFormat(pub u32);

impl AudioFormat {
    /// Let the driver pick
    pub const DEFAULT: Self = Self(0x0);
    pub const PCM_16_BIT: Self = Self(0x1);
    pub const PCM_8_BIT: Self = Self(0x2);
    pub const PCM_32_BIT: Self = Self(0x3);
    pub const PCM_8_24_BIT: Self = Self(0x4);
    pub const PCM_FLOAT: Self = Self(0x5);
    pub const PCM_24_BIT_PACKED: Self = Self(0x6);
    pub const MP3: Self = Self(0x0100_0000);
    pub const AAC: Self = Self(0x0400_0000);
    /// Compressed bursts wrapped in 16-bit stereo-like PCM words
    pub const IEC61937: Self = Self(0x0D00_0000);

    const MAIN_MASK: u32 = 0xFF00_0000;

    /// Whether samples are uncompressed linear PCM
    pub fn is_linear_pcm(&self) -> bool {
        self.0 & Self::MAIN_MASK == 0 && self.0 != 0
    }

    /// Bytes per sample for linear PCM and IEC 61937 transport, `None` for
    /// other compressed or unknown formats
    pub fn bytes_per_sample(&self) -> Option<usize> {
        match *self {
            Self::PCM_8_BIT => Some(1),
            Self::PCM_16_BIT | Self::IEC61937 => Some(2),
            Self::PCM_24_BIT_PACKED => Some(3),
            Self::PCM_32_BIT | Self::PCM_8_24_BIT | Self::PCM_FLOAT => Some(4),
            _ => None,
        }
    }
}

/// Channel mask as encoded by the legacy driver ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMask(pub u32);

impl ChannelMask {
    pub const NONE: Self = Self(0x0);
    pub const OUT_MONO: Self = Self(0x1);
    pub const OUT_STEREO: Self = Self(0x3);
    pub const OUT_5POINT1: Self = Self(0x3F);
    pub const OUT_7POINT1: Self = Self(0x63F);
    pub const IN_MONO: Self = Self(0x10);
    pub const IN_STEREO: Self = Self(0xC);

    // Top two bits carry the mask representation, not channels.
    const CHANNEL_BITS: u32 = 0x3FFF_FFFF;

    /// Number of channels described by the mask
    pub fn channel_count(&self) -> u32 {
        (self.0 & Self::CHANNEL_BITS).count_ones()
    }
}

/// Sample rate, channel mask and format of a stream, queried together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProperties {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel mask
    pub channel_mask: ChannelMask,
    /// Sample format
    pub format: AudioFormat,
}

/// Size in bytes of one frame.
///
/// IEC 61937 is framed like 16-bit PCM. Other compressed formats are
/// transported as a byte stream, so their frame size is one byte.
pub fn frame_size(format: AudioFormat, mask: ChannelMask) -> usize {
    match format.bytes_per_sample() {
        Some(bytes) => bytes * mask.channel_count() as usize,
        None => 1,
    }
}
