mod audio;
mod stream;

pub use audio::{frame_size, AudioFormat, AudioProperties, ChannelMask};
pub use stream::{
    CapturePosition, DrainType, EffectHandle, PresentationPosition, StreamCallbackEvent,
    StreamConfig, StreamId, StreamKind,
};
