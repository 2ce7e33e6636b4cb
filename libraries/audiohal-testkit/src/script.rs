//! Behaviour scripts for the fake driver

use std::collections::{HashMap, HashSet};

use audiohal_core::driver::OutEntry;
use audiohal_core::status::{self, Status};
use audiohal_core::{AudioFormat, CapturePosition, ChannelMask, PresentationPosition};

/// Driver entry points, as recorded by the fake streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetSampleRate,
    GetBufferSize,
    GetChannelMask,
    GetFormat,
    SetParameters,
    GetParameters,
    AddEffect,
    RemoveEffect,
    Standby,
    Dump,
    GetLatency,
    SetVolume,
    Write,
    GetRenderPosition,
    GetNextWriteTimestamp,
    SetCallback,
    Pause,
    Resume,
    Drain,
    Flush,
    GetPresentationPosition,
    SetGain,
    Read,
    GetInputFramesLost,
    GetCapturePosition,
}

/// What a fake stream reports and which entry points it implements
#[derive(Debug, Clone)]
pub struct StreamScript {
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub channel_mask: ChannelMask,
    pub format: AudioFormat,
    pub latency_ms: u32,
    pub render_position: u32,
    pub next_write_timestamp_us: i64,
    /// `None` leaves the entry point unimplemented
    pub presentation: Option<PresentationPosition>,
    pub frames_lost: u32,
    /// `None` leaves the entry point unimplemented
    pub capture: Option<CapturePosition>,
    /// Cap on bytes taken per `write`/`read`
    pub accept_at_most: Option<usize>,
    pub effect_capacity: usize,
    pub parameters_reply: String,
    /// Optional output entry points the stream implements
    pub provides: HashSet<OutEntry>,
    /// Status forced on an entry point instead of its normal behaviour
    pub failures: HashMap<Op, Status>,
    /// Block transfers until the probe releases them
    pub gate_transfers: bool,
    /// Status the device returns when closing the stream
    pub close_status: Status,
}

impl Default for StreamScript {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 4800,
            channel_mask: ChannelMask::OUT_STEREO,
            format: AudioFormat::PCM_16_BIT,
            latency_ms: 10,
            render_position: 0,
            next_write_timestamp_us: 0,
            presentation: None,
            frames_lost: 0,
            capture: None,
            accept_at_most: None,
            effect_capacity: 4,
            parameters_reply: String::new(),
            provides: HashSet::new(),
            failures: HashMap::new(),
            gate_transfers: false,
            close_status: status::OK,
        }
    }
}

impl StreamScript {
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_channel_mask(mut self, mask: ChannelMask) -> Self {
        self.channel_mask = mask;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub fn accept_at_most(mut self, bytes: usize) -> Self {
        self.accept_at_most = Some(bytes);
        self
    }

    /// Make `op` return `status`
    pub fn fail(mut self, op: Op, status: Status) -> Self {
        self.failures.insert(op, status);
        self
    }

    pub fn with_callback(self) -> Self {
        self.providing(&[OutEntry::SetCallback])
    }

    pub fn with_pause_resume(self) -> Self {
        self.providing(&[OutEntry::Pause, OutEntry::Resume])
    }

    pub fn with_drain(self) -> Self {
        self.providing(&[OutEntry::Drain])
    }

    pub fn with_flush(self) -> Self {
        self.providing(&[OutEntry::Flush])
    }

    /// Everything optional on an output stream, except positions
    pub fn full_output(self) -> Self {
        self.with_callback().with_pause_resume().with_drain().with_flush()
    }

    pub fn gated(mut self) -> Self {
        self.gate_transfers = true;
        self
    }

    pub fn close_with(mut self, status: Status) -> Self {
        self.close_status = status;
        self
    }

    fn providing(mut self, entries: &[OutEntry]) -> Self {
        self.provides.extend(entries.iter().copied());
        self
    }
}
