//! Transport snapshot types
//!
//! [`TransportState`] is what the presentation layer sees. The engine keeps
//! one authoritative copy behind its control lock and hands out clones, so a
//! snapshot never changes after it has been taken.

use serde::{Deserialize, Serialize};

/// Per-channel display data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatus {
    /// Formatted pattern cell at the current row
    pub line: String,
    /// Left VU level
    pub vu_left: f32,
    /// Right VU level
    pub vu_right: f32,
    /// Index into `ModuleInfo::instrument_names`, -1 when silent or unknown
    pub instrument_index: i32,
    /// Name of the instrument at `instrument_index`, empty otherwise
    pub instrument_name: String,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        ChannelStatus {
            line: String::new(),
            vu_left: 0.0,
            vu_right: 0.0,
            instrument_index: -1,
            instrument_name: String::new(),
        }
    }
}

impl ChannelStatus {
    /// Peak of the two VU levels
    pub fn level(&self) -> f32 {
        self.vu_left.abs().max(self.vu_right.abs())
    }

    pub(crate) fn clear_instrument(&mut self) {
        self.instrument_index = -1;
        self.instrument_name.clear();
    }
}

/// A row ahead of the playback cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRowPreview {
    /// Order the row belongs to
    pub order: i32,
    /// Pattern the row belongs to
    pub pattern: i32,
    /// Row inside the pattern
    pub row: i32,
    /// Formatted cell per channel
    pub channels: Vec<String>,
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Current order, -1 before playback
    pub order: i32,
    /// Current pattern, -1 before playback
    pub pattern: i32,
    /// Current row, -1 before playback
    pub row: i32,
    /// Current speed, -1 when unknown
    pub speed: i32,
    /// Playback position in seconds
    pub position_seconds: f64,
    /// Playback is paused
    pub paused: bool,
    /// The module ended or the output failed
    pub finished: bool,
    /// One entry per decoder channel
    pub channels: Vec<ChannelStatus>,
    /// Upcoming rows, at most the configured look-ahead
    pub preview_rows: Vec<PatternRowPreview>,
    /// Spectrum band levels in [0, 1]
    pub spectrum_bands: Vec<f32>,
    /// Left scope trace in [-1, 1]
    pub waveform_left: Vec<f32>,
    /// Right scope trace in [-1, 1]
    pub waveform_right: Vec<f32>,
}

impl TransportState {
    /// Initial state sized for `channels`, `bands` and `waveform_size`
    pub fn new(channels: usize, bands: usize, waveform_size: usize) -> Self {
        TransportState {
            order: -1,
            pattern: -1,
            row: -1,
            speed: -1,
            position_seconds: 0.0,
            paused: false,
            finished: false,
            channels: vec![ChannelStatus::default(); channels],
            preview_rows: Vec::new(),
            spectrum_bands: vec![0.0; bands],
            waveform_left: vec![0.0; waveform_size],
            waveform_right: vec![0.0; waveform_size],
        }
    }

    /// Resize `channels` to `count`, dropping stale entries
    pub fn resize_channels(&mut self, count: usize) {
        if self.channels.len() != count {
            self.channels.resize_with(count, ChannelStatus::default);
        }
    }

    /// Zero every channel's VU level
    pub fn silence_channels(&mut self) {
        for channel in &mut self.channels {
            channel.vu_left = 0.0;
            channel.vu_right = 0.0;
        }
    }

    /// Position formatted as `mm:ss`
    pub fn position_label(&self) -> String {
        let total = self.position_seconds.max(0.0) as u64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

impl Default for TransportState {
    fn default() -> Self {
        use crate::config::{DEFAULT_SPECTRUM_BANDS, DEFAULT_WAVEFORM_SIZE};
        TransportState::new(0, DEFAULT_SPECTRUM_BANDS, DEFAULT_WAVEFORM_SIZE)
    }
}
