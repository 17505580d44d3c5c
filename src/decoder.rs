//! Module decoder boundary
//!
//! The engine never parses tracker formats itself. It drives an implementation
//! of [`ModuleDecoder`] (typically a libopenmpt binding) and reads position,
//! pattern layout, per-channel VU and formatted pattern text from it.
//!
//! Indices follow tracker conventions: signed, with `-1` meaning
//! "unknown / not started" for positions and "no pattern" for
//! [`ModuleDecoder::order_pattern`].

use std::fmt;

/// Failure to format one pattern cell.
///
/// Recoverable: callers substitute [`crate::pattern_text::EMPTY_CELL`] and continue.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot format pattern {pattern} row {row} channel {channel}: {reason}")]
pub struct FormatError {
    /// Pattern index that was requested
    pub pattern: i32,
    /// Row index that was requested
    pub row: i32,
    /// Channel index that was requested
    pub channel: i32,
    /// Decoder-supplied explanation
    pub reason: String,
}

/// Interface the engine consumes from a module decoder.
///
/// Implementations are not assumed to be reentrant; the engine serialises
/// every call behind one lock.
pub trait ModuleDecoder: Send {
    /// Order currently playing (-1 before playback)
    fn current_order(&self) -> i32;
    /// Pattern currently playing (-1 before playback)
    fn current_pattern(&self) -> i32;
    /// Row currently playing (-1 before playback)
    fn current_row(&self) -> i32;
    /// Current ticks-per-row speed (-1 if unknown)
    fn current_speed(&self) -> i32;
    /// Playback position in seconds
    fn position_seconds(&self) -> f64;

    /// Number of channels the module currently uses
    fn num_channels(&self) -> i32;
    /// Length of the order list
    fn num_orders(&self) -> i32;
    /// Number of patterns stored in the module
    fn num_patterns(&self) -> i32;
    /// Number of instruments (0 for sample-only formats)
    fn num_instruments(&self) -> i32 {
        0
    }
    /// Number of samples
    fn num_samples(&self) -> i32 {
        0
    }
    /// Pattern referenced by `order`, or a negative value for skip/end markers
    fn order_pattern(&self, order: i32) -> i32;
    /// Rows in `pattern` (0 for invalid indices)
    fn pattern_num_rows(&self, pattern: i32) -> i32;
    /// Estimated total duration in seconds
    fn duration_seconds(&self) -> f64;

    /// Seek to `row` of `order`
    fn set_position_order_row(&mut self, order: i32, row: i32);
    /// Seek to an absolute time
    fn set_position_seconds(&mut self, seconds: f64);

    /// Render up to `frames` interleaved stereo frames into `out`.
    ///
    /// Returns the number of frames produced; 0 means the module has ended.
    fn read_interleaved_stereo(&mut self, sample_rate: u32, frames: usize, out: &mut [f32])
        -> usize;

    /// Formatted text of one pattern cell
    fn format_pattern_row_channel(
        &self,
        pattern: i32,
        row: i32,
        channel: i32,
    ) -> Result<String, FormatError>;

    /// Instantaneous left level of `channel`
    fn channel_vu_left(&self, channel: i32) -> f32;
    /// Instantaneous right level of `channel`
    fn channel_vu_right(&self, channel: i32) -> f32;

    /// Metadata lookup by key (`title`, `artist`, `tracker`, `type`, `message`, ...)
    fn metadata(&self, key: &str) -> Option<String>;

    /// Instrument names in module order
    fn instrument_names(&self) -> Vec<String> {
        Vec::new()
    }
    /// Sample names in module order
    fn sample_names(&self) -> Vec<String> {
        Vec::new()
    }
    /// Channel names in module order
    fn channel_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Width available for a name column in the channel view
pub const NAME_DISPLAY_WIDTH: usize = 24;

/// Upper bound on module message lines kept in [`ModuleInfo`]
pub const MAX_MESSAGE_LINES: usize = 256;

/// Metadata gathered once when a module is attached to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleInfo {
    /// Song title (falls back to the source label)
    pub title: String,
    /// Composer, "Unknown" when absent
    pub artist: String,
    /// Tracker that saved the module, "Unknown" when absent
    pub tracker: String,
    /// Format name, "Unknown" when absent
    pub module_type: String,
    /// Date string as stored in the module (may be empty)
    pub date: String,
    /// Song message split into non-empty lines
    pub message_lines: Vec<String>,
    /// Sanitised instrument names (samples or channels when the format has none)
    pub instrument_names: Vec<String>,
    /// Sanitised sample names
    pub sample_names: Vec<String>,
    /// Channel count at load time
    pub num_channels: i32,
    /// Instrument count
    pub num_instruments: i32,
    /// Sample count
    pub num_samples: i32,
    /// Pattern count
    pub num_patterns: i32,
    /// Order list length
    pub num_orders: i32,
    /// Estimated duration in seconds
    pub duration_seconds: f64,
}

impl ModuleInfo {
    /// Read metadata from `decoder`; `source` names the file for the title fallback
    pub fn collect(decoder: &dyn ModuleDecoder, source: &str) -> Self {
        let meta = |key: &str| decoder.metadata(key).filter(|v| !v.is_empty());

        let title = meta("title").unwrap_or_else(|| source.to_string());
        let artist = meta("artist").unwrap_or_else(|| "Unknown".to_string());
        let tracker = meta("tracker").unwrap_or_else(|| "Unknown".to_string());
        let module_type = meta("type")
            .or_else(|| meta("type_long"))
            .unwrap_or_else(|| "Unknown".to_string());
        let date = meta("date").unwrap_or_default();

        let message_lines = meta("message")
            .or_else(|| meta("comment"))
            .or_else(|| meta("message_text"))
            .map(|text| split_lines(&text, MAX_MESSAGE_LINES))
            .unwrap_or_default();

        let instrument_names = pick_instrument_names(decoder)
            .iter()
            .map(|name| sanitize_name(name))
            .collect();
        let sample_names = decoder
            .sample_names()
            .iter()
            .map(|name| sanitize_name(name))
            .collect();

        ModuleInfo {
            title,
            artist,
            tracker,
            module_type,
            date,
            message_lines,
            instrument_names,
            sample_names,
            num_channels: decoder.num_channels(),
            num_instruments: decoder.num_instruments(),
            num_samples: decoder.num_samples(),
            num_patterns: decoder.num_patterns(),
            num_orders: decoder.num_orders(),
            duration_seconds: decoder.duration_seconds(),
        }
    }

    /// Duration formatted as `mm:ss`
    pub fn duration_label(&self) -> String {
        let total = self.duration_seconds.max(0.0) as u64;
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} [{}, {} ch, {} orders, {}]",
            self.title,
            self.artist,
            self.module_type,
            self.num_channels,
            self.num_orders,
            self.duration_label()
        )
    }
}

fn pick_instrument_names(decoder: &dyn ModuleDecoder) -> Vec<String> {
    let instruments = decoder.instrument_names();
    if !instruments.is_empty() {
        return instruments;
    }
    let samples = decoder.sample_names();
    if !samples.is_empty() {
        return samples;
    }
    decoder.channel_names()
}

/// Fit a name into the channel view column.
///
/// Empty names become `<unnamed>`; long names are cut and end in `…`.
pub fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        return "<unnamed>".to_string();
    }
    if name.chars().count() <= NAME_DISPLAY_WIDTH {
        return name.to_string();
    }
    let mut cut: String = name.chars().take(NAME_DISPLAY_WIDTH - 1).collect();
    cut.push('…');
    cut
}

/// Split a module message into at most `max_lines` non-empty lines
pub fn split_lines(text: &str, max_lines: usize) -> Vec<String> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .take(max_lines)
        .map(str::to_string)
        .collect()
}
