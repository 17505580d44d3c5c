//! Playback engine for terminal tracker-module players
//!
//! Drives a module decoder on a background thread, applies volume and one
//! selectable DSP effect, derives visualization data (log-spaced spectrum
//! bands, a decimated scope trace, per-channel VU and pattern text) and
//! streams the result to an audio output. The presentation layer reads a
//! copied [`TransportState`] at its own cadence.
//!
//! # Features
//! - Background playback loop with an explicit Run/Pause/Stop control signal
//! - Six stateful real-time effects (bass boost, echo, reverb, flanger, phaser, chorus)
//! - 2048-point FFT spectrum folded into log-spaced bands
//! - Order/row navigation across the order → pattern → row hierarchy
//! - Look-ahead pattern row preview
//! - Offline export to WAV, MP3 and FLAC
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output via rodio (`streaming`)
//! - `export-mp3` (opt-in): MP3 export through LAME
//! - `export-flac` (opt-in): FLAC export through libFLAC
//! - `export` (opt-in): both encoders
//!
//! # Quick start
//! ```no_run
//! use modtracker::{EffectKind, EngineConfig, ModuleDecoder, NullOutput, Player};
//!
//! # fn decoder() -> Box<dyn ModuleDecoder> { unimplemented!() }
//! let player = Player::new(decoder(), Box::new(NullOutput::new()), EngineConfig::default(), "song.xm")?;
//! player.start()?;
//! player.set_effect(EffectKind::Reverb);
//!
//! let state = player.snapshot();
//! println!("order {:02} row {:02}", state.order, state.row);
//! player.stop();
//! # Ok::<(), modtracker::PlayerError>(())
//! ```

#![warn(missing_docs)]

pub mod analysis; // Spectrum + Scope
pub mod config; // Engine Configuration & Settings
pub mod decoder; // Module Decoder Boundary
pub mod effects; // DSP Effect Bank
pub mod engine; // Playback Engine
pub mod export; // Offline Rendering & Encoders
pub mod navigator; // Order/Row Seeking
pub mod output; // Audio Output Boundary
pub mod pattern_text; // Tracker Cell Formatting
pub mod state; // Transport Snapshot Types
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming

/// Error types for playback engine operations
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    /// Audio device could not be opened, started, stopped or written
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Module decoder failed to load or misbehaved
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// Requested export format has no encoder compiled in
    #[error("Format not supported (missing encoder): {0}")]
    FormatUnavailable(export::ExportFormat),

    /// Encoder failed while producing the output file
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Export was cancelled by the progress callback
    #[error("Export cancelled by user")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be (de)serialized
    #[error("Settings format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for PlayerError {
    /// Converts a String into `PlayerError::Other`.
    ///
    /// Prefer a specific variant where one fits; this exists for terse
    /// `map_err(|e| format!(..))?` chains in encoder glue.
    fn from(msg: String) -> Self {
        PlayerError::Other(msg)
    }
}

impl From<&str> for PlayerError {
    fn from(msg: &str) -> Self {
        PlayerError::Other(msg.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PlayerError>;

// Public API exports
pub use analysis::{SpectrumAnalyzer, WaveformSampler};
pub use config::{EngineConfig, Settings};
pub use decoder::{FormatError, ModuleDecoder, ModuleInfo};
pub use effects::{EffectBank, EffectKind};
pub use engine::{PlaybackState, Player};
pub use export::{Encoder, ExportFormat, ExportOptions};
pub use output::{AudioOutput, DeviceError, NullOutput};
pub use state::{ChannelStatus, PatternRowPreview, TransportState};
#[cfg(feature = "streaming")]
pub use streaming::{RingBuffer, StreamConfig, StreamingOutput};
