//! Engine configuration and persisted user settings

use crate::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default output sample rate (48 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default frames decoded per engine iteration
pub const DEFAULT_BUFFER_FRAMES: usize = 1024;

/// Default number of look-ahead rows published with each snapshot
pub const DEFAULT_PREVIEW_ROWS: usize = 32;

/// Default number of spectrum bands
pub const DEFAULT_SPECTRUM_BANDS: usize = 20;

/// Default scope trace length per channel
pub const DEFAULT_WAVEFORM_SIZE: usize = 512;

const MIN_SAMPLE_RATE: u32 = 8_000;
const MAX_SAMPLE_RATE: u32 = 192_000;

/// Configuration for the playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz used for decoding and the effects' time constants
    pub sample_rate: u32,
    /// Frames decoded and written per loop iteration
    pub buffer_frames: usize,
    /// Upper bound for `TransportState::preview_rows`
    pub preview_rows: usize,
    /// Number of log-spaced spectrum bands
    pub spectrum_bands: usize,
    /// Capacity of each scope ring buffer
    pub waveform_size: usize,
}

impl EngineConfig {
    /// Configuration with a custom sample rate and defaults elsewhere
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        EngineConfig {
            sample_rate,
            ..Self::default()
        }
    }

    /// Check that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::Config`] when a size is zero or the sample rate
    /// is outside 8 kHz..=192 kHz.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(PlayerError::Config(format!(
                "sample rate {} outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                self.sample_rate
            )));
        }
        let sizes = [
            ("buffer_frames", self.buffer_frames),
            ("preview_rows", self.preview_rows),
            ("spectrum_bands", self.spectrum_bands),
            ("waveform_size", self.waveform_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(PlayerError::Config(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    /// Latency of one engine buffer in milliseconds
    pub fn buffer_latency_ms(&self) -> f32 {
        (self.buffer_frames as f32 / self.sample_rate as f32) * 1000.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            spectrum_bands: DEFAULT_SPECTRUM_BANDS,
            waveform_size: DEFAULT_WAVEFORM_SIZE,
        }
    }
}

/// User settings persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub volume: f64,
    /// Colour theme name understood by the presentation layer
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            volume: 1.0,
            theme: "dark".to_string(),
        }
    }
}

impl Settings {
    /// Default settings location: `<config dir>/modtracker/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modtracker").join("settings.json"))
    }

    /// Load settings from `path`.
    ///
    /// A missing file yields the defaults. Volume is clamped to [0, 1].
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut settings: Settings = serde_json::from_str(&text)?;
        if !settings.volume.is_finite() {
            settings.volume = 1.0;
        }
        settings.volume = settings.volume.clamp(0.0, 1.0);
        Ok(settings)
    }

    /// Load from [`Settings::default_path`], falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Settings::default();
        };
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings {}: {e}", path.display());
            Settings::default()
        })
    }

    /// Write settings to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
