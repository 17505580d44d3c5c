//! Offline export of a rendered song
//!
//! The engine renders the whole module into memory (see
//! [`crate::Player::export_to_file`]) and hands the interleaved buffer to an
//! [`Encoder`] picked by [`encoder_for`]:
//! - WAV (16-bit PCM via `hound`), always available
//! - MP3 (LAME via `mp3lame-encoder`), feature `export-mp3`
//! - FLAC (libFLAC via `flac-bound`), feature `export-flac`
//!
//! # Example
//!
//! ```no_run
//! use modtracker::{ExportFormat, ExportOptions, Player};
//!
//! # fn run(player: &Player) -> modtracker::Result<()> {
//! let options = ExportOptions::new(ExportFormat::Wav, "song.wav")
//!     .with_progress(|done, total| {
//!         println!("{done}/{total}");
//!         true
//!     });
//! player.export_to_file(options)?;
//! # Ok(())
//! # }
//! ```

mod wav;

#[cfg(feature = "export-mp3")]
mod mp3;

#[cfg(feature = "export-flac")]
mod flac;

pub use wav::WavEncoder;

#[cfg(feature = "export-mp3")]
pub use mp3::Mp3Encoder;

#[cfg(feature = "export-flac")]
pub use flac::FlacEncoder;

use crate::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Frames rendered per step of an export
pub const EXPORT_CHUNK_FRAMES: usize = 4096;

/// Default MP3 bitrate in kbps
pub const DEFAULT_MP3_BITRATE: u32 = 320;

/// Default FLAC compression level (0-8)
pub const DEFAULT_FLAC_COMPRESSION: u32 = 5;

/// Output container/codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// 16-bit PCM WAV
    Wav,
    /// MPEG-1 Layer III
    Mp3,
    /// Free Lossless Audio Codec, 16-bit
    Flac,
}

impl ExportFormat {
    /// Every format in menu order
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Wav, ExportFormat::Mp3, ExportFormat::Flac];
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_name(*self))
    }
}

/// Progress callback: `(rendered_samples, total_samples) -> keep_going`
pub type ProgressCallback = Box<dyn FnMut(usize, usize) -> bool + Send>;

/// What to export and where
pub struct ExportOptions {
    /// Output format
    pub format: ExportFormat,
    /// Destination file
    pub output_path: PathBuf,
    /// Render sample rate in Hz
    pub sample_rate: u32,
    /// 1 (mono downmix) or 2
    pub channels: u16,
    /// MP3 bitrate in kbps
    pub mp3_bitrate: u32,
    /// FLAC compression level (0-8)
    pub flac_compression_level: u32,
    /// Called after each rendered chunk; returning `false` cancels
    pub progress: Option<ProgressCallback>,
}

impl ExportOptions {
    /// Stereo export at the default sample rate
    pub fn new(format: ExportFormat, output_path: impl Into<PathBuf>) -> Self {
        ExportOptions {
            format,
            output_path: output_path.into(),
            sample_rate: crate::config::DEFAULT_SAMPLE_RATE,
            channels: 2,
            mp3_bitrate: DEFAULT_MP3_BITRATE,
            flac_compression_level: DEFAULT_FLAC_COMPRESSION,
            progress: None,
        }
    }

    /// Set the render sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count (1 or 2)
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the MP3 bitrate in kbps
    pub fn with_mp3_bitrate(mut self, kbps: u32) -> Self {
        self.mp3_bitrate = kbps;
        self
    }

    /// Set the FLAC compression level
    pub fn with_flac_compression(mut self, level: u32) -> Self {
        self.flac_compression_level = level;
        self
    }

    /// Install a progress callback
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(usize, usize) -> bool + Send + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Check the options before any rendering happens.
    ///
    /// # Errors
    ///
    /// [`PlayerError::Config`] for an empty path, a channel count other than
    /// 1 or 2, or a zero sample rate.
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(PlayerError::Config("output path not specified".into()));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(PlayerError::Config(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(PlayerError::Config("sample rate must be greater than 0".into()));
        }
        Ok(())
    }

    /// Report progress; `true` means continue
    pub(crate) fn report(&mut self, rendered: usize, total: usize) -> bool {
        match self.progress.as_mut() {
            Some(progress) => progress(rendered, total),
            None => true,
        }
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("format", &self.format)
            .field("output_path", &self.output_path)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("mp3_bitrate", &self.mp3_bitrate)
            .field("flac_compression_level", &self.flac_compression_level)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Writes a fully rendered buffer to disk
pub trait Encoder: Send {
    /// Format this encoder produces
    fn format(&self) -> ExportFormat;

    /// Encode interleaved `samples` (`options.channels` per frame) into
    /// `options.output_path`.
    fn encode(&self, samples: &[f32], options: &ExportOptions) -> Result<()>;
}

/// Whether an encoder for `format` is compiled in
pub fn is_format_supported(format: ExportFormat) -> bool {
    match format {
        ExportFormat::Wav => true,
        ExportFormat::Mp3 => cfg!(feature = "export-mp3"),
        ExportFormat::Flac => cfg!(feature = "export-flac"),
    }
}

/// File extension including the dot
pub fn extension(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Wav => ".wav",
        ExportFormat::Mp3 => ".mp3",
        ExportFormat::Flac => ".flac",
    }
}

/// Human-readable format name
pub fn format_name(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Wav => "WAV (PCM)",
        ExportFormat::Mp3 => "MP3 (Lossy)",
        ExportFormat::Flac => "FLAC (Lossless)",
    }
}

/// Formats with an encoder compiled in
pub fn supported_formats() -> Vec<ExportFormat> {
    ExportFormat::ALL
        .into_iter()
        .filter(|f| is_format_supported(*f))
        .collect()
}

/// `path` with its extension replaced by the one for `format`
pub fn path_with_extension(path: &Path, format: ExportFormat) -> PathBuf {
    path.with_extension(extension(format).trim_start_matches('.'))
}

/// Encoder for `format`, or `None` when it is not compiled in
pub fn encoder_for(format: ExportFormat) -> Option<Box<dyn Encoder>> {
    match format {
        ExportFormat::Wav => Some(Box::new(WavEncoder)),
        #[cfg(feature = "export-mp3")]
        ExportFormat::Mp3 => Some(Box::new(Mp3Encoder)),
        #[cfg(feature = "export-flac")]
        ExportFormat::Flac => Some(Box::new(FlacEncoder)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Convert a float sample to 16-bit PCM.
///
/// Clamps to [-1, 1]; positive values scale by 32767 and negative values by
/// 32768 so both extremes are reachable.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * 32767.0) as i16
    } else {
        (clamped * 32768.0) as i16
    }
}

/// Average interleaved stereo frames down to mono
pub fn downmix_to_mono(stereo: &[f32]) -> Vec<f32> {
    stereo
        .chunks_exact(2)
        .map(|frame| (frame[0] + frame[1]) * 0.5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_to_i16_extremes() {
        assert_eq!(float_to_i16(1.0), 32767);
        assert_eq!(float_to_i16(-1.0), -32768);
        assert_eq!(float_to_i16(2.5), 32767);
        assert_eq!(float_to_i16(-7.0), -32768);
        assert_eq!(float_to_i16(0.0), 0);
        assert_eq!(float_to_i16(0.5), 16383);
    }

    #[test]
    fn test_registry_names() {
        assert_eq!(extension(ExportFormat::Flac), ".flac");
        assert_eq!(format_name(ExportFormat::Mp3), "MP3 (Lossy)");
        assert_eq!(ExportFormat::Wav.to_string(), "WAV (PCM)");
        assert!(is_format_supported(ExportFormat::Wav));
        assert!(supported_formats().contains(&ExportFormat::Wav));
    }

    #[test]
    fn test_encoder_matches_support() {
        for format in ExportFormat::ALL {
            let encoder = encoder_for(format);
            assert_eq!(encoder.is_some(), is_format_supported(format));
            if let Some(encoder) = encoder {
                assert_eq!(encoder.format(), format);
            }
        }
    }

    #[test]
    fn test_path_with_extension() {
        let path = path_with_extension(Path::new("out/song.xm"), ExportFormat::Mp3);
        assert_eq!(path, PathBuf::from("out/song.mp3"));
    }

    #[test]
    fn test_validate_options() {
        assert!(ExportOptions::new(ExportFormat::Wav, "a.wav").validate().is_ok());
        assert!(ExportOptions::new(ExportFormat::Wav, "").validate().is_err());
        let mono = ExportOptions::new(ExportFormat::Wav, "a.wav").with_channels(3);
        assert!(matches!(mono.validate(), Err(PlayerError::Config(_))));
    }

    #[test]
    fn test_report_without_callback_continues() {
        let mut options = ExportOptions::new(ExportFormat::Wav, "a.wav");
        assert!(options.report(10, 100));
        let mut options = options.with_progress(|done, _| done < 50);
        assert!(options.report(10, 100));
        assert!(!options.report(60, 100));
    }

    #[test]
    fn test_downmix() {
        assert_eq!(downmix_to_mono(&[1.0, 0.0, -0.5, -0.5]), vec![0.5, -0.5]);
    }
}
