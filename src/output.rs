//! Audio output boundary
//!
//! The engine writes processed interleaved stereo blocks to an
//! [`AudioOutput`]. The real device lives behind the `streaming` feature
//! ([`crate::streaming::StreamingOutput`]); [`NullOutput`] discards audio and
//! serves headless runs.

use crate::PlayerError;
use std::time::Duration;

/// Failure reported by an audio output
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct DeviceError {
    /// What the engine was doing (`open`, `start`, `stop`, `write`)
    pub operation: &'static str,
    /// Backend explanation
    pub message: String,
}

impl DeviceError {
    /// Error for `operation` with a backend message
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        DeviceError {
            operation,
            message: message.into(),
        }
    }
}

impl From<DeviceError> for PlayerError {
    fn from(err: DeviceError) -> Self {
        PlayerError::AudioDevice(err.to_string())
    }
}

/// Sink for processed audio.
///
/// `write` is called from the playback thread only; `start` and `stop` may be
/// called from the playback thread or from the thread driving the engine, but
/// never concurrently.
pub trait AudioOutput: Send {
    /// Begin (or resume) consuming audio
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Stop consuming audio. Queued samples may be dropped.
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Deliver `frames` interleaved stereo frames from `samples`.
    ///
    /// Blocks while the device is backed up.
    fn write(&mut self, samples: &[f32], frames: usize) -> Result<(), DeviceError>;
}

/// Output that accepts and discards everything.
///
/// With [`NullOutput::paced`] each write sleeps for the block's real-time
/// duration, so the engine advances at roughly playback speed.
#[derive(Debug, Default)]
pub struct NullOutput {
    sample_rate: Option<u32>,
    running: bool,
    frames_written: u64,
}

impl NullOutput {
    /// Output that returns immediately from every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Output that sleeps for each block's duration at `sample_rate`
    pub fn paced(sample_rate: u32) -> Self {
        NullOutput {
            sample_rate: Some(sample_rate.max(1)),
            ..Self::default()
        }
    }

    /// Whether `start` was called more recently than `stop`
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total frames accepted so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl AudioOutput for NullOutput {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.running = false;
        Ok(())
    }

    fn write(&mut self, _samples: &[f32], frames: usize) -> Result<(), DeviceError> {
        if !self.running {
            return Err(DeviceError::new("write", "output is stopped"));
        }
        self.frames_written += frames as u64;
        if let Some(rate) = self.sample_rate {
            std::thread::sleep(Duration::from_secs_f64(frames as f64 / f64::from(rate)));
        }
        Ok(())
    }
}
