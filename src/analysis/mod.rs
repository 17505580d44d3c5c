//! Visualization data derived from the output stream
//!
//! - [`SpectrumAnalyzer`]: 2048-point FFT folded into log-spaced bands
//! - [`WaveformSampler`]: decimated stereo trace for a scope view

mod spectrum;
mod waveform;

pub use spectrum::{SpectrumAnalyzer, FFT_SIZE, MAX_FREQUENCY, MIN_FREQUENCY};
pub use waveform::WaveformSampler;
