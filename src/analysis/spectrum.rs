//! Log-spaced spectrum bands

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Samples per analysis window
pub const FFT_SIZE: usize = 2048;

/// Lower edge of the first band (Hz)
pub const MIN_FREQUENCY: f32 = 20.0;

/// Upper edge of the last band (Hz)
pub const MAX_FREQUENCY: f32 = 20_000.0;

const MAGNITUDE_GAIN: f32 = 2.5;
const DB_FLOOR: f32 = 50.0;

/// Accumulates mono-folded samples and recomputes the bands every time a
/// full window has been collected.
///
/// Windows do not overlap: once the window is full, the rest of the block
/// that filled it is dropped and the next block starts a fresh window.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    input: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    write_pos: usize,
    /// Bin range `[start, end)` per band
    band_bins: Vec<(usize, usize)>,
    bands: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Analyzer producing `band_count` bands for audio at `sample_rate`
    pub fn new(sample_rate: u32, band_count: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Hann window
        let window = (0..FFT_SIZE)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        SpectrumAnalyzer {
            fft,
            window,
            input: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            scratch,
            write_pos: 0,
            band_bins: band_bins(sample_rate, band_count),
            bands: vec![0.0; band_count],
        }
    }

    /// Feed interleaved stereo samples.
    ///
    /// Returns `true` when the bands were recomputed by this call.
    pub fn push(&mut self, samples: &[f32]) -> bool {
        for frame in samples.chunks_exact(2) {
            if self.write_pos >= FFT_SIZE {
                break;
            }
            let mono = (frame[0] + frame[1]) * 0.5;
            self.input[self.write_pos] = Complex::new(mono, 0.0);
            self.write_pos += 1;
        }
        if self.write_pos < FFT_SIZE {
            return false;
        }
        self.write_pos = 0;
        self.analyze();
        true
    }

    fn analyze(&mut self) {
        for (sample, w) in self.input.iter_mut().zip(&self.window) {
            *sample *= *w;
        }
        self.fft
            .process_with_scratch(&mut self.input, &mut self.scratch);

        for (band, &(start, end)) in self.bands.iter_mut().zip(&self.band_bins) {
            let bins = &self.input[start..end];
            let sum: f32 = bins.iter().map(|c| c.norm()).sum();
            let average = sum / bins.len() as f32;
            *band = band_level(average / FFT_SIZE as f32 * MAGNITUDE_GAIN);
        }
    }

    /// Latest band values, each in [0, 1]
    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    /// Forget the partially filled window and zero the bands
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.bands.fill(0.0);
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("bands", &self.bands.len())
            .field("write_pos", &self.write_pos)
            .finish()
    }
}

/// Map a normalised magnitude onto a 50 dB display range
fn band_level(magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    ((20.0 * (magnitude + 1e-6).log10() + DB_FLOOR) / DB_FLOOR).clamp(0.0, 1.0)
}

fn band_bins(sample_rate: u32, band_count: usize) -> Vec<(usize, usize)> {
    let half = FFT_SIZE / 2;
    let freq_per_bin = sample_rate as f32 / FFT_SIZE as f32;
    let log_min = MIN_FREQUENCY.log10();
    let log_range = MAX_FREQUENCY.log10() - log_min;

    (0..band_count)
        .map(|band| {
            let edge = |b: usize| 10f32.powf(log_min + log_range * b as f32 / band_count as f32);
            let start = ((edge(band) / freq_per_bin) as usize).min(half - 1);
            let end = ((edge(band + 1) / freq_per_bin) as usize).min(half);
            (start, end.max(start + 1))
        })
        .collect()
}
