//! Bass boost: a one-pole low-pass added back on top of the dry signal

use super::{clamp_unit, frame_count, Effect};

const ALPHA: f32 = 0.15;
const GAIN: f32 = 1.8;
const DRY: f32 = 1.0 - GAIN * 0.5;

/// One-pole low-pass per channel, boosted and mixed with the dry signal
#[derive(Debug, Clone, Default)]
pub struct BassBoost {
    lp_left: f32,
    lp_right: f32,
}

impl BassBoost {
    /// Filter at rest
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn step(state: &mut f32, input: f32) -> f32 {
        *state += ALPHA * (input - *state);
        clamp_unit(*state * GAIN + input * DRY)
    }
}

impl Effect for BassBoost {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            frame[0] = Self::step(&mut self.lp_left, frame[0]);
            frame[1] = Self::step(&mut self.lp_right, frame[1]);
        }
    }

    fn reset(&mut self) {
        self.lp_left = 0.0;
        self.lp_right = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dc_settles_to_boosted_level() {
        let mut boost = BassBoost::new();
        let mut buffer = vec![0.25f32; 2000];
        boost.process(&mut buffer, 1000);
        // lp -> 0.25, out -> 0.25 * 1.8 + 0.25 * 0.1
        assert_relative_eq!(buffer[1998], 0.475, epsilon = 1e-4);
    }

    #[test]
    fn test_first_sample() {
        let mut boost = BassBoost::new();
        let mut buffer = [0.5f32, -0.5];
        boost.process(&mut buffer, 1);
        assert_relative_eq!(buffer[0], 0.075 * 1.8 + 0.05, epsilon = 1e-6);
        assert_relative_eq!(buffer[1], -(0.075 * 1.8 + 0.05), epsilon = 1e-6);
    }
}
