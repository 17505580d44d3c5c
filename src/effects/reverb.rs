//! Multi-tap comb reverb

use super::delay_line::{frames_for, DelayLine};
use super::{clamp_unit, frame_count, Effect};

const TAP_SECONDS: [f32; 4] = [0.029, 0.037, 0.041, 0.043];
const DECAY: f32 = 0.5;
const MIX: f32 = 0.35;

/// Four taps averaged and fed back into a two second line
#[derive(Debug, Clone)]
pub struct Reverb {
    line: DelayLine,
    taps: [usize; 4],
}

impl Reverb {
    /// Reverb sized for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Reverb {
            line: DelayLine::new(sample_rate as usize * 2),
            taps: TAP_SECONDS.map(|seconds| frames_for(seconds, sample_rate)),
        }
    }

    fn wet(&self) -> (f32, f32) {
        let (mut left, mut right) = (0.0, 0.0);
        for &tap in &self.taps {
            let (l, r) = self.line.read(tap);
            left += l * DECAY;
            right += r * DECAY;
        }
        let scale = 1.0 / self.taps.len() as f32;
        (left * scale, right * scale)
    }
}

impl Effect for Reverb {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            let (dry_l, dry_r) = (frame[0], frame[1]);
            let (wet_l, wet_r) = self.wet();
            self.line.push(dry_l + wet_l * DECAY, dry_r + wet_r * DECAY);
            frame[0] = clamp_unit(dry_l * (1.0 - MIX) + wet_l * MIX);
            frame[1] = clamp_unit(dry_r * (1.0 - MIX) + wet_r * MIX);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}
