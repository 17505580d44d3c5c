//! Phaser: four swept all-pass stages per channel

use super::delay_line::Lfo;
use super::{clamp_unit, frame_count, Effect};

const LFO_HZ: f32 = 0.4;
const STAGES: usize = 4;
const MIX: f32 = 0.5;
const FEEDBACK: f32 = 0.7;

/// Phaser with the all-pass coefficient swept between 0.3 and 0.8
#[derive(Debug, Clone)]
pub struct Phaser {
    lfo: Lfo,
    left: [f32; STAGES],
    right: [f32; STAGES],
}

impl Phaser {
    /// Phaser for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Phaser {
            lfo: Lfo::new(LFO_HZ, sample_rate),
            left: [0.0; STAGES],
            right: [0.0; STAGES],
        }
    }

    #[inline]
    fn all_pass(states: &mut [f32; STAGES], input: f32, coeff: f32) -> f32 {
        let mut signal = input;
        for state in states.iter_mut() {
            let out = -signal + *state;
            *state = signal + out * coeff;
            signal = out;
        }
        signal
    }

    #[inline]
    fn mix(dry: f32, phased: f32) -> f32 {
        clamp_unit(dry * (1.0 - MIX) + phased * MIX + phased * FEEDBACK * 0.3)
    }
}

impl Effect for Phaser {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            let coeff = 0.3 + self.lfo.tick_unipolar() * 0.5;
            let left = Self::all_pass(&mut self.left, frame[0], coeff);
            let right = Self::all_pass(&mut self.right, frame[1], coeff);
            frame[0] = Self::mix(frame[0], left);
            frame[1] = Self::mix(frame[1], right);
        }
    }

    fn reset(&mut self) {
        self.lfo.reset();
        self.left = [0.0; STAGES];
        self.right = [0.0; STAGES];
    }
}
