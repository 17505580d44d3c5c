//! Flanger

use super::delay_line::{frames_for, DelayLine, Lfo};
use super::{clamp_unit, frame_count, Effect};

const LFO_HZ: f32 = 0.5;
const BASE_SECONDS: f32 = 0.002;
const DEPTH_SECONDS: f32 = 0.003;
const FEEDBACK: f32 = 0.6;
const MIX: f32 = 0.5;

/// 2-5 ms swept feedback delay over a 100 ms line
#[derive(Debug, Clone)]
pub struct Flanger {
    line: DelayLine,
    lfo: Lfo,
    base: usize,
    depth: f32,
}

impl Flanger {
    /// Flanger sized for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Flanger {
            line: DelayLine::new(sample_rate as usize / 10),
            lfo: Lfo::new(LFO_HZ, sample_rate),
            base: frames_for(BASE_SECONDS, sample_rate),
            depth: DEPTH_SECONDS * sample_rate as f32,
        }
    }
}

impl Effect for Flanger {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            let delay = self.base + (self.lfo.tick_unipolar() * self.depth) as usize;
            let (dry_l, dry_r) = (frame[0], frame[1]);
            let (wet_l, wet_r) = self.line.read(delay);
            self.line
                .push(dry_l + wet_l * FEEDBACK, dry_r + wet_r * FEEDBACK);
            frame[0] = clamp_unit(dry_l * (1.0 - MIX) + wet_l * MIX);
            frame[1] = clamp_unit(dry_r * (1.0 - MIX) + wet_r * MIX);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.lfo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_comes_back_within_sweep() {
        let rate = 48_000;
        let mut flanger = Flanger::new(rate);
        let mut buffer = vec![0.0f32; 2 * 480];
        buffer[0] = 1.0;
        flanger.process(&mut buffer, 480);
        // first repeat lands between 2 ms and 5 ms
        let first = (1..480).find(|&i| buffer[2 * i] != 0.0).unwrap();
        assert!((95..=240).contains(&first), "repeat at frame {first}");
    }
}
