//! Two-voice chorus

use super::delay_line::{frames_for, DelayLine, Lfo};
use super::{clamp_unit, frame_count, Effect};

const LFO_HZ: [f32; 2] = [0.7, 1.1];
const BASE_SECONDS: f32 = 0.020;
const DEPTH_SECONDS: f32 = 0.002;
const MIX: f32 = 0.4;

/// Two delayed voices around 20 ms, detuned by independent LFOs
#[derive(Debug, Clone)]
pub struct Chorus {
    line: DelayLine,
    lfos: [Lfo; 2],
    base: usize,
    depth: f32,
}

impl Chorus {
    /// Chorus sized for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Chorus {
            line: DelayLine::new(sample_rate as usize / 5),
            lfos: LFO_HZ.map(|hz| Lfo::new(hz, sample_rate)),
            base: frames_for(BASE_SECONDS, sample_rate),
            depth: DEPTH_SECONDS * sample_rate as f32,
        }
    }
}

impl Effect for Chorus {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            let (mut wet_l, mut wet_r) = (0.0, 0.0);
            for lfo in &mut self.lfos {
                let delay = self.base + (lfo.tick_unipolar() * self.depth) as usize;
                let (l, r) = self.line.read(delay);
                wet_l += l;
                wet_r += r;
            }
            wet_l *= 0.5;
            wet_r *= 0.5;

            let (dry_l, dry_r) = (frame[0], frame[1]);
            // no feedback: the line only ever holds the dry input
            self.line.push(dry_l, dry_r);
            frame[0] = clamp_unit(dry_l * (1.0 - MIX) + wet_l * MIX);
            frame[1] = clamp_unit(dry_r * (1.0 - MIX) + wet_r * MIX);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        for lfo in &mut self.lfos {
            lfo.reset();
        }
    }
}
