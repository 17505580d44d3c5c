//! Feedback echo

use super::delay_line::{frames_for, DelayLine};
use super::{clamp_unit, frame_count, Effect};

const DELAY_SECONDS: f32 = 0.25;
const FEEDBACK: f32 = 0.4;
const MIX: f32 = 0.3;

/// Single-tap echo with a one second line
#[derive(Debug, Clone)]
pub struct Echo {
    line: DelayLine,
    delay: usize,
}

impl Echo {
    /// Echo sized for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Echo {
            line: DelayLine::new(sample_rate as usize),
            delay: frames_for(DELAY_SECONDS, sample_rate),
        }
    }
}

impl Effect for Echo {
    fn process(&mut self, buffer: &mut [f32], frames: usize) {
        let frames = frame_count(buffer, frames);
        for frame in buffer[..frames * 2].chunks_exact_mut(2) {
            let (dry_l, dry_r) = (frame[0], frame[1]);
            let (wet_l, wet_r) = self.line.read(self.delay);
            self.line.push(
                clamp_unit(dry_l + wet_l * FEEDBACK),
                clamp_unit(dry_r + wet_r * FEEDBACK),
            );
            frame[0] = clamp_unit(dry_l * (1.0 - MIX) + wet_l * MIX);
            frame[1] = clamp_unit(dry_r * (1.0 - MIX) + wet_r * MIX);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}
