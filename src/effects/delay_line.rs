//! Building blocks shared by the time-based effects

use std::f32::consts::TAU;

/// Stereo ring buffer with one write cursor for both channels
#[derive(Clone)]
pub struct DelayLine {
    left: Vec<f32>,
    right: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// A silent line holding `capacity` frames (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        DelayLine {
            left: vec![0.0; capacity],
            right: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Frames the line can hold
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// Frame written `delay` frames ago; `delay` is capped at capacity - 1
    #[inline]
    pub fn read(&self, delay: usize) -> (f32, f32) {
        let capacity = self.capacity();
        let delay = delay.min(capacity - 1);
        let pos = (self.write_pos + capacity - delay) % capacity;
        (self.left[pos], self.right[pos])
    }

    /// Store a frame at the cursor and advance it
    #[inline]
    pub fn push(&mut self, left: f32, right: f32) {
        self.left[self.write_pos] = left;
        self.right[self.write_pos] = right;
        self.write_pos = (self.write_pos + 1) % self.capacity();
    }

    /// Zero the contents and rewind the cursor
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.write_pos = 0;
    }
}

impl std::fmt::Debug for DelayLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayLine")
            .field("capacity", &self.capacity())
            .field("write_pos", &self.write_pos)
            .finish()
    }
}

/// Sine oscillator advanced once per frame
#[derive(Debug, Clone, Copy)]
pub struct Lfo {
    phase: f32,
    increment: f32,
}

impl Lfo {
    /// Oscillator at `frequency` Hz for the given sample rate
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Lfo {
            phase: 0.0,
            increment: TAU * frequency / sample_rate.max(1) as f32,
        }
    }

    /// Current value in [-1, 1], then step the phase
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let value = self.phase.sin();
        self.phase += self.increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        value
    }

    /// Same as [`Lfo::tick`] mapped to [0, 1]
    #[inline]
    pub fn tick_unipolar(&mut self) -> f32 {
        self.tick() * 0.5 + 0.5
    }

    /// Restart at phase 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Whole frames in `seconds` at `sample_rate`
#[inline]
pub(crate) fn frames_for(seconds: f32, sample_rate: u32) -> usize {
    (seconds * sample_rate as f32) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back_after_delay() {
        let mut line = DelayLine::new(8);
        line.push(1.0, -1.0);
        line.push(0.0, 0.0);
        line.push(0.0, 0.0);
        assert_eq!(line.read(3), (1.0, -1.0));
        assert_eq!(line.read(2), (0.0, 0.0));
    }

    #[test]
    fn test_delay_capped_and_wraps() {
        let mut line = DelayLine::new(4);
        for i in 0..6 {
            line.push(i as f32, 0.0);
        }
        // cursor at 2; capped delay 3 reads slot 3 (written as 3.0)
        assert_eq!(line.read(100).0, 3.0);
        line.clear();
        assert_eq!(line.read(1), (0.0, 0.0));
    }

    #[test]
    fn test_lfo_range() {
        let mut lfo = Lfo::new(1000.0, 48_000);
        for _ in 0..1000 {
            let v = lfo.tick_unipolar();
            assert!((0.0..=1.0).contains(&v));
        }
        lfo.reset();
        assert_eq!(lfo.tick(), 0.0);
    }
}
