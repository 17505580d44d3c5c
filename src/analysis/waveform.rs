//! Decimated scope trace

/// Two fixed-size rings holding a decimated left/right trace
#[derive(Debug, Clone)]
pub struct WaveformSampler {
    left: Vec<f32>,
    right: Vec<f32>,
    write_pos: usize,
}

impl WaveformSampler {
    /// Silent trace of `capacity` points per channel
    pub fn new(capacity: usize) -> Self {
        WaveformSampler {
            left: vec![0.0; capacity],
            right: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Points per channel
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    /// Feed interleaved stereo samples.
    ///
    /// Every `max(1, len / (capacity * 4))`-th frame is kept. A block stops
    /// early once it fills the ring up to its end.
    pub fn push(&mut self, samples: &[f32]) {
        let capacity = self.capacity();
        if capacity == 0 {
            return;
        }
        let stride = (samples.len() / (capacity * 4)).max(1);
        for frame in samples.chunks_exact(2).step_by(stride) {
            if self.write_pos >= capacity {
                self.write_pos = 0;
            }
            self.left[self.write_pos] = frame[0];
            self.right[self.write_pos] = frame[1];
            self.write_pos += 1;
            if self.write_pos >= capacity {
                break;
            }
        }
    }

    /// Left trace
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right trace
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Zero both traces
    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).flat_map(|i| [i as f32, -(i as f32)]).collect()
    }

    #[test]
    fn test_small_block_is_not_decimated() {
        let mut sampler = WaveformSampler::new(8);
        sampler.push(&ramp(3));
        assert_eq!(&sampler.left()[..4], &[0.0, 1.0, 2.0, 0.0]);
        assert_eq!(sampler.right()[2], -2.0);
    }

    #[test]
    fn test_large_block_is_decimated() {
        let mut sampler = WaveformSampler::new(4);
        // 64 samples / (4 * 4) = stride 4 frames
        sampler.push(&ramp(32));
        assert_eq!(sampler.left(), &[0.0, 4.0, 8.0, 12.0]);
    }

    #[test]
    fn test_wraps_on_next_block() {
        let mut sampler = WaveformSampler::new(4);
        sampler.push(&ramp(4));
        sampler.push(&[9.0, -9.0]);
        assert_eq!(sampler.left(), &[9.0, 1.0, 2.0, 3.0]);
        assert_eq!(sampler.left().len(), 4);
    }
}
