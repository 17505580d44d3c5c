//! Real-time output to the system audio device
//!
//! The playback thread pushes processed blocks into a [`RingBuffer`]; a rodio
//! source drains it on the device's callback thread. Memory use is fixed at
//! the ring size regardless of song length.

mod audio_device;
mod ring_buffer;

pub use audio_device::StreamingOutput;
pub use ring_buffer::{RingBuffer, RingBufferError};

/// Sleep between attempts to write into a full ring buffer (µs)
pub const BUFFER_BACKOFF_MICROS: u64 = 100;

/// Consecutive failed write attempts before a write is declared stalled
pub const MAX_WRITE_RETRIES: u32 = 1000;

/// Ring buffer and device format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Ring buffer size in samples (rounded up to a power of two)
    pub ring_buffer_size: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl StreamConfig {
    /// Stereo stream with roughly 85 ms of buffering at 48 kHz
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 8192,
            sample_rate,
            channels: 2,
        }
    }

    /// Stereo stream with roughly 340 ms of buffering at 48 kHz
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            ring_buffer_size: 32768,
            sample_rate,
            channels: 2,
        }
    }

    /// Buffered audio in milliseconds when the ring is full
    pub fn latency_ms(&self) -> f32 {
        let frames = self.ring_buffer_size as f32 / f32::from(self.channels.max(1));
        frames / self.sample_rate as f32 * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::stable(crate::config::DEFAULT_SAMPLE_RATE)
    }
}
