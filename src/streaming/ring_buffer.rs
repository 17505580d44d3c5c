//! Single-producer single-consumer sample ring
//!
//! Sample storage sits behind a `parking_lot::Mutex`; the read and write
//! cursors are atomics that only ever grow, so the fill level is their
//! difference and slot indices are the cursors masked to the capacity.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest ring we agree to allocate (512 MB of samples)
const MAX_CAPACITY: usize = 512 * 1024 * 1024 / std::mem::size_of::<f32>();

/// Invalid ring buffer size
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RingBufferError(pub String);

/// Lock-protected circular buffer of `f32` samples
#[derive(Debug)]
pub struct RingBuffer {
    samples: Mutex<Vec<f32>>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    capacity: usize,
    mask: usize,
}

impl RingBuffer {
    /// Ring holding `requested` samples, rounded up to a power of two.
    ///
    /// # Errors
    ///
    /// Fails for a zero size or one above 512 MB.
    pub fn new(requested: usize) -> Result<Self, RingBufferError> {
        if requested == 0 {
            return Err(RingBufferError(
                "ring buffer capacity must be greater than 0".into(),
            ));
        }
        let capacity = requested.next_power_of_two();
        if capacity > MAX_CAPACITY {
            return Err(RingBufferError(format!(
                "ring buffer capacity {capacity} exceeds maximum {MAX_CAPACITY}"
            )));
        }
        Ok(RingBuffer {
            samples: Mutex::new(vec![0.0; capacity]),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Slots in the ring
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples waiting to be read
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Free slots; one slot stays unused so full and empty differ
    pub fn available_write(&self) -> usize {
        self.capacity - self.available_read() - 1
    }

    /// Copy as much of `src` as fits. Returns the number of samples taken.
    pub fn write(&self, src: &[f32]) -> usize {
        let mut slots = self.samples.lock();
        let write = self.write_pos.load(Ordering::Acquire);
        let count = src.len().min(self.available_write());
        if count == 0 {
            return 0;
        }

        let start = write & self.mask;
        let first = count.min(self.capacity - start);
        slots[start..start + first].copy_from_slice(&src[..first]);
        slots[..count - first].copy_from_slice(&src[first..count]);
        drop(slots);

        self.write_pos
            .store(write.wrapping_add(count), Ordering::Release);
        count
    }

    /// Fill as much of `dest` as is available. Returns the number of samples read.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let slots = self.samples.lock();
        let read = self.read_pos.load(Ordering::Acquire);
        let count = dest.len().min(self.available_read());
        if count == 0 {
            return 0;
        }

        let start = read & self.mask;
        let first = count.min(self.capacity - start);
        dest[..first].copy_from_slice(&slots[start..start + first]);
        dest[first..count].copy_from_slice(&slots[..count - first]);
        drop(slots);

        self.read_pos.store(read.wrapping_add(count), Ordering::Release);
        count
    }

    /// Discard everything queued
    pub fn flush(&self) {
        let _slots = self.samples.lock();
        let write = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(write, Ordering::Release);
    }

    /// Nothing queued
    pub fn is_empty(&self) -> bool {
        self.available_read() == 0
    }

    /// Fill level (0.0 to 1.0)
    pub fn fill_percentage(&self) -> f32 {
        self.available_read() as f32 / self.capacity as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(RingBuffer::new(1000).unwrap().capacity(), 1024);
        assert_eq!(RingBuffer::new(1024).unwrap().capacity(), 1024);
    }

    #[test]
    fn test_write_then_read() {
        let ring = RingBuffer::new(16).unwrap();
        assert_eq!(ring.write(&[0.1, 0.2, 0.3, 0.4]), 4);
        assert_eq!(ring.available_read(), 4);
        let mut dest = [0.0; 4];
        assert_eq!(ring.read(&mut dest), 4);
        assert_eq!(dest, [0.1, 0.2, 0.3, 0.4]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_wrap_around_keeps_order() {
        let ring = RingBuffer::new(8).unwrap();
        ring.write(&[1.0; 6]);
        let mut drain = [0.0; 6];
        ring.read(&mut drain);

        let data: Vec<f32> = (0..7).map(|i| i as f32).collect();
        assert_eq!(ring.write(&data), 7);
        let mut dest = [0.0; 7];
        assert_eq!(ring.read(&mut dest), 7);
        assert_eq!(dest.to_vec(), data);
    }

    #[test]
    fn test_full_ring_rejects_writes() {
        let ring = RingBuffer::new(8).unwrap();
        assert_eq!(ring.write(&[1.0; 20]), 7);
        assert_eq!(ring.write(&[1.0]), 0);
        assert!(ring.fill_percentage() > 0.85);
    }

    #[test]
    fn test_flush() {
        let ring = RingBuffer::new(16).unwrap();
        ring.write(&[1.0; 8]);
        ring.flush();
        assert!(ring.is_empty());
        assert_eq!(ring.available_write(), 15);
    }

    #[test]
    fn test_invalid_sizes() {
        let err = RingBuffer::new(0).unwrap_err();
        assert!(err.to_string().contains("greater than 0"));
        assert!(RingBuffer::new(MAX_CAPACITY + 1).is_err());
    }
}
