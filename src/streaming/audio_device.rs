//! Audio device integration using rodio
//!
//! rodio's `OutputStream` must stay on the thread that created it, so the
//! stream and its sink live on a dedicated host thread. [`StreamingOutput`]
//! talks to that thread over a channel and feeds it through the shared
//! [`RingBuffer`].

use super::{RingBuffer, StreamConfig, BUFFER_BACKOFF_MICROS, MAX_WRITE_RETRIES};
use crate::output::{AudioOutput, DeviceError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Samples pulled from the ring per lock acquisition
const SOURCE_CHUNK: usize = 4096;

/// rodio source draining the ring buffer
struct RingBufferSource {
    ring: Arc<RingBuffer>,
    sample_rate: u32,
    channels: u16,
    finished: Arc<AtomicBool>,
    /// Batch of samples read from the ring
    chunk: Vec<f32>,
    chunk_pos: usize,
}

impl RingBufferSource {
    fn new(ring: Arc<RingBuffer>, config: StreamConfig, finished: Arc<AtomicBool>) -> Self {
        RingBufferSource {
            ring,
            sample_rate: config.sample_rate,
            channels: config.channels,
            finished,
            chunk: vec![0.0; SOURCE_CHUNK],
            chunk_pos: SOURCE_CHUNK,
        }
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for RingBufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }
        if self.chunk_pos >= self.chunk.len() {
            let read = self.ring.read(&mut self.chunk);
            // underrun: play silence rather than ending the stream
            self.chunk[read..].fill(0.0);
            self.chunk_pos = 0;
        }
        let sample = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Some(sample)
    }
}

enum HostCommand {
    Play,
    Pause,
    Shutdown,
}

/// Owns the rodio stream and sink until shut down
fn run_host(
    ring: Arc<RingBuffer>,
    config: StreamConfig,
    finished: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), DeviceError>>,
    commands: mpsc::Receiver<HostCommand>,
) {
    let opened = OutputStream::try_default()
        .map_err(|e| DeviceError::new("open", format!("failed to create audio stream: {e}")))
        .and_then(|(stream, handle)| {
            Sink::try_new(&handle)
                .map(|sink| (stream, sink))
                .map_err(|e| DeviceError::new("open", format!("failed to create audio sink: {e}")))
        });
    let (_stream, sink) = match opened {
        Ok(parts) => parts,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    sink.pause();
    sink.append(RingBufferSource::new(ring, config, Arc::clone(&finished)));
    if ready.send(Ok(())).is_err() {
        return;
    }

    // a dropped sender ends the host the same way as Shutdown
    while let Ok(command) = commands.recv() {
        match command {
            HostCommand::Play => sink.play(),
            HostCommand::Pause => sink.pause(),
            HostCommand::Shutdown => break,
        }
    }
    finished.store(true, Ordering::Relaxed);
    sink.stop();
    log::debug!("audio host thread exiting");
}

/// [`AudioOutput`] backed by the default system device
pub struct StreamingOutput {
    ring: Arc<RingBuffer>,
    commands: mpsc::Sender<HostCommand>,
    host: Option<JoinHandle<()>>,
    config: StreamConfig,
    running: bool,
}

impl StreamingOutput {
    /// Open the default output device. Playback starts paused.
    ///
    /// # Errors
    ///
    /// Fails if the ring buffer size is invalid or no device can be opened.
    pub fn open(config: StreamConfig) -> Result<Self, DeviceError> {
        let ring = Arc::new(
            RingBuffer::new(config.ring_buffer_size)
                .map_err(|e| DeviceError::new("open", e.to_string()))?,
        );
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();

        let host_ring = Arc::clone(&ring);
        let host = std::thread::Builder::new()
            .name("audio-host".into())
            .spawn(move || run_host(host_ring, config, finished, ready_tx, command_rx))
            .map_err(|e| DeviceError::new("open", format!("cannot spawn audio thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = host.join();
                return Err(err);
            }
            Err(_) => {
                let _ = host.join();
                return Err(DeviceError::new("open", "audio thread exited during setup"));
            }
        }

        log::info!(
            "audio output open: {} Hz, {} ch, {:.0} ms buffer",
            config.sample_rate,
            config.channels,
            config.latency_ms()
        );
        Ok(StreamingOutput {
            ring,
            commands: command_tx,
            host: Some(host),
            config,
            running: false,
        })
    }

    /// Format the device was opened with
    pub fn config(&self) -> StreamConfig {
        self.config
    }

    /// Ring buffer fill level (0.0 to 1.0)
    pub fn fill_percentage(&self) -> f32 {
        self.ring.fill_percentage()
    }

    fn send(&self, operation: &'static str, command: HostCommand) -> Result<(), DeviceError> {
        self.commands
            .send(command)
            .map_err(|_| DeviceError::new(operation, "audio thread is gone"))
    }

    /// Push `samples` into the ring, waiting while it is full.
    ///
    /// Gives up after [`MAX_WRITE_RETRIES`] consecutive attempts without
    /// progress and returns the number of samples written so far.
    fn write_blocking(&self, samples: &[f32]) -> usize {
        let mut remaining = samples;
        let mut retries = 0;
        while !remaining.is_empty() && retries < MAX_WRITE_RETRIES {
            let written = self.ring.write(remaining);
            if written == 0 {
                std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
                retries += 1;
            } else {
                remaining = &remaining[written..];
                retries = 0;
            }
        }
        samples.len() - remaining.len()
    }
}

impl AudioOutput for StreamingOutput {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.send("start", HostCommand::Play)?;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.send("stop", HostCommand::Pause)?;
        self.ring.flush();
        self.running = false;
        Ok(())
    }

    fn write(&mut self, samples: &[f32], frames: usize) -> Result<(), DeviceError> {
        let wanted = (frames * usize::from(self.config.channels)).min(samples.len());
        let written = self.write_blocking(&samples[..wanted]);
        if written < wanted {
            return Err(DeviceError::new(
                "write",
                format!("device stalled after {written} of {wanted} samples"),
            ));
        }
        Ok(())
    }
}

impl Drop for StreamingOutput {
    fn drop(&mut self) {
        let _ = self.commands.send(HostCommand::Shutdown);
        if let Some(host) = self.host.take() {
            if host.join().is_err() {
                log::warn!("audio host thread panicked");
            }
        }
    }
}
