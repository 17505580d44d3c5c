//! Scripted decoder and output used by the integration tests

#![allow(dead_code)]

use modtracker::{AudioOutput, DeviceError, EngineConfig, FormatError, ModuleDecoder, Player};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RATE: u32 = 48_000;

/// Song layout and playback cursor shared between a [`FakeDecoder`] and its
/// [`SongHandle`]
#[derive(Debug, Clone)]
pub struct Song {
    /// Pattern per order, negative for skip markers
    pub orders: Vec<i32>,
    /// Rows per pattern
    pub patterns: Vec<i32>,
    pub channels: i32,
    pub frames_per_row: usize,
    /// Sample value emitted on both channels
    pub level: f32,
    pub vu: f32,
    pub instrument_names: Vec<String>,
    /// Channels whose cells fail to format
    pub broken_channels: Vec<i32>,
    pub title: String,
    /// Frames played since the start of the song
    pub elapsed: usize,
    pub started: bool,
    pub seeks: Vec<f64>,
}

impl Song {
    pub fn new(orders: Vec<i32>, patterns: Vec<i32>) -> Self {
        Song {
            orders,
            patterns,
            channels: 4,
            frames_per_row: 480,
            level: 0.25,
            vu: 0.5,
            instrument_names: vec!["kick".into(), "snare".into(), "hat".into()],
            broken_channels: Vec::new(),
            title: "Fake Song".into(),
            elapsed: 0,
            started: false,
            seeks: Vec::new(),
        }
    }

    fn rows_in_order(&self, order: i32) -> i32 {
        let pattern = self.orders.get(order as usize).copied().unwrap_or(-1);
        if pattern < 0 {
            return 0;
        }
        self.patterns.get(pattern as usize).copied().unwrap_or(0).max(0)
    }

    pub fn total_rows(&self) -> usize {
        (0..self.orders.len() as i32)
            .map(|o| self.rows_in_order(o) as usize)
            .sum()
    }

    pub fn total_frames(&self) -> usize {
        self.total_rows() * self.frames_per_row
    }

    /// (order, row) for the current cursor; clamps to the last row
    fn locate(&self) -> (i32, i32) {
        let mut row_index = self.elapsed / self.frames_per_row;
        let mut last = (0, 0);
        for order in 0..self.orders.len() as i32 {
            let rows = self.rows_in_order(order) as usize;
            if rows == 0 {
                continue;
            }
            if row_index < rows {
                return (order, row_index as i32);
            }
            row_index -= rows;
            last = (order, rows as i32 - 1);
        }
        last
    }

    fn frames_before(&self, order: i32, row: i32) -> usize {
        let rows: usize = (0..order.max(0))
            .map(|o| self.rows_in_order(o) as usize)
            .sum();
        (rows + row.max(0) as usize) * self.frames_per_row
    }
}

/// Handle for inspecting and steering a decoder after it moved into a player
#[derive(Clone)]
pub struct SongHandle(pub Arc<Mutex<Song>>);

impl SongHandle {
    pub fn with<R>(&self, f: impl FnOnce(&mut Song) -> R) -> R {
        f(&mut self.0.lock())
    }

    pub fn position(&self) -> (i32, i32) {
        self.0.lock().locate()
    }

    pub fn elapsed(&self) -> usize {
        self.0.lock().elapsed
    }
}

pub struct FakeDecoder {
    song: Arc<Mutex<Song>>,
}

impl FakeDecoder {
    pub fn new(song: Song) -> (Self, SongHandle) {
        let song = Arc::new(Mutex::new(song));
        (
            FakeDecoder {
                song: Arc::clone(&song),
            },
            SongHandle(song),
        )
    }
}

impl ModuleDecoder for FakeDecoder {
    fn current_order(&self) -> i32 {
        let song = self.song.lock();
        if song.started {
            song.locate().0
        } else {
            -1
        }
    }

    fn current_pattern(&self) -> i32 {
        let song = self.song.lock();
        if !song.started {
            return -1;
        }
        let (order, _) = song.locate();
        song.orders.get(order as usize).copied().unwrap_or(-1)
    }

    fn current_row(&self) -> i32 {
        let song = self.song.lock();
        if song.started {
            song.locate().1
        } else {
            -1
        }
    }

    fn current_speed(&self) -> i32 {
        6
    }

    fn position_seconds(&self) -> f64 {
        self.song.lock().elapsed as f64 / f64::from(RATE)
    }

    fn num_channels(&self) -> i32 {
        self.song.lock().channels
    }

    fn num_orders(&self) -> i32 {
        self.song.lock().orders.len() as i32
    }

    fn num_patterns(&self) -> i32 {
        self.song.lock().patterns.len() as i32
    }

    fn num_instruments(&self) -> i32 {
        self.song.lock().instrument_names.len() as i32
    }

    fn order_pattern(&self, order: i32) -> i32 {
        let song = self.song.lock();
        if order < 0 {
            return -1;
        }
        song.orders.get(order as usize).copied().unwrap_or(-1)
    }

    fn pattern_num_rows(&self, pattern: i32) -> i32 {
        let song = self.song.lock();
        if pattern < 0 {
            return 0;
        }
        song.patterns.get(pattern as usize).copied().unwrap_or(0)
    }

    fn duration_seconds(&self) -> f64 {
        self.song.lock().total_frames() as f64 / f64::from(RATE)
    }

    fn set_position_order_row(&mut self, order: i32, row: i32) {
        let mut song = self.song.lock();
        song.elapsed = song.frames_before(order, row);
        song.started = true;
    }

    fn set_position_seconds(&mut self, seconds: f64) {
        let mut song = self.song.lock();
        song.seeks.push(seconds);
        song.elapsed = ((seconds * f64::from(RATE)) as usize).min(song.total_frames());
    }

    fn read_interleaved_stereo(&mut self, _sample_rate: u32, frames: usize, out: &mut [f32]) -> usize {
        let mut song = self.song.lock();
        let remaining = song.total_frames().saturating_sub(song.elapsed);
        let count = frames.min(remaining).min(out.len() / 2);
        out[..count * 2].fill(song.level);
        song.elapsed += count;
        song.started = true;
        count
    }

    fn format_pattern_row_channel(
        &self,
        pattern: i32,
        row: i32,
        channel: i32,
    ) -> Result<String, FormatError> {
        let song = self.song.lock();
        if song.broken_channels.contains(&channel) || pattern < 0 || row < 0 {
            return Err(FormatError {
                pattern,
                row,
                channel,
                reason: "unformattable".into(),
            });
        }
        let count = song.instrument_names.len().max(1) as i32;
        Ok(format!("C-4 {:02} .. ...", channel % count + 1))
    }

    fn channel_vu_left(&self, _channel: i32) -> f32 {
        self.song.lock().vu
    }

    fn channel_vu_right(&self, _channel: i32) -> f32 {
        self.song.lock().vu
    }

    fn metadata(&self, key: &str) -> Option<String> {
        let song = self.song.lock();
        match key {
            "title" => Some(song.title.clone()),
            "type" => Some("xm".into()),
            _ => None,
        }
    }

    fn instrument_names(&self) -> Vec<String> {
        self.song.lock().instrument_names.clone()
    }
}

/// Calls seen by a [`FakeOutput`]
#[derive(Debug, Default)]
pub struct OutputLog {
    pub starts: usize,
    pub stops: usize,
    pub writes: usize,
    pub frames: usize,
    pub fail_start: bool,
    /// Fail every write once this many writes succeeded
    pub fail_write_after: Option<usize>,
    /// Sleep per write
    pub write_delay: Duration,
}

#[derive(Clone)]
pub struct OutputHandle(pub Arc<Mutex<OutputLog>>);

impl OutputHandle {
    pub fn with<R>(&self, f: impl FnOnce(&mut OutputLog) -> R) -> R {
        f(&mut self.0.lock())
    }
}

pub struct FakeOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl FakeOutput {
    pub fn new(log: OutputLog) -> (Self, OutputHandle) {
        let log = Arc::new(Mutex::new(log));
        (
            FakeOutput {
                log: Arc::clone(&log),
            },
            OutputHandle(log),
        )
    }
}

impl AudioOutput for FakeOutput {
    fn start(&mut self) -> Result<(), DeviceError> {
        let mut log = self.log.lock();
        if log.fail_start {
            return Err(DeviceError::new("start", "no device"));
        }
        log.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.log.lock().stops += 1;
        Ok(())
    }

    fn write(&mut self, _samples: &[f32], frames: usize) -> Result<(), DeviceError> {
        let delay = {
            let mut log = self.log.lock();
            if log.fail_write_after.is_some_and(|limit| log.writes >= limit) {
                return Err(DeviceError::new("write", "device unplugged"));
            }
            log.writes += 1;
            log.frames += frames;
            log.write_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

/// 64-row pattern, skip marker, empty pattern, 32-row pattern, 64-row pattern
pub fn mixed_song() -> Song {
    Song::new(vec![0, -1, 1, 2, 0], vec![64, 0, 32])
}

/// Player over `song` with an output that plays at roughly 10x real time
pub fn player_with(song: Song, log: OutputLog) -> (Player, SongHandle, OutputHandle) {
    let (decoder, song) = FakeDecoder::new(song);
    let (output, out) = FakeOutput::new(log);
    let config = EngineConfig {
        buffer_frames: 480,
        ..EngineConfig::default()
    };
    let player = Player::new(Box::new(decoder), Box::new(output), config, "fake.xm")
        .expect("valid config");
    (player, song, out)
}

/// A long song whose output sleeps on every write, so the playback thread
/// stays busy for the duration of a test
pub fn slow_player() -> (Player, SongHandle, OutputHandle) {
    let song = Song::new(vec![0; 100], vec![64]);
    let log = OutputLog {
        write_delay: Duration::from_millis(1),
        ..OutputLog::default()
    };
    player_with(song, log)
}

/// Poll `condition` for up to two seconds
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
