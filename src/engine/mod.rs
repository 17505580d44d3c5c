//! Playback engine
//!
//! [`Player`] owns a module decoder and an audio output, runs the playback
//! loop on a background thread and exposes control calls plus a copied
//! [`TransportState`] snapshot to the presentation layer.
//!
//! # Locks
//!
//! - control: signal, device/finished flags, volume, effect, transport state
//!   (with a condition variable for the pause wait)
//! - decoder, output, effect bank, spectrum and scope each have their own
//!
//! No code path holds the control lock while taking another lock.

mod control;
mod export;
mod playback;
mod refresh;

pub use control::PlaybackState;

use crate::analysis::{SpectrumAnalyzer, WaveformSampler};
use crate::config::{EngineConfig, Settings};
use crate::decoder::{ModuleDecoder, ModuleInfo};
use crate::effects::{EffectBank, EffectKind};
use crate::navigator::{clamp_order, walk_rows, RowPosition};
use crate::output::AudioOutput;
use crate::state::TransportState;
use crate::{PlayerError, Result};
use control::{Control, ControlSignal};
use parking_lot::{Condvar, Mutex};
use refresh::Observation;
use std::sync::Arc;
use std::thread::JoinHandle;

/// State shared with the playback thread
pub(crate) struct Shared {
    control: Mutex<Control>,
    /// Pause wait and export hand-off
    resume: Condvar,
    decoder: Mutex<Box<dyn ModuleDecoder>>,
    output: Mutex<Box<dyn AudioOutput>>,
    effects: Mutex<EffectBank>,
    spectrum: Mutex<SpectrumAnalyzer>,
    waveform: Mutex<WaveformSampler>,
    info: ModuleInfo,
    config: EngineConfig,
}

impl Shared {
    /// Pull fresh positions, channels and preview rows from the decoder
    fn refresh(&self) {
        let observation = {
            let decoder = self.decoder.lock();
            Observation::gather(&**decoder, self.config.preview_rows)
        };
        self.control
            .lock()
            .publish(observation, &self.info.instrument_names);
    }

    /// Stop the output. On failure the session is marked finished.
    fn stop_device(&self) -> bool {
        let stopped = self.output.lock().stop();
        match stopped {
            Ok(()) => {
                self.control.lock().device_running = false;
                true
            }
            Err(err) => {
                log::error!("audio device {err}");
                let mut control = self.control.lock();
                control.device_running = false;
                control.mark_finished();
                false
            }
        }
    }
}

/// Real-time module player.
///
/// All methods take `&self`; the handle can be shared with an input thread
/// behind an `Arc`.
pub struct Player {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Wrap a loaded decoder and an output device.
    ///
    /// `source` names the module (usually its file name) and is used as the
    /// title when the module has none. Nothing plays until [`Player::start`].
    ///
    /// # Errors
    ///
    /// [`PlayerError::Config`] if `config` does not validate.
    pub fn new(
        decoder: Box<dyn ModuleDecoder>,
        output: Box<dyn AudioOutput>,
        config: EngineConfig,
        source: &str,
    ) -> Result<Self> {
        config.validate()?;
        let info = ModuleInfo::collect(decoder.as_ref(), source);
        let channels = usize::try_from(info.num_channels).unwrap_or(0);
        log::info!("loaded {info}");

        let shared = Shared {
            control: Mutex::new(Control::new(channels)),
            resume: Condvar::new(),
            decoder: Mutex::new(decoder),
            output: Mutex::new(output),
            effects: Mutex::new(EffectBank::new(config.sample_rate)),
            spectrum: Mutex::new(SpectrumAnalyzer::new(
                config.sample_rate,
                config.spectrum_bands,
            )),
            waveform: Mutex::new(WaveformSampler::new(config.waveform_size)),
            info,
            config,
        };
        Ok(Player {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
        })
    }

    /// Start the output device and the playback thread.
    ///
    /// Does nothing while the playback thread is alive. After the module
    /// finished (or [`Player::stop`]) it starts again from the current
    /// decoder position.
    ///
    /// # Errors
    ///
    /// [`PlayerError::AudioDevice`] if the device cannot be started.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        let loop_active = self.shared.control.lock().loop_active;
        if loop_active {
            return Ok(());
        }
        // the previous loop has left; its thread may still be returning
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                log::error!("previous playback thread panicked");
            }
        }

        self.shared.output.lock().start()?;
        {
            let mut control = self.shared.control.lock();
            control.signal = ControlSignal::Run;
            control.device_running = true;
            control.finished = false;
            control.loop_active = true;
            control.parked = false;
            control.state.paused = false;
            control.state.finished = false;
        }

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("playback".into())
            .spawn(move || playback::run(shared));
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.control.lock().loop_active = false;
                self.shared.stop_device();
                Err(PlayerError::Other(format!(
                    "cannot spawn playback thread: {err}"
                )))
            }
        }
    }

    /// Stop playback, join the thread and stop the device. Idempotent.
    pub fn stop(&self) {
        let handle = self.worker.lock().take();
        {
            let mut control = self.shared.control.lock();
            control.signal = ControlSignal::Stop;
            control.state.paused = false;
            self.shared.resume.notify_all();
        }
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("playback thread panicked");
            }
        }
        let device_running = self.shared.control.lock().device_running;
        if device_running {
            self.shared.stop_device();
        }
    }

    /// Flip between running and paused. Ignored while stopped.
    pub fn toggle_pause(&self) {
        let mut control = self.shared.control.lock();
        if !control.loop_active {
            return;
        }
        match control.signal {
            ControlSignal::Run => control.set_paused(true),
            ControlSignal::Pause => control.set_paused(false),
            ControlSignal::Stop => return,
        }
        log::debug!("paused: {}", control.state.paused);
        self.shared.resume.notify_all();
    }

    /// Pause or resume explicitly. Ignored while stopped.
    pub fn set_paused(&self, paused: bool) {
        let mut control = self.shared.control.lock();
        if !control.loop_active || control.signal == ControlSignal::Stop {
            return;
        }
        control.set_paused(paused);
        self.shared.resume.notify_all();
    }

    /// Whether the playback thread is alive
    pub fn is_running(&self) -> bool {
        self.shared.control.lock().loop_active
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.shared.control.lock().signal == ControlSignal::Pause
    }

    /// Current lifecycle state
    pub fn playback_state(&self) -> PlaybackState {
        self.shared.control.lock().playback_state()
    }

    /// Set the master volume, clamped to [0, 1]. NaN is ignored.
    pub fn set_volume(&self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.shared.control.lock().volume = volume.clamp(0.0, 1.0);
    }

    /// Master volume
    pub fn volume(&self) -> f64 {
        self.shared.control.lock().volume
    }

    /// Select the active effect. The others keep their state.
    pub fn set_effect(&self, effect: EffectKind) {
        self.shared.control.lock().effect = effect;
        log::debug!("effect: {effect}");
    }

    /// Active effect
    pub fn effect(&self) -> EffectKind {
        self.shared.control.lock().effect
    }

    /// Clear the history of every effect
    pub fn reset_effects(&self) {
        self.shared.effects.lock().reset();
    }

    /// Apply persisted settings (volume)
    pub fn apply_settings(&self, settings: &Settings) {
        self.set_volume(settings.volume);
    }

    /// Metadata read when the player was created
    pub fn info(&self) -> &ModuleInfo {
        &self.shared.info
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Copy of the current transport state, including spectrum and scope
    pub fn snapshot(&self) -> TransportState {
        let mut snapshot = self.shared.control.lock().state.clone();
        snapshot.spectrum_bands = self.shared.spectrum.lock().bands().to_vec();
        let waveform = self.shared.waveform.lock();
        snapshot.waveform_left = waveform.left().to_vec();
        snapshot.waveform_right = waveform.right().to_vec();
        snapshot
    }

    /// Re-read positions and channel data from the decoder now
    pub fn refresh(&self) {
        self.shared.refresh();
    }

    /// Move `delta` orders from the current one and seek to its first row.
    ///
    /// Clamps to the order list; does nothing for a module without orders
    /// or while an export is rendering.
    pub fn jump_to_order(&self, delta: i32) {
        if self.exporting() {
            return;
        }
        {
            let mut decoder = self.shared.decoder.lock();
            let Some(target) = clamp_order(decoder.current_order(), delta, decoder.num_orders())
            else {
                return;
            };
            decoder.set_position_order_row(target, 0);
            log::debug!("jump to order {target}");
        }
        self.after_seek();
    }

    /// Move `delta` rows forward or backward across pattern boundaries.
    ///
    /// Orders without a playable pattern are skipped; the walk clamps at
    /// the first and last row of the song. Ignored while an export is
    /// rendering.
    pub fn jump_rows(&self, delta: i32) {
        if delta == 0 || self.exporting() {
            return;
        }
        {
            let mut decoder = self.shared.decoder.lock();
            let from = RowPosition::new(decoder.current_order(), decoder.current_row());
            let Some(target) = walk_rows(&**decoder, from, delta) else {
                return;
            };
            decoder.set_position_order_row(target.order, target.row);
            log::debug!("jump to order {} row {}", target.order, target.row);
        }
        self.after_seek();
    }

    fn exporting(&self) -> bool {
        let exporting = self.shared.control.lock().exporting;
        if exporting {
            log::debug!("seek ignored during export");
        }
        exporting
    }

    fn after_seek(&self) {
        {
            let mut control = self.shared.control.lock();
            control.finished = false;
            control.state.finished = false;
        }
        self.shared.refresh();
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("info", &self.shared.info.title)
            .field("state", &self.playback_state())
            .finish()
    }
}
