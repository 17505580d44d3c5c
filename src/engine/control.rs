//! Control block shared between the engine handle and the playback thread

use crate::effects::EffectKind;
use crate::state::TransportState;

/// What the playback loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlSignal {
    /// Decode and play
    Run,
    /// Stop the device and wait
    Pause,
    /// Leave the loop
    Stop,
}

/// Coarse lifecycle of a [`crate::Player`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No playback thread
    Stopped,
    /// Playback thread decoding
    Running,
    /// Playback thread waiting for resume
    Paused,
    /// Module ended or the output failed
    Finished,
}

/// Everything guarded by the control lock.
///
/// The transport state lives here so positional fields, channels and
/// preview rows always change together.
#[derive(Debug)]
pub(crate) struct Control {
    pub signal: ControlSignal,
    pub device_running: bool,
    pub finished: bool,
    pub volume: f64,
    pub effect: EffectKind,
    pub state: TransportState,
    /// Sticky instrument index per channel, -1 when none seen yet
    pub channel_instruments: Vec<i32>,
    /// Playback thread exists and has not exited
    pub loop_active: bool,
    /// Playback thread is blocked in its pause wait
    pub parked: bool,
    /// An export owns the decoder
    pub exporting: bool,
}

impl Control {
    pub fn new(channels: usize) -> Self {
        Control {
            signal: ControlSignal::Stop,
            device_running: false,
            finished: false,
            volume: 1.0,
            effect: EffectKind::None,
            // bands and scope traces are merged in from their own locks
            state: TransportState::new(channels, 0, 0),
            channel_instruments: vec![-1; channels],
            loop_active: false,
            parked: false,
            exporting: false,
        }
    }

    /// The loop must not decode right now
    pub fn should_park(&self) -> bool {
        self.signal == ControlSignal::Pause
            || (self.exporting && self.signal != ControlSignal::Stop)
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
        self.state.finished = true;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.signal = if paused {
            ControlSignal::Pause
        } else {
            ControlSignal::Run
        };
        self.state.paused = paused;
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.finished {
            PlaybackState::Finished
        } else if !self.loop_active {
            PlaybackState::Stopped
        } else if self.signal == ControlSignal::Pause {
            PlaybackState::Paused
        } else {
            PlaybackState::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_control_is_stopped() {
        let control = Control::new(4);
        assert_eq!(control.signal, ControlSignal::Stop);
        assert_eq!(control.playback_state(), PlaybackState::Stopped);
        assert_eq!(control.channel_instruments, vec![-1; 4]);
        assert!(control.state.spectrum_bands.is_empty());
    }

    #[test]
    fn test_park_conditions() {
        let mut control = Control::new(1);
        control.signal = ControlSignal::Run;
        assert!(!control.should_park());
        control.exporting = true;
        assert!(control.should_park());
        control.signal = ControlSignal::Stop;
        assert!(!control.should_park());
    }

    #[test]
    fn test_pause_reflected_in_state() {
        let mut control = Control::new(1);
        control.loop_active = true;
        control.set_paused(true);
        assert!(control.state.paused);
        assert_eq!(control.playback_state(), PlaybackState::Paused);
        control.mark_finished();
        assert_eq!(control.playback_state(), PlaybackState::Finished);
    }
}
