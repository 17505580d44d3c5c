//! Real-time DSP effects
//!
//! Six stateful stereo effects operating in place on interleaved `f32`
//! buffers. Exactly one is active at a time; each owns its own delay lines
//! and oscillators, which survive switching to another effect and back.

mod bass_boost;
mod chorus;
mod delay_line;
mod echo;
mod flanger;
mod phaser;
mod reverb;

pub use bass_boost::BassBoost;
pub use chorus::Chorus;
pub use delay_line::{DelayLine, Lfo};
pub use echo::Echo;
pub use flanger::Flanger;
pub use phaser::Phaser;
pub use reverb::Reverb;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selectable effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Pass-through
    #[default]
    None,
    /// Low-shelf style boost built from a one-pole low-pass
    BassBoost,
    /// Single 250 ms feedback echo
    Echo,
    /// Four-tap comb reverb
    Reverb,
    /// Short modulated feedback delay
    Flanger,
    /// Four-stage modulated all-pass
    Phaser,
    /// Two-voice modulated delay
    Chorus,
}

impl EffectKind {
    /// Every kind in menu order
    pub const ALL: [EffectKind; 7] = [
        EffectKind::None,
        EffectKind::BassBoost,
        EffectKind::Echo,
        EffectKind::Reverb,
        EffectKind::Flanger,
        EffectKind::Phaser,
        EffectKind::Chorus,
    ];

    /// Display name used by the effect menu
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::None => "None",
            EffectKind::BassBoost => "Bass Boost",
            EffectKind::Echo => "Echo",
            EffectKind::Reverb => "Reverb",
            EffectKind::Flanger => "Flanger",
            EffectKind::Phaser => "Phaser",
            EffectKind::Chorus => "Chorus",
        }
    }

    /// The kind after this one, wrapping to `None`
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stateful in-place stereo processor
pub trait Effect: Send {
    /// Process `frames` interleaved stereo frames of `buffer`
    fn process(&mut self, buffer: &mut [f32], frames: usize);

    /// Forget all history (delay lines, filter state, LFO phase)
    fn reset(&mut self);
}

/// Number of whole stereo frames that fit in both `buffer` and `frames`
#[inline]
pub(crate) fn frame_count(buffer: &[f32], frames: usize) -> usize {
    frames.min(buffer.len() / 2)
}

#[inline]
pub(crate) fn clamp_unit(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

/// All six effects plus the selection between them
pub struct EffectBank {
    bass_boost: BassBoost,
    echo: Echo,
    reverb: Reverb,
    flanger: Flanger,
    phaser: Phaser,
    chorus: Chorus,
}

impl EffectBank {
    /// Allocate every effect's state for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        EffectBank {
            bass_boost: BassBoost::new(),
            echo: Echo::new(sample_rate),
            reverb: Reverb::new(sample_rate),
            flanger: Flanger::new(sample_rate),
            phaser: Phaser::new(sample_rate),
            chorus: Chorus::new(sample_rate),
        }
    }

    /// Run `kind` over `frames` frames of `buffer`. `None` leaves it untouched.
    pub fn process(&mut self, kind: EffectKind, buffer: &mut [f32], frames: usize) {
        if let Some(effect) = self.effect_mut(kind) {
            effect.process(buffer, frames);
        }
    }

    /// Clear the state of every effect
    pub fn reset(&mut self) {
        for kind in EffectKind::ALL {
            if let Some(effect) = self.effect_mut(kind) {
                effect.reset();
            }
        }
    }

    fn effect_mut(&mut self, kind: EffectKind) -> Option<&mut dyn Effect> {
        match kind {
            EffectKind::None => None,
            EffectKind::BassBoost => Some(&mut self.bass_boost),
            EffectKind::Echo => Some(&mut self.echo),
            EffectKind::Reverb => Some(&mut self.reverb),
            EffectKind::Flanger => Some(&mut self.flanger),
            EffectKind::Phaser => Some(&mut self.phaser),
            EffectKind::Chorus => Some(&mut self.chorus),
        }
    }
}

impl fmt::Debug for EffectBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBank").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    fn impulse(frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames * 2];
        buffer[0] = 1.0;
        buffer[1] = -1.0;
        buffer
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut bank = EffectBank::new(RATE);
        for kind in EffectKind::ALL {
            let mut buffer = vec![0.0f32; 4096];
            for _ in 0..8 {
                bank.process(kind, &mut buffer, 2048);
            }
            assert!(buffer.iter().all(|s| *s == 0.0), "{kind} produced energy");
        }
    }

    #[test]
    fn test_none_is_pass_through() {
        let mut bank = EffectBank::new(RATE);
        let mut buffer: Vec<f32> = (0..512).map(|i| (i as f32 / 512.0) - 0.5).collect();
        let original = buffer.clone();
        bank.process(EffectKind::None, &mut buffer, 256);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_outputs_stay_in_range() {
        let mut bank = EffectBank::new(RATE);
        for kind in EffectKind::ALL {
            let mut buffer: Vec<f32> = (0..9600)
                .map(|i| if (i / 40) % 2 == 0 { 1.0 } else { -1.0 })
                .collect();
            for _ in 0..20 {
                bank.process(kind, &mut buffer, 4800);
                assert!(
                    buffer.iter().all(|s| (-1.0..=1.0).contains(s)),
                    "{kind} left [-1, 1]"
                );
            }
        }
    }

    #[test]
    fn test_short_buffer_is_bounded_by_length() {
        let mut bank = EffectBank::new(RATE);
        let mut buffer = vec![0.5f32; 6];
        // more frames requested than the buffer holds
        bank.process(EffectKind::Reverb, &mut buffer, 100);
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_echo_state_persists_across_blocks() {
        let mut bank = EffectBank::new(RATE);
        let mut first = impulse(6000);
        bank.process(EffectKind::Echo, &mut first, 6000);
        // the 250 ms repeat lands at frame 12000, in the next block
        let mut second = vec![0.0f32; 12_002];
        bank.process(EffectKind::Echo, &mut second, 6001);
        let left = second[(12_000 - 6000) * 2];
        approx::assert_relative_eq!(left, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_switching_preserves_state_and_reset_clears_it() {
        let mut bank = EffectBank::new(RATE);
        let mut buffer = impulse(100);
        bank.process(EffectKind::Echo, &mut buffer, 100);

        let mut other = vec![0.0f32; 200];
        bank.process(EffectKind::Chorus, &mut other, 100);

        let mut tail = vec![0.0f32; 24_000];
        bank.process(EffectKind::Echo, &mut tail, 12_000);
        assert!(tail.iter().any(|s| *s != 0.0));

        bank.reset();
        let mut quiet = vec![0.0f32; 24_000];
        bank.process(EffectKind::Echo, &mut quiet, 12_000);
        assert!(quiet.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_kind_cycle_and_names() {
        assert_eq!(EffectKind::None.next(), EffectKind::BassBoost);
        assert_eq!(EffectKind::Chorus.next(), EffectKind::None);
        assert_eq!(EffectKind::BassBoost.to_string(), "Bass Boost");
        let json = serde_json::to_string(&EffectKind::Phaser).unwrap();
        assert_eq!(serde_json::from_str::<EffectKind>(&json).unwrap(), EffectKind::Phaser);
    }
}
