//! Offline render of the whole module

use super::control::ControlSignal;
use super::{Player, Shared};
use crate::effects::EffectBank;
use crate::export::{downmix_to_mono, encoder_for, Encoder, ExportOptions, EXPORT_CHUNK_FRAMES};
use crate::{PlayerError, Result};

impl Shared {
    /// Take the decoder away from the playback thread.
    ///
    /// Pauses a running session, then waits until the loop is parked or
    /// gone. Returns whether playback was running unpaused.
    fn begin_export(&self) -> bool {
        let mut control = self.control.lock();
        control.exporting = true;
        let was_playing = control.loop_active && control.signal == ControlSignal::Run;
        if was_playing {
            control.set_paused(true);
        }
        self.resume.notify_all();
        while control.loop_active && !control.parked {
            self.resume.wait(&mut control);
        }
        was_playing
    }

    fn end_export(&self, was_playing: bool) {
        let mut control = self.control.lock();
        control.exporting = false;
        if was_playing && control.signal == ControlSignal::Pause {
            control.set_paused(false);
        }
        self.resume.notify_all();
    }

    /// Render from the start of the song with the current volume and effect.
    ///
    /// The decoder stays locked for the whole render and the effect runs on
    /// a fresh bank built for the export rate, so live playback keeps its
    /// own effect history.
    fn render(&self, options: &mut ExportOptions) -> Result<Vec<f32>> {
        let channels = usize::from(options.channels);
        let (volume, effect) = {
            let control = self.control.lock();
            (control.volume as f32, control.effect)
        };
        let mut effects = EffectBank::new(options.sample_rate);
        let mut decoder = self.decoder.lock();
        decoder.set_position_seconds(0.0);
        let duration = decoder.duration_seconds().max(0.0);
        let total = (duration * f64::from(options.sample_rate) * channels as f64) as usize;
        log::info!(
            "rendering {duration:.1}s at {} Hz, {channels} ch",
            options.sample_rate
        );

        let mut rendered = Vec::with_capacity(total);
        let mut chunk = vec![0.0f32; EXPORT_CHUNK_FRAMES * 2];
        while rendered.len() < total {
            let wanted = EXPORT_CHUNK_FRAMES.min((total - rendered.len()) / channels);
            if wanted == 0 {
                break;
            }
            let frames = decoder
                .read_interleaved_stereo(options.sample_rate, wanted, &mut chunk)
                .min(wanted);
            if frames == 0 {
                break;
            }

            let block = &mut chunk[..frames * 2];
            if volume != 1.0 {
                block.iter_mut().for_each(|s| *s *= volume);
            }
            effects.process(effect, block, frames);
            if channels == 1 {
                rendered.extend(downmix_to_mono(block));
            } else {
                rendered.extend_from_slice(block);
            }

            if !options.report(rendered.len(), total) {
                log::info!("export cancelled at {}/{total} samples", rendered.len());
                return Err(PlayerError::Cancelled);
            }
        }

        if rendered.is_empty() {
            return Err(PlayerError::Encode("no audio data to export".into()));
        }
        Ok(rendered)
    }
}

impl Player {
    /// Render the whole module and write it with the encoder for
    /// `options.format`. Blocks until done.
    ///
    /// Playback is paused for the duration and the previous position and
    /// pause state are restored afterwards, whether or not the export
    /// succeeded. Output left behind by a failed or cancelled export is
    /// removed. Seeks requested while the export renders are ignored.
    ///
    /// The active effect is applied from a clean state at
    /// `options.sample_rate`; the live effect history is not touched.
    ///
    /// # Errors
    ///
    /// - [`PlayerError::FormatUnavailable`] when no encoder for the format is
    ///   compiled in (checked before playback is touched)
    /// - [`PlayerError::Config`] for invalid options
    /// - [`PlayerError::Cancelled`] when the progress callback returns `false`
    /// - [`PlayerError::Encode`] when nothing was rendered or the encoder failed
    pub fn export_to_file(&self, mut options: ExportOptions) -> Result<()> {
        let encoder =
            encoder_for(options.format).ok_or(PlayerError::FormatUnavailable(options.format))?;
        options.validate()?;
        let existed = options.output_path.exists();

        let shared = &self.shared;
        let was_playing = shared.begin_export();
        let saved_position = shared.decoder.lock().position_seconds();

        let outcome = shared
            .render(&mut options)
            .and_then(|samples| encode(encoder.as_ref(), &samples, &options));

        shared.decoder.lock().set_position_seconds(saved_position);
        shared.end_export(was_playing);
        shared.refresh();

        match &outcome {
            Ok(()) => log::info!("exported {}", options.output_path.display()),
            Err(err) => {
                log::warn!("export to {} failed: {err}", options.output_path.display());
                if !existed {
                    if let Err(e) = std::fs::remove_file(&options.output_path) {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            log::warn!("cannot remove partial export: {e}");
                        }
                    }
                }
            }
        }
        outcome
    }
}

fn encode(encoder: &dyn Encoder, samples: &[f32], options: &ExportOptions) -> Result<()> {
    log::info!(
        "encoding {} samples as {}",
        samples.len(),
        encoder.format()
    );
    encoder.encode(samples, options)
}
