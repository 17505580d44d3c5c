//! The playback thread

use super::control::ControlSignal;
use super::Shared;
use crate::effects::EffectKind;
use std::sync::Arc;

/// Decode, process and output blocks until stopped, finished or failed.
pub(super) fn run(shared: Arc<Shared>) {
    let frames = shared.config.buffer_frames;
    let sample_rate = shared.config.sample_rate;
    let mut buffer = vec![0.0f32; frames * 2];
    log::debug!("playback thread started ({frames} frames per block)");

    loop {
        let (signal, park, device_running, volume, effect) = {
            let control = shared.control.lock();
            (
                control.signal,
                control.should_park(),
                control.device_running,
                control.volume,
                control.effect,
            )
        };

        if signal == ControlSignal::Stop {
            break;
        }

        if park {
            if device_running && !shared.stop_device() {
                break;
            }
            let mut control = shared.control.lock();
            control.state.silence_channels();
            control.parked = true;
            shared.resume.notify_all();
            while control.should_park() {
                shared.resume.wait(&mut control);
            }
            control.parked = false;
            continue;
        }

        if !device_running {
            let started = shared.output.lock().start();
            if let Err(err) = started {
                log::error!("audio device {err}");
                shared.control.lock().mark_finished();
                break;
            }
            shared.control.lock().device_running = true;
        }

        let rendered = shared
            .decoder
            .lock()
            .read_interleaved_stereo(sample_rate, frames, &mut buffer)
            .min(frames);
        if rendered == 0 {
            log::info!("end of module reached");
            shared.control.lock().mark_finished();
            break;
        }

        let block = &mut buffer[..rendered * 2];
        if volume != 1.0 {
            let gain = volume as f32;
            block.iter_mut().for_each(|s| *s *= gain);
        }
        if effect != EffectKind::None {
            shared.effects.lock().process(effect, block, rendered);
        }
        shared.spectrum.lock().push(block);
        shared.waveform.lock().push(block);

        let written = shared.output.lock().write(block, rendered);
        if let Err(err) = written {
            log::error!("audio device {err}");
            shared.control.lock().mark_finished();
            break;
        }

        shared.refresh();
    }

    let mut control = shared.control.lock();
    control.signal = ControlSignal::Stop;
    control.state.paused = false;
    control.loop_active = false;
    control.parked = false;
    shared.resume.notify_all();
    log::debug!("playback thread exiting");
}
