//! MP3 export using the LAME encoder

use super::{float_to_i16, Encoder, ExportFormat, ExportOptions, EXPORT_CHUNK_FRAMES};
use crate::{PlayerError, Result};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use std::io::Write;

/// LAME-backed constant bitrate encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct Mp3Encoder;

/// Closest supported LAME bitrate at or below `kbps` (minimum 8)
fn bitrate_for(kbps: u32) -> Bitrate {
    match kbps {
        0..=15 => Bitrate::Kbps8,
        16..=23 => Bitrate::Kbps16,
        24..=31 => Bitrate::Kbps24,
        32..=39 => Bitrate::Kbps32,
        40..=47 => Bitrate::Kbps40,
        48..=63 => Bitrate::Kbps48,
        64..=79 => Bitrate::Kbps64,
        80..=95 => Bitrate::Kbps80,
        96..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn encode_error(what: &str, detail: impl std::fmt::Debug) -> PlayerError {
    PlayerError::Encode(format!("{what}: {detail:?}"))
}

impl Encoder for Mp3Encoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Mp3
    }

    fn encode(&self, samples: &[f32], options: &ExportOptions) -> Result<()> {
        let mut builder =
            Builder::new().ok_or_else(|| PlayerError::Encode("failed to create LAME encoder".into()))?;
        builder
            .set_num_channels(options.channels as u8)
            .map_err(|e| encode_error("failed to set channels", e))?;
        builder
            .set_sample_rate(options.sample_rate)
            .map_err(|e| encode_error("failed to set sample rate", e))?;
        builder
            .set_brate(bitrate_for(options.mp3_bitrate))
            .map_err(|e| encode_error("failed to set bitrate", e))?;
        builder
            .set_quality(Quality::Best)
            .map_err(|e| encode_error("failed to set quality", e))?;
        let mut encoder = builder
            .build()
            .map_err(|e| encode_error("failed to build LAME encoder", e))?;

        let pcm: Vec<i16> = samples.iter().map(|&s| float_to_i16(s)).collect();
        let channels = usize::from(options.channels.max(1));
        let mut encoded = Vec::new();

        for chunk in pcm.chunks(EXPORT_CHUNK_FRAMES * channels) {
            encoded.reserve(mp3lame_encoder::max_required_buffer_size(chunk.len() / channels));
            let result = if channels == 1 {
                encoder.encode_to_vec(MonoPcm(chunk), &mut encoded)
            } else {
                encoder.encode_to_vec(InterleavedPcm(chunk), &mut encoded)
            };
            result.map_err(|e| encode_error("LAME encoding error", e))?;
        }

        encoded.reserve(7200);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut encoded)
            .map_err(|e| encode_error("failed to flush LAME encoder", e))?;

        let mut file = std::fs::File::create(&options.output_path)
            .map_err(|e| PlayerError::Encode(format!("failed to create MP3 file: {e}")))?;
        file.write_all(&encoded)
            .map_err(|e| PlayerError::Encode(format!("failed to write MP3 data: {e}")))?;
        Ok(())
    }
}
