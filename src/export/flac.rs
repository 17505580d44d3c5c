//! FLAC export using libFLAC

use super::{float_to_i16, Encoder, ExportFormat, ExportOptions, EXPORT_CHUNK_FRAMES};
use crate::{PlayerError, Result};
use flac_bound::{FlacEncoder as LibFlac, WriteWrapper};

/// Highest libFLAC compression preset
const MAX_COMPRESSION: u32 = 8;

/// 16-bit lossless encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct FlacEncoder;

impl Encoder for FlacEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Flac
    }

    fn encode(&self, samples: &[f32], options: &ExportOptions) -> Result<()> {
        let channels = usize::from(options.channels.max(1));
        let mut file = std::fs::File::create(&options.output_path)
            .map_err(|e| PlayerError::Encode(format!("failed to create FLAC file: {e}")))?;

        let config = LibFlac::new()
            .ok_or_else(|| PlayerError::Encode("failed to create FLAC encoder".into()))?
            .channels(channels as u32)
            .sample_rate(options.sample_rate)
            .bits_per_sample(16)
            .compression_level(options.flac_compression_level.min(MAX_COMPRESSION));

        let mut wrapper = WriteWrapper(&mut file);
        let mut encoder = config
            .init_write(&mut wrapper)
            .map_err(|e| PlayerError::Encode(format!("failed to initialize FLAC encoder: {e:?}")))?;

        let pcm: Vec<i32> = samples.iter().map(|&s| i32::from(float_to_i16(s))).collect();
        for block in pcm.chunks(EXPORT_CHUNK_FRAMES * channels) {
            let frames = (block.len() / channels) as u32;
            encoder
                .process_interleaved(block, frames)
                .map_err(|_| PlayerError::Encode("FLAC encoding error".into()))?;
        }

        encoder
            .finish()
            .map_err(|_| PlayerError::Encode("failed to finish FLAC stream".into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_writes_flac_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.flac");
        let options = ExportOptions::new(ExportFormat::Flac, &path).with_channels(1);
        let samples: Vec<f32> = (0..10_000).map(|i| (i as f32 * 0.01).sin() * 0.25).collect();
        FlacEncoder.encode(&samples, &options).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"fLaC");
    }
}
