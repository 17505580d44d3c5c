//! WAV export using hound

use super::{float_to_i16, Encoder, ExportFormat, ExportOptions};
use crate::{PlayerError, Result};

/// 16-bit integer PCM writer
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl Encoder for WavEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Wav
    }

    fn encode(&self, samples: &[f32], options: &ExportOptions) -> Result<()> {
        let spec = hound::WavSpec {
            channels: options.channels,
            sample_rate: options.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&options.output_path, spec)
            .map_err(|e| PlayerError::Encode(format!("failed to create WAV file: {e}")))?;

        for &sample in samples {
            writer
                .write_sample(float_to_i16(sample))
                .map_err(|e| PlayerError::Encode(format!("failed to write WAV sample: {e}")))?;
        }

        writer
            .finalize()
            .map_err(|e| PlayerError::Encode(format!("failed to finalize WAV file: {e}")))?;
        Ok(())
    }
}
