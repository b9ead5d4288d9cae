// src/export.rs

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::error::StudioError;

/// Writes mono f32 samples as a 16-bit PCM WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), StudioError> {
    let display = path.display().to_string();
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| StudioError::io(&display, e))?;
    for &s in samples {
        let samp = if s.is_finite() {
            (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        } else {
            0i16
        };
        writer
            .write_sample(samp)
            .map_err(|e| StudioError::io(&display, e))?;
    }
    writer.finalize().map_err(|e| StudioError::io(&display, e))?;

    log::info!("wrote {} samples at {sample_rate} Hz to {display}", samples.len());
    Ok(())
}
