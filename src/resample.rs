// src/resample.rs

use anyhow::Result;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    calculate_cutoff,
};

fn build_resampler(src_rate: u32, dst_rate: u32) -> Result<SincFixedIn<f32>> {
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let chunk_size = 1024;
    let r = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)?;
    Ok(r)
}

/// One-shot mono sinc resample of a whole buffer. Output length is exactly
/// `round(len * dst/src)`; equal rates hand the input straight back.
pub fn resample_buffer(samples: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>> {
    if src_rate == dst_rate {
        return Ok(samples.to_vec());
    }

    let ratio = dst_rate as f64 / src_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut resampler = build_resampler(src_rate, dst_rate)?;
    let mut out = Vec::with_capacity(expected + 2048);

    let mut pos = 0usize;
    while pos < samples.len() {
        let need = resampler.input_frames_next();
        let remaining = samples.len() - pos;
        if remaining >= need {
            let block = vec![samples[pos..pos + need].to_vec()];
            let res = resampler.process(&block, None)?;
            out.extend_from_slice(&res[0]);
            pos += need;
        } else {
            let block = vec![samples[pos..].to_vec()];
            let res = resampler.process_partial(Some(block.as_slice()), None)?;
            out.extend_from_slice(&res[0]);
            pos = samples.len();
        }
    }

    // Flush the filter tail, then pin the length.
    let res = resampler.process_partial::<Vec<f32>>(None, None)?;
    out.extend_from_slice(&res[0]);
    out.resize(expected, 0.0);

    log::debug!(
        "resampled {} samples {src_rate} Hz -> {} samples {dst_rate} Hz",
        samples.len(),
        out.len()
    );
    Ok(out)
}
