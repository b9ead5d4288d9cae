// src/stretch/engine.rs
use crate::error::StudioError;
use crate::stretch::utils::{hann_window, normalized_correlation};

/// Tuning for the overlap-add stretcher. Larger frames favor low-frequency
/// fidelity, smaller frames favor transients. Frames land on the output every
/// `frame_len / 4` samples regardless of rate.
#[derive(Clone, Debug)]
pub struct StretchOptions {
    pub frame_len: usize,
    /// How far (in samples, each direction) a frame may slide from its naive
    /// analysis position while searching for the best waveform alignment.
    pub search_radius: usize,
    /// Length of the segment compared during the alignment search.
    pub compare_len: usize,
}

impl Default for StretchOptions {
    fn default() -> Self {
        Self {
            frame_len: 2048,
            search_radius: 512,
            compare_len: 512,
        }
    }
}

/// Time-stretches `input` by `rate` without changing pitch: 2.0 halves the
/// duration, 0.5 doubles it. Output sample rate equals the input's.
///
/// Pure and deterministic. Empty input yields empty output; the only error is
/// a non-positive or non-finite rate.
pub fn stretch(input: &[f32], rate: f32) -> Result<Vec<f32>, StudioError> {
    stretch_with_options(input, rate, &StretchOptions::default())
}

pub fn stretch_with_options(
    input: &[f32],
    rate: f32,
    opts: &StretchOptions,
) -> Result<Vec<f32>, StudioError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(StudioError::InvalidRateFactor(rate));
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let out_len = (input.len() as f64 / rate as f64).round() as usize;
    if out_len == 0 {
        return Ok(Vec::new());
    }

    let frame = opts.frame_len.max(4);
    let hop = (frame / 4).max(1);
    let window = hann_window(frame);

    // Frames land on a fixed output grid every `hop` samples, so the window
    // overlap (and with it the accumulated weight) stays the same at every
    // rate. Each frame reads near `syn * rate` on the input side, clamped so
    // reads stay whole frames even as the input runs out.
    let max_read = input.len().saturating_sub(frame);

    // Accumulate windowed frames plus the window weight per sample, then
    // divide at the end. Oversized so the last frame never bounds-checks.
    let mut acc = vec![0.0f32; out_len + frame];
    let mut weight = vec![0.0f32; out_len + frame];

    let mut prev_read = 0usize;
    let mut frames = 0usize;
    let mut syn = 0usize;

    while syn < out_len {
        let naive = ((syn as f64 * rate as f64).round() as usize).min(max_read);

        // The first frame anchors the output; every later frame slides within
        // the search window to best continue what the previous frame laid
        // down `hop` samples ago.
        let read = if frames == 0 {
            naive
        } else {
            best_alignment(input, naive, prev_read + hop, max_read, opts)
        };

        for i in 0..frame {
            if let Some(&s) = input.get(read + i) {
                let w = window[i];
                acc[syn + i] += s * w;
                weight[syn + i] += w;
            }
        }

        prev_read = read;
        frames += 1;
        syn += hop;
    }

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        if weight[i] > f32::EPSILON {
            out.push(acc[i] / weight[i]);
        } else {
            out.push(acc[i]);
        }
    }

    log::debug!(
        "stretch: {} -> {} samples at rate {rate} ({frames} frames)",
        input.len(),
        out.len()
    );
    Ok(out)
}

// ---------- Helper functions ----------

/// Searches `naive ± search_radius` for the read position whose next
/// `compare_len` samples best match the natural continuation at `target`.
/// Candidates past `max_read` are skipped so chosen frames stay whole, and
/// ties keep the naive position so results stay deterministic.
fn best_alignment(
    input: &[f32],
    naive: usize,
    target: usize,
    max_read: usize,
    opts: &StretchOptions,
) -> usize {
    let radius = opts.search_radius as isize;
    let cmp = opts.compare_len.max(1);

    let mut best_pos = naive;
    let mut best_score = normalized_correlation(input, naive, target, cmp);

    for d in -radius..=radius {
        if d == 0 {
            continue;
        }
        let Some(cand) = naive.checked_add_signed(d) else {
            continue;
        };
        if cand > max_read {
            continue;
        }
        let score = normalized_correlation(input, cand, target, cmp);
        if score > best_score {
            best_score = score;
            best_pos = cand;
        }
    }
    best_pos
}
