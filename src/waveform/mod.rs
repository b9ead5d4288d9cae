// src/waveform/mod.rs
pub mod terminal;

pub struct WaveformLevel {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

/// Peak-normalized min/max overview of a mono buffer, with halved
/// mipmap levels on top so any zoom can pick bins near its own
/// samples-per-column scale. Bin 0 of level 0 always starts at sample
/// 0; the overview stays aligned with the source timeline so columns
/// map straight back to selection times.
pub struct Waveform {
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub base_bin: usize,
    pub total_samples: usize,
    pub levels: Vec<WaveformLevel>,
}

impl Waveform {
    pub fn build_from_samples(samples: &[f32], sample_rate: u32, base_bin: usize) -> Self {
        let base_bin = base_bin.max(1);
        let mut lvl0_min = Vec::with_capacity(samples.len() / base_bin + 1);
        let mut lvl0_max = Vec::with_capacity(samples.len() / base_bin + 1);
        let mut cur_min = f32::INFINITY;
        let mut cur_max = f32::NEG_INFINITY;
        let mut in_bin = 0usize;
        let mut global_peak = 0.0f32;

        for &sample in samples {
            if sample < cur_min {
                cur_min = sample;
            }
            if sample > cur_max {
                cur_max = sample;
            }
            if sample.abs() > global_peak {
                global_peak = sample.abs();
            }

            in_bin += 1;
            if in_bin == base_bin {
                lvl0_min.push(cur_min);
                lvl0_max.push(cur_max);
                cur_min = f32::INFINITY;
                cur_max = f32::NEG_INFINITY;
                in_bin = 0;
            }
        }

        // Flush remainder
        if in_bin > 0 {
            lvl0_min.push(if cur_min.is_finite() { cur_min } else { 0.0 });
            lvl0_max.push(if cur_max.is_finite() { cur_max } else { 0.0 });
        }

        // Normalize
        if global_peak > 0.0 {
            let scale = 1.0 / global_peak;
            for v in &mut lvl0_min {
                *v *= scale;
            }
            for v in &mut lvl0_max {
                *v *= scale;
            }
        }

        let duration_secs = samples.len() as f64 / sample_rate as f64;
        Self::build_mipmaps(
            sample_rate,
            duration_secs,
            samples.len(),
            base_bin,
            lvl0_min,
            lvl0_max,
        )
    }

    fn build_mipmaps(
        sample_rate: u32,
        duration_secs: f64,
        total_samples: usize,
        base_bin: usize,
        lvl0_min: Vec<f32>,
        lvl0_max: Vec<f32>,
    ) -> Self {
        let mut levels = Vec::new();
        levels.push(WaveformLevel {
            min: lvl0_min,
            max: lvl0_max,
        });

        loop {
            let prev = match levels.last() {
                Some(lvl) => lvl,
                None => break,
            };
            let bins = prev.min.len();
            if bins <= 1 {
                break;
            }
            let next_bins = bins / 2;
            let mut next_min = Vec::with_capacity(next_bins + 1);
            let mut next_max = Vec::with_capacity(next_bins + 1);
            let mut i = 0usize;
            while i + 1 < bins {
                next_min.push(prev.min[i].min(prev.min[i + 1]));
                next_max.push(prev.max[i].max(prev.max[i + 1]));
                i += 2;
            }
            if i < bins {
                next_min.push(prev.min[i]);
                next_max.push(prev.max[i]);
            }
            levels.push(WaveformLevel {
                min: next_min,
                max: next_max,
            });
            if next_bins <= 1 {
                break;
            }
        }

        Self {
            sample_rate,
            duration_secs,
            base_bin,
            total_samples,
            levels,
        }
    }

    /// Collapses the sample window `[start_sample, end_sample)` into
    /// `columns` (min, max) pairs for drawing. Picks the coarsest
    /// mipmap level that is still finer than the zoom; columns past the
    /// end of the audio come back flat.
    pub fn column_extrema(
        &self,
        start_sample: usize,
        end_sample: usize,
        columns: usize,
    ) -> Vec<(f32, f32)> {
        let columns = columns.max(1);
        let start = start_sample.min(self.total_samples);
        let end = end_sample.clamp(start, self.total_samples.max(start));
        if end <= start {
            return vec![(0.0, 0.0); columns];
        }

        let samples_per_col = (end_sample.max(start + 1) - start) as f64 / columns as f64;

        let mut level_idx = 0usize;
        let mut bin_size = self.base_bin as f64;
        while level_idx + 1 < self.levels.len() && bin_size * 2.0 <= samples_per_col {
            level_idx += 1;
            bin_size *= 2.0;
        }
        let lvl = &self.levels[level_idx];
        let total_bins = lvl.min.len();

        let mut out = Vec::with_capacity(columns);
        for col in 0..columns {
            let s0 = start as f64 + col as f64 * samples_per_col;
            let s1 = s0 + samples_per_col;
            let b0 = (s0 / bin_size).floor() as usize;
            let b1 = ((s1 / bin_size).ceil() as usize).max(b0 + 1).min(total_bins);
            if b0 >= b1 {
                out.push((0.0, 0.0));
                continue;
            }
            let mut col_min = f32::INFINITY;
            let mut col_max = f32::NEG_INFINITY;
            for b in b0..b1 {
                if lvl.min[b] < col_min {
                    col_min = lvl.min[b];
                }
                if lvl.max[b] > col_max {
                    col_max = lvl.max[b];
                }
            }
            if col_min.is_finite() && col_max.is_finite() {
                out.push((col_min, col_max));
            } else {
                out.push((0.0, 0.0));
            }
        }
        out
    }
}
