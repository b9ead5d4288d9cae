// src/stretch/utils.rs
use std::f32::consts::PI;

pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n).map(|i| {
        0.5 * (1.0 - (2.0 * PI * i as f32 / (n as f32)).cos())
    }).collect()
}

/// Normalized cross-correlation between two segments of `x`, both `len`
/// samples long, starting at `a` and `b`. Reads past the end count as
/// silence so callers never have to bounds-check.
///
/// r = sum(a*b) / sqrt(sum(a^2) * sum(b^2)), accumulated in f64. Returns 0.0
/// when either segment is all-zero.
pub fn normalized_correlation(x: &[f32], a: usize, b: usize, len: usize) -> f32 {
    let mut sum_ab = 0.0f64;
    let mut sum_aa = 0.0f64;
    let mut sum_bb = 0.0f64;
    for i in 0..len {
        let va = x.get(a + i).copied().unwrap_or(0.0) as f64;
        let vb = x.get(b + i).copied().unwrap_or(0.0) as f64;
        sum_ab += va * vb;
        sum_aa += va * va;
        sum_bb += vb * vb;
    }
    if sum_aa > 0.0 && sum_bb > 0.0 {
        (sum_ab / (sum_aa.sqrt() * sum_bb.sqrt())) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_shape() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-6, "window should start at zero");
        assert!((w[512] - 1.0).abs() < 1e-5, "window should peak at the middle");
        assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_correlation_of_segment_with_itself_is_one() {
        let x: Vec<f32> = (0..2000).map(|i| (i as f32 / 30.0).sin()).collect();
        let r = normalized_correlation(&x, 100, 100, 512);
        assert!((r - 1.0).abs() < 1e-6, "self correlation was {r}");
    }

    #[test]
    fn test_correlation_detects_phase_inversion() {
        let pos: Vec<f32> = (0..1000).map(|i| (i as f32 / 20.0).sin()).collect();
        let mut both = pos.clone();
        both.extend(pos.iter().map(|v| -v));
        let r = normalized_correlation(&both, 0, 1000, 500);
        assert!(r < -0.99, "inverted copy should correlate near -1, got {r}");
    }

    #[test]
    fn test_correlation_out_of_bounds_reads_as_silence() {
        let x = vec![1.0f32; 10];
        assert_eq!(normalized_correlation(&x, 0, 1_000_000, 64), 0.0);
    }
}
