// src/selection.rs

use crate::error::StudioError;

/// Time region the user has marked on the waveform. Endpoints arrive in
/// pointer order, so start may lie after end (right-to-left drag); consumers
/// get a normalized view. Times are seconds in the source timeline.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    start_time: Option<f64>,
    end_time: Option<f64>,
    duration: f64,
}

impl SelectionModel {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            start_time: None,
            end_time: None,
            duration: duration_seconds.max(0.0),
        }
    }

    /// Clears both endpoints and adopts the new buffer duration. Called when
    /// a new file is loaded.
    pub fn reset(&mut self, duration_seconds: f64) {
        self.start_time = None;
        self.end_time = None;
        self.duration = duration_seconds.max(0.0);
    }

    /// Pointer down: a fresh start invalidates any previous end.
    pub fn begin_selection(&mut self, time_seconds: f64) {
        self.start_time = Some(time_seconds);
        self.end_time = None;
    }

    /// Pointer up (or drag update).
    pub fn end_selection(&mut self, time_seconds: f64) {
        self.end_time = Some(time_seconds);
    }

    pub fn is_set(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Sorted endpoints clamped to the buffer duration, or None while either
    /// endpoint is unset.
    pub fn normalized_range(&self) -> Option<(f64, f64)> {
        let (a, b) = (self.start_time?, self.end_time?);
        let lo = a.min(b).clamp(0.0, self.duration);
        let hi = a.max(b).clamp(0.0, self.duration);
        Some((lo, hi))
    }

    /// Converts the normalized range to sample indices. Degenerate when both
    /// endpoints round to the same sample (or the selection is unset), so
    /// callers can short-circuit before doing any stretch work.
    pub fn to_sample_range(&self, sample_rate: u32) -> Result<(usize, usize), StudioError> {
        let (lo, hi) = self
            .normalized_range()
            .ok_or(StudioError::DegenerateSelection)?;
        let start = (lo * sample_rate as f64).round() as usize;
        let end = (hi * sample_rate as f64).round() as usize;
        if start == end {
            return Err(StudioError::DegenerateSelection);
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_until_both_endpoints() {
        let mut sel = SelectionModel::new(10.0);
        assert!(sel.normalized_range().is_none());

        sel.begin_selection(2.0);
        assert!(sel.normalized_range().is_none());

        sel.end_selection(4.0);
        assert_eq!(sel.normalized_range(), Some((2.0, 4.0)));
    }

    #[test]
    fn test_right_to_left_drag_is_normalized() {
        let mut sel = SelectionModel::new(10.0);
        sel.begin_selection(8.0);
        sel.end_selection(2.0);
        let (lo, hi) = sel.normalized_range().unwrap();
        assert!(lo <= hi);
        assert_eq!((lo, hi), (2.0, 8.0));
    }

    #[test]
    fn test_clamped_to_duration() {
        let mut sel = SelectionModel::new(5.0);
        sel.begin_selection(-1.0);
        sel.end_selection(99.0);
        assert_eq!(sel.normalized_range(), Some((0.0, 5.0)));
    }

    #[test]
    fn test_new_start_invalidates_old_end() {
        let mut sel = SelectionModel::new(10.0);
        sel.begin_selection(1.0);
        sel.end_selection(2.0);
        sel.begin_selection(3.0);
        assert!(sel.normalized_range().is_none());
    }

    #[test]
    fn test_sample_conversion() {
        let mut sel = SelectionModel::new(1.0);
        sel.begin_selection(0.2);
        sel.end_selection(0.8);
        assert_eq!(sel.to_sample_range(100_000).unwrap(), (20_000, 80_000));
    }

    #[test]
    fn test_degenerate_iff_same_sample() {
        let mut sel = SelectionModel::new(1.0);
        sel.begin_selection(0.5);
        sel.end_selection(0.5);
        assert!(matches!(
            sel.to_sample_range(100_000),
            Err(StudioError::DegenerateSelection)
        ));

        // Distinct times that round to the same sample at a low rate are
        // still degenerate there, but fine at a high rate.
        let mut sel = SelectionModel::new(10.0);
        sel.begin_selection(1.0);
        sel.end_selection(1.0001);
        assert!(sel.to_sample_range(1_000).is_err());
        assert!(sel.to_sample_range(100_000).is_ok());
    }

    #[test]
    fn test_unset_is_degenerate_for_conversion() {
        let sel = SelectionModel::new(10.0);
        assert!(matches!(
            sel.to_sample_range(44_100),
            Err(StudioError::DegenerateSelection)
        ));
    }

    #[test]
    fn test_reset_clears_endpoints() {
        let mut sel = SelectionModel::new(10.0);
        sel.begin_selection(1.0);
        sel.end_selection(2.0);
        sel.reset(3.0);
        assert!(sel.normalized_range().is_none());
        sel.begin_selection(0.0);
        sel.end_selection(99.0);
        assert_eq!(sel.normalized_range(), Some((0.0, 3.0)));
    }
}
