// src/playback/mod.rs

pub mod cursor;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::audio::{self, RenderHandle};
use crate::buffer::SampleBuffer;
use crate::error::StudioError;
use crate::export::write_wav;
use crate::selection::SelectionModel;
use crate::stretch::stretch;

use cursor::{SessionSnapshot, spawn_cursor_feed};

pub const EXPORT_FILE_NAME: &str = "processed_audio.wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Stretching,
    Playing,
}

struct ActiveSession {
    cancel: Arc<AtomicBool>,
    cursor_rx: mpsc::Receiver<f64>,
    // Absent only in sessions installed by tests, which have no device.
    _render: Option<RenderHandle>,
    _feed: JoinHandle<()>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Owns the lifecycle of one playback at a time: stretch the selected
/// region, hand it to the output device, and run the cursor feed that
/// reports source-time positions back to the caller. A new `play`
/// supersedes whatever was playing before it.
pub struct PlaybackController {
    state: PlaybackState,
    poll_interval: Duration,
    session: Option<ActiveSession>,
}

impl PlaybackController {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: PlaybackState::Idle,
            poll_interval,
            session: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Stretches the selected region and starts playing it. Returns
    /// `Ok(true)` when playback started, `Ok(false)` when the selection
    /// is empty or unset (a silent no-op). An out-of-range rate factor
    /// is an error before anything else is looked at.
    pub fn play(
        &mut self,
        buffer: &SampleBuffer,
        selection: &SelectionModel,
        rate_factor: f32,
        gain: f32,
    ) -> Result<bool, anyhow::Error> {
        if !rate_factor.is_finite() || rate_factor <= 0.0 {
            return Err(StudioError::InvalidRateFactor(rate_factor).into());
        }
        let Ok((start, end)) = selection.to_sample_range(buffer.sample_rate()) else {
            return Ok(false);
        };
        let Some((region_start, region_end)) = selection.normalized_range() else {
            return Ok(false);
        };
        let slice = buffer.slice(start, end);
        if slice.is_empty() {
            return Ok(false);
        }

        // Supersede whatever was playing before doing the heavy work.
        self.stop();
        self.state = PlaybackState::Stretching;

        let mut stretched = match stretch(slice, rate_factor) {
            Ok(samples) => samples,
            Err(e) => {
                self.state = PlaybackState::Idle;
                return Err(e.into());
            }
        };
        if gain != 1.0 {
            let gain = gain.max(0.0);
            for s in &mut stretched {
                *s *= gain;
            }
        }

        let stretched_duration = stretched.len() as f64 / buffer.sample_rate() as f64;
        if stretched_duration <= 0.0 {
            self.state = PlaybackState::Idle;
            return Ok(false);
        }

        let render = match audio::render(stretched, buffer.sample_rate()) {
            Ok(handle) => handle,
            Err(e) => {
                self.state = PlaybackState::Idle;
                return Err(e).context("starting audio output");
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let snapshot = SessionSnapshot {
            region_start,
            region_end,
            stretched_duration,
            started: Instant::now(),
        };
        let feed = spawn_cursor_feed(snapshot, self.poll_interval, cancel.clone(), tx);

        self.session = Some(ActiveSession {
            cancel,
            cursor_rx: rx,
            _render: Some(render),
            _feed: feed,
        });
        self.state = PlaybackState::Playing;
        log::info!(
            "playing {region_start:.3}s..{region_end:.3}s at rate {rate_factor} ({stretched_duration:.3}s stretched)"
        );
        Ok(true)
    }

    /// Stretches the selected region and writes it, unscaled, to
    /// `processed_audio.wav` inside `dest_dir`. Unlike `play`, an empty
    /// or unset selection is reported as an error.
    pub fn export(
        &self,
        buffer: &SampleBuffer,
        selection: &SelectionModel,
        rate_factor: f32,
        dest_dir: &Path,
    ) -> Result<PathBuf, StudioError> {
        if !rate_factor.is_finite() || rate_factor <= 0.0 {
            return Err(StudioError::InvalidRateFactor(rate_factor));
        }
        let (start, end) = selection.to_sample_range(buffer.sample_rate())?;
        let slice = buffer.slice(start, end);
        if slice.is_empty() {
            return Err(StudioError::DegenerateSelection);
        }
        let stretched = stretch(slice, rate_factor)?;
        let path = dest_dir.join(EXPORT_FILE_NAME);
        write_wav(&path, &stretched, buffer.sample_rate())?;
        log::info!("exported {} stretched samples to {}", stretched.len(), path.display());
        Ok(path)
    }

    /// Cancels the current session, if any. The cursor feed shuts down
    /// within one poll interval and the device stream is dropped.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.store(true, Ordering::Relaxed);
        }
        self.state = PlaybackState::Idle;
    }

    /// Drains the cursor channel and returns the most recent position,
    /// if any arrived since the last call. A closed channel means the
    /// feed finished; the controller then falls back to idle.
    pub fn poll_cursor(&mut self) -> Option<f64> {
        let Some(session) = self.session.as_ref() else {
            return None;
        };
        let mut latest = None;
        let mut finished = false;
        loop {
            match session.cursor_rx.try_recv() {
                Ok(pos) => latest = Some(pos),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.session = None;
            self.state = PlaybackState::Idle;
            log::debug!("playback finished");
        }
        latest
    }

    /// Adopts an externally built session so the supersession paths can be
    /// exercised without an output device.
    #[cfg(test)]
    fn install_session(
        &mut self,
        cancel: Arc<AtomicBool>,
        cursor_rx: mpsc::Receiver<f64>,
        feed: JoinHandle<()>,
    ) {
        self.session = Some(ActiveSession {
            cancel,
            cursor_rx,
            _render: None,
            _feed: feed,
        });
        self.state = PlaybackState::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_buffer(len: usize, freq: f32, sample_rate: u32) -> SampleBuffer {
        let samples = (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5
            })
            .collect();
        SampleBuffer::new(samples, sample_rate)
    }

    fn selection(start: f64, end: f64, duration: f64) -> SelectionModel {
        let mut sel = SelectionModel::new(duration);
        sel.begin_selection(start);
        sel.end_selection(end);
        sel
    }

    fn temp_export_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stretch_studio_{}_{name}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Puts the controller into `Playing` with a live cursor feed but no
    /// device stream, and returns the session's cancel flag.
    fn installed_session(controller: &mut PlaybackController) -> Arc<AtomicBool> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let snapshot = SessionSnapshot {
            region_start: 0.0,
            region_end: 1.0,
            stretched_duration: 60.0,
            started: Instant::now(),
        };
        let feed = spawn_cursor_feed(snapshot, Duration::from_millis(10), cancel.clone(), tx);
        controller.install_session(cancel.clone(), rx, feed);
        cancel
    }

    #[test]
    fn test_play_with_degenerate_selection_is_silent_noop() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = selection(0.5, 0.5, buffer.duration_seconds());

        let started = controller.play(&buffer, &sel, 1.0, 1.0).unwrap();
        assert!(!started);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.poll_cursor().is_none());
    }

    #[test]
    fn test_play_with_unset_selection_is_silent_noop() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = SelectionModel::new(buffer.duration_seconds());

        assert!(!controller.play(&buffer, &sel, 2.0, 1.0).unwrap());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_play_rejects_bad_rate_before_looking_at_selection() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        // Selection is degenerate too; the rate error must win.
        let sel = selection(0.5, 0.5, buffer.duration_seconds());

        let err = controller.play(&buffer, &sel, 0.0, 1.0).unwrap_err();
        let studio = err.downcast_ref::<StudioError>();
        assert!(matches!(studio, Some(StudioError::InvalidRateFactor(_))));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_export_rejects_degenerate_selection() {
        let controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = selection(0.25, 0.25, buffer.duration_seconds());

        let err = controller
            .export(&buffer, &sel, 1.0, &std::env::temp_dir())
            .unwrap_err();
        assert!(matches!(err, StudioError::DegenerateSelection));
    }

    #[test]
    fn test_export_rejects_bad_rate_first() {
        let controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = selection(0.25, 0.25, buffer.duration_seconds());

        let err = controller
            .export(&buffer, &sel, -1.0, &std::env::temp_dir())
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidRateFactor(_)));
    }

    #[test]
    fn test_export_writes_stretched_wav() {
        let controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = selection(0.2, 0.8, buffer.duration_seconds());
        let dir = temp_export_dir("export_ok");

        let path = controller.export(&buffer, &sel, 2.0, &dir).unwrap();
        assert!(path.ends_with(EXPORT_FILE_NAME));

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 8_000);
        assert_eq!(spec.channels, 1);
        // 0.6 s of source at double speed comes out half as long.
        let expected = ((0.6 * 8_000.0_f64) / 2.0).round() as usize;
        assert_eq!(reader.len() as usize, expected);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_full_second_buffer_at_double_speed() {
        let controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(100_000, 440.0, 100_000);
        let sel = selection(0.2, 0.8, buffer.duration_seconds());
        let dir = temp_export_dir("export_100k");

        let path = controller.export(&buffer, &sel, 2.0, &dir).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 30_000);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_stop_without_session_stays_idle() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.poll_cursor().is_none());
    }

    #[test]
    fn test_new_play_supersedes_prior_session() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let sel = selection(0.2, 0.8, buffer.duration_seconds());

        let prior = installed_session(&mut controller);
        assert!(controller.is_playing());
        assert!(!prior.load(Ordering::Relaxed));

        // Whether or not an output device is available for the new session,
        // the prior one must already be cancelled when play returns.
        let _ = controller.play(&buffer, &sel, 2.0, 1.0);
        assert!(prior.load(Ordering::Relaxed));
    }

    #[test]
    fn test_rejected_play_leaves_prior_session_running() {
        let mut controller = PlaybackController::new(Duration::from_millis(10));
        let buffer = sine_buffer(8_000, 220.0, 8_000);
        let prior = installed_session(&mut controller);
        let degenerate = selection(0.5, 0.5, buffer.duration_seconds());

        // A bad rate errors out before the running session is touched.
        assert!(controller.play(&buffer, &degenerate, 0.0, 1.0).is_err());
        assert!(!prior.load(Ordering::Relaxed));
        assert!(controller.is_playing());

        // A degenerate selection is a no-op, not a stop.
        assert!(!controller.play(&buffer, &degenerate, 1.0, 1.0).unwrap());
        assert!(!prior.load(Ordering::Relaxed));
        assert!(controller.is_playing());

        // The surviving session keeps feeding cursor positions.
        std::thread::sleep(Duration::from_millis(30));
        assert!(controller.poll_cursor().is_some());

        controller.stop();
        assert!(prior.load(Ordering::Relaxed));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }
}
