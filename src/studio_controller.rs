// src/studio_controller.rs

use std::fmt::Write as FmtWrite;
use std::io::{Write, stdout};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};

use crate::buffer::SampleBuffer;
use crate::config::AppConfig;
use crate::playback::PlaybackController;
use crate::selection::SelectionModel;
use crate::waveform::Waveform;
use crate::waveform::terminal::{ViewOverlay, render_rows};

pub const VIEW_COLS: usize = 120;
pub const VIEW_ROWS: usize = 20;

const WAVEFORM_BASE_BIN: usize = 512;
const ZOOM_STEP: f64 = 1.5;

/// Ties the pieces together for the interactive terminal session: one
/// loaded buffer, the selection being edited with the mouse, the
/// playback controller, and a zoomable view window over the waveform.
pub struct StudioController {
    config: AppConfig,
    buffer: SampleBuffer,
    waveform: Waveform,
    selection: SelectionModel,
    playback: PlaybackController,
    export_dir: PathBuf,

    speed: f32,
    gain: f32,

    // View window over the source, in samples.
    view_start: usize,
    view_len: usize,

    cursor_time: Option<f64>,
    pan_anchor: Option<(usize, usize)>,
    status: String,

    // --- OPTIMIZATION STATE ---
    cached_view: (usize, usize),
    cached_overlay: ViewOverlay,
    cached_status: String,
    force_redraw: bool,

    // Reusable buffer for CLI output.
    draw_buffer: String,
}

impl StudioController {
    pub fn new(buffer: SampleBuffer, config: AppConfig, export_dir: PathBuf) -> Self {
        let waveform =
            Waveform::build_from_samples(buffer.samples(), buffer.sample_rate(), WAVEFORM_BASE_BIN);
        let selection = SelectionModel::new(buffer.duration_seconds());
        let playback = PlaybackController::new(Duration::from_millis(config.cursor_poll_ms));
        let view_len = buffer.len().max(1);

        Self {
            config,
            buffer,
            waveform,
            selection,
            playback,
            export_dir,
            speed: 1.0,
            gain: 1.0,
            view_start: 0,
            view_len,
            cursor_time: None,
            pan_anchor: None,
            status: String::new(),
            cached_view: (usize::MAX, 0),
            cached_overlay: ViewOverlay::default(),
            cached_status: String::new(),
            force_redraw: true,
            draw_buffer: String::with_capacity(8192),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn should_quit(&self, key: KeyCode) -> bool {
        matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
    }

    pub fn run_tick(&mut self) -> Result<(), anyhow::Error> {
        // 1. Logic tick
        self.tick();

        // 2. Gather what the screen depends on
        let overlay = ViewOverlay {
            selection: self.selection_columns(),
            cursor: self.cursor_column(),
        };
        let status = self.status_line();
        let view = (self.view_start, self.view_len);

        // 3. Dirty check
        if !self.force_redraw
            && view == self.cached_view
            && overlay == self.cached_overlay
            && status == self.cached_status
        {
            return Ok(());
        }

        // 4. Update cache
        self.cached_view = view;
        self.cached_overlay = overlay;
        self.force_redraw = false;

        // 5. Build output buffer
        let cols = self.waveform.column_extrema(
            self.view_start,
            self.view_start + self.view_len,
            VIEW_COLS,
        );
        let rows = render_rows(&cols, VIEW_ROWS, overlay);

        self.draw_buffer.clear();
        let _ = write!(self.draw_buffer, "{}", MoveTo(0, 0));
        for line in &rows {
            let _ = write!(self.draw_buffer, "{}\x1b[K\n", line);
        }
        let _ = write!(self.draw_buffer, "{}", MoveTo(0, VIEW_ROWS as u16));
        let _ = write!(self.draw_buffer, "{}", Clear(ClearType::UntilNewLine));
        let _ = write!(self.draw_buffer, "{status}");
        self.cached_status = status;

        // 6. Flush to terminal
        let mut stdout = stdout();
        execute!(stdout, BeginSynchronizedUpdate)?;
        stdout.write_all(self.draw_buffer.as_bytes())?;
        execute!(stdout, EndSynchronizedUpdate)?;
        stdout.flush()?;

        Ok(())
    }

    pub fn tick(&mut self) {
        let was_playing = self.playback.is_playing();
        if let Some(pos) = self.playback.poll_cursor() {
            self.cursor_time = Some(pos);
        }
        if was_playing && !self.playback.is_playing() {
            self.cursor_time = None;
            self.status = "⏹️  finished".into();
            self.force_redraw = true;
        }
    }

    // -------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------
    pub fn handle_key(&mut self, key: KeyCode, _modifiers: KeyModifiers) {
        match key {
            KeyCode::Char(' ') => self.play_selection(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_selection(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.stop_playback(),
            KeyCode::Char(c @ '1'..='9') => self.apply_preset(c as usize - '1' as usize),
            KeyCode::Char(',') | KeyCode::Char('<') => self.adjust_speed(-0.01),
            KeyCode::Char('.') | KeyCode::Char('>') => self.adjust_speed(0.01),
            KeyCode::Char('[') => self.adjust_gain(-0.1),
            KeyCode::Char(']') => self.adjust_gain(0.1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom_at(VIEW_COLS / 2, true),
            KeyCode::Char('-') | KeyCode::Char('_') => self.zoom_at(VIEW_COLS / 2, false),
            KeyCode::Left => self.pan_by_cols(-(VIEW_COLS as f64) / 10.0),
            KeyCode::Right => self.pan_by_cols(VIEW_COLS as f64 / 10.0),
            _ => return,
        }
        self.force_redraw = true;
    }

    // -------------------------------------------------------------
    // Mouse: left selects, middle pans, wheel zooms
    // -------------------------------------------------------------
    pub fn handle_mouse(&mut self, ev: MouseEvent) {
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let t = self.time_at_col(ev.column as usize);
                self.selection.begin_selection(t);
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Up(MouseButton::Left) => {
                let t = self.time_at_col(ev.column as usize);
                self.selection.end_selection(t);
            }
            MouseEventKind::Down(MouseButton::Middle) => {
                self.pan_anchor = Some((ev.column as usize, self.view_start));
            }
            MouseEventKind::Drag(MouseButton::Middle) => {
                let Some((anchor_col, anchor_start)) = self.pan_anchor else {
                    return;
                };
                let spc = self.samples_per_col();
                let delta = (anchor_col as f64 - ev.column as f64) * spc;
                let max_start = self.buffer.len().saturating_sub(self.view_len) as f64;
                let target = (anchor_start as f64 + delta).clamp(0.0, max_start.max(0.0));
                self.view_start = target.round() as usize;
            }
            MouseEventKind::Up(MouseButton::Middle) => {
                self.pan_anchor = None;
            }
            MouseEventKind::ScrollUp => self.zoom_at(ev.column as usize, true),
            MouseEventKind::ScrollDown => self.zoom_at(ev.column as usize, false),
            _ => return,
        }
        self.force_redraw = true;
    }

    // -------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------
    fn play_selection(&mut self) {
        match self
            .playback
            .play(&self.buffer, &self.selection, self.speed, self.gain)
        {
            Ok(true) => {
                self.status = format!("▶️  playing at {:.2}x", self.speed);
            }
            // Empty or unset selection: do nothing, like clicking play
            // with nothing selected.
            Ok(false) => {}
            Err(e) => {
                self.status = format!("❌ {e}");
            }
        }
    }

    fn export_selection(&mut self) {
        match self
            .playback
            .export(&self.buffer, &self.selection, self.speed, &self.export_dir)
        {
            Ok(path) => {
                self.status = format!("💾 exported {}", path.display());
            }
            Err(e) => {
                self.status = format!("❌ export failed: {e}");
            }
        }
    }

    fn stop_playback(&mut self) {
        self.playback.stop();
        self.cursor_time = None;
        self.status = "⏹️  stopped".into();
    }

    fn apply_preset(&mut self, idx: usize) {
        if let Some(&preset) = self.config.speed_presets.get(idx) {
            self.speed = self.config.clamp_speed(preset);
            self.status = format!("🎚️ speed {:.2}x", self.speed);
        }
    }

    fn adjust_speed(&mut self, delta: f32) {
        self.speed = self.config.clamp_speed(self.speed + delta);
        self.status = format!("🎚️ speed {:.2}x", self.speed);
    }

    fn adjust_gain(&mut self, delta: f32) {
        self.gain = self.config.clamp_gain(self.gain + delta);
        self.status = format!("🔊 gain {:.1}", self.gain);
    }

    // -------------------------------------------------------------
    // View window
    // -------------------------------------------------------------
    fn samples_per_col(&self) -> f64 {
        self.view_len.max(1) as f64 / VIEW_COLS as f64
    }

    fn time_at_col(&self, col: usize) -> f64 {
        let sample = self.view_start as f64 + col as f64 * self.samples_per_col();
        sample / self.buffer.sample_rate() as f64
    }

    fn zoom_at(&mut self, anchor_col: usize, zoom_in: bool) {
        let total = self.buffer.len();
        if total == 0 {
            return;
        }
        let factor = if zoom_in { 1.0 / ZOOM_STEP } else { ZOOM_STEP };
        // Floor the window at ~10ms so zooming never collapses the view.
        let min_len = VIEW_COLS
            .max(self.buffer.sample_rate() as usize / 100)
            .min(total)
            .max(1);
        let new_len = ((self.view_len as f64 * factor).round() as usize).clamp(min_len, total);

        // Keep the sample under the anchor column at the same column.
        let anchor_frac = anchor_col.min(VIEW_COLS) as f64 / VIEW_COLS as f64;
        let anchor_sample = self.view_start as f64 + anchor_frac * self.view_len as f64;
        let new_start = anchor_sample - anchor_frac * new_len as f64;
        let max_start = (total - new_len) as f64;
        self.view_start = new_start.clamp(0.0, max_start).round() as usize;
        self.view_len = new_len;
    }

    fn pan_by_cols(&mut self, cols: f64) {
        let delta = cols * self.samples_per_col();
        let max_start = self.buffer.len().saturating_sub(self.view_len) as f64;
        let target = (self.view_start as f64 + delta).clamp(0.0, max_start.max(0.0));
        self.view_start = target.round() as usize;
    }

    fn selection_columns(&self) -> Option<(usize, usize)> {
        let (t0, t1) = self.selection.normalized_range()?;
        let sr = self.buffer.sample_rate() as f64;
        let spc = self.samples_per_col();
        let c0 = (t0 * sr - self.view_start as f64) / spc;
        let c1 = (t1 * sr - self.view_start as f64) / spc;
        if c1 <= 0.0 || c0 >= VIEW_COLS as f64 {
            return None;
        }
        let a = c0.floor().max(0.0) as usize;
        let b = (c1.ceil().min(VIEW_COLS as f64) as usize)
            .max(a + 1)
            .min(VIEW_COLS);
        if b <= a { None } else { Some((a, b)) }
    }

    fn cursor_column(&self) -> Option<usize> {
        let t = self.cursor_time?;
        let sr = self.buffer.sample_rate() as f64;
        let col = (t * sr - self.view_start as f64) / self.samples_per_col();
        if col < 0.0 || col >= VIEW_COLS as f64 {
            return None;
        }
        Some(col as usize)
    }

    fn status_line(&self) -> String {
        let sr = self.buffer.sample_rate() as f64;
        let mut line = String::with_capacity(160);
        let _ = write!(
            line,
            "🎵 {:.2}x | 🔊 {:.1} | {} Hz",
            self.speed,
            self.gain,
            self.buffer.sample_rate()
        );
        match self.selection.normalized_range() {
            Some((a, b)) => {
                let _ = write!(line, " | ✂️ {a:.2}s..{b:.2}s");
            }
            None => {
                let _ = write!(line, " | ✂️ none");
            }
        }
        let view_t0 = self.view_start as f64 / sr;
        let view_t1 = (self.view_start + self.view_len) as f64 / sr;
        let _ = write!(line, " | 🔍 {view_t0:.2}s..{view_t1:.2}s");
        if let Some(c) = self.cursor_time {
            let _ = write!(line, " | ▶ {c:.2}s");
        }
        if !self.status.is_empty() {
            let _ = write!(line, " | {}", self.status);
        }
        line
    }
}
