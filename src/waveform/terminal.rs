// src/waveform/terminal.rs

use std::fmt::Write as FmtWrite;

use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};

/// View-local column decorations: the selected region as a half-open
/// column span and the playback cursor column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOverlay {
    pub selection: Option<(usize, usize)>,
    pub cursor: Option<usize>,
}

/// Renders column extrema as rows of text, top row first. The body of
/// the wave is drawn with box characters, the selection gets a colored
/// background, and the cursor column is drawn as a full-height bar.
pub fn render_rows(cols: &[(f32, f32)], height: usize, overlay: ViewOverlay) -> Vec<String> {
    let height = height.max(4);
    let mut rows = Vec::with_capacity(height);
    for row in 0..height {
        let visual_y = height - 1 - row;
        let mut line = String::with_capacity(cols.len() * 4);
        for (x, &(min, max)) in cols.iter().enumerate() {
            let n_min = (min.clamp(-1.0, 1.0) + 1.0) / 2.0;
            let n_max = (max.clamp(-1.0, 1.0) + 1.0) / 2.0;
            let start_row = (n_min * height as f32).floor() as usize;
            let end_row = (n_max * height as f32).ceil() as usize;

            let ch = if visual_y >= start_row && visual_y < end_row {
                '│'
            } else if visual_y == height / 2 {
                '─'
            } else {
                ' '
            };

            let selected = overlay.selection.is_some_and(|(a, b)| x >= a && x < b);
            if overlay.cursor == Some(x) {
                let _ = write!(line, "{}┃{}", SetForegroundColor(Color::Green), ResetColor);
            } else if selected {
                let _ = write!(line, "{}{ch}{}", SetBackgroundColor(Color::DarkRed), ResetColor);
            } else {
                line.push(ch);
            }
        }
        rows.push(line);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale_column_fills_every_row() {
        let rows = render_rows(&[(-1.0, 1.0)], 6, ViewOverlay::default());
        assert_eq!(rows.len(), 6);
        for row in &rows {
            assert_eq!(row, "│");
        }
    }

    #[test]
    fn test_silent_column_shows_midline_only() {
        let rows = render_rows(&[(0.0, 0.0)], 4, ViewOverlay::default());
        let body: usize = rows.iter().filter(|r| r.contains('│')).count();
        assert_eq!(body, 0);
        assert_eq!(rows.iter().filter(|r| r.contains('─')).count(), 1);
    }

    #[test]
    fn test_selection_columns_carry_color_codes() {
        let cols = vec![(0.0, 0.0); 4];
        let overlay = ViewOverlay {
            selection: Some((1, 3)),
            cursor: None,
        };
        let rows = render_rows(&cols, 4, overlay);
        assert!(rows[0].contains('\u{1b}'));
        let plain = render_rows(&cols, 4, ViewOverlay::default());
        assert!(!plain[0].contains('\u{1b}'));
    }

    #[test]
    fn test_cursor_column_draws_full_height_bar() {
        let cols = vec![(0.0, 0.0); 3];
        let overlay = ViewOverlay {
            selection: None,
            cursor: Some(1),
        };
        let rows = render_rows(&cols, 5, overlay);
        for row in &rows {
            assert_eq!(row.matches('┃').count(), 1);
        }
    }
}
