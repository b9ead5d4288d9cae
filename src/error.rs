// src/error.rs

use thiserror::Error;

/// Errors surfaced by the core operations. All of them are recoverable:
/// a failed load/play/export leaves the buffer and selection untouched.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("could not decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("selection is empty or unset")]
    DegenerateSelection,

    #[error("rate factor must be positive and finite, got {0}")]
    InvalidRateFactor(f32),

    #[error("write failed for '{path}': {reason}")]
    Io { path: String, reason: String },
}

impl StudioError {
    pub fn decode(path: &str, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: &str, reason: impl ToString) -> Self {
        Self::Io {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let e = StudioError::decode("song.mp3", "no default audio track");
        assert!(e.to_string().contains("song.mp3"));
        assert!(e.to_string().contains("no default audio track"));

        let e = StudioError::InvalidRateFactor(-2.0);
        assert!(e.to_string().contains("-2"));
    }
}
