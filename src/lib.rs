// src/lib.rs

pub mod audio;
pub mod buffer;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod playback;
pub mod resample;
pub mod selection;
pub mod stretch;
pub mod studio_controller;
pub mod waveform;

pub use buffer::SampleBuffer;
pub use config::AppConfig;
pub use decode::load_audio;
pub use error::StudioError;
pub use playback::{PlaybackController, PlaybackState};
pub use selection::SelectionModel;
pub use stretch::{StretchOptions, stretch, stretch_with_options};
pub use studio_controller::StudioController;
pub use waveform::Waveform; // convenience
