// src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application settings. Everything here has a sensible default; a JSON file
/// can override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Working sample rate: loaded audio is resampled to this before display
    /// and stretching. High on purpose so the stretch operates on fine-grained
    /// material, but not a behavioral contract.
    pub target_sample_rate: u32,
    /// Interval between cursor-position updates during playback.
    pub cursor_poll_ms: u64,
    /// Quick-access speed buttons.
    pub speed_presets: Vec<f32>,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_gain: f32,
    pub max_gain: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 100_000,
            cursor_poll_ms: 50,
            speed_presets: vec![0.33, 0.5, 0.66, 1.0, 1.33, 1.66, 2.0],
            min_speed: 0.03,
            max_speed: 3.0,
            min_gain: 0.0,
            max_gain: 10.0,
        }
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Reads the config file if it exists, otherwise returns defaults.
    /// A malformed file falls back to defaults rather than refusing to start.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(self.min_speed, self.max_speed)
    }

    pub fn clamp_gain(&self, gain: f32) -> f32 {
        gain.clamp(self.min_gain, self.max_gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.target_sample_rate, 100_000);
        assert_eq!(cfg.cursor_poll_ms, 50);
        assert_eq!(cfg.speed_presets.len(), 7);
        assert_eq!(cfg.speed_presets[3], 1.0);
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = AppConfig::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target_sample_rate, cfg.target_sample_rate);
        assert_eq!(back.speed_presets, cfg.speed_presets);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let back: AppConfig = serde_json::from_str(r#"{ "target_sample_rate": 48000 }"#).unwrap();
        assert_eq!(back.target_sample_rate, 48_000);
        assert_eq!(back.cursor_poll_ms, 50);
    }

    #[test]
    fn test_clamps() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.clamp_speed(0.0), 0.03);
        assert_eq!(cfg.clamp_speed(99.0), 3.0);
        assert_eq!(cfg.clamp_gain(-1.0), 0.0);
        assert_eq!(cfg.clamp_gain(11.0), 10.0);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = AppConfig::load_or_default(Path::new("/definitely/not/here.json"));
        assert_eq!(cfg.target_sample_rate, 100_000);
    }
}
