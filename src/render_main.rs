// src/render_main.rs
//
// Headless companion to the interactive studio: stretch a region of a
// file from the command line and write the result as a wav.

use std::path::{Path, PathBuf};
use std::time::Duration;

use stretch_studio::config::AppConfig;
use stretch_studio::decode::load_audio;
use stretch_studio::playback::PlaybackController;
use stretch_studio::selection::SelectionModel;

fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: render <audio-file> <output-dir> <rate> [start-sec end-sec]");
        std::process::exit(2);
    }
    let input_path = &args[1];
    let out_dir = PathBuf::from(&args[2]);
    let rate: f32 = args[3].parse()?;

    let config = AppConfig::load_or_default(Path::new("studio.json"));

    println!("🎧 Loading {input_path}...");
    let buffer = load_audio(input_path, config.target_sample_rate)?;

    let mut selection = SelectionModel::new(buffer.duration_seconds());
    if args.len() >= 6 {
        let start: f64 = args[4].parse()?;
        let end: f64 = args[5].parse()?;
        selection.begin_selection(start);
        selection.end_selection(end);
    } else {
        selection.begin_selection(0.0);
        selection.end_selection(buffer.duration_seconds());
    }

    std::fs::create_dir_all(&out_dir)?;

    let controller = PlaybackController::new(Duration::from_millis(config.cursor_poll_ms));
    let path = controller.export(&buffer, &selection, rate, &out_dir)?;
    println!("💾 Wrote {}", path.display());
    Ok(())
}
