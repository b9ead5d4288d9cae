// src/main.rs

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stretch_studio::config::AppConfig;
use stretch_studio::decode::load_audio;
use stretch_studio::studio_controller::StudioController;

fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    let Some(input_path) = args.get(1).cloned() else {
        eprintln!("Usage: studio <audio-file> [export-dir]");
        std::process::exit(2);
    };
    let export_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = AppConfig::load_or_default(Path::new("studio.json"));

    println!("🎧 Loading {input_path}...");
    let buffer = load_audio(&input_path, config.target_sample_rate)?;
    println!(
        "✅ {:.2}s of audio at {} Hz",
        buffer.duration_seconds(),
        buffer.sample_rate()
    );

    let mut studio = StudioController::new(buffer, config, export_dir);

    println!(
        "Drag to select | [SPACE] Play | [E] Export | [1-7] Speed | [,/.] Fine speed | [S] Stop | [Q] Quit"
    );

    enable_raw_mode()?;
    execute!(stdout(), EnableMouseCapture, Clear(ClearType::All))?;

    // Target 20 FPS (50ms per frame)
    let target_frame_duration = Duration::from_millis(50);

    // Initial draw
    studio.run_tick()?;

    loop {
        // 1. Process Input
        if event::poll(target_frame_duration)? {
            match event::read()? {
                Event::Key(ev) if ev.kind == KeyEventKind::Press => {
                    if ev.code == KeyCode::Char('c')
                        && ev.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }

                    if studio.should_quit(ev.code) {
                        break;
                    }

                    studio.handle_key(ev.code, ev.modifiers);
                    // Force an immediate tick update on input for responsiveness
                    studio.run_tick()?;
                    continue;
                }
                Event::Mouse(ev) => {
                    studio.handle_mouse(ev);
                    studio.run_tick()?;
                    continue;
                }
                _ => {}
            }
        }

        // 2. Update UI on the frame cadence
        studio.run_tick()?;
    }

    execute!(stdout(), DisableMouseCapture)?;
    disable_raw_mode()?;
    println!("\n🛑 Exiting studio.");
    Ok(())
}
