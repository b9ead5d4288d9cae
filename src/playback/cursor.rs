// src/playback/cursor.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Everything the cursor feed needs, captured by value when playback
/// starts. The feed never looks at shared playback state after this.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot {
    /// Region start in source-time seconds.
    pub region_start: f64,
    /// Region end in source-time seconds.
    pub region_end: f64,
    /// Duration of the stretched audio in wall-clock seconds.
    pub stretched_duration: f64,
    /// Wall-clock moment the audio was handed to the output device.
    pub started: Instant,
}

/// Spawns the thread that maps wall-clock progress back to source time
/// and streams positions over `tx`. Positions are nondecreasing and
/// stay inside `[region_start, region_end)`. The channel closes when
/// playback ends or `cancel` is raised; the receiving side treats a
/// closed channel as end-of-playback.
pub fn spawn_cursor_feed(
    snapshot: SessionSnapshot,
    poll: Duration,
    cancel: Arc<AtomicBool>,
    tx: mpsc::Sender<f64>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let span = snapshot.region_end - snapshot.region_start;
        loop {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let elapsed = snapshot.started.elapsed().as_secs_f64();
            if elapsed >= snapshot.stretched_duration {
                break;
            }
            let pos = snapshot.region_start + elapsed * span / snapshot.stretched_duration;
            if pos >= snapshot.region_end {
                break;
            }
            if tx.send(pos).is_err() {
                break;
            }
            thread::sleep(poll);
        }
        log::debug!("cursor feed for region {:.3}..{:.3} ended", snapshot.region_start, snapshot.region_end);
    })
}
