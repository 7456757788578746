use std::io::{self, Write};
use std::time::{Duration, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Receives transfer updates from the downloader.
///
/// `advance` follows the block-callback convention: `block_number` blocks of
/// `block_size` bytes have arrived so far, and `total_size` is the announced
/// length, or a value below 1 when the server did not announce one.
pub trait TransferProgress {
    fn start(&mut self, _label: &str) {}

    fn advance(&mut self, block_number: u64, block_size: u64, total_size: i64);

    fn finish(&mut self) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn advance(&mut self, _block_number: u64, _block_size: u64, _total_size: i64) {}
}

/// Single-line stderr progress display, expressed in MB.
#[derive(Debug)]
pub struct DownloadProgressBar {
    enabled: bool,
    started_at: Instant,
    last_render: Option<Instant>,
    frame: usize,
    rendered: bool,
}

impl DownloadProgressBar {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started_at: Instant::now(),
            last_render: None,
            frame: 0,
            rendered: false,
        }
    }

    fn render_line(&mut self, block_number: u64, block_size: u64, total_size: i64) -> String {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if total_size < 1 {
            let frame = FRAMES[self.frame % FRAMES.len()];
            self.frame = self.frame.wrapping_add(1);
            return format!("kiche ▸ downloading {frame} elapsed {elapsed:.2}s");
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
        let (downloaded, total) = {
            let total = total_size as u64;
            let downloaded = block_number.saturating_mul(block_size).min(total);
            (downloaded as f64 / BYTES_PER_MB, total as f64 / BYTES_PER_MB)
        };
        format!("kiche ▸ downloading [{downloaded:<4.1}MB/{total:.1}MB] elapsed {elapsed:.2}s")
    }

    fn clear(&mut self) {
        if self.rendered {
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\r\x1b[2K");
            let _ = stderr.flush();
            self.rendered = false;
        }
    }
}

impl TransferProgress for DownloadProgressBar {
    fn start(&mut self, label: &str) {
        self.started_at = Instant::now();
        self.last_render = None;
        if self.enabled {
            eprintln!("kiche ▸ fetching {label}");
        }
    }

    fn advance(&mut self, block_number: u64, block_size: u64, total_size: i64) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        if self
            .last_render
            .is_some_and(|last| now.saturating_duration_since(last) < TICK)
        {
            return;
        }
        self.last_render = Some(now);
        let line = self.render_line(block_number, block_size, total_size);
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r\x1b[2K{line}");
        let _ = stderr.flush();
        self.rendered = true;
    }

    fn finish(&mut self) {
        self.clear();
    }
}

impl Drop for DownloadProgressBar {
    fn drop(&mut self) {
        self.clear();
    }
}
