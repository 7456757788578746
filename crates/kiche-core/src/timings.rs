use std::sync::OnceLock;
use std::time::Instant;

fn timings_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("KICHE_TIMINGS")
            .ok()
            .map(|raw| {
                !matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "" | "0" | "false" | "no" | "off"
                )
            })
            .unwrap_or(true)
    })
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Debug,
}

/// Logs `"<message><seconds>s"` when dropped.
pub(crate) struct TimingGuard {
    message: &'static str,
    level: Level,
    start: Instant,
}

impl TimingGuard {
    /// Stage-level timing, e.g. `"downloaded python in "`.
    pub(crate) fn info(message: &'static str) -> Self {
        Self::new(message, Level::Info)
    }

    pub(crate) fn debug(message: &'static str) -> Self {
        Self::new(message, Level::Debug)
    }

    fn new(message: &'static str, level: Level) -> Self {
        Self {
            message,
            level,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !timings_enabled() {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        match self.level {
            Level::Info => tracing::info!("{}{elapsed:.2}s", self.message),
            Level::Debug => tracing::debug!("{}{elapsed:.2}s", self.message),
        }
    }
}
