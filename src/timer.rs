use std::time::{Duration, Instant};

/// Host polling period. Sampling faster than this gives nothing extra,
/// slower makes the displayed seconds lag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Whole seconds elapsed since the running signal last went true.
///
/// Elapsed time is always `now - started_at`, so slow or missed polls never
/// drift away from wall-clock time. Stopping resets the count to zero.
#[derive(Debug, Clone, Default)]
pub struct ActiveTimer {
    started_at: Option<Instant>,
    seconds: u64,
}

impl ActiveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&mut self, running: bool, now: Instant) {
        if running {
            if self.started_at.is_none() {
                self.started_at = Some(now);
                self.seconds = 0;
            }
        } else {
            self.started_at = None;
            self.seconds = 0;
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Recomputes the elapsed seconds; returns the new value only when it changed.
    pub fn sample(&mut self, now: Instant) -> Option<u64> {
        let start = self.started_at?;
        let secs = now.saturating_duration_since(start).as_secs();
        if secs != self.seconds {
            self.seconds = secs;
            Some(secs)
        } else {
            None
        }
    }

    /// Elapsed seconds at `now` without touching the cached value.
    pub fn elapsed_at(&self, now: Instant) -> u64 {
        self.started_at
            .map(|start| now.saturating_duration_since(start).as_secs())
            .unwrap_or(0)
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}
