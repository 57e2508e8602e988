use std::time::{Duration, Instant};

use crate::progress::DailyProgress;
use crate::scheduler::Scheduler;

/// Quiet period after the last increasing report before credit is flushed.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Flush,
}

/// Coalesces cumulative elapsed-second reports into tracker credits.
///
/// `baseline` is the highest cumulative value seen in the current timer run;
/// it is never reset by a flush, so re-reports of the same run credit
/// nothing. A report lower than the baseline means a new run began.
#[derive(Debug, Default)]
pub struct CreditBridge {
    baseline: u64,
    pending: u64,
    credited: u64,
    timers: Scheduler<Pending>,
}

impl CreditBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, seconds: u64, now: Instant) {
        if seconds > self.baseline {
            self.pending += seconds - self.baseline;
            self.baseline = seconds;
            self.timers.schedule_once(Pending::Flush, now + SETTLE_DELAY);
        } else if seconds < self.baseline {
            self.baseline = seconds;
        }
    }

    /// Flushes once the settle delay passed without a newer report.
    pub fn advance(&mut self, now: Instant, progress: &mut DailyProgress) {
        while let Some((Pending::Flush, _)) = self.timers.pop_due(now) {
            self.flush(progress);
        }
    }

    /// Credits whatever is pending right away; used on teardown.
    pub fn flush(&mut self, progress: &mut DailyProgress) {
        self.timers.cancel(Pending::Flush);
        let amount = std::mem::take(&mut self.pending);
        if amount > 0 {
            tracing::debug!(amount, "flushing practice credit");
            progress.add_seconds(amount);
            self.credited += amount;
        }
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    /// Total seconds handed to the tracker by this bridge.
    pub fn credited(&self) -> u64 {
        self.credited
    }

    pub fn flush_scheduled_at(&self) -> Option<Instant> {
        self.timers.due_at(Pending::Flush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn tracker() -> DailyProgress {
        DailyProgress::load(Rc::new(MemoryStore::new()))
    }

    #[test]
    fn repeated_and_growing_reports_flush_once_with_final_total() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();
        let mut progress = tracker();

        for (i, secs) in [2, 2, 5, 5, 9].into_iter().enumerate() {
            let now = t0 + ms(250 * i as u64);
            bridge.report(secs, now);
            bridge.advance(now, &mut progress);
        }
        assert_eq!(bridge.credited(), 0);
        assert_eq!(bridge.pending(), 9);

        bridge.advance(t0 + ms(1000 + 1499), &mut progress);
        assert_eq!(bridge.credited(), 0);
        bridge.advance(t0 + ms(1000 + 1500), &mut progress);
        assert_eq!(bridge.credited(), 9);
        assert_eq!(progress.today_seconds(), 9);

        bridge.advance(t0 + ms(10_000), &mut progress);
        assert_eq!(bridge.credited(), 9);
    }

    #[test]
    fn rereporting_after_flush_does_not_double_credit() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();
        let mut progress = tracker();

        bridge.report(4, t0);
        bridge.advance(t0 + ms(2_000), &mut progress);
        assert_eq!(bridge.credited(), 4);

        bridge.report(4, t0 + ms(2_100));
        bridge.report(6, t0 + ms(2_200));
        bridge.advance(t0 + ms(5_000), &mut progress);
        assert_eq!(bridge.credited(), 6);
    }

    #[test]
    fn zero_and_decreasing_reports_credit_nothing() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();

        bridge.report(0, t0);
        assert_eq!(bridge.flush_scheduled_at(), None);

        bridge.report(3, t0);
        bridge.report(1, t0 + ms(100));
        bridge.report(0, t0 + ms(200));
        assert_eq!(bridge.pending(), 3);
        assert_eq!(bridge.flush_scheduled_at(), Some(t0 + SETTLE_DELAY));
    }

    #[test]
    fn new_timer_run_is_credited_from_zero() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();
        let mut progress = tracker();

        bridge.report(5, t0);
        bridge.report(0, t0 + ms(100));
        bridge.report(2, t0 + ms(1_100));
        bridge.advance(t0 + ms(5_000), &mut progress);
        assert_eq!(bridge.credited(), 7);
    }

    #[test]
    fn latest_report_pushes_the_flush_back() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();
        bridge.report(1, t0);
        bridge.report(2, t0 + ms(1_000));
        assert_eq!(bridge.flush_scheduled_at(), Some(t0 + ms(1_000) + SETTLE_DELAY));
    }

    #[test]
    fn teardown_flush_credits_pending_once() {
        let t0 = Instant::now();
        let mut bridge = CreditBridge::new();
        let mut progress = tracker();

        bridge.report(8, t0);
        bridge.flush(&mut progress);
        bridge.flush(&mut progress);
        bridge.advance(t0 + ms(10_000), &mut progress);
        assert_eq!(bridge.credited(), 8);
        assert_eq!(progress.today_seconds(), 8);
    }
}
