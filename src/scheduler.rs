use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry<K> {
    key: K,
    due: Instant,
    period: Option<Duration>,
}

/// Cancellable single-shot and periodic timers keyed by `K`.
///
/// Holds at most one pending entry per key: scheduling a key again replaces
/// whatever was pending for it. Nothing runs by itself; the owner drains due
/// entries with [`Scheduler::pop_due`] from its own `advance`.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    entries: Vec<Entry<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + Eq> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, key: K, due: Instant) {
        self.insert(Entry {
            key,
            due,
            period: None,
        });
    }

    /// First fires at `first`, then every `period` counted from the scheduled
    /// time of the previous firing.
    pub fn schedule_every(&mut self, key: K, first: Instant, period: Duration) {
        self.insert(Entry {
            key,
            due: first,
            period: Some(period),
        });
    }

    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn due_at(&self, key: K) -> Option<Instant> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.due)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the earliest entry due at or before `now` and returns it with
    /// its scheduled time. Periodic entries are re-armed before returning.
    pub fn pop_due(&mut self, now: Instant) -> Option<(K, Instant)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| e.due)
            .map(|(i, _)| i)?;

        let entry = self.entries[idx];
        match entry.period {
            Some(period) => self.entries[idx].due = entry.due + period,
            None => {
                self.entries.remove(idx);
            }
        }
        Some((entry.key, entry.due))
    }

    fn insert(&mut self, entry: Entry<K>) {
        self.entries.retain(|e| e.key != entry.key);
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Flip,
        Tick,
        Gap,
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn nothing_fires_before_due() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(Key::Flip, t0 + ms(600));
        assert_eq!(s.pop_due(t0 + ms(599)), None);
        assert_eq!(s.pop_due(t0 + ms(600)), Some((Key::Flip, t0 + ms(600))));
        assert!(s.is_empty());
    }

    #[test]
    fn rescheduling_a_key_replaces_it() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(Key::Gap, t0 + ms(100));
        s.schedule_once(Key::Gap, t0 + ms(500));
        assert_eq!(s.pop_due(t0 + ms(200)), None);
        assert_eq!(s.due_at(Key::Gap), Some(t0 + ms(500)));
    }

    #[test]
    fn cancel_prevents_stale_firing() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(Key::Flip, t0 + ms(100));
        assert!(s.cancel(Key::Flip));
        assert!(!s.cancel(Key::Flip));
        assert_eq!(s.pop_due(t0 + ms(1_000)), None);
    }

    #[test]
    fn periodic_entries_rearm_without_drift() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_every(Key::Tick, t0 + ms(1_000), ms(1_000));

        // one very late drain catches up every missed period in order
        let fired: Vec<_> = std::iter::from_fn(|| s.pop_due(t0 + ms(3_500))).collect();
        assert_eq!(
            fired,
            vec![
                (Key::Tick, t0 + ms(1_000)),
                (Key::Tick, t0 + ms(2_000)),
                (Key::Tick, t0 + ms(3_000)),
            ]
        );
        assert_eq!(s.due_at(Key::Tick), Some(t0 + ms(4_000)));
    }

    #[test]
    fn earliest_due_fires_first() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(Key::Gap, t0 + ms(300));
        s.schedule_once(Key::Flip, t0 + ms(100));
        assert_eq!(s.pop_due(t0 + ms(400)).map(|(k, _)| k), Some(Key::Flip));
        assert_eq!(s.pop_due(t0 + ms(400)).map(|(k, _)| k), Some(Key::Gap));
    }

    #[test]
    fn cancel_all_clears_everything() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_once(Key::Gap, t0);
        s.schedule_every(Key::Tick, t0, ms(10));
        s.cancel_all();
        assert!(!s.is_scheduled(Key::Tick));
        assert_eq!(s.pop_due(t0 + ms(100)), None);
    }
}
