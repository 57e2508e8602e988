use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use crate::timer::POLL_INTERVAL;

/// Everything the host loop reacts to. `Tick` is synthesized when no other
/// event arrives within one ticker interval.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

/// An event and the moment it arrived. Exercises judge input at `at`, so
/// reaction times do not include the frame drawn before it was handled.
#[derive(Clone, Debug)]
pub struct Stamped {
    pub event: AppEvent,
    pub at: Instant,
}

impl Stamped {
    pub fn now(event: AppEvent) -> Self {
        Self {
            event,
            at: Instant::now(),
        }
    }
}

/// Source of terminal events.
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<Stamped, RecvTimeoutError>;
}

/// Production event source using crossterm. Events are stamped on the
/// reader thread as soon as crossterm yields them.
pub struct CrosstermEventSource {
    rx: Receiver<Stamped>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // key release and repeat reports would double every press
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(Stamped::now(AppEvent::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Mouse(mouse)) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
                    if tx.send(Stamped::now(AppEvent::Mouse(mouse))).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(Stamped::now(AppEvent::Resize)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Stamped, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    /// One tick per [`POLL_INTERVAL`].
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless tests; events are stamped when received.
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Stamped, RecvTimeoutError> {
        self.rx.recv_timeout(timeout).map(Stamped::now)
    }
}

/// Advances the host one event or tick at a time.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> Stamped {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                Stamped::now(AppEvent::Tick)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step().event, AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step().event, AppEvent::Resize);
    }

    #[test]
    fn disconnected_source_degrades_to_ticks() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());
        assert_matches!(runner.step().event, AppEvent::Tick);
    }

    #[test]
    fn default_ticker_uses_the_poll_interval() {
        assert_eq!(FixedTicker::default().interval(), POLL_INTERVAL);
    }

    #[test]
    fn events_are_stamped_on_arrival() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());
        let before = Instant::now();
        tx.send(AppEvent::Resize).unwrap();
        let step = runner.step();
        assert_matches!(step.event, AppEvent::Resize);
        assert!(step.at >= before);
        assert!(step.at <= Instant::now());
    }
}
