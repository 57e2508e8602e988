use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{make_rng, Exercise, ExerciseKind};
use crate::scheduler::Scheduler;
use crate::sound::Sound;
use crate::store::{self, KvStore};
use crate::timer::ActiveTimer;
use crate::util::rand_int;

pub const REVEAL_KEY: &str = "path_reveal_ms";
pub const SESSION_SECONDS: i64 = 60;
pub const MIN_TARGETS: usize = 3;
pub const MAX_TARGETS: usize = 6;
pub const TRANSITION: Duration = Duration::from_millis(600);

pub const AREA_WIDTH: i64 = 320;
pub const AREA_HEIGHT: i64 = 260;
pub const DOT_RADIUS: i64 = 18;
const PAD: i64 = 28;
/// Squared spacing below which a candidate point is redrawn.
const MIN_SPACING_SQ: i64 = (DOT_RADIUS * 5) * (DOT_RADIUS * 5);
const PLACEMENT_ATTEMPTS: usize = 100;
/// Picks farther than this from every point are ignored.
pub const HIT_RADIUS: i64 = 36;

pub const REVEAL_MIN_MS: u64 = 300;
pub const REVEAL_MAX_MS: u64 = 6000;
pub const REVEAL_STEP_MS: u64 = 100;
pub const REVEAL_DEFAULT_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Marker {
    Red,
    Blue,
    Black,
    White,
    Teal,
    Indigo,
}

const MARKERS: [Marker; 6] = [
    Marker::Red,
    Marker::Blue,
    Marker::Black,
    Marker::White,
    Marker::Teal,
    Marker::Indigo,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
    pub marker: Marker,
    /// Keyboard label, shuffled so it does not give the order away.
    pub label: u8,
}

impl Point {
    fn dist_sq(&self, x: i64, y: i64) -> i64 {
        (self.x - x).pow(2) + (self.y - y).pow(2)
    }
}

/// Places `count` points inside the play area, redrawing each one up to a
/// fixed number of times while it sits too close to an earlier point.
pub fn generate_points(rng: &mut StdRng, count: usize) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(count);
    for i in 0..count {
        let mut attempts = 0;
        let (x, y) = loop {
            let x = rand_int(rng, PAD, AREA_WIDTH - PAD);
            let y = rand_int(rng, PAD, AREA_HEIGHT - PAD);
            attempts += 1;
            let far = points.iter().all(|p| p.dist_sq(x, y) > MIN_SPACING_SQ);
            if far || attempts >= PLACEMENT_ATTEMPTS {
                break (x, y);
            }
        };
        points.push(Point {
            x,
            y,
            marker: MARKERS[i % MARKERS.len()],
            label: 0,
        });
    }
    let mut labels: Vec<u8> = (1..=count as u8).collect();
    labels.shuffle(rng);
    for (point, label) in points.iter_mut().zip(labels) {
        point.label = label;
    }
    points
}

pub fn clamp_reveal_ms(ms: u64) -> u64 {
    let ms = ms.clamp(REVEAL_MIN_MS, REVEAL_MAX_MS);
    (ms / REVEAL_STEP_MS) * REVEAL_STEP_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Points `0..=revealed` are on screen.
    Showing { revealed: usize },
    /// Waiting for point `next`.
    Input { next: usize },
    Transition,
    SessionOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Ignored,
    Correct,
    TaskComplete,
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Countdown,
    Reveal,
    Between,
}

/// Watch a sequence of points appear, then reproduce the order.
pub struct PathFinder {
    points: Vec<Point>,
    phase: Phase,
    running: bool,
    time_left: i64,
    targets: usize,
    tasks_done: u32,
    tasks_started: u32,
    reveal_ms: u64,
    store: Rc<dyn KvStore>,
    timer: ActiveTimer,
    timers: Scheduler<Timer>,
    rng: StdRng,
    sound: Rc<dyn Sound>,
}

impl PathFinder {
    pub fn new(sound: Rc<dyn Sound>, store: Rc<dyn KvStore>, seed: Option<u64>) -> Self {
        let reveal_ms = clamp_reveal_ms(store::load(store.as_ref(), REVEAL_KEY, REVEAL_DEFAULT_MS));
        Self {
            points: Vec::new(),
            phase: Phase::Idle,
            running: false,
            time_left: SESSION_SECONDS,
            targets: MIN_TARGETS,
            tasks_done: 0,
            tasks_started: 0,
            reveal_ms,
            store,
            timer: ActiveTimer::new(),
            timers: Scheduler::new(),
            rng: make_rng(seed),
            sound,
        }
    }

    pub fn start_session(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.time_left = SESSION_SECONDS;
        self.targets = MIN_TARGETS;
        self.tasks_done = 0;
        self.tasks_started = 0;
        self.running = true;
        self.timer.set_running(true, now);
        self.timers.schedule_every(
            Timer::Countdown,
            now + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        tracing::debug!(reveal_ms = self.reveal_ms, "path session started");
        self.prepare_task(now);
    }

    /// Abandons the session and returns to idle.
    pub fn stop(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.running = false;
        self.phase = Phase::Idle;
        self.time_left = SESSION_SECONDS;
    }

    fn prepare_task(&mut self, now: Instant) {
        self.points = generate_points(&mut self.rng, self.targets);
        self.tasks_started += 1;
        self.enter_showing(0, now);
    }

    fn enter_showing(&mut self, revealed: usize, now: Instant) {
        if revealed + 1 >= self.points.len() {
            self.timers.cancel(Timer::Reveal);
            self.phase = Phase::Input { next: 0 };
            return;
        }
        self.phase = Phase::Showing { revealed };
        self.timers.schedule_once(Timer::Reveal, now + self.reveal_interval());
    }

    fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_ms.max(REVEAL_MIN_MS))
    }

    /// Picks the nearest point to `(x, y)` in play-area units.
    pub fn select_at(&mut self, x: i64, y: i64, now: Instant) -> Pick {
        if !self.accepts_input() {
            return Pick::Ignored;
        }
        let nearest = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, p)| (idx, p.dist_sq(x, y)))
            .min_by_key(|&(_, d)| d);
        match nearest {
            Some((idx, d)) if d <= HIT_RADIUS * HIT_RADIUS => self.select(idx, now),
            _ => Pick::Ignored,
        }
    }

    /// Picks the point with keyboard label `label`.
    pub fn select_label(&mut self, label: u8, now: Instant) -> Pick {
        match self.points.iter().position(|p| p.label == label) {
            Some(idx) => self.select(idx, now),
            None => Pick::Ignored,
        }
    }

    pub fn select(&mut self, idx: usize, now: Instant) -> Pick {
        let Phase::Input { next } = self.phase else {
            return Pick::Ignored;
        };
        if !self.running || idx >= self.points.len() {
            return Pick::Ignored;
        }
        self.sound.click();
        if idx != next {
            self.sound.fail();
            return Pick::Wrong;
        }
        self.sound.success();
        if next + 1 < self.points.len() {
            self.phase = Phase::Input { next: next + 1 };
            return Pick::Correct;
        }
        self.tasks_done += 1;
        self.targets = MAX_TARGETS.min(MIN_TARGETS + self.tasks_done as usize / 2);
        self.phase = Phase::Transition;
        self.timers.schedule_once(Timer::Between, now + TRANSITION);
        tracing::debug!(tasks_done = self.tasks_done, targets = self.targets, "path task complete");
        Pick::TaskComplete
    }

    fn accepts_input(&self) -> bool {
        self.running && matches!(self.phase, Phase::Input { .. })
    }

    pub fn set_reveal_ms(&mut self, ms: u64, now: Instant) {
        let ms = clamp_reveal_ms(ms);
        if ms == self.reveal_ms {
            return;
        }
        self.reveal_ms = ms;
        store::save(self.store.as_ref(), REVEAL_KEY, &ms);
        if let Phase::Showing { revealed } = self.phase {
            self.enter_showing(revealed, now);
        }
    }

    pub fn faster(&mut self, now: Instant) {
        self.set_reveal_ms(self.reveal_ms.saturating_sub(REVEAL_STEP_MS), now);
    }

    pub fn slower(&mut self, now: Instant) {
        self.set_reveal_ms(self.reveal_ms + REVEAL_STEP_MS, now);
    }

    fn fire(&mut self, timer: Timer, at: Instant) {
        match timer {
            Timer::Countdown => {
                self.time_left -= 1;
                if self.time_left <= 0 {
                    self.timers.cancel_all();
                    self.timer.set_running(false, at);
                    self.running = false;
                    self.phase = Phase::SessionOver;
                    tracing::debug!(tasks_done = self.tasks_done, "path session over");
                }
            }
            Timer::Reveal => {
                if let Phase::Showing { revealed } = self.phase {
                    self.enter_showing(revealed + 1, at);
                }
            }
            Timer::Between => {
                if self.phase == Phase::Transition {
                    self.prepare_task(at);
                }
            }
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Points currently drawn: the revealed prefix while showing, all of
    /// them otherwise.
    pub fn visible_points(&self) -> &[Point] {
        match self.phase {
            Phase::Idle | Phase::SessionOver => &[],
            Phase::Showing { revealed } => &self.points[..=revealed.min(self.points.len().saturating_sub(1))],
            Phase::Input { .. } | Phase::Transition => &self.points,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_left(&self) -> i64 {
        self.time_left.max(0)
    }

    pub fn targets(&self) -> usize {
        self.targets
    }

    pub fn tasks_done(&self) -> u32 {
        self.tasks_done
    }

    pub fn tasks_started(&self) -> u32 {
        self.tasks_started
    }

    pub fn reveal_ms(&self) -> u64 {
        self.reveal_ms
    }
}

impl Exercise for PathFinder {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Path
    }

    fn advance(&mut self, now: Instant) {
        while let Some((timer, at)) = self.timers.pop_due(now) {
            self.fire(timer, at);
        }
        self.timer.sample(now);
    }

    fn elapsed_seconds(&self) -> u64 {
        self.timer.seconds()
    }

    fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    fn restart(&mut self, now: Instant) {
        self.stop(now);
        self.points.clear();
        self.targets = MIN_TARGETS;
        self.tasks_done = 0;
        self.tasks_started = 0;
    }
}
