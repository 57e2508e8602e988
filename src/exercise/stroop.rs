use rand::rngs::StdRng;
use rand::Rng;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{make_rng, Exercise, ExerciseKind};
use crate::scheduler::Scheduler;
use crate::sound::Sound;
use crate::timer::ActiveTimer;
use crate::util::mean;

pub const TOTAL_TRIALS: u32 = 20;
/// Blank screen between a response (or timeout) and the next stimulus.
pub const BLANK_INTERVAL: Duration = Duration::from_millis(150);
pub const INCONGRUENT_RATE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub label: &'static str,
    pub seconds: u32,
    /// A stimulus left unanswered this long counts as a miss.
    pub response_limit: Duration,
}

pub const LEVELS: [Level; 2] = [
    Level {
        label: "Level 1",
        seconds: 40,
        response_limit: Duration::from_millis(2300),
    },
    Level {
        label: "Level 2",
        seconds: 30,
        response_limit: Duration::from_millis(1800),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Ink {
    #[strum(serialize = "RED")]
    Red,
    #[strum(serialize = "BLUE")]
    Blue,
    #[strum(serialize = "GREEN")]
    Green,
    #[strum(serialize = "YELLOW")]
    Yellow,
}

pub const INKS: [Ink; 4] = [Ink::Red, Ink::Blue, Ink::Green, Ink::Yellow];

/// A colour name printed in some ink; the correct answer is the ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    pub word: Ink,
    pub ink: Ink,
}

impl Stimulus {
    pub fn is_congruent(&self) -> bool {
        self.word == self.ink
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Presenting { stimulus: Stimulus, shown_at: Instant },
    Blank,
    Paused,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Ignored,
    Correct { rt_ms: f64 },
    Wrong { rt_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Countdown,
    Response,
    Gap,
}

/// Word/ink conflict trials against a per-level response window.
pub struct Stroop {
    level: usize,
    phase: Phase,
    trial: u32,
    correct: u32,
    timeouts: u32,
    time_left: i64,
    rts: Vec<f64>,
    timer: ActiveTimer,
    timers: Scheduler<Timer>,
    rng: StdRng,
    sound: Rc<dyn Sound>,
}

impl Stroop {
    pub fn new(sound: Rc<dyn Sound>, level: usize, seed: Option<u64>) -> Self {
        let level = level.min(LEVELS.len() - 1);
        Self {
            level,
            phase: Phase::Idle,
            trial: 0,
            correct: 0,
            timeouts: 0,
            time_left: LEVELS[level].seconds as i64,
            rts: Vec::new(),
            timer: ActiveTimer::new(),
            timers: Scheduler::new(),
            rng: make_rng(seed),
            sound,
        }
    }

    fn reset(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.phase = Phase::Idle;
        self.trial = 0;
        self.correct = 0;
        self.timeouts = 0;
        self.rts.clear();
        self.time_left = LEVELS[self.level].seconds as i64;
    }

    pub fn level(&self) -> Level {
        LEVELS[self.level]
    }

    pub fn level_index(&self) -> usize {
        self.level
    }

    pub fn select_level(&mut self, idx: usize, now: Instant) {
        if idx < LEVELS.len() {
            self.level = idx;
            self.reset(now);
        }
    }

    pub fn has_next_level(&self) -> bool {
        self.level + 1 < LEVELS.len()
    }

    pub fn next_level(&mut self, now: Instant) {
        if self.has_next_level() {
            self.select_level(self.level + 1, now);
        }
    }

    pub fn is_done(&self) -> bool {
        self.trial >= TOTAL_TRIALS || self.time_left <= 0
    }

    pub fn start(&mut self, now: Instant) {
        if !matches!(self.phase, Phase::Idle | Phase::Paused) || self.is_done() {
            return;
        }
        self.timer.set_running(true, now);
        self.timers
            .schedule_every(Timer::Countdown, now + Duration::from_secs(1), Duration::from_secs(1));
        tracing::debug!(level = self.level, trial = self.trial, "stroop running");
        self.present(now);
    }

    pub fn stop(&mut self, now: Instant) {
        self.drain(now);
        if !self.timer.is_running() {
            return;
        }
        if self.phase == Phase::Blank {
            // the answered or timed-out trial is settled before pausing
            self.trial += 1;
            if self.trial >= TOTAL_TRIALS {
                self.finish(now);
                return;
            }
        }
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.phase = Phase::Paused;
    }

    fn draw_stimulus(&mut self) -> Stimulus {
        let ink = INKS[self.rng.gen_range(0..INKS.len())];
        let word = if self.rng.gen_bool(INCONGRUENT_RATE) {
            loop {
                let w = INKS[self.rng.gen_range(0..INKS.len())];
                if w != ink {
                    break w;
                }
            }
        } else {
            ink
        };
        Stimulus { word, ink }
    }

    fn present(&mut self, at: Instant) {
        let stimulus = self.draw_stimulus();
        self.phase = Phase::Presenting {
            stimulus,
            shown_at: at,
        };
        self.timers
            .schedule_once(Timer::Response, at + LEVELS[self.level].response_limit);
    }

    fn blank(&mut self, at: Instant) {
        self.phase = Phase::Blank;
        self.timers.schedule_once(Timer::Gap, at + BLANK_INTERVAL);
    }

    /// Scores `ink` against the stimulus on screen. Timers due by `now` fire
    /// first, and a key landing on a stimulus they just presented is dropped.
    pub fn answer(&mut self, ink: Ink, now: Instant) -> Answer {
        let shown = self.phase;
        self.drain(now);
        if self.phase != shown {
            return Answer::Ignored;
        }
        let Phase::Presenting { stimulus, shown_at } = self.phase else {
            return Answer::Ignored;
        };
        self.timers.cancel(Timer::Response);

        let rt_ms = now.saturating_duration_since(shown_at).as_secs_f64() * 1000.0;
        self.rts.push(rt_ms);
        let result = if ink == stimulus.ink {
            self.correct += 1;
            self.sound.success();
            Answer::Correct { rt_ms }
        } else {
            self.sound.fail();
            Answer::Wrong { rt_ms }
        };
        self.blank(now);
        result
    }

    fn finish(&mut self, now: Instant) {
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.phase = Phase::Complete;
        tracing::debug!(
            correct = self.correct,
            trials = self.trial,
            "stroop session complete"
        );
    }

    fn drain(&mut self, now: Instant) {
        while let Some((timer, at)) = self.timers.pop_due(now) {
            self.fire(timer, at);
        }
    }

    fn fire(&mut self, timer: Timer, at: Instant) {
        match timer {
            Timer::Countdown => {
                self.time_left -= 1;
                if self.time_left <= 0 {
                    self.finish(at);
                }
            }
            Timer::Response => {
                self.sound.fail();
                self.timeouts += 1;
                self.blank(at);
            }
            Timer::Gap => {
                self.trial += 1;
                if self.trial >= TOTAL_TRIALS {
                    self.finish(at);
                } else {
                    self.present(at);
                }
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<Stimulus> {
        match self.phase {
            Phase::Presenting { stimulus, .. } => Some(stimulus),
            _ => None,
        }
    }

    /// Zero-based index of the trial being shown.
    pub fn trial(&self) -> u32 {
        self.trial
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn time_left(&self) -> i64 {
        self.time_left.max(0)
    }

    /// Correct answers over trials attempted, in `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        let attempted = self.trial.min(TOTAL_TRIALS).max(1);
        self.correct as f64 / attempted as f64
    }

    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy() * 100.0).round() as u32
    }

    /// Mean latency of answered trials; timeouts are not sampled.
    pub fn avg_rt_ms(&self) -> u64 {
        mean(&self.rts).map(|m| m.round() as u64).unwrap_or(0)
    }
}

impl Exercise for Stroop {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Stroop
    }

    fn advance(&mut self, now: Instant) {
        self.drain(now);
        self.timer.sample(now);
    }

    fn elapsed_seconds(&self) -> u64 {
        self.timer.seconds()
    }

    fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    fn restart(&mut self, now: Instant) {
        self.reset(now);
    }
}
