use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{make_rng, Exercise, ExerciseKind};
use crate::scheduler::Scheduler;
use crate::sound::Sound;
use crate::timer::ActiveTimer;
use crate::util::rand_int;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub label: &'static str,
    pub seconds: u32,
}

pub const LEVELS: [Level; 3] = [
    Level {
        label: "Level 1",
        seconds: 60,
    },
    Level {
        label: "Level 2",
        seconds: 45,
    },
    Level {
        label: "Level 3",
        seconds: 30,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    pub fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '×',
        }
    }
}

const OPS: [Op; 3] = [Op::Add, Op::Sub, Op::Mul];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub a: i64,
    pub b: i64,
    pub op: Op,
}

impl Question {
    pub fn answer(&self) -> i64 {
        match self.op {
            Op::Add => self.a + self.b,
            Op::Sub => self.a - self.b,
            Op::Mul => self.a * self.b,
        }
    }

    pub fn text(&self) -> String {
        format!("{} {} {}", self.a, self.op.symbol(), self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Running,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Ignored,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Countdown,
}

/// As many arithmetic answers as possible before the countdown ends.
pub struct MathBlitz {
    level: usize,
    phase: Phase,
    time_left: i64,
    score: u32,
    answered: u32,
    answer: String,
    current: Question,
    timer: ActiveTimer,
    timers: Scheduler<Timer>,
    rng: StdRng,
    sound: Rc<dyn Sound>,
}

impl MathBlitz {
    pub fn new(sound: Rc<dyn Sound>, level: usize, seed: Option<u64>) -> Self {
        let level = level.min(LEVELS.len() - 1);
        let mut rng = make_rng(seed);
        let current = make_question(&mut rng);
        Self {
            level,
            phase: Phase::Ready,
            time_left: LEVELS[level].seconds as i64,
            score: 0,
            answered: 0,
            answer: String::new(),
            current,
            timer: ActiveTimer::new(),
            timers: Scheduler::new(),
            rng,
            sound,
        }
    }

    pub fn select_level(&mut self, idx: usize, now: Instant) {
        if idx < LEVELS.len() {
            self.level = idx;
            self.restart(now);
        }
    }

    pub fn level(&self) -> Level {
        LEVELS[self.level]
    }

    pub fn level_index(&self) -> usize {
        self.level
    }

    pub fn type_char(&mut self, c: char) {
        if self.phase != Phase::Over && (c.is_ascii_digit() || c == '-') {
            self.answer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.answer.pop();
    }

    pub fn set_answer(&mut self, text: &str) {
        if self.phase != Phase::Over {
            self.answer = text.to_string();
        }
    }

    /// Scores the buffered answer and moves to a fresh question. The first
    /// submission starts the countdown.
    pub fn submit(&mut self, now: Instant) -> Submit {
        self.drain(now);
        if self.phase == Phase::Over {
            return Submit::Ignored;
        }
        if self.phase == Phase::Ready {
            self.phase = Phase::Running;
            self.timer.set_running(true, now);
            self.timers.schedule_every(
                Timer::Countdown,
                now + Duration::from_secs(1),
                Duration::from_secs(1),
            );
            tracing::debug!(level = self.level, "math blitz running");
        }

        let expected = self.current.answer();
        let result = match self.answer.trim().parse::<i64>() {
            Ok(value) if value == expected => {
                self.score += 1;
                self.sound.success();
                Submit::Correct
            }
            _ => {
                self.sound.fail();
                Submit::Incorrect
            }
        };
        self.answered += 1;
        self.answer.clear();
        self.current = make_question(&mut self.rng);
        result
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
                    self.timers.cancel_all();
                    self.timer.set_running(false, at);
                    self.phase = Phase::Over;
                    tracing::debug!(score = self.score, "math blitz over");
                }
            }
        }
    }

    pub fn question(&self) -> Question {
        self.current
    }

    pub fn answer_text(&self) -> &str {
        &self.answer
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn time_left(&self) -> i64 {
        self.time_left.max(0)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

fn make_question(rng: &mut StdRng) -> Question {
    let a = rand_int(rng, 7, 49);
    let b = rand_int(rng, 3, 12);
    let op = *OPS.choose(rng).unwrap_or(&Op::Add);
    Question { a, b, op }
}

impl Exercise for MathBlitz {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Math
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
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.phase = Phase::Ready;
        self.time_left = LEVELS[self.level].seconds as i64;
        self.score = 0;
        self.answered = 0;
        self.answer.clear();
        self.current = make_question(&mut self.rng);
    }
}
