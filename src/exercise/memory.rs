use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{make_rng, Exercise, ExerciseKind};
use crate::scheduler::Scheduler;
use crate::sound::Sound;
use crate::timer::ActiveTimer;

pub const SYMBOLS: [char; 8] = ['◆', '●', '▲', '■', '★', '♣', '♥', '✿'];
/// How long a mismatched pair stays face up.
pub const MISMATCH_DELAY: Duration = Duration::from_millis(600);
/// Finishing later than this earns no time bonus.
pub const TIME_BUDGET_SECS: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fresh board, timer not started.
    Ready,
    Playing,
    /// Two unmatched cards are showing; input is rejected until they turn back.
    Mismatch,
    Complete { score: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    Ignored,
    Revealed,
    Matched,
    Mismatched,
    Completed { score: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    FlipBack,
}

/// `round(1000 * (0.7 * efficiency + 0.3 * time_factor))`, always in `0..=1000`.
pub fn score(pairs: u32, moves: u32, elapsed_secs: u64) -> u32 {
    let efficiency = pairs as f64 / moves.max(pairs).max(1) as f64;
    let time_factor = (1.0 - elapsed_secs as f64 / TIME_BUDGET_SECS).max(0.0);
    let raw = (1000.0 * (0.7 * efficiency + 0.3 * time_factor)).round();
    raw.clamp(0.0, 1000.0) as u32
}

/// Pair matching on a shuffled 4x4 board.
pub struct MemoryMatch {
    deck: Vec<char>,
    flipped: Vec<usize>,
    matched: Vec<bool>,
    moves: u32,
    phase: Phase,
    final_elapsed: u64,
    timer: ActiveTimer,
    timers: Scheduler<Timer>,
    rng: StdRng,
    sound: Rc<dyn Sound>,
}

impl MemoryMatch {
    pub fn new(sound: Rc<dyn Sound>, seed: Option<u64>) -> Self {
        let mut game = Self {
            deck: Vec::new(),
            flipped: Vec::new(),
            matched: Vec::new(),
            moves: 0,
            phase: Phase::Ready,
            final_elapsed: 0,
            timer: ActiveTimer::new(),
            timers: Scheduler::new(),
            rng: make_rng(seed),
            sound,
        };
        game.deal();
        game
    }

    fn deal(&mut self) {
        let mut deck: Vec<char> = SYMBOLS.iter().chain(SYMBOLS.iter()).copied().collect();
        deck.shuffle(&mut self.rng);
        self.matched = vec![false; deck.len()];
        self.deck = deck;
        self.flipped.clear();
        self.moves = 0;
        self.final_elapsed = 0;
        self.phase = Phase::Ready;
    }

    pub fn flip(&mut self, idx: usize, now: Instant) -> Flip {
        if matches!(self.phase, Phase::Complete { .. } | Phase::Mismatch) || idx >= self.deck.len()
        {
            return Flip::Ignored;
        }
        if self.phase == Phase::Ready {
            self.phase = Phase::Playing;
            self.timer.set_running(true, now);
            tracing::debug!("memory match started");
        }
        self.sound.click();
        if self.matched[idx] || self.flipped.contains(&idx) {
            return Flip::Ignored;
        }

        self.flipped.push(idx);
        if self.flipped.len() < 2 {
            return Flip::Revealed;
        }

        self.moves += 1;
        let (a, b) = (self.flipped[0], self.flipped[1]);
        if self.deck[a] == self.deck[b] {
            self.matched[a] = true;
            self.matched[b] = true;
            self.flipped.clear();
            self.sound.success();
            if self.matched.iter().all(|m| *m) {
                let score = self.complete(now);
                return Flip::Completed { score };
            }
            Flip::Matched
        } else {
            self.phase = Phase::Mismatch;
            self.timers.schedule_once(Timer::FlipBack, now + MISMATCH_DELAY);
            Flip::Mismatched
        }
    }

    fn complete(&mut self, now: Instant) -> u32 {
        self.final_elapsed = self.timer.elapsed_at(now);
        let score = score(self.pair_count(), self.moves, self.final_elapsed);
        self.timer.set_running(false, now);
        self.timers.cancel_all();
        self.phase = Phase::Complete { score };
        tracing::debug!(score, moves = self.moves, secs = self.final_elapsed, "memory match complete");
        score
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::FlipBack => {
                self.flipped.clear();
                self.sound.fail();
                if self.phase == Phase::Mismatch {
                    self.phase = Phase::Playing;
                }
            }
        }
    }

    pub fn deck(&self) -> &[char] {
        &self.deck
    }

    pub fn is_face_up(&self, idx: usize) -> bool {
        self.flipped.contains(&idx) || self.matched.get(idx).copied().unwrap_or(false)
    }

    pub fn is_matched(&self, idx: usize) -> bool {
        self.matched.get(idx).copied().unwrap_or(false)
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pair_count(&self) -> u32 {
        (self.deck.len() / 2) as u32
    }

    pub fn matched_pairs(&self) -> u32 {
        (self.matched.iter().filter(|m| **m).count() / 2) as u32
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds on the clock when the last pair was found.
    pub fn final_elapsed(&self) -> u64 {
        self.final_elapsed
    }
}

impl Exercise for MemoryMatch {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Memory
    }

    fn advance(&mut self, now: Instant) {
        while let Some((timer, _)) = self.timers.pop_due(now) {
            self.fire(timer);
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
        self.timers.cancel_all();
        self.timer.set_running(false, now);
        self.deal();
    }
}
