use rand::rngs::StdRng;
use rand::Rng;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::{make_rng, Exercise, ExerciseKind};
use crate::scheduler::Scheduler;
use crate::sound::Sound;
use crate::timer::ActiveTimer;

pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUV";
pub const STREAM_LEN: usize = 28;
pub const LAG: usize = 2;
/// Share of eligible positions forced to repeat the symbol `LAG` back.
pub const MATCH_RATE: f64 = 0.28;
/// Display window of one symbol.
pub const STEP: Duration = Duration::from_millis(1100);
/// The countdown loses one unit per symbol shown.
pub const SESSION_STEPS: i64 = 60;

/// Symbol stream with no two adjacent symbols equal and roughly
/// `MATCH_RATE` forced lag-2 repeats.
pub fn generate_stream<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(len);
    for k in 0..len {
        if k >= LAG && rng.gen_bool(MATCH_RATE) {
            // out[k-2] != out[k-1] already holds, so no adjacent repeat
            out.push(out[k - LAG]);
            continue;
        }
        let next = loop {
            let c = ALPHABET[rng.gen_range(0..ALPHABET.len())] as char;
            if k == 0 || c != out[k - 1] {
                break c;
            }
        };
        out.push(next);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Ignored,
    Hit,
    FalseAlarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Step,
}

/// Continuous recognition: signal when the symbol matches the one two back.
pub struct NBack {
    stream: Vec<char>,
    index: usize,
    time_left: i64,
    responded: bool,
    hits: u32,
    false_alarms: u32,
    missed: u32,
    phase: Phase,
    timer: ActiveTimer,
    timers: Scheduler<Timer>,
    rng: StdRng,
    sound: Rc<dyn Sound>,
}

impl NBack {
    pub fn new(sound: Rc<dyn Sound>, seed: Option<u64>) -> Self {
        let mut rng = make_rng(seed);
        let stream = generate_stream(&mut rng, STREAM_LEN);
        Self {
            stream,
            index: 0,
            time_left: SESSION_STEPS,
            responded: false,
            hits: 0,
            false_alarms: 0,
            missed: 0,
            phase: Phase::Idle,
            timer: ActiveTimer::new(),
            timers: Scheduler::new(),
            rng,
            sound,
        }
    }

    /// Start when idle or paused, pause when running.
    pub fn toggle(&mut self, now: Instant) {
        self.drain(now);
        match self.phase {
            Phase::Running => {
                self.timers.cancel_all();
                self.timer.set_running(false, now);
                self.phase = Phase::Paused;
            }
            Phase::Idle | Phase::Paused if self.time_left > 0 => {
                self.phase = Phase::Running;
                self.timer.set_running(true, now);
                self.timers.schedule_every(Timer::Step, now + STEP, STEP);
                tracing::debug!(index = self.index, "2-back running");
            }
            _ => {}
        }
    }

    pub fn is_target(&self) -> bool {
        self.index >= LAG && self.stream[self.index] == self.stream[self.index - LAG]
    }

    /// Judges a press against the symbol whose window contains `now`.
    pub fn press(&mut self, now: Instant) -> Press {
        self.drain(now);
        if self.phase != Phase::Running || self.index < LAG || self.responded {
            return Press::Ignored;
        }
        self.responded = true;
        if self.is_target() {
            self.hits += 1;
            self.sound.success();
            Press::Hit
        } else {
            self.false_alarms += 1;
            self.sound.fail();
            Press::FalseAlarm
        }
    }

    fn drain(&mut self, now: Instant) {
        while let Some((timer, at)) = self.timers.pop_due(now) {
            self.fire(timer, at);
        }
    }

    fn fire(&mut self, timer: Timer, at: Instant) {
        match timer {
            Timer::Step => {
                if self.is_target() && !self.responded {
                    self.missed += 1;
                }
                self.index = (self.index + 1) % self.stream.len();
                self.responded = false;
                self.time_left -= 1;
                if self.time_left <= 0 {
                    self.timers.cancel_all();
                    self.timer.set_running(false, at);
                    self.phase = Phase::Complete;
                    tracing::debug!(hits = self.hits, false_alarms = self.false_alarms, "2-back complete");
                }
            }
        }
    }

    pub fn current(&self) -> char {
        self.stream[self.index]
    }

    pub fn stream(&self) -> &[char] {
        &self.stream
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn time_left(&self) -> i64 {
        self.time_left.max(0)
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn false_alarms(&self) -> u32 {
        self.false_alarms
    }

    /// Targets that passed without a press.
    pub fn missed(&self) -> u32 {
        self.missed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Exercise for NBack {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::NBack
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
        self.stream = generate_stream(&mut self.rng, STREAM_LEN);
        self.index = 0;
        self.time_left = SESSION_STEPS;
        self.responded = false;
        self.hits = 0;
        self.false_alarms = 0;
        self.missed = 0;
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{Cue, RecordingSound};
    use rand::SeedableRng;

    fn game(seed: u64) -> (Rc<RecordingSound>, NBack) {
        let sound = Rc::new(RecordingSound::new());
        let game = NBack::new(sound.clone(), Some(seed));
        (sound, game)
    }

    /// Steps forward until the current symbol is (or is not) a target.
    fn seek(game: &mut NBack, now: &mut Instant, target: bool) {
        for _ in 0..STREAM_LEN {
            *now += STEP;
            game.advance(*now);
            if game.index() >= LAG && game.is_target() == target {
                return;
            }
        }
        panic!("no position with target={target} in {:?}", game.stream());
    }

    #[test]
    fn streams_never_repeat_adjacent_symbols() {
        let mut rng = StdRng::seed_from_u64(11);
        for len in 2..200 {
            let s = generate_stream(&mut rng, len);
            assert_eq!(s.len(), len);
            assert!(s.windows(2).all(|w| w[0] != w[1]), "{s:?}");
            assert!(s.iter().all(|c| ALPHABET.contains(&(*c as u8))));
        }
    }

    #[test]
    fn streams_carry_roughly_the_target_rate() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut targets = 0;
        let mut eligible = 0;
        for _ in 0..400 {
            let s = generate_stream(&mut rng, STREAM_LEN);
            for k in LAG..s.len() {
                eligible += 1;
                if s[k] == s[k - LAG] {
                    targets += 1;
                }
            }
        }
        let rate = targets as f64 / eligible as f64;
        assert!((0.25..0.36).contains(&rate), "{rate}");
    }

    #[test]
    fn press_before_start_or_in_first_two_positions_is_ignored() {
        let (_, mut game) = game(1);
        let t0 = Instant::now();
        assert_eq!(game.press(t0), Press::Ignored);
        game.toggle(t0);
        assert_eq!(game.press(t0), Press::Ignored);
        game.advance(t0 + STEP);
        assert_eq!(game.index(), 1);
        assert_eq!(game.press(t0 + STEP), Press::Ignored);
    }

    #[test]
    fn press_on_target_is_a_hit() {
        let (sound, mut game) = game(2);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, true);
        assert_eq!(game.press(now), Press::Hit);
        assert_eq!(game.hits(), 1);
        assert_eq!(sound.count(Cue::Success), 1);
    }

    #[test]
    fn press_on_non_target_is_a_false_alarm() {
        let (sound, mut game) = game(3);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, false);
        assert_eq!(game.press(now), Press::FalseAlarm);
        assert_eq!(game.false_alarms(), 1);
        assert_eq!(sound.count(Cue::Fail), 1);
    }

    #[test]
    fn one_response_per_symbol() {
        let (_, mut game) = game(4);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, true);
        assert_eq!(game.press(now), Press::Hit);
        assert_eq!(game.press(now), Press::Ignored);
        assert_eq!(game.hits(), 1);
    }

    #[test]
    fn unanswered_target_counts_as_missed() {
        let (_, mut game) = game(5);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, true);
        now += STEP;
        game.advance(now);
        assert_eq!(game.missed(), 1);
    }

    #[test]
    fn countdown_ends_after_sixty_steps() {
        let (_, mut game) = game(6);
        let t0 = Instant::now();
        game.toggle(t0);
        game.advance(t0 + STEP * 59);
        assert_eq!(game.time_left(), 1);
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.index(), 59 % STREAM_LEN);
        game.advance(t0 + STEP * 60);
        assert_eq!(game.time_left(), 0);
        assert_eq!(game.phase(), Phase::Complete);
        assert!(!game.is_running());
        assert_eq!(game.press(t0 + STEP * 60), Press::Ignored);

        game.toggle(t0 + STEP * 61);
        assert_eq!(game.phase(), Phase::Complete);
    }

    #[test]
    fn pause_stops_the_stream() {
        let (_, mut game) = game(7);
        let t0 = Instant::now();
        game.toggle(t0);
        game.advance(t0 + STEP * 3);
        game.toggle(t0 + STEP * 3);
        assert_eq!(game.phase(), Phase::Paused);
        game.advance(t0 + STEP * 30);
        assert_eq!(game.index(), 3);
        assert_eq!(game.time_left(), 57);
    }

    #[test]
    fn restart_draws_a_fresh_stream_and_clears_scores() {
        let (_, mut game) = game(8);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, false);
        game.press(now);
        game.restart(now);
        assert_eq!(game.false_alarms(), 0);
        assert_eq!(game.index(), 0);
        assert_eq!(game.time_left(), SESSION_STEPS);
        assert_eq!(game.phase(), Phase::Idle);
        game.advance(now + STEP * 5);
        assert_eq!(game.index(), 0);
    }

    #[test]
    fn press_after_a_step_boundary_judges_the_new_symbol() {
        // a non-target immediately followed by a target
        let (mut game, k) = (9u64..)
            .find_map(|seed| {
                let (_, g) = game(seed);
                let s = g.stream().to_vec();
                (LAG..STREAM_LEN - 1)
                    .find(|&k| s[k] != s[k - LAG] && s[k + 1] == s[k + 1 - LAG])
                    .map(|k| (g, k))
            })
            .unwrap();
        let t0 = Instant::now();
        game.toggle(t0);
        game.advance(t0 + STEP * k as u32);
        assert_eq!(game.index(), k);
        assert!(!game.is_target());

        // the step is due but no tick has run yet
        assert_eq!(game.press(t0 + STEP * (k as u32 + 1)), Press::Hit);
        assert_eq!(game.index(), k + 1);
        assert_eq!(game.false_alarms(), 0);
    }

    #[test]
    fn press_after_the_last_step_is_ignored() {
        let (_, mut game) = game(10);
        let t0 = Instant::now();
        game.toggle(t0);
        game.advance(t0 + STEP * 59);
        assert_eq!(game.press(t0 + STEP * 60), Press::Ignored);
        assert_eq!(game.phase(), Phase::Complete);
        assert_eq!(game.hits() + game.false_alarms(), 0);
    }

    #[test]
    fn pause_mid_step_keeps_the_response_and_resumes_the_stream() {
        let (_, mut game) = game(11);
        let mut now = Instant::now();
        game.toggle(now);
        seek(&mut game, &mut now, true);
        let shown = game.index();
        let missed = game.missed();
        assert_eq!(game.press(now + STEP / 2), Press::Hit);
        game.toggle(now + STEP / 2);
        assert_eq!(game.phase(), Phase::Paused);

        let resumed = now + Duration::from_secs(10);
        game.toggle(resumed);
        assert_eq!(game.phase(), Phase::Running);
        assert_eq!(game.index(), shown);
        assert_eq!(game.press(resumed), Press::Ignored);
        assert_eq!(game.hits(), 1);

        game.advance(resumed + STEP);
        assert_eq!(game.index(), (shown + 1) % STREAM_LEN);
        assert_eq!(game.missed(), missed);
    }

    #[test]
    fn pausing_after_a_due_step_applies_it_first() {
        let (_, mut game) = game(12);
        let t0 = Instant::now();
        game.toggle(t0);
        game.toggle(t0 + STEP * 3);
        assert_eq!(game.index(), 3);
        assert_eq!(game.time_left(), SESSION_STEPS - 3);
    }
}
