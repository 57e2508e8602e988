use std::rc::Rc;
use std::time::Instant;

use crate::credit::CreditBridge;
use crate::exercise::{Exercise, ExerciseKind, MathBlitz, MemoryMatch, NBack, PathFinder, Stroop};
use crate::progress::DailyProgress;
use crate::report::ProgressSummary;
use crate::sound::Sound;
use crate::store::KvStore;

/// The exercise currently mounted in the host.
pub enum ActiveExercise {
    Memory(MemoryMatch),
    Stroop(Stroop),
    NBack(NBack),
    Math(MathBlitz),
    Path(PathFinder),
}

impl std::fmt::Debug for ActiveExercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActiveExercise::Memory(_) => "Memory",
            ActiveExercise::Stroop(_) => "Stroop",
            ActiveExercise::NBack(_) => "NBack",
            ActiveExercise::Math(_) => "Math",
            ActiveExercise::Path(_) => "Path",
        };
        f.debug_tuple(name).finish_non_exhaustive()
    }
}

impl ActiveExercise {
    pub fn as_exercise(&self) -> &dyn Exercise {
        match self {
            ActiveExercise::Memory(e) => e,
            ActiveExercise::Stroop(e) => e,
            ActiveExercise::NBack(e) => e,
            ActiveExercise::Math(e) => e,
            ActiveExercise::Path(e) => e,
        }
    }

    pub fn as_exercise_mut(&mut self) -> &mut dyn Exercise {
        match self {
            ActiveExercise::Memory(e) => e,
            ActiveExercise::Stroop(e) => e,
            ActiveExercise::NBack(e) => e,
            ActiveExercise::Math(e) => e,
            ActiveExercise::Path(e) => e,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.as_exercise().kind()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainerSettings {
    pub exercise: ExerciseKind,
    pub stroop_level: usize,
    pub math_level: usize,
    /// Base seed for every exercise RNG; `None` draws from entropy.
    pub seed: Option<u64>,
}

/// Owns the daily tracker, the credit bridge and the mounted exercise, and
/// wires elapsed practice time from one to the other on every tick.
pub struct Trainer {
    store: Rc<dyn KvStore>,
    sound: Rc<dyn Sound>,
    settings: TrainerSettings,
    mounts: u64,
    progress: DailyProgress,
    bridge: CreditBridge,
    active: ActiveExercise,
}

impl Trainer {
    pub fn new(store: Rc<dyn KvStore>, sound: Rc<dyn Sound>, settings: TrainerSettings) -> Self {
        let progress = DailyProgress::load(store.clone());
        let active = build(settings.exercise, &store, &sound, &settings, 0);
        Self {
            store,
            sound,
            settings,
            mounts: 0,
            progress,
            bridge: CreditBridge::new(),
            active,
        }
    }

    /// Tears down the current exercise and mounts a fresh `kind`. Any
    /// credit still settling keeps its flush deadline.
    pub fn switch_to(&mut self, kind: ExerciseKind, now: Instant) {
        self.tick(now);
        self.capture_levels();
        self.mounts += 1;
        self.settings.exercise = kind;
        self.active = build(kind, &self.store, &self.sound, &self.settings, self.mounts);
        tracing::info!(exercise = %kind, "mounted exercise");
    }

    pub fn next_exercise(&mut self, now: Instant) {
        self.switch_to(self.active.kind().next(), now);
    }

    pub fn prev_exercise(&mut self, now: Instant) {
        self.switch_to(self.active.kind().prev(), now);
    }

    /// Advances the exercise, forwards its elapsed seconds and settles credit.
    pub fn tick(&mut self, now: Instant) {
        let exercise = self.active.as_exercise_mut();
        exercise.advance(now);
        let elapsed = exercise.elapsed_seconds();
        self.bridge.report(elapsed, now);
        self.bridge.advance(now, &mut self.progress);
    }

    /// Credits anything still pending. Call before exit.
    pub fn shutdown(&mut self, now: Instant) {
        self.tick(now);
        self.bridge.flush(&mut self.progress);
        self.capture_levels();
    }

    fn capture_levels(&mut self) {
        match &self.active {
            ActiveExercise::Stroop(e) => self.settings.stroop_level = e.level_index(),
            ActiveExercise::Math(e) => self.settings.math_level = e.level_index(),
            _ => {}
        }
    }

    pub fn active(&self) -> &ActiveExercise {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut ActiveExercise {
        &mut self.active
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    pub fn bridge(&self) -> &CreditBridge {
        &self.bridge
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary::of(&self.progress)
    }

    /// Current exercise and level choices, for saving back to config.
    pub fn settings(&self) -> TrainerSettings {
        let mut settings = self.settings;
        match &self.active {
            ActiveExercise::Stroop(e) => settings.stroop_level = e.level_index(),
            ActiveExercise::Math(e) => settings.math_level = e.level_index(),
            _ => {}
        }
        settings
    }
}

fn build(
    kind: ExerciseKind,
    store: &Rc<dyn KvStore>,
    sound: &Rc<dyn Sound>,
    settings: &TrainerSettings,
    mounts: u64,
) -> ActiveExercise {
    let seed = settings.seed.map(|s| s.wrapping_add(mounts));
    let sound = sound.clone();
    match kind {
        ExerciseKind::Memory => ActiveExercise::Memory(MemoryMatch::new(sound, seed)),
        ExerciseKind::Stroop => ActiveExercise::Stroop(Stroop::new(sound, settings.stroop_level, seed)),
        ExerciseKind::NBack => ActiveExercise::NBack(NBack::new(sound, seed)),
        ExerciseKind::Math => ActiveExercise::Math(MathBlitz::new(sound, settings.math_level, seed)),
        ExerciseKind::Path => ActiveExercise::Path(PathFinder::new(sound, store.clone(), seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::Silent;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn trainer(kind: ExerciseKind) -> (Rc<MemoryStore>, Trainer) {
        let store = Rc::new(MemoryStore::new());
        let settings = TrainerSettings {
            exercise: kind,
            seed: Some(7),
            ..TrainerSettings::default()
        };
        let trainer = Trainer::new(store.clone(), Rc::new(Silent), settings);
        (store, trainer)
    }

    #[test]
    fn mounts_the_configured_exercise() {
        let (_, trainer) = trainer(ExerciseKind::NBack);
        assert_matches!(trainer.active(), ActiveExercise::NBack(_));
        assert_eq!(trainer.summary().today_seconds, 0);
    }

    #[test]
    fn switching_cycles_and_remounts() {
        let (_, mut trainer) = trainer(ExerciseKind::Memory);
        let t0 = Instant::now();
        trainer.prev_exercise(t0);
        assert_eq!(trainer.active().kind(), ExerciseKind::Path);
        trainer.next_exercise(t0);
        trainer.next_exercise(t0);
        assert_eq!(trainer.active().kind(), ExerciseKind::Stroop);
    }

    #[test]
    fn running_exercise_earns_credit_after_settling() {
        let (_, mut trainer) = trainer(ExerciseKind::NBack);
        let t0 = Instant::now();
        if let ActiveExercise::NBack(game) = trainer.active_mut() {
            game.toggle(t0);
        }
        let mut now = t0;
        while now < t0 + Duration::from_secs(5) {
            now += crate::timer::POLL_INTERVAL;
            trainer.tick(now);
        }
        // the last increase at 5s is still settling
        assert_eq!(trainer.progress().today_seconds(), 0);
        assert_eq!(trainer.bridge().pending(), 5);

        if let ActiveExercise::NBack(game) = trainer.active_mut() {
            game.toggle(now);
        }
        trainer.tick(now + Duration::from_millis(1500));
        assert_eq!(trainer.progress().today_seconds(), 5);
    }

    #[test]
    fn shutdown_flushes_pending_credit() {
        let (_, mut trainer) = trainer(ExerciseKind::Path);
        let t0 = Instant::now();
        if let ActiveExercise::Path(game) = trainer.active_mut() {
            game.start_session(t0);
        }
        trainer.tick(t0 + Duration::from_secs(3));
        trainer.shutdown(t0 + Duration::from_secs(3));
        assert_eq!(trainer.progress().today_seconds(), 3);
        assert_eq!(trainer.bridge().pending(), 0);
    }

    #[test]
    fn switching_keeps_settling_credit() {
        let (_, mut trainer) = trainer(ExerciseKind::Path);
        let t0 = Instant::now();
        if let ActiveExercise::Path(game) = trainer.active_mut() {
            game.start_session(t0);
        }
        trainer.tick(t0 + Duration::from_secs(4));
        trainer.switch_to(ExerciseKind::Math, t0 + Duration::from_secs(4));
        trainer.tick(t0 + Duration::from_millis(5600));
        assert_eq!(trainer.progress().today_seconds(), 4);
    }

    #[test]
    fn settings_report_chosen_levels() {
        let (_, mut trainer) = trainer(ExerciseKind::Math);
        let t0 = Instant::now();
        if let ActiveExercise::Math(game) = trainer.active_mut() {
            game.select_level(2, t0);
        }
        trainer.switch_to(ExerciseKind::Stroop, t0);
        if let ActiveExercise::Stroop(game) = trainer.active_mut() {
            game.select_level(1, t0);
        }
        let settings = trainer.settings();
        assert_eq!(settings.math_level, 2);
        assert_eq!(settings.stroop_level, 1);
        assert_eq!(settings.exercise, ExerciseKind::Stroop);
    }
}
