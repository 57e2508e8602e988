//! The five timed mini-games.
//!
//! Every exercise is a self-contained state machine: it owns its round
//! state, a [`Scheduler`](crate::scheduler::Scheduler) for its own delays and
//! countdowns, an [`ActiveTimer`](crate::timer::ActiveTimer) for practice
//! credit, and a seedable RNG. The host calls [`Exercise::advance`] on every
//! tick and forwards [`Exercise::elapsed_seconds`] to the credit bridge.

pub mod math;
pub mod memory;
pub mod nback;
pub mod path;
pub mod stroop;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub use math::MathBlitz;
pub use memory::MemoryMatch;
pub use nback::NBack;
pub use path::PathFinder;
pub use stroop::Stroop;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    #[strum(serialize = "Memory Match")]
    Memory,
    #[strum(serialize = "Stroop")]
    Stroop,
    #[strum(serialize = "2-Back")]
    #[value(name = "nback")]
    NBack,
    #[strum(serialize = "Math Blitz")]
    Math,
    #[strum(serialize = "Path Finder")]
    Path,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::Memory,
        ExerciseKind::Stroop,
        ExerciseKind::NBack,
        ExerciseKind::Math,
        ExerciseKind::Path,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Operations every exercise shares with the host loop.
pub trait Exercise {
    fn kind(&self) -> ExerciseKind;

    /// Fires every timer due at or before `now`, in order, then samples the
    /// practice timer.
    fn advance(&mut self, now: Instant);

    /// Whole seconds of the current running stretch; zero when stopped.
    fn elapsed_seconds(&self) -> u64;

    fn is_running(&self) -> bool;

    /// Back to initial state with a fresh stimulus set. Cancels every timer.
    fn restart(&mut self, now: Instant);
}

pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cycle_in_both_directions() {
        let mut kind = ExerciseKind::Memory;
        for _ in 0..ExerciseKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, ExerciseKind::Memory);
        assert_eq!(ExerciseKind::Memory.prev(), ExerciseKind::Path);
        assert_eq!(ExerciseKind::Path.next(), ExerciseKind::Memory);
    }

    #[test]
    fn display_names_match_picker_labels() {
        assert_eq!(ExerciseKind::NBack.to_string(), "2-Back");
        assert_eq!(ExerciseKind::Math.to_string(), "Math Blitz");
    }

    #[test]
    fn kinds_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExerciseKind::NBack).unwrap(),
            "\"nback\""
        );
        let parsed: ExerciseKind = serde_json::from_str("\"path\"").unwrap();
        assert_eq!(parsed, ExerciseKind::Path);
    }
}
