use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;

use mindtick::exercise::memory::{self, Flip};
use mindtick::exercise::nback::generate_stream;
use mindtick::exercise::path::{self, Pick};
use mindtick::exercise::{Exercise, MemoryMatch, PathFinder};
use mindtick::sound::{Cue, RecordingSound};
use mindtick::store::MemoryStore;

#[test]
fn memory_board_solved_in_sixteen_flips() {
    let sound = Rc::new(RecordingSound::new());
    let mut game = MemoryMatch::new(sound.clone(), Some(17));
    let mut pairs: HashMap<char, Vec<usize>> = HashMap::new();
    for (idx, symbol) in game.deck().iter().enumerate() {
        pairs.entry(*symbol).or_default().push(idx);
    }

    let t0 = Instant::now();
    let mut last = Flip::Ignored;
    for (n, positions) in pairs.values().enumerate() {
        let now = t0 + Duration::from_secs(n as u64);
        game.flip(positions[0], now);
        last = game.flip(positions[1], now);
        game.advance(now);
    }

    assert_matches!(last, Flip::Completed { score } if score <= 1000);
    assert_eq!(game.matched_pairs(), game.pair_count());
    assert_eq!(game.moves(), 8);
    assert_matches!(game.phase(), memory::Phase::Complete { .. });
    assert!(!game.is_running());
    assert_eq!(sound.count(Cue::Fail), 0);
}

#[test]
fn nback_streams_have_no_adjacent_repeats() {
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(99);
    for _ in 0..100 {
        let stream = generate_stream(&mut rng, 28);
        assert!(stream.windows(2).all(|w| w[0] != w[1]));
    }
}

#[test]
fn path_reproduction_completes_once_then_starts_next_task() {
    let sound = Rc::new(RecordingSound::new());
    let store = Rc::new(MemoryStore::new());
    let mut game = PathFinder::new(sound, store, Some(8));
    let mut now = Instant::now();
    game.start_session(now);
    while matches!(game.phase(), path::Phase::Showing { .. }) {
        now += Duration::from_millis(game.reveal_ms());
        game.advance(now);
    }

    let points = game.points().to_vec();
    let picks: Vec<Pick> = points
        .iter()
        .map(|p| game.select_at(p.x, p.y, now))
        .collect();
    assert_eq!(
        picks,
        [Pick::Correct, Pick::Correct, Pick::TaskComplete]
    );
    assert_eq!(game.tasks_done(), 1);

    now += path::TRANSITION;
    game.advance(now);
    assert_eq!(game.tasks_started(), 2);
    assert_matches!(game.phase(), path::Phase::Showing { revealed: 0 });
    assert_eq!(game.tasks_done(), 1);
}
