use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use ascii_wars_core::{Direction, Event, GameConfig};
use ascii_wars_headless::{FrameInput, Session};
use ascii_wars_world::query;

const FRAME: Duration = Duration::from_millis(50);

#[test]
fn deterministic_replay_produces_identical_logs() {
    let first = replay(0x5eed);
    let second = replay(0x5eed);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first.events.iter().any(|line| line.starts_with("EntityMoved")),
        "no entity ever moved"
    );
}

#[test]
fn different_seeds_build_different_runs() {
    assert_ne!(replay(1).fingerprint(), replay(2).fingerprint());
}

#[test]
fn events_serialize_as_json_lines() {
    let mut session = Session::new(GameConfig::default(), 11).expect("valid config");
    let mut events = Vec::new();
    session.start(1, &mut events).expect("level builds");
    for frame in 0..40 {
        session
            .frame(FRAME, scripted_input(frame), &mut events)
            .expect("frame");
    }

    for event in &events {
        let line = serde_json::to_string(event).expect("events serialize");
        assert!(!line.contains('\n'));
    }
    let first = serde_json::to_value(&events[0]).expect("events serialize");
    assert!(first.get("LevelLoaded").is_some());
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut session = Session::new(GameConfig::default(), seed).expect("valid config");
    let mut events = Vec::new();
    session.start(1, &mut events).expect("level builds");

    for frame in 0..600 {
        session
            .frame(FRAME, scripted_input(frame), &mut events)
            .expect("frame");
    }

    let world = session.world();
    ReplayOutcome {
        events: events.iter().map(record).collect(),
        score: query::score(world),
        level: query::level(world),
        player: format!("{:?}", query::player(world)),
    }
}

fn scripted_input(frame: u32) -> FrameInput {
    let movement = match (frame / 12) % 4 {
        0 => Direction::East,
        1 => Direction::South,
        2 => Direction::West,
        _ => Direction::North,
    };
    FrameInput {
        movement: Some(movement),
        fire: (frame % 45 == 0).then_some(movement),
    }
}

fn record(event: &Event) -> String {
    format!("{event:?}")
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    events: Vec<String>,
    score: u32,
    level: u32,
    player: String,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
