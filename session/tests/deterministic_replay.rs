use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use mnemosyne_core::{
    Archetype, Command, Event, InputEvent, LevelDefinition, LevelGoal, MutedSink, Phase,
    SessionSnapshot,
};
use mnemosyne_session::{query, LevelTable, SessionConfig, SessionController};

const PLAY_TIME: Duration = Duration::from_secs(12);

#[test]
fn chunking_does_not_change_the_trajectory() {
    let coarse = replay(Duration::from_millis(500));
    let fine = replay(Duration::from_millis(50));
    let ragged = replay(Duration::from_millis(35));

    assert_eq!(coarse.snapshot, fine.snapshot, "500ms vs 50ms diverged");
    assert_eq!(fine.snapshot, ragged.snapshot, "50ms vs 35ms diverged");
    assert_eq!(coarse.fingerprint(), fine.fingerprint());
}

#[test]
fn identical_seeds_replay_identically() {
    let first = replay(Duration::from_millis(100));
    let second = replay(Duration::from_millis(100));
    let fingerprint = first.fingerprint();
    assert_eq!(
        fingerprint,
        second.fingerprint(),
        "fingerprint mismatch: {fingerprint:#x}"
    );
}

#[test]
fn intro_overflow_is_played_in_the_same_tick() {
    let whole = across_boundaries(&[Duration::from_millis(4_500)]);
    let split = across_boundaries(&[Duration::from_millis(4_000), Duration::from_millis(500)]);

    assert_eq!(whole.snapshot.phase, Phase::Playing);
    assert_eq!(whole.snapshot.level_elapsed, Duration::from_millis(500));
    assert_eq!(whole.snapshot, split.snapshot);
    assert_eq!(whole.events, split.events);
}

#[test]
fn time_left_after_a_level_flows_into_the_next_intro() {
    // Two intros, the one-second level, and 2.5s into the second level.
    let total = Duration::from_millis(11_500);
    let whole = across_boundaries(&[total]);
    assert_eq!(whole.snapshot.level_index, 1);
    assert_eq!(whole.snapshot.phase, Phase::Playing);
    assert_eq!(whole.snapshot.level_elapsed, Duration::from_millis(2_500));

    for chunk in [700, 333, 1_025, 50] {
        let chunks = chunked(total, Duration::from_millis(chunk));
        let outcome = across_boundaries(&chunks);
        assert_eq!(outcome.snapshot, whole.snapshot, "{chunk}ms chunks diverged");
        assert_eq!(outcome.fingerprint(), whole.fingerprint());
    }
}

fn chunked(total: Duration, chunk: Duration) -> Vec<Duration> {
    let mut chunks = Vec::new();
    let mut left = total;
    while !left.is_zero() {
        let dt = chunk.min(left);
        chunks.push(dt);
        left -= dt;
    }
    chunks
}

fn across_boundaries(ticks: &[Duration]) -> ReplayOutcome {
    let mut config = SessionConfig::with_seed(0xb0a7);
    config.simulator.approach.creep_chance = 0.0;
    let levels = LevelTable::new(vec![
        LevelDefinition::new(
            Archetype::Approach,
            LevelGoal::Survive(Duration::from_secs(1)),
            "ONE",
        ),
        LevelDefinition::new(
            Archetype::Approach,
            LevelGoal::Survive(Duration::from_secs(60)),
            "TWO",
        ),
    ])
    .expect("valid table");
    let mut session = SessionController::with_levels(config, levels, MutedSink);
    let mut log = Vec::new();

    let mut events = Vec::new();
    session.apply(Command::Input(InputEvent::Confirm), &mut events);
    session.apply(Command::Input(InputEvent::Confirm), &mut events);
    record(&events, &mut log);
    for &dt in ticks {
        let mut events = Vec::new();
        session.apply(Command::Tick { dt }, &mut events);
        record(&events, &mut log);
    }

    ReplayOutcome {
        snapshot: query::snapshot(&session),
        events: log,
    }
}

struct ReplayOutcome {
    snapshot: SessionSnapshot,
    events: Vec<String>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.snapshot).hash(&mut hasher);
        self.events.hash(&mut hasher);
        hasher.finish()
    }
}

fn replay(chunk: Duration) -> ReplayOutcome {
    let config = SessionConfig::with_seed(0xfeed);
    let mut session = SessionController::new(config, MutedSink);
    let mut log = Vec::new();

    for command in scripted_prelude() {
        let mut events = Vec::new();
        session.apply(command, &mut events);
        record(&events, &mut log);
    }

    // Eyes toggle on whole-second boundaries so every chunking sees the same edges.
    let mut elapsed = Duration::ZERO;
    let mut next_edge = Duration::from_secs(1);
    let mut closed = false;
    while elapsed < PLAY_TIME {
        let mut events = Vec::new();
        let dt = chunk.min(next_edge - elapsed);
        session.apply(Command::Tick { dt }, &mut events);
        elapsed += dt;
        if elapsed == next_edge {
            closed = !closed;
            let input = if closed {
                InputEvent::EyeDown
            } else {
                InputEvent::EyeUp
            };
            session.apply(Command::Input(input), &mut events);
            next_edge += Duration::from_secs(1);
        }
        record(&events, &mut log);
    }

    ReplayOutcome {
        snapshot: query::snapshot(&session),
        events: log,
    }
}

fn scripted_prelude() -> Vec<Command> {
    vec![
        Command::Input(InputEvent::Confirm),
        Command::Input(InputEvent::Confirm),
        Command::Tick {
            dt: Duration::from_secs(4),
        },
    ]
}

fn record(events: &[Event], log: &mut Vec<String>) {
    log.extend(
        events
            .iter()
            .filter(|event| !matches!(event, Event::PhaseChanged { .. }))
            .map(|event| format!("{event:?}")),
    );
}
