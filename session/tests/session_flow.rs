use std::time::Duration;

use mnemosyne_core::{
    Archetype, AudioCue, CutsceneStage, Event, FailureCause, InputEvent, LevelDefinition,
    LevelGoal, Meter, Phase, FIXED_STEP,
};
use mnemosyne_session::{query, LevelTable, SessionConfig, SessionController};

type Session = SessionController<Vec<AudioCue>>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn play(session: &mut Session, events: &mut Vec<Event>) {
    session.dispatch_input(InputEvent::Confirm, events);
    session.dispatch_input(InputEvent::Confirm, events);
    session.tick(session.config().intro_delay, events);
    assert_eq!(session.phase(), Phase::Playing);
}

fn steps(session: &mut Session, count: u32, events: &mut Vec<Event>) {
    for _ in 0..count {
        session.tick(FIXED_STEP, events);
    }
}

fn single_level(level: LevelDefinition, config: SessionConfig) -> Session {
    let levels = LevelTable::new(vec![level]).expect("valid table");
    SessionController::with_levels(config, levels, Vec::new())
}

#[test]
fn open_eyes_dry_out_at_the_expected_step() {
    init_logging();
    let mut session = SessionController::new(SessionConfig::with_seed(17), Vec::new());
    let mut events = Vec::new();
    play(&mut session, &mut events);

    steps(&mut session, 249, &mut events);
    assert_eq!(session.phase(), Phase::Playing);
    steps(&mut session, 1, &mut events);

    assert_eq!(session.phase(), Phase::GameOver);
    assert!(events.contains(&Event::GameOver {
        cause: FailureCause::Dryness
    }));
    assert_eq!(session.failure_log().len(), 1);
    assert!(session.failure_log()[0].contains(FailureCause::Dryness.marker()));
    assert!(session.sink().contains(&AudioCue::TensionOff));
}

#[test]
fn reset_after_game_over_restores_initial_values() {
    init_logging();
    let mut session = SessionController::new(SessionConfig::with_seed(5), Vec::new());
    let mut events = Vec::new();
    play(&mut session, &mut events);
    session.dispatch_input(InputEvent::EyeDown, &mut events);
    steps(&mut session, 40, &mut events);
    session.dispatch_input(InputEvent::EyeUp, &mut events);
    steps(&mut session, 400, &mut events);
    assert_eq!(session.phase(), Phase::GameOver);

    events.clear();
    session.dispatch_input(InputEvent::Confirm, &mut events);
    assert_reset(&session, &events);

    // Resetting twice in a row is not possible from Boot; confirm starts a new run instead.
    session.dispatch_input(InputEvent::Confirm, &mut events);
    assert_eq!(session.phase(), Phase::LevelIntro);
}

#[test]
fn victory_plays_the_finale_with_carry_over() {
    init_logging();
    let mut config = SessionConfig::with_seed(3);
    config.simulator.origin.open_progress = Meter::MAX_MILLI;
    let mut session = single_level(
        LevelDefinition::new(Archetype::Origin, LevelGoal::Progress, "CORE"),
        config,
    );
    let mut events = Vec::new();
    play(&mut session, &mut events);
    steps(&mut session, 1, &mut events);

    assert_eq!(session.phase(), Phase::Cutscene);
    assert!(events.contains(&Event::LevelCompleted { index: 0 }));
    assert!(!query::scheduler_running(&session));
    assert!(session
        .sink()
        .contains(&AudioCue::MasterGain { scale: 0.3 }));

    session.tick(Duration::from_millis(2_500), &mut events);
    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.cutscene_stage, Some(CutsceneStage::Blackout));

    session.tick(Duration::from_millis(3_499), &mut events);
    assert_eq!(session.phase(), Phase::Cutscene);
    session.tick(Duration::from_millis(1), &mut events);
    assert_eq!(session.phase(), Phase::Victory);
    assert_eq!(
        session.sink().last(),
        Some(&AudioCue::MasterGain { scale: 1.0 })
    );

    events.clear();
    session.dispatch_input(InputEvent::Confirm, &mut events);
    assert_reset(&session, &events);
}

#[test]
fn finale_can_be_skipped() {
    let mut config = SessionConfig::with_seed(3);
    config.finale = false;
    config.simulator.origin.open_progress = Meter::MAX_MILLI;
    let mut session = single_level(
        LevelDefinition::new(Archetype::Origin, LevelGoal::Progress, "CORE"),
        config,
    );
    let mut events = Vec::new();
    play(&mut session, &mut events);
    steps(&mut session, 1, &mut events);
    assert_eq!(session.phase(), Phase::Victory);
    assert!(events.contains(&Event::Victory));
}

#[test]
fn levels_advance_through_a_fresh_intro() {
    let mut config = SessionConfig::with_seed(9);
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
    let mut session = SessionController::with_levels(config, levels, Vec::new());
    let mut events = Vec::new();
    play(&mut session, &mut events);
    steps(&mut session, 20, &mut events);

    assert_eq!(session.phase(), Phase::LevelIntro);
    assert_eq!(session.level_index(), 1);
    assert!(!query::scheduler_running(&session));
    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.moisture, Meter::full());
    assert_eq!(snapshot.level_elapsed, Duration::ZERO);
    assert_eq!(snapshot.level_title, "TWO");

    // Scheduler timers never carry over: nothing fires before the minimum delay.
    events.clear();
    session.tick(session.config().intro_delay, &mut events);
    assert!(query::scheduler_running(&session));
    steps(&mut session, 59, &mut events);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::PhantomTriggered { .. })));
}

#[test]
fn nothing_fires_after_leaving_play() {
    let mut config = SessionConfig::with_seed(12);
    config.scheduler.phantom.base_chance = 1.0;
    config.scheduler.phantom.max_chance = 1.0;
    config.scheduler.flash.chance = 1.0;
    let mut session = SessionController::new(config, Vec::new());
    let mut events = Vec::new();
    play(&mut session, &mut events);
    steps(&mut session, 250, &mut events);
    assert_eq!(session.phase(), Phase::GameOver);
    assert!(!query::scheduler_running(&session));

    events.clear();
    session.tick(Duration::from_secs(120), &mut events);
    assert!(events.is_empty());
}

#[test]
fn panic_penalty_ignores_eye_closure_for_its_full_length() {
    init_logging();
    let mut config = SessionConfig::with_seed(21);
    config.simulator.reflection.toggle_chance = 0.0;
    let mut session = single_level(
        LevelDefinition::new(
            Archetype::Reflection,
            LevelGoal::Survive(Duration::from_secs(600)),
            "MIRROR",
        ),
        config,
    );
    let mut events = Vec::new();
    play(&mut session, &mut events);
    session.dispatch_input(InputEvent::EyeDown, &mut events);

    let mut guard = 0;
    while !events.contains(&Event::PanicOverflow) {
        steps(&mut session, 1, &mut events);
        guard += 1;
        assert!(guard < 1_000, "panic never overflowed");
    }
    assert!(!query::snapshot(&session).eyes_closed);

    for step in 1..=50 {
        events.clear();
        steps(&mut session, 1, &mut events);
        session.dispatch_input(InputEvent::EyeDown, &mut events);
        let closed = events.contains(&Event::EyesChanged { closed: true });
        assert_eq!(closed, step == 50, "unexpected eye state at step {step}");
    }
    assert!(query::snapshot(&session).panic.is_empty());
}

#[test]
fn upload_lock_repair_round() {
    let mut config = SessionConfig::with_seed(33);
    config.simulator.upload.lock_chance = 0.0;
    config.simulator.upload.glitch_chance = 0.0;
    let mut session = single_level(
        LevelDefinition::new(Archetype::Upload, LevelGoal::Progress, "UPLOAD"),
        config,
    );
    let mut events = Vec::new();
    play(&mut session, &mut events);
    steps(&mut session, 50, &mut events);
    assert_eq!(query::snapshot(&session).progress.milli(), 20_000);

    assert!(session.engage_upload_lock('k', &mut events));
    assert_eq!(query::snapshot(&session).lock, Some('K'));

    session.dispatch_input(InputEvent::Key('J'), &mut events);
    let after_wrong = query::snapshot(&session).progress;
    assert!(after_wrong < Meter::from_milli(20_000));

    session.dispatch_input(InputEvent::Key('K'), &mut events);
    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.lock, None);
    assert_eq!(snapshot.progress, after_wrong);
    assert!(events.contains(&Event::LockCleared));
    assert!(session.sink().contains(&AudioCue::RepairSuccess));
}

#[test]
fn every_cue_reaches_the_sink_exactly_once() {
    let mut session = SessionController::new(SessionConfig::with_seed(77), Vec::new());
    let mut events = Vec::new();
    play(&mut session, &mut events);
    session.dispatch_input(InputEvent::EyeDown, &mut events);
    steps(&mut session, 30, &mut events);
    session.dispatch_input(InputEvent::EyeUp, &mut events);
    steps(&mut session, 400, &mut events);

    let relayed: Vec<AudioCue> = events
        .iter()
        .filter_map(|event| match event {
            Event::Cue(cue) => Some(*cue),
            _ => None,
        })
        .collect();
    assert_eq!(&relayed, session.sink());
}

fn assert_reset(session: &Session, events: &[Event]) {
    let snapshot = query::snapshot(session);
    assert_eq!(snapshot.phase, Phase::Boot);
    assert_eq!(snapshot.level_index, 0);
    assert_eq!(snapshot.moisture, Meter::full());
    assert!(snapshot.danger.is_empty());
    assert!(snapshot.progress.is_empty());
    assert!(snapshot.panic.is_empty());
    assert!(snapshot.failure_log.is_empty());
    assert_eq!(snapshot.overlay, None);
    assert_eq!(snapshot.cutscene_stage, None);
    assert!(events.contains(&Event::SessionReset));
    assert!(!query::scheduler_running(session));
}
