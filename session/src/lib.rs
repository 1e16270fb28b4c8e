#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state machine for Mnemosyne.
//!
//! [`SessionController`] owns the phase, the level simulator, the random event
//! scheduler and the heartbeat timer. Hosts feed it input edges and wall-clock
//! deltas; it runs zero or more fixed steps per delta, broadcasts [`Event`]
//! values and relays every [`AudioCue`] to the injected [`CueSink`] exactly
//! once. Presentation reads detached copies through [`query::snapshot`].

mod config;
mod effects;
mod levels;

use std::time::Duration;

use mnemosyne_core::{
    AudioCue, Command, CueSink, CutsceneStage, Event, FailureCause, InputEvent, OverlayKind,
    Phase, StepSignal, FIXED_STEP,
};
use mnemosyne_system_heartbeat::Heartbeat;
use mnemosyne_system_scheduler::{
    risk_factor, Fired, RandomEventScheduler, RiskInputs, ScheduledKind,
};
use mnemosyne_system_simulator::{LevelReadout, LevelSimulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use config::{SessionConfig, DEFAULT_SEED};
pub use levels::{LevelTable, LevelTableError};

use effects::Effects;

const SCREAM: Duration = Duration::from_millis(500);
const FLASH_STATIC: Duration = Duration::from_millis(100);
const PHANTOM_SHAKE: f32 = 20.0;
const PHANTOM_SHAKE_TIME: Duration = Duration::from_millis(300);
const GLITCH_SHAKE: f32 = 5.0;
const GLITCH_SHAKE_TIME: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug)]
struct Finale {
    stage: CutsceneStage,
    remaining: Duration,
}

impl Finale {
    const fn enter(stage: CutsceneStage) -> Self {
        Self {
            stage,
            remaining: stage.duration(),
        }
    }
}

/// Owns the session state and orchestrates every system.
#[derive(Debug)]
pub struct SessionController<S> {
    config: SessionConfig,
    levels: LevelTable,
    sink: S,
    rng: ChaCha8Rng,
    phase: Phase,
    simulator: LevelSimulator,
    scheduler: RandomEventScheduler,
    heartbeat: Heartbeat,
    effects: Effects,
    accumulator: Duration,
    intro_remaining: Duration,
    finale: Option<Finale>,
    steps_since_proximity: u32,
    failure_log: Vec<String>,
}

impl<S> SessionController<S>
where
    S: CueSink,
{
    /// Creates a session playing the standard campaign.
    #[must_use]
    pub fn new(config: SessionConfig, sink: S) -> Self {
        Self::with_levels(config, LevelTable::standard(), sink)
    }

    /// Creates a session playing a custom campaign.
    #[must_use]
    pub fn with_levels(config: SessionConfig, levels: LevelTable, sink: S) -> Self {
        let simulator = LevelSimulator::new(config.simulator.clone(), 0, levels.level(0));
        let scheduler = RandomEventScheduler::new(config.scheduler.clone());
        let heartbeat = Heartbeat::new(config.heartbeat);
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            levels,
            sink,
            phase: Phase::PreBoot,
            simulator,
            scheduler,
            heartbeat,
            effects: Effects::default(),
            accumulator: Duration::ZERO,
            intro_remaining: Duration::ZERO,
            finale: None,
            steps_since_proximity: 0,
            failure_log: Vec::new(),
        }
    }

    /// Active phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the current level.
    #[must_use]
    pub fn level_index(&self) -> usize {
        self.simulator.readout().index
    }

    /// Causes of death recorded since the last reset.
    #[must_use]
    pub fn failure_log(&self) -> &[String] {
        &self.failure_log
    }

    /// Configuration the session was built with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Campaign being played.
    #[must_use]
    pub const fn levels(&self) -> &LevelTable {
        &self.levels
    }

    /// Cue sink receiving the audio side effects.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the cue sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Applies a command, appending the resulting events to `out`.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        match command {
            Command::Input(input) => self.dispatch_input(input, out),
            Command::Tick { dt } => self.tick(dt, out),
        }
    }

    /// Relays a player input edge. Inputs the current phase ignores are dropped.
    pub fn dispatch_input(&mut self, input: InputEvent, out: &mut Vec<Event>) {
        match (self.phase, input) {
            (Phase::PreBoot, _) => {
                self.emit(Event::Cue(AudioCue::Activate), out);
                self.emit(Event::Cue(AudioCue::MenuAmbience), out);
                self.set_phase(Phase::Boot, out);
            }
            (Phase::Boot, InputEvent::Confirm) => {
                self.emit(Event::Cue(AudioCue::Click), out);
                self.emit(Event::Cue(AudioCue::GameAmbience), out);
                self.begin_intro(0, out);
            }
            (Phase::LevelIntro | Phase::Playing, InputEvent::EyeDown) => {
                self.set_eyes(true, out);
            }
            (Phase::LevelIntro | Phase::Playing, InputEvent::EyeUp) => {
                self.set_eyes(false, out);
            }
            (Phase::Playing, InputEvent::Key(key)) => {
                let mut scratch = Vec::new();
                let _ = self.simulator.handle_key(key, &mut scratch);
                self.relay(scratch, out);
            }
            (Phase::GameOver | Phase::Victory, InputEvent::Confirm) => self.reset(out),
            _ => {}
        }
    }

    /// Advances the session clock by a wall-clock delta.
    ///
    /// Playing time is consumed in [`FIXED_STEP`] increments; the remainder is
    /// carried to the next call. Time left over when the intro card expires,
    /// or when a level ends mid-delta, flows into the phase that follows, so
    /// chunking never changes the trajectory.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut carry = dt;
        loop {
            match self.phase {
                Phase::LevelIntro => {
                    if carry < self.intro_remaining {
                        self.intro_remaining -= carry;
                        return;
                    }
                    carry -= self.intro_remaining;
                    self.intro_remaining = Duration::ZERO;
                    self.start_playing(out);
                }
                Phase::Playing => {
                    self.accumulator += carry;
                    while self.phase == Phase::Playing && self.accumulator >= FIXED_STEP {
                        self.accumulator -= FIXED_STEP;
                        self.step(out);
                    }
                    if self.phase == Phase::Playing {
                        return;
                    }
                    carry = std::mem::take(&mut self.accumulator);
                }
                Phase::Cutscene => return self.advance_finale(carry, out),
                Phase::PreBoot | Phase::Boot | Phase::GameOver | Phase::Victory => return,
            }
        }
    }

    /// Forces an upload lock demanding `key`; only honoured while an upload level plays.
    pub fn engage_upload_lock(&mut self, key: char, out: &mut Vec<Event>) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let mut scratch = Vec::new();
        let engaged = self.simulator.engage_lock(key, &mut scratch);
        self.relay(scratch, out);
        engaged
    }

    /// Stops every timer and releases the audio resources.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.sink.play(&AudioCue::Shutdown);
    }

    fn emit(&mut self, event: Event, out: &mut Vec<Event>) {
        if let Event::Cue(cue) = &event {
            self.sink.play(cue);
        }
        out.push(event);
    }

    fn set_phase(&mut self, to: Phase, out: &mut Vec<Event>) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::debug!("phase {from:?} -> {to:?}");
        self.phase = to;
        out.push(Event::PhaseChanged { from, to });
    }

    fn set_eyes(&mut self, closed: bool, out: &mut Vec<Event>) {
        if self.simulator.set_eyes_closed(closed) {
            out.push(Event::EyesChanged { closed });
        }
    }

    fn begin_intro(&mut self, index: usize, out: &mut Vec<Event>) {
        let level = self.levels.level(index);
        let archetype = level.archetype;
        self.simulator.enter(index, level);
        self.intro_remaining = self.config.intro_delay;
        self.set_phase(Phase::LevelIntro, out);
        out.push(Event::LevelAnnounced { index, archetype });
    }

    fn start_playing(&mut self, out: &mut Vec<Event>) {
        self.accumulator = Duration::ZERO;
        self.steps_since_proximity = 0;
        self.heartbeat.reset();
        self.effects.clear();
        let readout = self.simulator.readout();
        let risk = self.risk(&readout);
        self.scheduler.start(risk, &mut self.rng);
        self.set_phase(Phase::Playing, out);
        self.emit_proximity(&readout, out);
    }

    fn leave_playing(&mut self, out: &mut Vec<Event>) {
        self.scheduler.stop();
        self.heartbeat.reset();
        self.effects.clear();
        self.emit(Event::Cue(AudioCue::TensionOff), out);
    }

    fn step(&mut self, out: &mut Vec<Event>) {
        self.effects.age(FIXED_STEP);

        let mut scratch = Vec::new();
        let signal = self.simulator.step(&mut self.rng, &mut scratch);
        self.relay(scratch, out);

        match signal {
            StepSignal::GameOver(cause) => return self.fail(cause, out),
            StepSignal::Advance => return self.complete_level(out),
            StepSignal::Continue => {}
        }

        let readout = self.simulator.readout();
        let risk = self.risk(&readout);
        let mut fired = Vec::new();
        self.scheduler
            .advance(FIXED_STEP, risk, &mut self.rng, &mut fired);
        self.resolve_fired(fired, out);

        let meters = readout.meters;
        let bpm =
            self.heartbeat
                .tuning()
                .beats_per_minute(meters.danger, meters.moisture.inverse(), meters.panic);
        if let Some(pulse) = self.heartbeat.handle(FIXED_STEP, bpm) {
            self.emit(Event::Cue(AudioCue::Heartbeat { fast: pulse.fast }), out);
        }

        self.steps_since_proximity = self.steps_since_proximity.saturating_add(1);
        if self.steps_since_proximity >= self.config.proximity_interval_steps {
            self.steps_since_proximity = 0;
            self.emit_proximity(&readout, out);
        }
    }

    fn relay(&mut self, events: Vec<Event>, out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::PhantomRequested => {
                    out.push(Event::PhantomRequested);
                    let overlay = self.scheduler.phantom_overlay(&mut self.rng);
                    self.trigger_phantom(overlay, out);
                }
                Event::Glitch => {
                    self.effects.start_shake(GLITCH_SHAKE, GLITCH_SHAKE_TIME);
                    out.push(Event::Glitch);
                }
                other => self.emit(other, out),
            }
        }
    }

    fn resolve_fired(&mut self, fired: Vec<Fired>, out: &mut Vec<Event>) {
        for event in fired {
            if event.generation != self.scheduler.generation() {
                log::debug!("dropping stale scheduler event {event:?}");
                continue;
            }
            match event.kind {
                ScheduledKind::Phantom { overlay } => self.trigger_phantom(overlay, out),
                ScheduledKind::Flash { duration } => self.trigger_flash(duration, out),
            }
        }
    }

    fn trigger_phantom(&mut self, overlay: Duration, out: &mut Vec<Event>) {
        self.effects.show(OverlayKind::Phantom, overlay);
        self.effects.start_shake(PHANTOM_SHAKE, PHANTOM_SHAKE_TIME);
        out.push(Event::PhantomTriggered { overlay });
        self.emit(Event::Cue(AudioCue::Scream { duration: SCREAM }), out);
    }

    fn trigger_flash(&mut self, duration: Duration, out: &mut Vec<Event>) {
        self.effects.show(OverlayKind::Flash, duration);
        out.push(Event::FlashTriggered { duration });
        self.emit(Event::Cue(AudioCue::DigitalError), out);
        self.emit(
            Event::Cue(AudioCue::StaticBurst {
                duration: FLASH_STATIC,
            }),
            out,
        );
    }

    fn emit_proximity(&mut self, readout: &LevelReadout, out: &mut Vec<Event>) {
        let cue = AudioCue::Proximity {
            archetype: readout.archetype,
            danger: readout.meters.danger.fraction(),
            alert: readout.alert(),
        };
        self.emit(Event::Cue(cue), out);
    }

    fn risk(&self, readout: &LevelReadout) -> f32 {
        risk_factor(
            self.scheduler.tuning().risk,
            RiskInputs {
                dryness: readout.meters.moisture.inverse(),
                level_index: readout.index,
                panic: readout.meters.panic,
            },
        )
    }

    fn fail(&mut self, cause: FailureCause, out: &mut Vec<Event>) {
        let line = cause.log_line();
        log::debug!("session failed: {line}");
        self.failure_log.push(line);
        self.leave_playing(out);
        self.emit(Event::Cue(AudioCue::Scream { duration: SCREAM }), out);
        self.set_phase(Phase::GameOver, out);
        out.push(Event::GameOver { cause });
    }

    fn complete_level(&mut self, out: &mut Vec<Event>) {
        let index = self.level_index();
        out.push(Event::LevelCompleted { index });
        self.leave_playing(out);

        let next = index + 1;
        if next < self.levels.len() {
            self.begin_intro(next, out);
        } else if self.config.finale {
            self.emit(Event::Cue(AudioCue::Thud), out);
            self.finale = Some(Finale::enter(CutsceneStage::Collapse));
            self.set_phase(Phase::Cutscene, out);
            self.announce_stage(CutsceneStage::Collapse, out);
        } else {
            self.win(out);
        }
    }

    fn announce_stage(&mut self, stage: CutsceneStage, out: &mut Vec<Event>) {
        out.push(Event::CutsceneAdvanced { stage });
        self.emit(
            Event::Cue(AudioCue::MasterGain {
                scale: stage.gain_scale(),
            }),
            out,
        );
    }

    fn advance_finale(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut budget = dt;
        loop {
            let Some(finale) = self.finale.as_mut() else {
                return;
            };
            if budget < finale.remaining {
                finale.remaining -= budget;
                return;
            }
            budget -= finale.remaining;
            match finale.stage.next() {
                Some(stage) => {
                    *finale = Finale::enter(stage);
                    self.announce_stage(stage, out);
                }
                None => {
                    self.finale = None;
                    self.win(out);
                    return;
                }
            }
        }
    }

    fn win(&mut self, out: &mut Vec<Event>) {
        self.emit(Event::Cue(AudioCue::MasterGain { scale: 1.0 }), out);
        self.set_phase(Phase::Victory, out);
        out.push(Event::Victory);
    }

    fn reset(&mut self, out: &mut Vec<Event>) {
        self.scheduler.stop();
        self.heartbeat.reset();
        self.effects.clear();
        self.accumulator = Duration::ZERO;
        self.intro_remaining = Duration::ZERO;
        self.finale = None;
        self.steps_since_proximity = 0;
        self.failure_log.clear();
        self.simulator.enter(0, self.levels.level(0));

        self.emit(Event::Cue(AudioCue::Click), out);
        self.emit(Event::Cue(AudioCue::MenuAmbience), out);
        self.set_phase(Phase::Boot, out);
        out.push(Event::SessionReset);
    }
}

/// Applies the provided command to the session.
pub fn apply<S>(session: &mut SessionController<S>, command: Command, out: &mut Vec<Event>)
where
    S: CueSink,
{
    session.apply(command, out);
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use mnemosyne_core::{Phase, SessionSnapshot};
    use mnemosyne_system_simulator::LevelReadout;

    use super::SessionController;

    /// Detached copy of everything presentation layers render.
    #[must_use]
    pub fn snapshot<S>(session: &SessionController<S>) -> SessionSnapshot {
        let readout = session.simulator.readout();
        let level = session.levels.level(readout.index);
        SessionSnapshot {
            phase: session.phase,
            level_index: readout.index,
            level_count: session.levels.len(),
            archetype: readout.archetype,
            level_title: level.title.clone(),
            goal: readout.goal,
            eyes_closed: readout.eyes_closed,
            moisture: readout.meters.moisture,
            danger: readout.meters.danger,
            progress: readout.meters.progress,
            panic: readout.meters.panic,
            entity_mode: readout.entity_mode,
            level_elapsed: readout.elapsed,
            lock: readout.lock,
            penalty_remaining: readout.penalty_remaining,
            overlay: session.effects.overlay(),
            shake: session.effects.shake(),
            cutscene_stage: session.finale.map(|finale| finale.stage),
            failure_log: session.failure_log.clone(),
        }
    }

    /// Raw simulator readout for the current level.
    #[must_use]
    pub fn level_readout<S>(session: &SessionController<S>) -> LevelReadout {
        session.simulator.readout()
    }

    /// Reports whether the random event scheduler is armed.
    #[must_use]
    pub fn scheduler_running<S>(session: &SessionController<S>) -> bool {
        session.scheduler.is_running()
    }

    /// Active phase.
    #[must_use]
    pub fn phase<S>(session: &SessionController<S>) -> Phase {
        session.phase
    }
}
