#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots Mnemosyne.

mod audio;

use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use mnemosyne_core::{Command, CueSink, Event, SessionSnapshot};
use mnemosyne_rendering::{
    palette, Autopilot, FrameInput, FrameTiming, HeadlessBackend, Presentation,
    RenderingBackend, Scene, SceneComposer,
};
use mnemosyne_rendering_macroquad::MacroquadBackend;
use mnemosyne_session::{query, SessionConfig, SessionController, DEFAULT_SEED};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use audio::AudioMode;

/// Mixed into the seed so presentation jitter never mirrors the session stream.
const PRESENTATION_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keep your eyes open. Or don't.")]
struct CliArgs {
    /// Seed for every random decision in the session
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Run without a window; an autopilot plays the game
    #[arg(long)]
    headless: bool,

    /// Frames simulated by the headless backend
    #[arg(long, default_value_t = 2_400)]
    frames: u32,

    /// Length of a headless frame in milliseconds
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..=1_000))]
    frame_ms: u64,

    /// Print a JSON snapshot on every phase change and when the run ends
    #[arg(long)]
    json: bool,

    /// Discard every audio cue
    #[arg(long)]
    mute: bool,

    /// Synchronise presentation with the display refresh rate
    #[arg(long, value_enum, default_value_t = Toggle::On)]
    vsync: Toggle,

    /// Print frame timing once per second
    #[arg(long)]
    show_fps: bool,
}

impl CliArgs {
    fn audio_mode(&self) -> AudioMode {
        if self.mute {
            AudioMode::Muted
        } else if self.headless {
            AudioMode::Offline
        } else {
            AudioMode::Device
        }
    }
}

/// Entry point for the Mnemosyne command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(CliArgs::parse())
}

fn run(args: CliArgs) -> Result<()> {
    info!("seed {:#x}", args.seed);
    let wiring = audio::wire(args.audio_mode(), args.seed);
    let session = Rc::new(RefCell::new(SessionController::new(
        SessionConfig::with_seed(args.seed),
        wiring.sink,
    )));
    let mut composer = SceneComposer::new(ChaCha8Rng::seed_from_u64(args.seed ^ PRESENTATION_SALT));
    let presentation = Presentation::new(
        "Mnemosyne",
        palette::BACKGROUND,
        composer.compose(&query::snapshot(&*session.borrow())),
    );

    let frame_session = Rc::clone(&session);
    let json = args.json;
    let update = move |dt: Duration, input: FrameInput, scene: &mut Scene| {
        let mut session = frame_session.borrow_mut();
        let simulation_start = Instant::now();
        let events = advance(&mut session, dt, input);
        let simulation = simulation_start.elapsed();

        let scene_start = Instant::now();
        let snapshot = query::snapshot(&*session);
        if json && events.iter().any(|event| matches!(event, Event::PhaseChanged { .. })) {
            print_json(&snapshot);
        }
        *scene = composer.compose(&snapshot);
        FrameTiming {
            simulation,
            scene: scene_start.elapsed(),
        }
    };

    if args.headless {
        HeadlessBackend::new(args.frames, Duration::from_millis(args.frame_ms))
            .with_autopilot(Autopilot::new())
            .run(presentation, update)
            .context("headless run failed")?;
    } else {
        MacroquadBackend::new()
            .with_vsync(args.vsync == Toggle::On)
            .with_show_fps(args.show_fps)
            .run(presentation, update)
            .context("window backend failed")?;
    }

    let mut session = session.borrow_mut();
    let snapshot = query::snapshot(&*session);
    info!(
        "finished in {:?} on level {}/{}; {} failure(s)",
        snapshot.phase,
        snapshot.level_index + 1,
        snapshot.level_count,
        snapshot.failure_log.len()
    );
    if json {
        print_json(&snapshot);
    }
    session.shutdown();
    Ok(())
}

fn advance<S: CueSink>(
    session: &mut SessionController<S>,
    dt: Duration,
    input: FrameInput,
) -> Vec<Event> {
    let mut events = Vec::new();
    for input in input.into_inputs() {
        session.apply(Command::Input(input), &mut events);
    }
    session.apply(Command::Tick { dt }, &mut events);
    for event in &events {
        log_event(event);
    }
    events
}

fn log_event(event: &Event) {
    match event {
        Event::PhaseChanged { from, to } => info!("{from:?} -> {to:?}"),
        Event::GameOver { cause } => info!("game over: {}", cause.log_line()),
        Event::Victory => info!("victory"),
        Event::Cue(cue) => log::trace!("cue {cue:?}"),
        other => debug!("{other:?}"),
    }
}

fn print_json(snapshot: &SessionSnapshot) {
    match serde_json::to_string(snapshot) {
        Ok(line) => println!("{line}"),
        Err(error) => log::warn!("snapshot could not be serialised: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemosyne_core::{MutedSink, Phase};

    #[test]
    fn defaults_open_a_window_with_sound() {
        let args = CliArgs::try_parse_from(["mnemosyne"]).expect("defaults parse");
        assert_eq!(args.seed, DEFAULT_SEED);
        assert!(!args.headless);
        assert_eq!(args.vsync, Toggle::On);
        assert_eq!(args.audio_mode(), AudioMode::Device);
    }

    #[test]
    fn headless_flags_parse() {
        let args = CliArgs::try_parse_from([
            "mnemosyne",
            "--headless",
            "--seed",
            "42",
            "--frames",
            "10",
            "--frame-ms",
            "50",
            "--json",
            "--vsync",
            "off",
        ])
        .expect("flags parse");
        assert!(args.headless && args.json);
        assert_eq!((args.seed, args.frames, args.frame_ms), (42, 10, 50));
        assert_eq!(args.vsync, Toggle::Off);
        assert_eq!(args.audio_mode(), AudioMode::Offline);
    }

    #[test]
    fn mute_wins_over_every_backend() {
        let args = CliArgs::try_parse_from(["mnemosyne", "--headless", "--mute"])
            .expect("flags parse");
        assert_eq!(args.audio_mode(), AudioMode::Muted);
    }

    #[test]
    fn zero_length_frames_are_rejected() {
        assert!(CliArgs::try_parse_from(["mnemosyne", "--frame-ms", "0"]).is_err());
    }

    #[test]
    fn frame_input_reaches_the_session() {
        let mut session = SessionController::new(SessionConfig::default(), MutedSink);
        let confirm = FrameInput {
            confirm: true,
            ..FrameInput::default()
        };
        let events = advance(&mut session, Duration::from_millis(16), confirm.clone());
        assert!(events.contains(&Event::PhaseChanged {
            from: Phase::PreBoot,
            to: Phase::Boot
        }));
        let _ = advance(&mut session, Duration::from_millis(16), confirm);
        assert_eq!(session.phase(), Phase::LevelIntro);
    }
}
