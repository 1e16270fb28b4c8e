use std::time::Duration;

use mnemosyne_audio::{
    AudioGraph, ProceduralAudioEngine, SharedGraph, SoftwareGraph, UnavailableGraph,
};
use mnemosyne_core::{Archetype, AudioCue, CueSink};

const RATE: u32 = 8_000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn render(engine: &mut ProceduralAudioEngine<SoftwareGraph>, millis: u32) -> Vec<f32> {
    let mut buffer = vec![0.0; (RATE * millis / 1_000) as usize];
    engine.graph_mut().render(&mut buffer);
    buffer
}

fn started() -> ProceduralAudioEngine<SoftwareGraph> {
    let mut engine = ProceduralAudioEngine::new(SoftwareGraph::new(RATE), 11);
    engine.play(&AudioCue::Activate);
    engine.play(&AudioCue::GameAmbience);
    engine
}

#[test]
fn cues_before_activation_are_silent() {
    init_logging();
    let mut engine = ProceduralAudioEngine::new(SoftwareGraph::new(RATE), 1);
    engine.play(&AudioCue::MenuAmbience);
    engine.play(&AudioCue::Scream {
        duration: Duration::from_millis(500),
    });
    engine.play(&AudioCue::Proximity {
        archetype: Archetype::Approach,
        danger: 0.9,
        alert: false,
    });

    assert!(!engine.is_active());
    assert_eq!(engine.graph().live_voices(), 0);
    assert!(render(&mut engine, 50).iter().all(|sample| *sample == 0.0));
}

#[test]
fn repeated_proximity_updates_reuse_voices() {
    init_logging();
    let mut engine = started();
    engine.play(&AudioCue::Proximity {
        archetype: Archetype::Reflection,
        danger: 0.1,
        alert: false,
    });
    let baseline = engine.graph().live_voices();

    for step in 0..500 {
        let archetype = Archetype::ALL[step % Archetype::ALL.len()];
        engine.play(&AudioCue::Proximity {
            archetype,
            danger: (step % 100) as f32 / 100.0,
            alert: step % 3 == 0,
        });
    }

    assert_eq!(engine.graph().live_voices(), baseline);
    assert_eq!(engine.failures(), 0);
}

#[test]
fn stingers_clean_up_after_themselves() {
    init_logging();
    let mut engine = started();
    let baseline = engine.graph().live_voices();

    for cue in [
        AudioCue::Scream {
            duration: Duration::from_millis(500),
        },
        AudioCue::StaticBurst {
            duration: Duration::from_millis(300),
        },
        AudioCue::Whisper,
        AudioCue::DigitalError,
        AudioCue::RepairSuccess,
        AudioCue::Click,
        AudioCue::Thud,
        AudioCue::Heartbeat { fast: true },
    ] {
        engine.play(&cue);
    }
    assert!(engine.graph().live_voices() > baseline);

    let samples = render(&mut engine, 2_000);
    assert!(samples.iter().any(|sample| sample.abs() > 0.01));
    assert_eq!(engine.graph().live_voices(), baseline);
}

#[test]
fn tension_off_silences_without_releasing() {
    init_logging();
    let mut engine = started();
    engine.play(&AudioCue::Proximity {
        archetype: Archetype::Approach,
        danger: 1.0,
        alert: false,
    });
    let voices = engine.graph().live_voices();
    engine.play(&AudioCue::TensionOff);
    assert_eq!(engine.graph().live_voices(), voices);
}

#[test]
fn unavailable_output_never_panics() {
    init_logging();
    let mut engine = ProceduralAudioEngine::new(UnavailableGraph, 3);
    for cue in [
        AudioCue::Activate,
        AudioCue::MenuAmbience,
        AudioCue::GameAmbience,
        AudioCue::Proximity {
            archetype: Archetype::Origin,
            danger: 0.5,
            alert: true,
        },
        AudioCue::Thud,
        AudioCue::MasterGain { scale: 0.2 },
        AudioCue::Shutdown,
    ] {
        engine.play(&cue);
    }
    assert!(!engine.is_active());
    assert!(engine.is_shut_down());
    assert_eq!(engine.failures(), 1);
}

#[test]
fn shutdown_is_idempotent_and_final() {
    init_logging();
    let control = SharedGraph::new(SoftwareGraph::new(RATE));
    let observer = control.clone();
    let mut engine = ProceduralAudioEngine::new(control, 5);
    engine.play(&AudioCue::Activate);
    engine.play(&AudioCue::MenuAmbience);
    assert!(observer.live_voices() > 0);

    engine.play(&AudioCue::Shutdown);
    engine.play(&AudioCue::Shutdown);
    engine.play(&AudioCue::Activate);
    engine.play(&AudioCue::Click);
    assert!(engine.is_shut_down());
    assert!(!engine.is_active());

    let mut buffer = vec![1.0; 64];
    observer.render(&mut buffer);
    assert!(buffer.iter().all(|sample| *sample == 0.0));
}

#[test]
fn dropping_the_engine_releases_voices() {
    init_logging();
    let control = SharedGraph::new(SoftwareGraph::new(RATE));
    let mut observer = control.clone();
    {
        let mut engine = ProceduralAudioEngine::new(control, 9);
        engine.play(&AudioCue::Activate);
        engine.play(&AudioCue::GameAmbience);
    }

    observer.resume().expect("resume");
    let mut buffer = vec![0.0; 800];
    observer.render(&mut buffer);
    assert_eq!(observer.live_voices(), 0);
}
