#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Mnemosyne.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the crate is pulled in without its default `audio` feature.
//! Sound comes from `mnemosyne-audio` instead.
//!
//! Controls: hold `Space` to close the eyes, `Enter` confirms, letters answer
//! upload locks, `Escape` quits.

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{get_char_pressed, is_key_pressed, is_key_released, KeyCode};
use mnemosyne_core::{Archetype, OverlayKind, Phase, FIXED_STEP};
use mnemosyne_rendering::{
    palette, Color, FrameInput, FrameTiming, MeterBar, Presentation, RenderingBackend, Scene,
};
use std::time::{Duration, Instant};

const HEADLINE_SIZE: f32 = 64.0;
const CAPTION_SIZE: f32 = 24.0;
const METER_LABEL_SIZE: f32 = 18.0;

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Costs of one presented frame.
#[derive(Clone, Copy, Debug, Default)]
struct FrameSample {
    dt: Duration,
    timing: FrameTiming,
    draw: Duration,
}

/// Per-second summary printed when `show_fps` is set.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameReport {
    fps: f32,
    worst_frame: Duration,
    // Frames longer than one fixed step make the session catch up with several steps.
    overruns: u32,
    avg_simulation: Duration,
    avg_compose: Duration,
    avg_draw: Duration,
}

/// Accumulates frame samples into one [`FrameReport`] per second of host time.
#[derive(Debug, Default)]
struct FrameReporter {
    elapsed: Duration,
    frames: u32,
    worst_frame: Duration,
    overruns: u32,
    simulation: Duration,
    compose: Duration,
    draw: Duration,
}

impl FrameReporter {
    fn record(&mut self, sample: FrameSample) -> Option<FrameReport> {
        self.elapsed += sample.dt;
        self.frames = self.frames.saturating_add(1);
        self.worst_frame = self.worst_frame.max(sample.dt);
        if sample.dt > FIXED_STEP {
            self.overruns = self.overruns.saturating_add(1);
        }
        self.simulation += sample.timing.simulation;
        self.compose += sample.timing.scene;
        self.draw += sample.draw;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let frames = self.frames.max(1);
        let report = FrameReport {
            fps: self.frames as f32 / self.elapsed.as_secs_f32(),
            worst_frame: self.worst_frame,
            overruns: self.overruns,
            avg_simulation: self.simulation / frames,
            avg_compose: self.compose / frames,
            avg_draw: self.draw / frames,
        };
        *self = Self::default();
        Some(report)
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameTiming + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut reporter = FrameReporter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input();
                let timing = update_scene(frame_dt, frame_input, &mut scene);

                let render_start = Instant::now();
                let layout = Layout::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                    scene.shake_offset,
                );
                let background = if scene.phase == Phase::Victory {
                    palette::PAPER
                } else {
                    clear_color
                };
                macroquad::window::clear_background(to_macroquad_color(background));
                draw_scene(&scene, &layout);
                let render = render_start.elapsed();

                let report = reporter.record(FrameSample {
                    dt: frame_dt,
                    timing,
                    draw: render,
                });
                if let Some(report) = report.filter(|_| show_fps) {
                    println!(
                        "FPS: {:.1} | worst: {:.1}ms overruns: {} | sim: {:.2}ms scene: {:.2}ms draw: {:.2}ms",
                        report.fps,
                        millis(report.worst_frame),
                        report.overruns,
                        millis(report.avg_simulation),
                        millis(report.avg_compose),
                        millis(report.avg_draw),
                    );
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input() -> FrameInput {
    let mut typed = Vec::new();
    while let Some(character) = get_char_pressed() {
        typed.push(character);
    }
    frame_input_from_observations(
        is_key_pressed(KeyCode::Space),
        is_key_released(KeyCode::Space),
        is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter),
        &typed,
    )
}

fn frame_input_from_observations(
    space_pressed: bool,
    space_released: bool,
    enter_pressed: bool,
    typed: &[char],
) -> FrameInput {
    FrameInput {
        eyes_pressed: space_pressed,
        eyes_released: space_released,
        confirm: enter_pressed,
        keys: typed
            .iter()
            .copied()
            .filter(char::is_ascii_alphanumeric)
            .collect(),
    }
}

/// Screen geometry for one frame, shifted by screen shake.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Layout {
    origin: Vec2,
    size: Vec2,
}

impl Layout {
    fn new(width: f32, height: f32, shake: Vec2) -> Self {
        Self {
            origin: shake,
            size: Vec2::new(width.max(1.0), height.max(1.0)),
        }
    }

    fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    fn meter_slot(&self, index: usize) -> (Vec2, Vec2) {
        let width = (self.size.x * 0.35).min(480.0);
        let top = self.size.y - 48.0 - index as f32 * 44.0;
        (
            Vec2::new(self.origin.x + 32.0, self.origin.y + top),
            Vec2::new(width, 10.0),
        )
    }
}

fn draw_scene(scene: &Scene, layout: &Layout) {
    let center = layout.center();

    if matches!(scene.phase, Phase::Playing | Phase::LevelIntro) {
        draw_entity(scene, layout);
    }

    let text_color = if scene.phase == Phase::Victory {
        palette::BACKGROUND
    } else if scene.phase == Phase::GameOver {
        palette::RED
    } else {
        palette::TEXT
    };
    let headline_y = if scene.phase == Phase::Playing {
        layout.origin.y + 80.0
    } else {
        center.y - 20.0
    };
    draw_centered(&scene.headline, center.x, headline_y, HEADLINE_SIZE, text_color);

    if scene.blackout > 0.0 {
        macroquad::shapes::draw_rectangle(
            layout.origin.x - 64.0,
            layout.origin.y - 64.0,
            layout.size.x + 128.0,
            layout.size.y + 128.0,
            to_macroquad_color(palette::BACKGROUND.with_alpha(scene.blackout)),
        );
    }

    let caption_color = if scene.alert { palette::RED } else { palette::CYAN };
    draw_centered(
        &scene.caption,
        center.x,
        headline_y + 56.0,
        CAPTION_SIZE,
        caption_color,
    );

    for (index, meter) in scene.meters.iter().enumerate() {
        draw_meter(meter, layout.meter_slot(index));
    }
    if matches!(scene.phase, Phase::Playing | Phase::LevelIntro) {
        let eyes = if scene.eyes_closed {
            "[ EYES CLOSED ]"
        } else {
            "[ EYES OPEN ]"
        };
        let (x, y) = (
            layout.origin.x + layout.size.x - 220.0,
            layout.origin.y + layout.size.y - 48.0,
        );
        let color = if scene.eyes_forced_open {
            palette::AMBER
        } else {
            palette::CYAN
        };
        let _ = macroquad::text::draw_text(eyes, x, y, CAPTION_SIZE, to_macroquad_color(color));
    }

    if let Some(kind) = scene.overlay {
        draw_overlay(kind, layout);
    }
}

fn draw_entity(scene: &Scene, layout: &Layout) {
    let center = layout.center();
    let danger = scene.danger.clamp(0.0, 1.0);
    let red = to_macroquad_color(palette::RED.with_alpha(0.3 + danger * 0.7));

    match scene.archetype {
        Archetype::Approach => {
            let height = 40.0 + danger * layout.size.y * 0.6;
            let width = height * 0.35;
            macroquad::shapes::draw_rectangle(
                center.x - width / 2.0,
                center.y + layout.size.y * 0.3 - height,
                width,
                height,
                red,
            );
        }
        Archetype::Upload => {
            let code = if scene.alert { palette::RED } else { palette::GREEN };
            let lines = ["> ACCESSING MAINFRAME...", "> DECODING MEMORY FRAGMENTS..."];
            for (row, line) in lines.iter().enumerate() {
                let _ = macroquad::text::draw_text(
                    line,
                    layout.origin.x + 48.0,
                    layout.origin.y + 180.0 + row as f32 * 32.0,
                    CAPTION_SIZE,
                    to_macroquad_color(code),
                );
            }
            if let Some(key) = scene.repair_prompt {
                draw_centered(&format!("[{key}]"), center.x, center.y + 60.0, 120.0, palette::RED);
            }
        }
        Archetype::Reflection => {
            let frame = to_macroquad_color(palette::MUTED);
            macroquad::shapes::draw_rectangle_lines(
                center.x - 120.0,
                center.y - 180.0,
                240.0,
                320.0,
                4.0,
                frame,
            );
            if scene.alert {
                for side in [-1.0, 1.0] {
                    macroquad::shapes::draw_circle(center.x + side * 36.0, center.y - 60.0, 8.0, red);
                }
            }
        }
        Archetype::Void => {
            // Nothing to see with the eyes shut.
            if !scene.eyes_closed {
                let width = 80.0 + danger * 240.0;
                let height = width * 1.2;
                macroquad::shapes::draw_rectangle(
                    center.x - width / 2.0,
                    center.y - height / 2.0,
                    width,
                    height,
                    red,
                );
                draw_centered(
                    "SEARCHING FOR EXIT...",
                    center.x,
                    layout.origin.y + 96.0,
                    24.0,
                    palette::RED,
                );
            }
        }
        Archetype::Corruption => {
            if scene.alert {
                for block in 0..24 {
                    let x = (block * 97 % 23) as f32 / 23.0 * layout.size.x;
                    let y = (block * 53 % 17) as f32 / 17.0 * layout.size.y;
                    macroquad::shapes::draw_rectangle(
                        layout.origin.x + x,
                        layout.origin.y + y,
                        60.0,
                        12.0,
                        red,
                    );
                }
            } else {
                draw_centered("SAFE", center.x, center.y + 40.0, 160.0, palette::MUTED);
            }
        }
        Archetype::Origin => {
            let radius = 30.0 + danger * 160.0;
            macroquad::shapes::draw_circle(center.x, center.y, radius, red);
        }
    }
}

fn draw_meter(meter: &MeterBar, (position, size): (Vec2, Vec2)) {
    let label_color = if meter.critical { palette::RED } else { palette::TEXT };
    let _ = macroquad::text::draw_text(
        meter.label,
        position.x,
        position.y - 6.0,
        METER_LABEL_SIZE,
        to_macroquad_color(label_color),
    );
    macroquad::shapes::draw_rectangle(
        position.x,
        position.y,
        size.x,
        size.y,
        to_macroquad_color(palette::MUTED),
    );
    macroquad::shapes::draw_rectangle(
        position.x,
        position.y,
        size.x * meter.fill.clamp(0.0, 1.0),
        size.y,
        to_macroquad_color(meter.color),
    );
}

fn draw_overlay(kind: OverlayKind, layout: &Layout) {
    let (background, text_color, text) = match kind {
        OverlayKind::Phantom => (palette::RED, palette::BACKGROUND, "DON'T LOOK"),
        OverlayKind::Flash => (palette::PAPER, palette::RED, "WAKE UP"),
    };
    macroquad::shapes::draw_rectangle(
        layout.origin.x - 64.0,
        layout.origin.y - 64.0,
        layout.size.x + 128.0,
        layout.size.y + 128.0,
        to_macroquad_color(background),
    );
    let center = layout.center();
    draw_centered(text, center.x, center.y, 160.0, text_color);
}

fn draw_centered(text: &str, x: f32, y: f32, size: f32, color: Color) {
    if text.is_empty() {
        return;
    }
    let dimensions = macroquad::text::measure_text(text, None, size as u16, 1.0);
    let _ = macroquad::text::draw_text(
        text,
        x - dimensions.width / 2.0,
        y,
        size,
        to_macroquad_color(color),
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
