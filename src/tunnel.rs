//! The fractal tunnel: per-frame rendering and the run loops.
//!
//! Every frame advances the simulation clock by the preset's fixed step,
//! fades the canvas for motion trails, recomputes the depth layers, and
//! redraws the branch fractal once per layer under that layer's transform.
//! The clock is the only state that survives between frames.

use crate::canvas::Canvas;
use crate::colors::hsl_to_rgb;
use crate::config::{
    clamp_control, clamp_control_u32, ranges, AxisMode, Preset, StylePreset, TunnelParams,
};
use crate::fractal::{self, Segment};
use crate::help::render_help_overlay;
use crate::layers::{self, Layer};
use crate::terminal::Terminal;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::style::Color;
use rand::prelude::*;
use std::f32::consts::FRAC_PI_2;
use std::io;
use std::time::{Duration, Instant};

const HELP: &str = "\
FRACTAL TUNNEL
─────────────────
s/S    Size -/+
v/V    Tunnel speed -/+
c/C    Hue offset -/+
b/B    Branch amplitude -/+
d/D    Recursion depth -/+
a/A    Base angle -/+
l/L    Length reduction -/+
f      Tree/Multibranch
x      Axis rotation mode
z/Z    Axis speed -/+
t/T    Tunnel depth -/+
o/O    Focal length -/+
n/N    Layer count -/+
e/E    Trail fade -/+
p      Cycle preset
r      Random parameters
1-9,0  Frame delay
Space  Pause
q/Esc  Quit
?      Close help";

/// Widest stroke in dots; keeps near layers from flooding the frame.
const MAX_STROKE_DOTS: f32 = 16.0;

/// How long a parameter-change readout stays on screen.
const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Per-frame tunnel renderer. Owns the simulation clock explicitly; nothing
/// else persists across frames.
pub struct TunnelRenderer {
    time: f32,
    segments: Vec<Segment>,
    layers: Vec<Layer>,
}

impl TunnelRenderer {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            segments: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the clock by the preset's fixed step. Never reset; it wraps
    /// only through the trigonometric periodicity of its consumers.
    pub fn advance(&mut self, preset: &StylePreset) {
        self.time += preset.time_step;
    }

    /// Render one frame into the canvas from the parameter snapshot.
    pub fn render_frame(&mut self, canvas: &mut Canvas, params: &TunnelParams, preset: &StylePreset) {
        canvas.fade(params.trail_fade);

        let w = canvas.width();
        let h = canvas.height();
        let reference = if preset.root_from_height { h } else { w.min(h) };
        let root_len = reference * preset.root_frac * params.size_factor;
        let cx = w / 2.0;
        let cy = h / 2.0;
        let axis = AxisProjection::new(params, self.time, w.max(h));

        let mut layer_list = std::mem::take(&mut self.layers);
        layers::compute_layers(params, preset, self.time, &mut layer_list);

        for layer in &layer_list {
            if !layer.scale.is_finite() || layer.alpha <= 0.0 {
                continue;
            }
            let (sin_r, cos_r) = layer.rotation.sin_cos();

            self.segments.clear();
            fractal::collect_branches(
                params,
                preset,
                self.time,
                0.0,
                0.0,
                -FRAC_PI_2,
                root_len,
                params.max_depth,
                &mut self.segments,
            );

            for seg in &self.segments {
                let (x1, y1) = place(seg.x1, seg.y1, sin_r, cos_r, layer, cx, cy);
                let (x2, y2) = place(seg.x2, seg.y2, sin_r, cos_r, layer, cx, cy);
                let (x1, y1) = axis.project(x1, y1, cx, cy);
                let (x2, y2) = axis.project(x2, y2, cx, cy);

                let (hue, sat, light) =
                    fractal::branch_color(preset, self.time, seg.depth, params.hue_offset);
                let (r, g, b) = hsl_to_rgb(hue, sat, light);
                let alpha = layer.alpha * preset.stroke_alpha;
                let rgb = [
                    r as f32 / 255.0 * alpha,
                    g as f32 / 255.0 * alpha,
                    b as f32 / 255.0 * alpha,
                ];

                let width = (fractal::stroke_width(preset, seg.depth) * layer.scale)
                    .clamp(1.0, MAX_STROKE_DOTS);
                canvas.stroke(x1, y1, x2, y2, width, rgb);
            }
        }

        self.layers = layer_list;
    }
}

impl Default for TunnelRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a layer's transform to a fractal-space point. Mirrors the save/
/// translate/scale/translate/rotate order of the drawing context: rotate
/// first, then lateral shift, then scale about the canvas center.
fn place(x: f32, y: f32, sin_r: f32, cos_r: f32, layer: &Layer, cx: f32, cy: f32) -> (f32, f32) {
    let rx = x * cos_r - y * sin_r;
    let ry = x * sin_r + y * cos_r;
    (
        cx + (rx + layer.lateral_shift) * layer.scale,
        cy + ry * layer.scale,
    )
}

/// Whole-canvas tumble: a one-axis perspective projection about the canvas
/// center, applied after layer composition and independent of it.
struct AxisProjection {
    mode: AxisMode,
    sin: f32,
    cos: f32,
    focal: f32,
}

impl AxisProjection {
    fn new(params: &TunnelParams, time: f32, reference: f32) -> Self {
        let angle = (params.axis_speed * time * 360.0).to_radians();
        let (sin, cos) = angle.sin_cos();
        Self {
            mode: params.axis_mode,
            sin,
            cos,
            focal: reference * 1.5,
        }
    }

    fn project(&self, x: f32, y: f32, cx: f32, cy: f32) -> (f32, f32) {
        if self.mode == AxisMode::None {
            return (x, y);
        }

        let dx = x - cx;
        let dy = y - cy;
        match self.mode {
            AxisMode::Front | AxisMode::Back => {
                let sin = if self.mode == AxisMode::Front { self.sin } else { -self.sin };
                let k = self.focal / (self.focal + dy * sin).max(1.0);
                (cx + dx * k, cy + dy * self.cos * k)
            }
            AxisMode::Side => {
                let k = self.focal / (self.focal + dx * self.sin).max(1.0);
                (cx + dx * self.cos * k, cy + dy * k)
            }
            AxisMode::None => (x, y),
        }
    }
}

/// Live control state: the parameter snapshot the renderer samples each
/// frame, plus loop-level toggles.
struct Controls {
    preset: Preset,
    params: TunnelParams,
    delay: f32,
    paused: bool,
    show_help: bool,
    rng: StdRng,
    notice: Option<(String, Instant)>,
}

const SIZE_STEP: f32 = 0.05;
const SPEED_STEP: f32 = 0.05;
const HUE_STEP: f32 = 10.0;
const AMP_STEP: f32 = 0.05;
const ANGLE_STEP: f32 = 5.0;
const REDUCTION_STEP: f32 = 0.02;
const AXIS_SPEED_STEP: f32 = 0.25;
const TUNNEL_DEPTH_STEP: f32 = 25.0;
const FOCAL_STEP: f32 = 25.0;
const FADE_STEP: f32 = 0.02;

fn adjust_f32(value: &mut f32, delta: f32, range: (f32, f32)) -> f32 {
    *value = clamp_control(*value + delta, range);
    *value
}

fn adjust_u32(value: &mut u32, delta: i32, range: (u32, u32)) -> u32 {
    *value = clamp_control_u32(value.saturating_add_signed(delta), range);
    *value
}

impl Controls {
    fn new(preset: Preset, params: TunnelParams, delay: f32, seed: u64) -> Self {
        Self {
            preset,
            params,
            delay,
            paused: false,
            show_help: false,
            rng: StdRng::seed_from_u64(seed),
            notice: None,
        }
    }

    fn notify(&mut self, text: String) {
        self.notice = Some((text, Instant::now()));
    }

    /// Handle keypress, returns true if should quit
    fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            // Number keys: frame delay (1=fastest, 9=slowest, 0=very slow)
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let n = c.to_digit(10).unwrap() as u8;
                self.delay = match n {
                    0 => 0.2,
                    1 => 0.005,
                    2 => 0.01,
                    3 => 0.02,
                    4 => 0.03,
                    5 => 0.05,
                    6 => 0.07,
                    7 => 0.1,
                    8 => 0.15,
                    9 => 0.2,
                    _ => self.delay,
                };
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.preset = self.preset.cycled();
                self.params = self.preset.params();
                self.notify(format!("preset {}", self.preset.style().name));
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.params.fractal_kind = self.params.fractal_kind.toggled();
                self.notify(format!("fractal {}", self.params.fractal_kind.label()));
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.params.axis_mode = self.params.axis_mode.cycled();
                self.notify(format!("axis {}", self.params.axis_mode.label()));
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.params.randomize(&mut self.rng);
                self.notify("randomized".to_string());
            }
            KeyCode::Char('s') => {
                let v = adjust_f32(&mut self.params.size_factor, -SIZE_STEP, ranges::SIZE);
                self.notify(format!("size {v:.2}"));
            }
            KeyCode::Char('S') => {
                let v = adjust_f32(&mut self.params.size_factor, SIZE_STEP, ranges::SIZE);
                self.notify(format!("size {v:.2}"));
            }
            KeyCode::Char('v') => {
                let v = adjust_f32(&mut self.params.tunnel_speed, -SPEED_STEP, ranges::SPEED);
                self.notify(format!("speed {v:.2}"));
            }
            KeyCode::Char('V') => {
                let v = adjust_f32(&mut self.params.tunnel_speed, SPEED_STEP, ranges::SPEED);
                self.notify(format!("speed {v:.2}"));
            }
            KeyCode::Char('c') => {
                let v = adjust_f32(&mut self.params.hue_offset, -HUE_STEP, ranges::HUE);
                self.notify(format!("hue {v:.0}"));
            }
            KeyCode::Char('C') => {
                let v = adjust_f32(&mut self.params.hue_offset, HUE_STEP, ranges::HUE);
                self.notify(format!("hue {v:.0}"));
            }
            KeyCode::Char('b') => {
                let v = adjust_f32(&mut self.params.branch_amplitude, -AMP_STEP, ranges::AMPLITUDE);
                self.notify(format!("amplitude {v:.2}"));
            }
            KeyCode::Char('B') => {
                let v = adjust_f32(&mut self.params.branch_amplitude, AMP_STEP, ranges::AMPLITUDE);
                self.notify(format!("amplitude {v:.2}"));
            }
            KeyCode::Char('d') => {
                let v = adjust_u32(&mut self.params.max_depth, -1, ranges::DEPTH);
                self.notify(format!("depth {v}"));
            }
            KeyCode::Char('D') => {
                let v = adjust_u32(&mut self.params.max_depth, 1, ranges::DEPTH);
                self.notify(format!("depth {v}"));
            }
            KeyCode::Char('a') => {
                let v = adjust_f32(&mut self.params.base_angle_deg, -ANGLE_STEP, ranges::BASE_ANGLE);
                self.notify(format!("base angle {v:.0}"));
            }
            KeyCode::Char('A') => {
                let v = adjust_f32(&mut self.params.base_angle_deg, ANGLE_STEP, ranges::BASE_ANGLE);
                self.notify(format!("base angle {v:.0}"));
            }
            KeyCode::Char('l') => {
                let v = adjust_f32(
                    &mut self.params.length_reduction,
                    -REDUCTION_STEP,
                    ranges::LENGTH_REDUCTION,
                );
                self.notify(format!("reduction {v:.2}"));
            }
            KeyCode::Char('L') => {
                let v = adjust_f32(
                    &mut self.params.length_reduction,
                    REDUCTION_STEP,
                    ranges::LENGTH_REDUCTION,
                );
                self.notify(format!("reduction {v:.2}"));
            }
            KeyCode::Char('z') => {
                let v = adjust_f32(&mut self.params.axis_speed, -AXIS_SPEED_STEP, ranges::AXIS_SPEED);
                self.notify(format!("axis speed {v:.2}"));
            }
            KeyCode::Char('Z') => {
                let v = adjust_f32(&mut self.params.axis_speed, AXIS_SPEED_STEP, ranges::AXIS_SPEED);
                self.notify(format!("axis speed {v:.2}"));
            }
            KeyCode::Char('t') => {
                let v = adjust_f32(
                    &mut self.params.tunnel_depth,
                    -TUNNEL_DEPTH_STEP,
                    ranges::TUNNEL_DEPTH,
                );
                self.notify(format!("tunnel depth {v:.0}"));
            }
            KeyCode::Char('T') => {
                let v = adjust_f32(
                    &mut self.params.tunnel_depth,
                    TUNNEL_DEPTH_STEP,
                    ranges::TUNNEL_DEPTH,
                );
                self.notify(format!("tunnel depth {v:.0}"));
            }
            KeyCode::Char('o') => {
                let v = adjust_f32(&mut self.params.focal_length, -FOCAL_STEP, ranges::FOCAL_LENGTH);
                self.notify(format!("focal {v:.0}"));
            }
            KeyCode::Char('O') => {
                let v = adjust_f32(&mut self.params.focal_length, FOCAL_STEP, ranges::FOCAL_LENGTH);
                self.notify(format!("focal {v:.0}"));
            }
            KeyCode::Char('n') => {
                let v = adjust_u32(&mut self.params.num_layers, -2, ranges::LAYERS);
                self.notify(format!("layers {v}"));
            }
            KeyCode::Char('N') => {
                let v = adjust_u32(&mut self.params.num_layers, 2, ranges::LAYERS);
                self.notify(format!("layers {v}"));
            }
            KeyCode::Char('e') => {
                let v = adjust_f32(&mut self.params.trail_fade, -FADE_STEP, ranges::TRAIL_FADE);
                self.notify(format!("trail fade {v:.2}"));
            }
            KeyCode::Char('E') => {
                let v = adjust_f32(&mut self.params.trail_fade, FADE_STEP, ranges::TRAIL_FADE);
                self.notify(format!("trail fade {v:.2}"));
            }
            _ => {}
        }
        false
    }
}

fn draw_status(term: &mut Terminal, controls: &Controls) {
    let text = match &controls.notice {
        Some((text, at)) if at.elapsed() < NOTICE_TTL => format!("{text} [?:help]"),
        _ => format!(
            "{} {} depth {} layers {} [?:help]",
            controls.preset.style().name,
            controls.params.fractal_kind.label(),
            controls.params.max_depth,
            controls.params.num_layers
        ),
    };
    term.set_str(1, 0, &text, Some(Color::DarkGrey), false);
}

pub struct RunConfig {
    pub preset: Preset,
    pub params: TunnelParams,
    pub frame_delay: f32,
    pub seed: u64,
}

/// Interactive fullscreen loop: poll keys, advance the clock, draw, sleep.
pub fn run(config: RunConfig) -> io::Result<()> {
    let mut term = Terminal::new(true)?;
    term.clear_screen()?;

    let (mut prev_w, mut prev_h) = term.size();
    let mut canvas = Canvas::new(prev_w, prev_h);
    let mut renderer = TunnelRenderer::new();
    let mut controls = Controls::new(config.preset, config.params, config.frame_delay, config.seed);

    loop {
        // Follow terminal resizes without touching the clock.
        let (w, h) = crossterm::terminal::size().unwrap_or((prev_w, prev_h));
        if w != prev_w || h != prev_h {
            term.resize(w, h);
            canvas.resize(w, h);
            term.clear_screen()?;
            prev_w = w;
            prev_h = h;
        }

        if let Some((code, mods)) = term.check_key()? {
            if controls.handle_key(code, mods) {
                break;
            }
        }

        if controls.paused {
            term.sleep(0.1);
            continue;
        }

        let preset = controls.preset.style();
        renderer.advance(preset);
        renderer.render_frame(&mut canvas, &controls.params, preset);

        canvas.render_to(&mut term);
        draw_status(&mut term, &controls);
        if controls.show_help {
            let (w, h) = term.size();
            render_help_overlay(&mut term, w, h, HELP);
        }

        term.present()?;
        term.sleep(controls.delay);
    }

    Ok(())
}

pub struct PrintConfig {
    pub preset: Preset,
    pub params: TunnelParams,
    pub frames: u32,
    pub width: Option<u16>,
    pub height: Option<u16>,
}

/// Simulate a fixed number of frames off-screen and print the final frame
/// to stdout as ANSI truecolor braille.
pub fn run_print(config: PrintConfig) -> io::Result<()> {
    let (term_w, term_h) = crossterm::terminal::size().unwrap_or((100, 30));
    let width = config.width.unwrap_or(term_w);
    let height = config.height.unwrap_or(term_h);

    let mut term = Terminal::headless(width, height);
    let mut canvas = Canvas::new(width, height);
    let mut renderer = TunnelRenderer::new();
    let preset = config.preset.style();

    for _ in 0..config.frames {
        renderer.advance(preset);
        renderer.render_frame(&mut canvas, &config.params, preset);
    }

    canvas.render_to(&mut term);
    term.print_to_stdout();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Preset, CLASSIC, GLOW};

    #[test]
    fn clock_advances_by_the_preset_step() {
        let mut renderer = TunnelRenderer::new();
        renderer.advance(&CLASSIC);
        renderer.advance(&CLASSIC);
        assert!((renderer.time() - 2.0 * CLASSIC.time_step).abs() < 1e-6);

        let mut glow = TunnelRenderer::new();
        glow.advance(&GLOW);
        assert!((glow.time() - GLOW.time_step).abs() < 1e-6);
    }

    #[test]
    fn a_frame_lights_the_canvas() {
        for preset_choice in [Preset::Classic, Preset::Glow] {
            let params = preset_choice.params();
            let preset = preset_choice.style();
            let mut canvas = Canvas::new(60, 30);
            let mut renderer = TunnelRenderer::new();

            for _ in 0..5 {
                renderer.advance(preset);
                renderer.render_frame(&mut canvas, &params, preset);
            }
            assert!(canvas.lit_dots() > 0, "{} preset drew nothing", preset.name);
        }
    }

    #[test]
    fn resize_mid_animation_keeps_the_clock() {
        let params = Preset::Classic.params();
        let mut canvas = Canvas::new(60, 30);
        let mut renderer = TunnelRenderer::new();

        for _ in 0..3 {
            renderer.advance(&CLASSIC);
            renderer.render_frame(&mut canvas, &params, &CLASSIC);
        }
        let before = renderer.time();

        canvas.resize(20, 50);
        renderer.advance(&CLASSIC);
        renderer.render_frame(&mut canvas, &params, &CLASSIC);

        assert!((renderer.time() - before - CLASSIC.time_step).abs() < 1e-6);
        assert!(canvas.lit_dots() > 0);
    }

    #[test]
    fn axis_projection_none_is_identity() {
        let mut params = Preset::Classic.params();
        params.axis_mode = AxisMode::None;
        params.axis_speed = 3.0;
        let axis = AxisProjection::new(&params, 1.0, 100.0);
        assert_eq!(axis.project(12.0, 34.0, 50.0, 50.0), (12.0, 34.0));
    }

    #[test]
    fn front_tumble_squashes_vertically_at_quarter_turn() {
        // axis_speed * time * 360 = 90 degrees.
        let mut params = Preset::Classic.params();
        params.axis_mode = AxisMode::Front;
        params.axis_speed = 1.0;
        let axis = AxisProjection::new(&params, 0.25, 100.0);

        // cos(90°) ~ 0: vertical offsets collapse toward the center row,
        // modulo the perspective factor.
        let (_, y) = axis.project(50.0, 90.0, 50.0, 50.0);
        assert!((y - 50.0).abs() < 1.0);
    }

    #[test]
    fn side_tumble_squashes_horizontally() {
        let mut params = Preset::Classic.params();
        params.axis_mode = AxisMode::Side;
        params.axis_speed = 1.0;
        let axis = AxisProjection::new(&params, 0.25, 100.0);

        let (x, _) = axis.project(90.0, 50.0, 50.0, 50.0);
        assert!((x - 50.0).abs() < 1.0);
    }

    #[test]
    fn projection_stays_finite_for_extreme_points() {
        let mut params = Preset::Classic.params();
        params.axis_mode = AxisMode::Front;
        params.axis_speed = 2.0;
        let axis = AxisProjection::new(&params, 0.6, 100.0);

        let (x, y) = axis.project(1e6, -1e6, 50.0, 50.0);
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn key_adjustments_clamp_to_recognized_ranges() {
        let mut controls = Controls::new(Preset::Classic, Preset::Classic.params(), 0.03, 1);

        // Size tops out at 2.0 no matter how often it is raised.
        for _ in 0..100 {
            controls.handle_key(KeyCode::Char('S'), KeyModifiers::NONE);
        }
        assert_eq!(controls.params.size_factor, ranges::SIZE.1);

        // Depth bottoms out at the range floor.
        for _ in 0..100 {
            controls.handle_key(KeyCode::Char('d'), KeyModifiers::NONE);
        }
        assert_eq!(controls.params.max_depth, ranges::DEPTH.0);
    }

    #[test]
    fn quit_keys_request_exit() {
        let mut controls = Controls::new(Preset::Classic, Preset::Classic.params(), 0.03, 1);
        assert!(controls.handle_key(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(controls.handle_key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(!controls.handle_key(KeyCode::Char('S'), KeyModifiers::NONE));
    }

    #[test]
    fn preset_cycle_swaps_parameter_defaults() {
        let mut controls = Controls::new(Preset::Classic, Preset::Classic.params(), 0.03, 1);
        controls.handle_key(KeyCode::Char('p'), KeyModifiers::NONE);
        assert_eq!(controls.preset, Preset::Glow);
        assert_eq!(controls.params, Preset::Glow.params());
    }
}
