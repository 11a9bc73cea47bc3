use clap::ValueEnum;
use rand::Rng;

/// Branching rule for the recursive fractal
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum FractalKind {
    /// Two children per branch, spread symmetrically
    Tree,
    /// Three children per branch: spread pair plus a straight continuation
    Multibranch,
}

impl FractalKind {
    pub fn label(self) -> &'static str {
        match self {
            FractalKind::Tree => "tree",
            FractalKind::Multibranch => "multibranch",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            FractalKind::Tree => FractalKind::Multibranch,
            FractalKind::Multibranch => FractalKind::Tree,
        }
    }
}

/// Whole-canvas tumble axis, independent of per-layer drawing
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum AxisMode {
    None,
    Front,
    Back,
    Side,
}

impl AxisMode {
    pub fn label(self) -> &'static str {
        match self {
            AxisMode::None => "none",
            AxisMode::Front => "front",
            AxisMode::Back => "back",
            AxisMode::Side => "side",
        }
    }

    pub fn cycled(self) -> Self {
        match self {
            AxisMode::None => AxisMode::Front,
            AxisMode::Front => AxisMode::Back,
            AxisMode::Back => AxisMode::Side,
            AxisMode::Side => AxisMode::None,
        }
    }
}

/// Layer perspective formula
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScaleMode {
    /// scale = 1 / (z * k)
    Inverse,
    /// scale = focal / (focal + z)
    Perspective,
}

/// Recognized control ranges (slider min/max). Keyboard and CLI input is
/// clamped to these; preset constants may sit outside them until touched.
pub mod ranges {
    pub const SIZE: (f32, f32) = (0.5, 2.0);
    pub const SPEED: (f32, f32) = (0.1, 2.0);
    pub const HUE: (f32, f32) = (0.0, 360.0);
    pub const AMPLITUDE: (f32, f32) = (0.0, 1.0);
    pub const DEPTH: (u32, u32) = (3, 12);
    pub const BASE_ANGLE: (f32, f32) = (0.0, 90.0);
    pub const LENGTH_REDUCTION: (f32, f32) = (0.5, 0.9);
    pub const AXIS_SPEED: (f32, f32) = (0.0, 5.0);
    pub const TUNNEL_DEPTH: (f32, f32) = (100.0, 600.0);
    pub const FOCAL_LENGTH: (f32, f32) = (100.0, 600.0);
    pub const LAYERS: (u32, u32) = (10, 50);
    pub const TRAIL_FADE: (f32, f32) = (0.0, 0.5);
}

pub fn clamp_control(value: f32, range: (f32, f32)) -> f32 {
    value.clamp(range.0, range.1)
}

pub fn clamp_control_u32(value: u32, range: (u32, u32)) -> u32 {
    value.clamp(range.0, range.1)
}

/// Per-frame configuration snapshot: every live-adjustable control.
/// Sampled once per frame and passed down; the render core never reads
/// anything else.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunnelParams {
    pub size_factor: f32,
    pub tunnel_speed: f32,
    pub hue_offset: f32,
    pub branch_amplitude: f32,
    pub max_depth: u32,
    pub base_angle_deg: f32,
    pub length_reduction: f32,
    pub fractal_kind: FractalKind,
    pub axis_mode: AxisMode,
    pub axis_speed: f32,
    pub tunnel_depth: f32,
    pub focal_length: f32,
    pub num_layers: u32,
    pub trail_fade: f32,
}

impl TunnelParams {
    /// Draw every control uniformly from its recognized range.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        self.size_factor = rng.gen_range(ranges::SIZE.0..=ranges::SIZE.1);
        self.tunnel_speed = rng.gen_range(ranges::SPEED.0..=ranges::SPEED.1);
        self.hue_offset = rng.gen_range(ranges::HUE.0..=ranges::HUE.1);
        self.branch_amplitude = rng.gen_range(ranges::AMPLITUDE.0..=ranges::AMPLITUDE.1);
        self.max_depth = rng.gen_range(ranges::DEPTH.0..=ranges::DEPTH.1);
        self.base_angle_deg = rng.gen_range(ranges::BASE_ANGLE.0..=ranges::BASE_ANGLE.1);
        self.length_reduction =
            rng.gen_range(ranges::LENGTH_REDUCTION.0..=ranges::LENGTH_REDUCTION.1);
        self.fractal_kind = if rng.gen_bool(0.5) {
            FractalKind::Tree
        } else {
            FractalKind::Multibranch
        };
        self.tunnel_depth = rng.gen_range(ranges::TUNNEL_DEPTH.0..=ranges::TUNNEL_DEPTH.1);
        self.focal_length = rng.gen_range(ranges::FOCAL_LENGTH.0..=ranges::FOCAL_LENGTH.1);
        self.num_layers = rng.gen_range(ranges::LAYERS.0..=ranges::LAYERS.1);
        self.trail_fade = rng.gen_range(ranges::TRAIL_FADE.0..=ranges::TRAIL_FADE.1);
    }
}

impl Default for TunnelParams {
    fn default() -> Self {
        Preset::Classic.params()
    }
}

/// Style constants distinguishing the two built-in variants of the renderer.
/// The drawing algorithm is shared; everything that differs between variants
/// is a field here.
#[derive(Clone, Copy, Debug)]
pub struct StylePreset {
    pub name: &'static str,
    /// Fixed simulation-clock increment per frame
    pub time_step: f32,
    pub hue_rate: f32,
    pub hue_depth_step: f32,
    pub sat_base: f32,
    pub sat_amp: f32,
    pub light_base: f32,
    pub light_amp: f32,
    pub light_rate: f32,
    pub stroke_width_mul: f32,
    pub stroke_alpha: f32,
    /// Rate of the time-oscillating branch-angle wobble
    pub wobble_rate: f32,
    pub scale_mode: ScaleMode,
    /// k of the inverse formula; unused under Perspective
    pub inverse_k: f32,
    /// Wrap layer depth into [0, tunnel_depth) instead of drifting forever
    pub wrap_layers: bool,
    pub lateral_amp: f32,
    pub lateral_z_rate: f32,
    pub lateral_time_rate: f32,
    pub spin_rate: f32,
    pub spin_z_rate: f32,
    pub alpha_scale: f32,
    /// Root branch length as a fraction of the reference dimension
    pub root_frac: f32,
    /// Reference dimension: canvas height, or the smaller of width/height
    pub root_from_height: bool,
}

pub const CLASSIC: StylePreset = StylePreset {
    name: "classic",
    time_step: 0.005,
    hue_rate: 50.0,
    hue_depth_step: 15.0,
    sat_base: 100.0,
    sat_amp: 0.0,
    light_base: 50.0,
    light_amp: 0.0,
    light_rate: 0.5,
    stroke_width_mul: 0.5,
    stroke_alpha: 1.0,
    wobble_rate: 2.0,
    scale_mode: ScaleMode::Inverse,
    inverse_k: 0.1,
    wrap_layers: false,
    lateral_amp: 50.0,
    lateral_z_rate: 0.1,
    lateral_time_rate: 0.15,
    spin_rate: 0.3,
    spin_z_rate: 0.01,
    alpha_scale: 1.0,
    root_frac: 0.4,
    root_from_height: false,
};

pub const GLOW: StylePreset = StylePreset {
    name: "glow",
    time_step: 0.007,
    hue_rate: 60.0,
    hue_depth_step: 20.0,
    sat_base: 100.0,
    sat_amp: 15.0,
    light_base: 60.0,
    light_amp: 10.0,
    light_rate: 0.5,
    stroke_width_mul: 1.8,
    stroke_alpha: 0.9,
    wobble_rate: 2.5,
    scale_mode: ScaleMode::Perspective,
    inverse_k: 0.1,
    wrap_layers: true,
    lateral_amp: 50.0,
    lateral_z_rate: 0.02,
    lateral_time_rate: 0.7,
    spin_rate: 0.35,
    spin_z_rate: 0.015,
    alpha_scale: 0.95,
    root_frac: 1.0 / 3.5,
    root_from_height: true,
};

/// Built-in presets: style constants plus matching control defaults.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum Preset {
    /// Sharp full-screen tunnel with inverse perspective
    Classic,
    /// Soft drifting tunnel with focal-length perspective and long trails
    Glow,
}

impl Preset {
    pub fn style(self) -> &'static StylePreset {
        match self {
            Preset::Classic => &CLASSIC,
            Preset::Glow => &GLOW,
        }
    }

    pub fn params(self) -> TunnelParams {
        match self {
            Preset::Classic => TunnelParams {
                size_factor: 1.5,
                tunnel_speed: 1.5,
                hue_offset: 30.0,
                branch_amplitude: 0.6,
                max_depth: 7,
                base_angle_deg: 35.0,
                length_reduction: 0.65,
                fractal_kind: FractalKind::Tree,
                axis_mode: AxisMode::None,
                axis_speed: 1.5,
                tunnel_depth: 600.0,
                focal_length: 600.0,
                num_layers: 50,
                trail_fade: 0.05,
            },
            Preset::Glow => TunnelParams {
                size_factor: 0.6,
                tunnel_speed: 0.18,
                hue_offset: 120.0,
                branch_amplitude: 1.5,
                max_depth: 9,
                base_angle_deg: 35.0,
                length_reduction: 0.78,
                fractal_kind: FractalKind::Tree,
                axis_mode: AxisMode::None,
                axis_speed: 0.0,
                tunnel_depth: 900.0,
                focal_length: 1800.0,
                num_layers: 18,
                trail_fade: 0.18,
            },
        }
    }

    pub fn cycled(self) -> Self {
        match self {
            Preset::Classic => Preset::Glow,
            Preset::Glow => Preset::Classic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn clamp_control_enforces_recognized_ranges() {
        assert_eq!(clamp_control(3.0, ranges::SIZE), 2.0);
        assert_eq!(clamp_control(0.1, ranges::SIZE), 0.5);
        assert_eq!(clamp_control(1.0, ranges::SIZE), 1.0);
        assert_eq!(clamp_control_u32(20, ranges::DEPTH), 12);
        assert_eq!(clamp_control_u32(1, ranges::DEPTH), 3);
    }

    #[test]
    fn randomize_stays_within_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut params = TunnelParams::default();

        for _ in 0..50 {
            params.randomize(&mut rng);
            assert!(params.size_factor >= ranges::SIZE.0 && params.size_factor <= ranges::SIZE.1);
            assert!(params.tunnel_speed >= ranges::SPEED.0 && params.tunnel_speed <= ranges::SPEED.1);
            assert!(params.max_depth >= ranges::DEPTH.0 && params.max_depth <= ranges::DEPTH.1);
            assert!(params.num_layers >= ranges::LAYERS.0 && params.num_layers <= ranges::LAYERS.1);
            assert!(
                params.length_reduction >= ranges::LENGTH_REDUCTION.0
                    && params.length_reduction <= ranges::LENGTH_REDUCTION.1
            );
            assert!(params.trail_fade >= ranges::TRAIL_FADE.0 && params.trail_fade <= ranges::TRAIL_FADE.1);
        }
    }

    #[test]
    fn presets_use_distinct_scale_formulas() {
        assert_eq!(CLASSIC.scale_mode, ScaleMode::Inverse);
        assert_eq!(GLOW.scale_mode, ScaleMode::Perspective);
        assert!(!CLASSIC.wrap_layers);
        assert!(GLOW.wrap_layers);
    }

    #[test]
    fn preset_cycle_returns_after_two_steps() {
        assert_eq!(Preset::Classic.cycled(), Preset::Glow);
        assert_eq!(Preset::Classic.cycled().cycled(), Preset::Classic);
    }

    #[test]
    fn kind_and_axis_cycles_cover_all_variants() {
        assert_eq!(FractalKind::Tree.toggled(), FractalKind::Multibranch);
        assert_eq!(FractalKind::Multibranch.toggled(), FractalKind::Tree);

        let mut axis = AxisMode::None;
        let mut seen = vec![axis];
        for _ in 0..3 {
            axis = axis.cycled();
            seen.push(axis);
        }
        assert_eq!(axis.cycled(), AxisMode::None);
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }
}
