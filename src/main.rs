mod canvas;
mod colors;
mod config;
mod fractal;
mod help;
mod layers;
mod settings;
mod terminal;
mod tunnel;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{clamp_control, clamp_control_u32, ranges, AxisMode, FractalKind, Preset, TunnelParams};
use rand::prelude::*;
use settings::{Settings, TunnelSettings};
use std::io;
use tunnel::{PrintConfig, RunConfig};

#[derive(Parser)]
#[command(name = "termtunnel")]
#[command(author = "Terminal Art Generator")]
#[command(version)]
#[command(
    about = "Terminal fractal tunnel: recursive branching fractals with depth-layer perspective",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tunnel parameters shared by both modes. Anything not given falls back to
/// the config file, then to the chosen preset's defaults.
#[derive(Args)]
struct ParamArgs {
    /// Style preset to start from
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// Base branch length scale [0.5-2]
    #[arg(long)]
    size: Option<f32>,

    /// Forward travel speed [0.1-2]
    #[arg(long)]
    speed: Option<f32>,

    /// Hue offset in degrees [0-360]
    #[arg(long)]
    hue: Option<f32>,

    /// Branch wobble amplitude in radians [0-1]
    #[arg(long)]
    amplitude: Option<f32>,

    /// Recursion depth ceiling [3-12]
    #[arg(short, long)]
    depth: Option<u32>,

    /// Base branching angle in degrees [0-90]
    #[arg(long)]
    base_angle: Option<f32>,

    /// Per-level length decay factor [0.5-0.9]
    #[arg(long)]
    length_reduction: Option<f32>,

    /// Branching rule
    #[arg(short, long, value_enum)]
    kind: Option<FractalKind>,

    /// Whole-canvas tumble axis
    #[arg(long, value_enum)]
    axis: Option<AxisMode>,

    /// Tumble speed [0-5]
    #[arg(long)]
    axis_speed: Option<f32>,

    /// Tunnel depth extent [100-600]
    #[arg(long)]
    tunnel_depth: Option<f32>,

    /// Perspective focal length [100-600]
    #[arg(long)]
    focal_length: Option<f32>,

    /// Number of depth layers [10-50]
    #[arg(short, long)]
    layers: Option<u32>,

    /// Alpha of the per-frame background repaint [0-0.5]
    #[arg(long)]
    trail_fade: Option<f32>,

    /// Start from a random parameter set
    #[arg(short, long)]
    random: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly through the tunnel interactively
    Run {
        #[command(flatten)]
        params: ParamArgs,

        /// Frame delay in seconds
        #[arg(short, long)]
        time: Option<f32>,
    },

    /// Simulate frames off-screen and print the final frame to stdout
    Print {
        #[command(flatten)]
        params: ParamArgs,

        /// Number of frames to simulate before printing
        #[arg(short, long, default_value = "90")]
        frames: u32,

        /// Output width in columns (defaults to the terminal width)
        #[arg(long)]
        width: Option<u16>,

        /// Output height in rows (defaults to the terminal height)
        #[arg(long)]
        height: Option<u16>,
    },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Run { params, time } => {
            let (preset, resolved, seed) = resolve(&params, &settings.tunnel);
            let delay = time
                .or(settings.tunnel.time)
                .unwrap_or(0.03)
                .clamp(0.005, 0.5);
            tunnel::run(RunConfig {
                preset,
                params: resolved,
                frame_delay: delay,
                seed,
            })
        }
        Commands::Print {
            params,
            frames,
            width,
            height,
        } => {
            let (preset, resolved, _) = resolve(&params, &settings.tunnel);
            tunnel::run_print(PrintConfig {
                preset,
                params: resolved,
                frames,
                width,
                height,
            })
        }
    }
}

/// Merge preset defaults, config-file overrides and CLI flags into the
/// starting parameter snapshot. CLI wins over file, file over preset.
fn resolve(args: &ParamArgs, file: &TunnelSettings) -> (Preset, TunnelParams, u64) {
    let preset = args
        .preset
        .or_else(|| parse_enum::<Preset>("preset", file.preset.as_deref()))
        .unwrap_or(Preset::Classic);

    let mut params = preset.params();
    apply_file_overrides(&mut params, file);
    apply_cli_overrides(&mut params, args);

    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });

    if args.random {
        let mut rng = StdRng::seed_from_u64(seed);
        params.randomize(&mut rng);
    }

    (preset, params, seed)
}

fn parse_enum<T: ValueEnum>(what: &str, value: Option<&str>) -> Option<T> {
    let value = value?;
    match T::from_str(value, true) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            eprintln!("Unknown {} in config file: {}", what, value);
            None
        }
    }
}

fn apply_file_overrides(params: &mut TunnelParams, file: &TunnelSettings) {
    if let Some(v) = file.size {
        params.size_factor = clamp_control(v, ranges::SIZE);
    }
    if let Some(v) = file.speed {
        params.tunnel_speed = clamp_control(v, ranges::SPEED);
    }
    if let Some(v) = file.hue {
        params.hue_offset = clamp_control(v, ranges::HUE);
    }
    if let Some(v) = file.amplitude {
        params.branch_amplitude = clamp_control(v, ranges::AMPLITUDE);
    }
    if let Some(v) = file.depth {
        params.max_depth = clamp_control_u32(v, ranges::DEPTH);
    }
    if let Some(v) = file.base_angle {
        params.base_angle_deg = clamp_control(v, ranges::BASE_ANGLE);
    }
    if let Some(v) = file.length_reduction {
        params.length_reduction = clamp_control(v, ranges::LENGTH_REDUCTION);
    }
    if let Some(kind) = parse_enum::<FractalKind>("fractal kind", file.kind.as_deref()) {
        params.fractal_kind = kind;
    }
    if let Some(axis) = parse_enum::<AxisMode>("axis mode", file.axis.as_deref()) {
        params.axis_mode = axis;
    }
    if let Some(v) = file.axis_speed {
        params.axis_speed = clamp_control(v, ranges::AXIS_SPEED);
    }
    if let Some(v) = file.tunnel_depth {
        params.tunnel_depth = clamp_control(v, ranges::TUNNEL_DEPTH);
    }
    if let Some(v) = file.focal_length {
        params.focal_length = clamp_control(v, ranges::FOCAL_LENGTH);
    }
    if let Some(v) = file.layers {
        params.num_layers = clamp_control_u32(v, ranges::LAYERS);
    }
    if let Some(v) = file.trail_fade {
        params.trail_fade = clamp_control(v, ranges::TRAIL_FADE);
    }
}

fn apply_cli_overrides(params: &mut TunnelParams, args: &ParamArgs) {
    if let Some(v) = args.size {
        params.size_factor = clamp_control(v, ranges::SIZE);
    }
    if let Some(v) = args.speed {
        params.tunnel_speed = clamp_control(v, ranges::SPEED);
    }
    if let Some(v) = args.hue {
        params.hue_offset = clamp_control(v, ranges::HUE);
    }
    if let Some(v) = args.amplitude {
        params.branch_amplitude = clamp_control(v, ranges::AMPLITUDE);
    }
    if let Some(v) = args.depth {
        params.max_depth = clamp_control_u32(v, ranges::DEPTH);
    }
    if let Some(v) = args.base_angle {
        params.base_angle_deg = clamp_control(v, ranges::BASE_ANGLE);
    }
    if let Some(v) = args.length_reduction {
        params.length_reduction = clamp_control(v, ranges::LENGTH_REDUCTION);
    }
    if let Some(kind) = args.kind {
        params.fractal_kind = kind;
    }
    if let Some(axis) = args.axis {
        params.axis_mode = axis;
    }
    if let Some(v) = args.axis_speed {
        params.axis_speed = clamp_control(v, ranges::AXIS_SPEED);
    }
    if let Some(v) = args.tunnel_depth {
        params.tunnel_depth = clamp_control(v, ranges::TUNNEL_DEPTH);
    }
    if let Some(v) = args.focal_length {
        params.focal_length = clamp_control(v, ranges::FOCAL_LENGTH);
    }
    if let Some(v) = args.layers {
        params.num_layers = clamp_control_u32(v, ranges::LAYERS);
    }
    if let Some(v) = args.trail_fade {
        params.trail_fade = clamp_control(v, ranges::TRAIL_FADE);
    }
}
