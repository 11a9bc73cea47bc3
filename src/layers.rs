//! Depth-layer computation for the tunnel illusion.
//!
//! Layers are recomputed from scratch every frame; no identity persists
//! across frames. Depth `z` here is tunnel depth, not recursion depth.

use crate::config::{ScaleMode, StylePreset, TunnelParams};

/// One depth slice of the tunnel for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct Layer {
    pub z: f32,
    pub scale: f32,
    pub lateral_shift: f32,
    pub rotation: f32,
    pub alpha: f32,
}

/// The inverse formula diverges at z = 0; clamp so a layer sitting exactly
/// on the viewer stays finite.
const MIN_INVERSE_Z: f32 = 1e-3;

pub fn layer_scale(preset: &StylePreset, focal_length: f32, z: f32) -> f32 {
    match preset.scale_mode {
        ScaleMode::Inverse => 1.0 / (z.max(MIN_INVERSE_Z) * preset.inverse_k),
        ScaleMode::Perspective => focal_length / (focal_length + z),
    }
}

/// Opacity falls linearly toward the far end of the tunnel.
pub fn layer_alpha(preset: &StylePreset, tunnel_depth: f32, z: f32) -> f32 {
    ((1.0 - z / tunnel_depth) * preset.alpha_scale).clamp(0.0, 1.0)
}

/// Compute the evenly spaced depth layers for this frame into `out`.
pub fn compute_layers(params: &TunnelParams, preset: &StylePreset, time: f32, out: &mut Vec<Layer>) {
    out.clear();

    let spacing = params.tunnel_depth / params.num_layers as f32;
    let offset = if preset.wrap_layers {
        time * params.tunnel_speed * params.tunnel_depth
    } else {
        time * params.tunnel_speed
    };

    for i in 0..params.num_layers {
        let mut z = i as f32 * spacing + offset;
        if preset.wrap_layers {
            z = z.rem_euclid(params.tunnel_depth);
        }

        out.push(Layer {
            z,
            scale: layer_scale(preset, params.focal_length, z),
            lateral_shift: (preset.lateral_z_rate * z + preset.lateral_time_rate * time).sin()
                * preset.lateral_amp,
            rotation: preset.spin_rate * time + preset.spin_z_rate * z,
            alpha: layer_alpha(preset, params.tunnel_depth, z),
        });
    }
}
