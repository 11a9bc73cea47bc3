//! Recursive branch geometry.
//!
//! Each frame regenerates the whole branch set from the parameter snapshot
//! and the shared clock; no segment survives across frames. Geometry is
//! collected in fractal-local space (root at the origin, unscaled) so the
//! per-layer transform can reuse one traversal result.

use crate::config::{FractalKind, StylePreset, TunnelParams};

/// Branches shorter than this are not drawn and do not recurse further,
/// regardless of remaining depth.
pub const MIN_BRANCH_LEN: f32 = 2.0;

/// One drawn line segment, the atomic visual unit of the fractal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Remaining recursion levels at the time this segment was emitted
    pub depth: u32,
}

impl Segment {
    pub fn length(&self) -> f32 {
        let dx = self.x2 - self.x1;
        let dy = self.y2 - self.y1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Collect the branch segments rooted at `(x, y)` facing `angle`.
///
/// Children spread by `base_angle ± sin(time·wobble_rate + depth)·amplitude`,
/// shrink by `length_reduction` and lose one level of depth. Terminates when
/// depth reaches zero or the branch falls under [`MIN_BRANCH_LEN`].
pub fn collect_branches(
    params: &TunnelParams,
    preset: &StylePreset,
    time: f32,
    x: f32,
    y: f32,
    angle: f32,
    length: f32,
    depth: u32,
    out: &mut Vec<Segment>,
) {
    if depth == 0 || length < MIN_BRANCH_LEN {
        return;
    }

    let x2 = x + length * angle.cos();
    let y2 = y + length * angle.sin();
    out.push(Segment { x1: x, y1: y, x2, y2, depth });

    let base = params.base_angle_deg.to_radians();
    let offset = base + (time * preset.wobble_rate + depth as f32).sin() * params.branch_amplitude;
    let child_len = length * params.length_reduction;

    match params.fractal_kind {
        FractalKind::Tree => {
            collect_branches(params, preset, time, x2, y2, angle - offset, child_len, depth - 1, out);
            collect_branches(params, preset, time, x2, y2, angle + offset, child_len, depth - 1, out);
        }
        FractalKind::Multibranch => {
            collect_branches(params, preset, time, x2, y2, angle - offset, child_len, depth - 1, out);
            collect_branches(params, preset, time, x2, y2, angle, child_len, depth - 1, out);
            collect_branches(params, preset, time, x2, y2, angle + offset, child_len, depth - 1, out);
        }
    }
}

/// Stroke color in HSL for a segment at the given remaining depth.
pub fn branch_color(preset: &StylePreset, time: f32, depth: u32, hue_offset: f32) -> (f32, f32, f32) {
    let d = depth as f32;
    let hue = (time * preset.hue_rate + d * preset.hue_depth_step + hue_offset).rem_euclid(360.0);
    let sat = preset.sat_base + (time + d).sin() * preset.sat_amp;
    let light = preset.light_base + (time * preset.light_rate + d).cos() * preset.light_amp;
    (hue, sat, light)
}

/// Stroke width before layer scaling: thicker near the trunk, thinner at
/// the tips.
pub fn stroke_width(preset: &StylePreset, depth: u32) -> f32 {
    depth as f32 * preset.stroke_width_mul
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FractalKind, Preset, CLASSIC};
    use std::f32::consts::FRAC_PI_2;

    fn params_without_wobble(kind: FractalKind, depth: u32, reduction: f32) -> TunnelParams {
        let mut params = Preset::Classic.params();
        params.fractal_kind = kind;
        params.max_depth = depth;
        params.length_reduction = reduction;
        params.branch_amplitude = 0.0;
        params
    }

    fn collect(params: &TunnelParams, length: f32) -> Vec<Segment> {
        let mut out = Vec::new();
        collect_branches(
            params,
            &CLASSIC,
            0.0,
            0.0,
            0.0,
            -FRAC_PI_2,
            length,
            params.max_depth,
            &mut out,
        );
        out
    }

    #[test]
    fn zero_depth_emits_nothing() {
        let params = params_without_wobble(FractalKind::Tree, 0, 0.9);
        assert!(collect(&params, 100.0).is_empty());
    }

    #[test]
    fn sub_minimum_length_emits_nothing() {
        let params = params_without_wobble(FractalKind::Tree, 8, 0.9);
        assert!(collect(&params, 1.9).is_empty());
    }

    #[test]
    fn tree_segment_count_is_full_binary_tree() {
        // Reduction 0.9 from 100 keeps every branch above the length floor
        // through depth 5, so the count is exactly 2^5 - 1.
        let params = params_without_wobble(FractalKind::Tree, 5, 0.9);
        assert_eq!(collect(&params, 100.0).len(), 31);
    }

    #[test]
    fn multibranch_segment_count_is_full_ternary_tree() {
        // (3^4 - 1) / 2
        let params = params_without_wobble(FractalKind::Multibranch, 4, 0.9);
        assert_eq!(collect(&params, 100.0).len(), 40);
    }

    #[test]
    fn length_floor_prunes_deep_recursion() {
        // 100 * 0.5^6 < 2, so even a depth-12 ceiling stops early.
        let params = params_without_wobble(FractalKind::Tree, 12, 0.5);
        let segments = collect(&params, 100.0);
        assert!(!segments.is_empty());
        assert!((segments.len() as u32) < 2u32.pow(12) - 1);
        for seg in &segments {
            assert!(seg.length() >= MIN_BRANCH_LEN - 1e-3);
        }
    }

    #[test]
    fn three_level_tree_matches_geometric_decay() {
        let mut params = params_without_wobble(FractalKind::Tree, 3, 0.65);
        params.base_angle_deg = 35.0;

        let segments = collect(&params, 100.0);
        assert_eq!(segments.len(), 7);

        let mut lengths: Vec<f32> = segments.iter().map(Segment::length).collect();
        lengths.sort_by(|a, b| b.partial_cmp(a).unwrap());
        let expected = [100.0, 65.0, 65.0, 42.25, 42.25, 42.25, 42.25];
        for (got, want) in lengths.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3, "length {got} != {want}");
        }

        // The trunk is emitted first and points straight up.
        let trunk = &segments[0];
        assert_eq!((trunk.x1, trunk.y1), (0.0, 0.0));
        assert!(trunk.x2.abs() < 1e-3);
        assert!((trunk.y2 + 100.0).abs() < 1e-3);
    }

    #[test]
    fn stroke_width_decreases_toward_the_tips() {
        for preset in [&CLASSIC, &crate::config::GLOW] {
            let mut prev = stroke_width(preset, 12);
            for depth in (1..12).rev() {
                let w = stroke_width(preset, depth);
                assert!(w < prev, "width must shrink as depth falls ({})", preset.name);
                prev = w;
            }
        }
    }

    #[test]
    fn hue_cycles_with_clock_and_depth() {
        let (h0, _, _) = branch_color(&CLASSIC, 0.0, 5, 30.0);
        assert!((h0 - (5.0 * 15.0 + 30.0)).abs() < 1e-4);

        // One full hue revolution after 360 / hue_rate clock units.
        let (h1, _, _) = branch_color(&CLASSIC, 360.0 / 50.0, 5, 30.0);
        assert!((h1 - h0).abs() < 1e-2);

        // Classic holds saturation and lightness fixed.
        let (_, s, l) = branch_color(&CLASSIC, 3.7, 5, 30.0);
        assert_eq!((s, l), (100.0, 50.0));
    }
}
