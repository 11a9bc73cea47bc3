//! Braille pixel canvas with motion trails.
//!
//! Each terminal cell holds a 2x4 grid of braille dots; each dot carries an
//! RGB accumulator so trails keep their color while they decay. Drawing never
//! clears the surface outright: the per-frame `fade` repaints translucent
//! black over the previous frame, which is what produces the afterimage
//! trails.

use crate::terminal::Terminal;
use crossterm::style::Color;

pub const DOTS_X: usize = 2;
pub const DOTS_Y: usize = 4;
const BRAILLE_BASE: u32 = 0x2800;

/// Dots dimmer than this are treated as unlit, so faded trails eventually
/// disappear instead of flickering at one bit of brightness.
const DOT_CUTOFF: f32 = 0.04;

/// Luminance above which a cell is drawn bold.
const BOLD_CUTOFF: f32 = 0.7;

pub struct Canvas {
    cells_w: usize,
    cells_h: usize,
    dots_w: usize,
    dots_h: usize,
    dots: Vec<[f32; 3]>,
}

impl Canvas {
    pub fn new(cells_w: u16, cells_h: u16) -> Self {
        let cells_w = cells_w as usize;
        let cells_h = cells_h as usize;
        let dots_w = cells_w * DOTS_X;
        let dots_h = cells_h * DOTS_Y;
        Self {
            cells_w,
            cells_h,
            dots_w,
            dots_h,
            dots: vec![[0.0; 3]; dots_w * dots_h],
        }
    }

    /// Follow a terminal resize. Trails are dropped; the caller's clock is
    /// untouched.
    pub fn resize(&mut self, cells_w: u16, cells_h: u16) {
        *self = Canvas::new(cells_w, cells_h);
    }

    /// Drawing surface width in dots.
    pub fn width(&self) -> f32 {
        self.dots_w as f32
    }

    /// Drawing surface height in dots.
    pub fn height(&self) -> f32 {
        self.dots_h as f32
    }

    /// Repaint translucent black over the whole surface: previous frames
    /// persist scaled by `1 - fade`. A fade of 0 keeps trails forever.
    pub fn fade(&mut self, fade: f32) {
        let keep = (1.0 - fade).clamp(0.0, 1.0);
        for dot in &mut self.dots {
            dot[0] *= keep;
            dot[1] *= keep;
            dot[2] *= keep;
        }
    }

    fn plot(&mut self, x: i32, y: i32, rgb: [f32; 3]) {
        if x < 0 || y < 0 || x >= self.dots_w as i32 || y >= self.dots_h as i32 {
            return;
        }
        let dot = &mut self.dots[y as usize * self.dots_w + x as usize];
        // Lighten blend: overlapping strokes keep the brighter channel.
        dot[0] = dot[0].max(rgb[0]);
        dot[1] = dot[1].max(rgb[1]);
        dot[2] = dot[2].max(rgb[2]);
    }

    /// Draw a line segment in dot coordinates, clipped to the surface.
    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, rgb: [f32; 3]) {
        let Some((x0, y0, x1, y1)) = self.clip(x0, y0, x1, y1) else {
            return;
        };

        // Bresenham over the clipped endpoints.
        let (mut x, mut y) = (x0.round() as i32, y0.round() as i32);
        let (x_end, y_end) = (x1.round() as i32, y1.round() as i32);
        let dx = (x_end - x).abs();
        let dy = -(y_end - y).abs();
        let sx = if x < x_end { 1 } else { -1 };
        let sy = if y < y_end { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x, y, rgb);
            if x == x_end && y == y_end {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                if x == x_end {
                    break;
                }
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                if y == y_end {
                    break;
                }
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw a segment with the given stroke width: `round(width)` parallel
    /// lines offset perpendicular to the segment.
    pub fn stroke(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, rgb: [f32; 3]) {
        let n = width.round().max(1.0) as i32;
        if n == 1 {
            self.line(x0, y0, x1, y1, rgb);
            return;
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        if len < f32::EPSILON {
            self.line(x0, y0, x1, y1, rgb);
            return;
        }

        let px = -dy / len;
        let py = dx / len;
        for i in 0..n {
            let off = i as f32 - (n - 1) as f32 / 2.0;
            self.line(
                x0 + px * off,
                y0 + py * off,
                x1 + px * off,
                y1 + py * off,
                rgb,
            );
        }
    }

    /// Cohen-Sutherland clip against the dot grid. Without this, layers
    /// scaled far past the viewport would make Bresenham walk enormous
    /// off-surface spans.
    fn clip(&self, mut x0: f32, mut y0: f32, mut x1: f32, mut y1: f32) -> Option<(f32, f32, f32, f32)> {
        const INSIDE: u8 = 0;
        const LEFT: u8 = 1;
        const RIGHT: u8 = 2;
        const BOTTOM: u8 = 4;
        const TOP: u8 = 8;

        let x_max = (self.dots_w - 1) as f32;
        let y_max = (self.dots_h - 1) as f32;

        let outcode = |x: f32, y: f32| -> u8 {
            let mut code = INSIDE;
            if x < 0.0 {
                code |= LEFT;
            } else if x > x_max {
                code |= RIGHT;
            }
            if y < 0.0 {
                code |= BOTTOM;
            } else if y > y_max {
                code |= TOP;
            }
            code
        };

        let mut code0 = outcode(x0, y0);
        let mut code1 = outcode(x1, y1);

        loop {
            if code0 | code1 == INSIDE {
                return Some((x0, y0, x1, y1));
            }
            if code0 & code1 != INSIDE {
                return None;
            }

            let code_out = if code0 != INSIDE { code0 } else { code1 };
            let (x, y);
            if code_out & TOP != 0 {
                x = x0 + (x1 - x0) * (y_max - y0) / (y1 - y0);
                y = y_max;
            } else if code_out & BOTTOM != 0 {
                x = x0 + (x1 - x0) * (0.0 - y0) / (y1 - y0);
                y = 0.0;
            } else if code_out & RIGHT != 0 {
                y = y0 + (y1 - y0) * (x_max - x0) / (x1 - x0);
                x = x_max;
            } else {
                y = y0 + (y1 - y0) * (0.0 - x0) / (x1 - x0);
                x = 0.0;
            }

            if code_out == code0 {
                x0 = x;
                y0 = y;
                code0 = outcode(x0, y0);
            } else {
                x1 = x;
                y1 = y;
                code1 = outcode(x1, y1);
            }
        }
    }

    fn dot(&self, x: usize, y: usize) -> [f32; 3] {
        self.dots[y * self.dots_w + x]
    }

    /// Pack the dot grid into braille characters on the terminal back
    /// buffer. Each cell takes the color of its brightest lit dot.
    pub fn render_to(&self, term: &mut Terminal) {
        term.clear();

        // Braille dot numbering within a 2x4 cell.
        const BITS: [[u8; DOTS_X]; DOTS_Y] = [
            [0x01, 0x08],
            [0x02, 0x10],
            [0x04, 0x20],
            [0x40, 0x80],
        ];

        for cy in 0..self.cells_h {
            for cx in 0..self.cells_w {
                let mut bits: u8 = 0;
                let mut best = [0.0f32; 3];
                let mut best_lum = 0.0f32;

                for dy in 0..DOTS_Y {
                    for dx in 0..DOTS_X {
                        let rgb = self.dot(cx * DOTS_X + dx, cy * DOTS_Y + dy);
                        let lum = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
                        if lum > DOT_CUTOFF {
                            bits |= BITS[dy][dx];
                            if lum > best_lum {
                                best_lum = lum;
                                best = rgb;
                            }
                        }
                    }
                }

                if bits != 0 {
                    let ch = char::from_u32(BRAILLE_BASE + bits as u32).unwrap_or(' ');
                    let color = Color::Rgb {
                        r: (best[0].clamp(0.0, 1.0) * 255.0) as u8,
                        g: (best[1].clamp(0.0, 1.0) * 255.0) as u8,
                        b: (best[2].clamp(0.0, 1.0) * 255.0) as u8,
                    };
                    term.set(cx as i32, cy as i32, ch, Some(color), best_lum > BOLD_CUTOFF);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn lit_dots(&self) -> usize {
        self.dots
            .iter()
            .filter(|d| d.iter().any(|&c| c > DOT_CUTOFF))
            .count()
    }
}
