//! Renderable Ball State
//!
//! Turns the ball into a sprite (center, depth-cued radius, glint colour)
//! and draws it through a [`PixelSink`] one scanline at a time.
//!
//! Depth cue: the ball is drawn smaller toward the top of the arena
//! ("far") and larger toward the bottom ("near").

use crate::core::fixed::clamp_i32;
use crate::platform::PixelSink;
use crate::sim::state::{ArenaBounds, Ball};

/// Radius at the top edge, px
pub const BALL_RADIUS_MIN: i32 = 12;

/// Radius at the bottom edge, px
pub const BALL_RADIUS_MAX: i32 = 34;

/// Largest tile drawn in one pass, px
pub const TILE_MAX: i32 = 200;

/// Background colour (black)
pub const BACKGROUND_RGB565: u16 = 0x0000;

/// Where and how to draw the ball this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BallSprite {
    /// Center x, px
    pub cx: i32,
    /// Center y, px
    pub cy: i32,
    /// Radius, px
    pub radius: i32,
    /// Body colour (RGB565)
    pub color: u16,
    /// Glint intensity
    pub glint: u8,
}

impl BallSprite {
    /// Build from ball state and the arena it moves in.
    pub fn from_ball(ball: &Ball, bounds: &ArenaBounds) -> Self {
        let (cx, cy) = ball.pixel();
        Self {
            cx,
            cy,
            radius: depth_radius(cy, bounds),
            color: shade_rgb565(ball.glint),
            glint: ball.glint,
        }
    }

    /// Inclusive bounding box `(x0, y0, x1, y1)`, clipped to the display
    /// and to [`TILE_MAX`]. `None` when fully off-screen.
    pub fn tile(&self, width: u16, height: u16) -> Option<(u16, u16, u16, u16)> {
        let r = self.radius.min(TILE_MAX / 2);
        let x0 = (self.cx - r).max(0);
        let y0 = (self.cy - r).max(0);
        let x1 = (self.cx + r).min(width as i32 - 1);
        let y1 = (self.cy + r).min(height as i32 - 1);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0 as u16, y0 as u16, x1 as u16, y1 as u16))
    }

    /// Colour at (x, y) inside the tile.
    fn color_at(&self, x: i32, y: i32, background: u16) -> u16 {
        let (dx, dy) = (x - self.cx, y - self.cy);
        let r = self.radius;
        if dx * dx + dy * dy > r * r {
            return background;
        }
        // Specular spot up-left of center, sized by glint
        let spot = r * self.glint as i32 / 768;
        let (sx, sy) = (dx + r / 3, dy + r / 3);
        if spot > 0 && sx * sx + sy * sy <= spot * spot {
            0xFFFF
        } else {
            self.color
        }
    }
}

/// Radius for a ball at row `y`, linear from top to bottom of the arena.
pub fn depth_radius(y: i32, bounds: &ArenaBounds) -> i32 {
    let span = bounds.max_y - bounds.min_y;
    if span <= 0 {
        return BALL_RADIUS_MIN;
    }
    let depth = clamp_i32(y - bounds.min_y, 0, span);
    BALL_RADIUS_MIN + (BALL_RADIUS_MAX - BALL_RADIUS_MIN) * depth / span
}

/// Warm body colour brightened by glint.
pub fn shade_rgb565(glint: u8) -> u16 {
    let g = glint as u16;
    let r5 = 16 + (g >> 4); // 16..=31
    let g6 = 24 + (g >> 3) * 39 / 31; // 24..=63
    let b5 = 4 + (g >> 5); // 4..=11
    (r5 << 11) | (g6 << 5) | b5
}

/// Draw the sprite tile, one blocking scanline write per row.
///
/// Returns the number of rows written.
pub fn draw_ball<S: PixelSink + ?Sized>(sink: &mut S, sprite: &BallSprite, background: u16) -> usize {
    let (width, height) = sink.size();
    let Some((x0, y0, x1, y1)) = sprite.tile(width, height) else {
        return 0;
    };
    let mut line = Vec::with_capacity((x1 - x0) as usize + 1);
    for y in y0..=y1 {
        line.clear();
        line.extend((x0..=x1).map(|x| sprite.color_at(x as i32, y as i32, background)));
        sink.write_region(x0, y, x1, y, &line);
    }
    (y1 - y0) as usize + 1
}
