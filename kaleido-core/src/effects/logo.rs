//! Bouncing logo
//!
//! The logo sprite travels diagonally, bouncing off the canvas edges. Each
//! bounce picks a new tint from the active palette.

use rand::Rng;

use super::sprite::{Sprite, LOGO};
use super::{Effect, Frame, InitContext};
use crate::color::BLACK;

type LogoSprite = Sprite<24, 16>;

pub struct Logo {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    tint: u8,
    bounces: u32,
}

impl Logo {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 1.0,
            vy: 1.0,
            tint: 0,
            bounces: 0,
        }
    }

    /// Number of edge hits since activation
    pub fn bounces(&self) -> u32 {
        self.bounces
    }
}

impl Default for Logo {
    fn default() -> Self {
        Self::new()
    }
}

/// Reflect `pos` into `0..=max`, flipping `vel`; true on contact
fn bounce(pos: &mut f32, vel: &mut f32, max: f32) -> bool {
    if *pos <= 0.0 {
        *pos = 0.0;
        *vel = libm::fabsf(*vel);
        true
    } else if *pos >= max {
        *pos = max;
        *vel = -libm::fabsf(*vel);
        true
    } else {
        false
    }
}

impl Effect for Logo {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        let max_x = (ctx.width as i32 - LogoSprite::WIDTH).max(1) as f32;
        let max_y = (ctx.height as i32 - LogoSprite::HEIGHT).max(1) as f32;
        self.x = ctx.rng.gen_range(0.0..max_x);
        self.y = ctx.rng.gen_range(0.0..max_y);
        self.vx = if ctx.rng.gen() { 1.5 } else { -1.5 };
        self.vy = if ctx.rng.gen() { 1.0 } else { -1.0 };
        self.tint = ctx.rng.gen();
        self.bounces = 0;
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let max_x = (frame.width as i32 - LogoSprite::WIDTH).max(0) as f32;
        let max_y = (frame.height as i32 - LogoSprite::HEIGHT).max(0) as f32;

        self.x += self.vx;
        self.y += self.vy;
        let hit_x = bounce(&mut self.x, &mut self.vx, max_x);
        let hit_y = bounce(&mut self.y, &mut self.vy, max_y);
        if hit_x || hit_y {
            self.bounces += 1;
            self.tint = self.tint.wrapping_add(frame.rng.gen_range(40..216));
        }

        let tint = frame.color(self.tint);
        let (x, y) = (self.x as i32, self.y as i32);
        let mut raster = frame.raster();
        raster.clear(BLACK);
        LOGO.blit(&mut raster, x, y, Some(tint));
    }
}
