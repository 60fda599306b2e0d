//! Flow-field particles
//!
//! Particles follow the angle of a slowly scrolling noise field, leaving
//! trails that fade a little every frame.

use rand::Rng;

use super::{Effect, Frame, InitContext};
use crate::color::DimTable;
use crate::noise::noise2d;

/// Number of particles
pub const PARTICLES: usize = 500;

const NOISE_SCALE: f32 = 0.008;
const NOISE_DRIFT: f32 = 0.15;
const SPEED: f32 = 1.5;
/// Roughly 85 % per frame
const TRAIL_LEVEL: u8 = 216;

#[derive(Debug, Clone, Copy, Default)]
struct Particle {
    x: f32,
    y: f32,
}

pub struct FlowField {
    particles: [Particle; PARTICLES],
    trail: DimTable,
}

impl FlowField {
    pub fn new() -> Self {
        Self {
            particles: [Particle::default(); PARTICLES],
            trail: DimTable::new(TRAIL_LEVEL),
        }
    }
}

impl Default for FlowField {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a coordinate onto `0..extent`
///
/// Particles move less than one extent per step, so one correction is
/// enough; anything still outside (NaN, huge jumps) is pinned to 0.
pub fn wrap_coord(v: f32, extent: f32) -> f32 {
    let mut v = v;
    if v < 0.0 {
        v += extent;
    }
    if v >= extent {
        v -= extent;
    }
    if v >= 0.0 && v < extent {
        v
    } else {
        0.0
    }
}

impl Effect for FlowField {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        let (w, h) = (ctx.width as f32, ctx.height as f32);
        for p in self.particles.iter_mut() {
            p.x = ctx.rng.gen_range(0.0..w);
            p.y = ctx.rng.gen_range(0.0..h);
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let t = frame.time_s();
        let (w, h) = (frame.width, frame.height);
        let palette = frame.palette;
        let drift = t * NOISE_DRIFT;
        let hue_shift = t * 20.0;

        let mut raster = frame.raster();
        raster.fade(&self.trail);

        for p in self.particles.iter_mut() {
            let angle = noise2d(p.x * NOISE_SCALE, p.y * NOISE_SCALE + drift) * core::f32::consts::PI * 4.0;
            p.x = wrap_coord(p.x + libm::cosf(angle) * SPEED, w as f32);
            p.y = wrap_coord(p.y + libm::sinf(angle) * SPEED, h as f32);

            let index = ((p.x + p.y * 0.7 + hue_shift) as i32 & 0xFF) as usize;
            raster.put(p.x as i32, p.y as i32, palette[index]);
        }
    }
}
