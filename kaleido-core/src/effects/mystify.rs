//! Mystify polygons
//!
//! Two closed quadrilaterals whose vertices bounce independently off the
//! canvas edges. The buffer fades every frame so edges leave afterimages;
//! each polygon walks through the palette at its own rate.

use rand::Rng;

use super::{Effect, Frame, InitContext};
use crate::color::DimTable;

const POLYGONS: usize = 2;
const VERTICES: usize = 4;
const TRAIL_LEVEL: u8 = 200;

#[derive(Debug, Clone, Copy, Default)]
struct Vertex {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

impl Vertex {
    /// Move one step, reflecting off `0..=max`
    fn advance(&mut self, max_x: f32, max_y: f32) {
        self.x += self.vx;
        self.y += self.vy;
        if self.x < 0.0 {
            self.x = 0.0;
            self.vx = -self.vx;
        } else if self.x > max_x {
            self.x = max_x;
            self.vx = -self.vx;
        }
        if self.y < 0.0 {
            self.y = 0.0;
            self.vy = -self.vy;
        } else if self.y > max_y {
            self.y = max_y;
            self.vy = -self.vy;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Polygon {
    vertices: [Vertex; VERTICES],
    hue: f32,
    hue_rate: f32,
}

pub struct Mystify {
    polygons: [Polygon; POLYGONS],
    trail: DimTable,
}

impl Mystify {
    pub fn new() -> Self {
        Self {
            polygons: [Polygon::default(); POLYGONS],
            trail: DimTable::new(TRAIL_LEVEL),
        }
    }
}

impl Default for Mystify {
    fn default() -> Self {
        Self::new()
    }
}

fn velocity<R: Rng>(rng: &mut R) -> f32 {
    let v = rng.gen_range(0.8..3.0);
    if rng.gen() {
        v
    } else {
        -v
    }
}

impl Effect for Mystify {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        let (w, h) = (ctx.width as f32, ctx.height as f32);
        for poly in self.polygons.iter_mut() {
            for v in poly.vertices.iter_mut() {
                *v = Vertex {
                    x: ctx.rng.gen_range(0.0..w),
                    y: ctx.rng.gen_range(0.0..h),
                    vx: velocity(&mut *ctx.rng),
                    vy: velocity(&mut *ctx.rng),
                };
            }
            poly.hue = ctx.rng.gen_range(0.0..256.0);
            poly.hue_rate = ctx.rng.gen_range(0.2..1.2);
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let max_x = frame.width as f32 - 1.0;
        let max_y = frame.height as f32 - 1.0;
        let palette = frame.palette;
        let mut raster = frame.raster();
        raster.fade(&self.trail);

        for poly in self.polygons.iter_mut() {
            for v in poly.vertices.iter_mut() {
                v.advance(max_x, max_y);
            }
            poly.hue = libm::fmodf(poly.hue + poly.hue_rate, 256.0);
            let c = palette[poly.hue as usize & 0xFF];
            for i in 0..VERTICES {
                let a = poly.vertices[i];
                let b = poly.vertices[(i + 1) % VERTICES];
                raster.line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, c);
            }
        }
    }
}
