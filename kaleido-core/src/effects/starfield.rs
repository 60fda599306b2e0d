//! Perspective starfield
//!
//! Stars live in a unit square around the view axis and approach the
//! viewer at a constant rate. Each is projected with a perspective divide
//! and drawn as a streak from its previous projected position. Nearer
//! stars are brighter.

use rand::Rng;

use super::{Effect, Frame, InitContext};
use crate::color::{self, BLACK, WHITE};

pub const STARS: usize = 200;

/// Depth at which stars spawn
const FAR: f32 = 1.0;
/// Stars closer than this respawn
const NEAR: f32 = 0.02;
/// Depth lost per frame
const APPROACH: f32 = 0.008;

#[derive(Debug, Clone, Copy, Default)]
struct Star {
    x: f32,
    y: f32,
    z: f32,
    /// Last projected position, if on screen
    prev: Option<(i32, i32)>,
}

impl Star {
    fn spawn<R: Rng>(rng: &mut R, z: f32) -> Self {
        Self {
            x: rng.gen_range(-1.0..1.0),
            y: rng.gen_range(-1.0..1.0),
            z,
            prev: None,
        }
    }

    fn project(&self, cx: f32, cy: f32) -> (i32, i32) {
        ((cx + self.x / self.z * cx) as i32, (cy + self.y / self.z * cy) as i32)
    }
}

pub struct Starfield {
    stars: [Star; STARS],
}

impl Starfield {
    pub fn new() -> Self {
        Self {
            stars: [Star::default(); STARS],
        }
    }
}

impl Default for Starfield {
    fn default() -> Self {
        Self::new()
    }
}

/// Brightness for a depth: 0 at the far plane, 255 at the viewer
fn brightness(z: f32) -> u8 {
    let p = ((FAR - z) / FAR).clamp(0.0, 1.0);
    (p * 255.0) as u8
}

impl Effect for Starfield {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        for star in self.stars.iter_mut() {
            let z = ctx.rng.gen_range(NEAR..FAR);
            *star = Star::spawn(&mut *ctx.rng, z);
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let (w, h) = (frame.width as i32, frame.height as i32);
        let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
        let (back, rng) = (&mut *frame.back, &mut *frame.rng);
        let mut raster = super::Raster::new(back, w as usize, h as usize);
        raster.clear(BLACK);

        for star in self.stars.iter_mut() {
            star.z -= APPROACH;
            if star.z <= NEAR {
                *star = Star::spawn(rng, FAR);
                continue;
            }
            let (sx, sy) = star.project(cx, cy);
            if sx < 0 || sy < 0 || sx >= w || sy >= h {
                *star = Star::spawn(rng, FAR);
                continue;
            }
            let c = color::dim(WHITE, brightness(star.z));
            match star.prev {
                Some((px, py)) => raster.line(px, py, sx, sy, c),
                None => raster.put(sx, sy, c),
            }
            star.prev = Some((sx, sy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::Bench;

    #[test]
    fn test_brightness_grows_with_proximity() {
        assert_eq!(brightness(FAR), 0);
        assert!(brightness(0.5) < brightness(0.1));
        assert_eq!(brightness(0.0), 255);
    }

    #[test]
    fn test_stars_respawn_in_range() {
        let mut bench = Bench::new(80, 60);
        let mut stars = Starfield::new();
        bench.init(&mut stars);
        for frame in 0..500 {
            bench.step(&mut stars, frame * 16);
            for s in stars.stars.iter() {
                assert!(s.z > NEAR - APPROACH && s.z <= FAR);
                assert!((-1.0..1.0).contains(&s.x));
            }
        }
        assert!(bench.lit() > 0);
    }

    #[test]
    fn test_projection_is_centered() {
        let star = Star {
            x: 0.0,
            y: 0.0,
            z: 0.5,
            prev: None,
        };
        assert_eq!(star.project(40.0, 30.0), (40, 30));
    }
}
