//! Flying toasters
//!
//! Winged toasters and slices of toast drift diagonally from the top
//! right towards the bottom left, wrapping around the edges. Toasters
//! flap their wings.

use rand::Rng;

use super::sprite::{TOAST, TOASTER_DOWN, TOASTER_UP};
use super::{Effect, Frame, InitContext};
use crate::color::BLACK;

const FLYERS: usize = 8;
/// Frames per wing position
const FLAP_FRAMES: u8 = 6;
const MARGIN: f32 = 24.0;

#[derive(Debug, Clone, Copy, Default)]
struct Flyer {
    x: f32,
    y: f32,
    speed: f32,
    toast: bool,
    flap: u8,
}

pub struct Toasters {
    flyers: [Flyer; FLYERS],
}

impl Toasters {
    pub fn new() -> Self {
        Self {
            flyers: [Flyer::default(); FLYERS],
        }
    }
}

impl Default for Toasters {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Toasters {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        let (w, h) = (ctx.width as f32, ctx.height as f32);
        for (i, f) in self.flyers.iter_mut().enumerate() {
            *f = Flyer {
                x: ctx.rng.gen_range(0.0..w + MARGIN),
                y: ctx.rng.gen_range(-MARGIN..h),
                speed: ctx.rng.gen_range(0.8..2.0),
                toast: i % 3 == 2,
                flap: ctx.rng.gen_range(0..FLAP_FRAMES * 2),
            };
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let (w, h) = (frame.width as f32, frame.height as f32);
        let mut raster = frame.raster();
        raster.clear(BLACK);

        for f in self.flyers.iter_mut() {
            f.x -= f.speed;
            f.y += f.speed * 0.5;
            if f.x < -MARGIN {
                f.x += w + MARGIN * 2.0;
            }
            if f.y > h + MARGIN {
                f.y -= h + MARGIN * 2.0;
            }
            f.flap = (f.flap + 1) % (FLAP_FRAMES * 2);

            let (x, y) = (f.x as i32, f.y as i32);
            if f.toast {
                TOAST.blit(&mut raster, x, y, None);
            } else if f.flap < FLAP_FRAMES {
                TOASTER_UP.blit(&mut raster, x, y, None);
            } else {
                TOASTER_DOWN.blit(&mut raster, x, y, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::Bench;

    #[test]
    fn test_flyers_wrap_and_stay_in_band() {
        let mut bench = Bench::new(96, 64);
        let mut toasters = Toasters::new();
        bench.init(&mut toasters);
        for frame in 0..1000 {
            bench.step(&mut toasters, frame * 16);
            for f in toasters.flyers.iter() {
                assert!(f.x >= -MARGIN - 2.0 && f.x <= 96.0 + MARGIN * 2.0);
                assert!(f.y >= -MARGIN - 2.0 && f.y <= 64.0 + MARGIN + 2.0);
            }
        }
    }

    #[test]
    fn test_draws_something() {
        let mut bench = Bench::new(96, 64);
        let mut toasters = Toasters::new();
        bench.init(&mut toasters);
        for f in toasters.flyers.iter_mut() {
            f.x = 40.0;
            f.y = 20.0;
        }
        bench.step(&mut toasters, 0);
        assert!(bench.lit() > 0);
    }
}
