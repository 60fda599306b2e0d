//! Moiré ring interference
//!
//! Four ring sources travel on Lissajous paths. Each pixel sums its
//! octagonal distance to every source, which produces interfering ring
//! bands; the palette index also rotates slowly with time.

use core::f32::consts::PI;

use super::{Effect, Frame, InitContext};

const SOURCES: usize = 4;

pub struct Moire;

impl Moire {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Moire {
    fn default() -> Self {
        Self::new()
    }
}

/// Octagonal distance approximation: `max + min / 2`
#[inline]
pub fn octagonal(dx: i32, dy: i32) -> i32 {
    let (dx, dy) = (dx.abs(), dy.abs());
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    hi + (lo >> 1)
}

/// Source positions at time `t` seconds
fn sources(t: f32, width: usize, height: usize) -> [(i32, i32); SOURCES] {
    let (w, h) = (width as f32, height as f32);
    let mut out = [(0, 0); SOURCES];
    for (i, src) in out.iter_mut().enumerate() {
        let i_f = i as f32;
        let phase = i_f * PI * 0.5;
        let freq_x = 0.3 + i_f * 0.17;
        let freq_y = 0.23 + i_f * 0.13;
        let x = w * 0.5 + w * 0.35 * libm::sinf(t * freq_x + phase);
        let y = h * 0.5 + h * 0.35 * libm::cosf(t * freq_y + phase * 1.3);
        *src = (x as i32, y as i32);
    }
    out
}

impl Effect for Moire {
    fn init(&mut self, _ctx: &mut InitContext<'_>) {}

    fn render(&mut self, frame: &mut Frame<'_>) {
        let t = frame.time_s();
        let (w, h) = (frame.width, frame.height);
        let src = sources(t, w, h);
        let shift = (t * 30.0) as u32;
        let palette = frame.palette;

        for (y, row) in frame.back.chunks_exact_mut(w).take(h).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                let sum: u32 = src
                    .iter()
                    .map(|&(sx, sy)| (octagonal(x as i32 - sx, y as i32 - sy) & 0xFF) as u32)
                    .sum();
                *px = palette[((sum + shift) & 0xFF) as usize];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::Bench;

    #[test]
    fn test_octagonal_distance() {
        assert_eq!(octagonal(0, 0), 0);
        assert_eq!(octagonal(10, 0), 10);
        assert_eq!(octagonal(-10, 4), 12);
        assert_eq!(octagonal(4, -10), 12);
    }

    #[test]
    fn test_sources_stay_near_canvas() {
        for step in 0..100 {
            for (x, y) in sources(step as f32 * 0.7, 320, 240) {
                assert!((0..320).contains(&x));
                assert!((0..240).contains(&y));
            }
        }
    }

    #[test]
    fn test_renders_palette_colors() {
        let mut bench = Bench::new(40, 30);
        let mut moire = Moire::new();
        bench.step(&mut moire, 2500);
        assert!(bench.shown().iter().all(|c| bench.palette.contains(c)));
    }
}
