//! Sine plasma
//!
//! Four phased sine lookups (horizontal, vertical, diagonal, radial) are
//! summed with byte wraparound, smoothed through one more sine lookup and
//! mapped through the palette. The phase rates are mutually prime so the
//! pattern does not visibly repeat.

use super::{Effect, Frame, InitContext};

pub struct Plasma;

impl Plasma {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Plasma {
    fn init(&mut self, _ctx: &mut InitContext<'_>) {}

    fn render(&mut self, frame: &mut Frame<'_>) {
        let t = frame.time_s();
        let t1 = (t * 47.0) as u32;
        let t2 = (t * 31.0) as u32;
        let t3 = (t * 23.0) as u32;
        let t4 = (t * 17.0) as u32;

        let (w, h) = (frame.width, frame.height);
        let sine = frame.sine;
        let palette = frame.palette;
        let distance = frame.distance;

        for (y, row) in frame.back.chunks_exact_mut(w).take(h).enumerate() {
            let sy = sine.at(y as u32 + t2) as u32;
            let radial = distance.map(|d| d.row(y));
            for (x, px) in row.iter_mut().enumerate() {
                let x = x as u32;
                let mut v = sine.at(x + t1) as u32 + sy + sine.at((x + y as u32 + t3) >> 1) as u32;
                if let Some(radial) = radial {
                    v += radial[x as usize] as u32 + t4;
                }
                *px = palette[sine.at(v) as usize];
            }
        }
    }
}
