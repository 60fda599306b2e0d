//! Ambient indicator sampler
//!
//! Samples evenly spaced points along the horizontal center line of the
//! rendered frame and eases each indicator toward its sample with an
//! exponential moving average, so the lights follow the picture without
//! flicker.

use kaleido_hal::{IndicatorError, IndicatorStrip, Rgb8};

use crate::color;
use crate::config::AmbientConfig;

/// Indicators driven by the sampler
pub const LIGHTS: usize = 10;

/// Smoothed per-indicator color state
pub struct AmbientSampler {
    /// 8.8 fixed-point channel accumulators; never reset after boot
    acc: [[u16; 3]; LIGHTS],
    /// Rounded accumulators, as last pushed
    levels: [Rgb8; LIGHTS],
    alpha: u16,
    every: u8,
    countdown: u8,
}

/// One EMA step on an 8.8 accumulator: `s += (x - s) * alpha / 256`
///
/// The step rounds to nearest, so an accumulator settles within half a
/// unit of `x` from either side.
#[inline]
fn ease(s: u16, x: u8, alpha: u16) -> u16 {
    let delta = ((x as i32) << 8) - s as i32;
    (s as i32 + ((delta * alpha as i32 + 128) >> 8)).clamp(0, u16::MAX as i32) as u16
}

/// Accumulator back to a channel value
#[inline]
fn level(s: u16) -> u8 {
    ((s as u32 + 128) >> 8).min(255) as u8
}

impl AmbientSampler {
    pub fn new(config: &AmbientConfig) -> Self {
        Self {
            acc: [[0; 3]; LIGHTS],
            levels: [Rgb8::BLACK; LIGHTS],
            alpha: config.alpha as u16,
            every: config.every.max(1),
            countdown: config.every.max(1),
        }
    }

    /// Current smoothed colors
    pub fn levels(&self) -> &[Rgb8; LIGHTS] {
        &self.levels
    }

    /// Sample coordinates for indicator `i`
    pub fn sample_point(i: usize, width: usize, height: usize) -> (usize, usize) {
        (width * (i + 1) / (LIGHTS + 1), height / 2)
    }

    /// Fold one frame into the accumulators
    pub fn update(&mut self, frame: &[u8], width: usize, height: usize) {
        for (i, acc) in self.acc.iter_mut().enumerate() {
            let (x, y) = Self::sample_point(i, width, height);
            let Some(&code) = frame.get(y * width + x) else {
                continue;
            };
            let (r, g, b) = color::unpack(code);
            for (s, x) in acc.iter_mut().zip([r, g, b]) {
                *s = ease(*s, x, self.alpha);
            }
            self.levels[i] = Rgb8::new(level(acc[0]), level(acc[1]), level(acc[2]));
        }
    }

    /// Count one frame; every `every`-th frame sample it and push to `strip`
    ///
    /// Returns whether the strip was updated.
    pub fn tick<S: IndicatorStrip + ?Sized>(
        &mut self,
        frame: &[u8],
        width: usize,
        height: usize,
        strip: &mut S,
    ) -> Result<bool, IndicatorError> {
        self.countdown -= 1;
        if self.countdown > 0 {
            return Ok(false);
        }
        self.countdown = self.every;
        self.update(frame, width, height);
        let n = strip.len().min(LIGHTS);
        strip.show(&self.levels[..n])?;
        Ok(true)
    }
}
