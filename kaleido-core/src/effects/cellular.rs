//! Continuous cellular automaton
//!
//! A 160×120 grid of byte cells. Each generation replaces every interior
//! cell with a 1-2-1 weighted average of its 3×3 neighbourhood, then
//! pushes the result away from mid-grey. Occasionally a small patch is
//! re-randomised so the grid never settles. The grid is shown at 2× scale.
//!
//! The two generation buffers come from the frame memory pools. Without
//! them the effect renders black.

use kaleido_hal::MemoryPools;
use rand::Rng;

use super::{Effect, Frame, InitContext};

pub const GRID_WIDTH: usize = 160;
pub const GRID_HEIGHT: usize = 120;
pub const GRID_CELLS: usize = GRID_WIDTH * GRID_HEIGHT;

/// Side of the square patch re-randomised by a perturbation
const PATCH: usize = 7;
/// One perturbation every this many generations on average
const PERTURB_ODDS: u32 = 10;

pub struct Cellular {
    grids: Option<[&'static mut [u8]; 2]>,
    current: usize,
}

impl Cellular {
    /// Reserve both generation buffers
    pub fn allocate(pools: &mut MemoryPools<'_>) -> Self {
        let first = pools.reserve(GRID_CELLS).map(|(region, _)| region);
        let second = pools.reserve(GRID_CELLS).map(|(region, _)| region);
        match (first, second) {
            (Some(a), Some(b)) => Self::from_regions(a, b),
            _ => {
                warn!("cellular: no memory for {} byte grids, effect disabled", GRID_CELLS * 2);
                Self::disabled()
            }
        }
    }

    /// Use caller-provided generation buffers of [`GRID_CELLS`] bytes each
    pub fn from_regions(a: &'static mut [u8], b: &'static mut [u8]) -> Self {
        if a.len() < GRID_CELLS || b.len() < GRID_CELLS {
            return Self::disabled();
        }
        Self {
            grids: Some([a, b]),
            current: 0,
        }
    }

    /// An automaton without grids; renders black
    pub fn disabled() -> Self {
        Self {
            grids: None,
            current: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.grids.is_some()
    }

    /// Current generation
    pub fn grid(&self) -> Option<&[u8]> {
        self.grids
            .as_ref()
            .map(|grids| &grids[self.current][..GRID_CELLS])
    }

    /// Fill the grid with noise
    pub fn seed<R: Rng>(&mut self, rng: &mut R) {
        if let Some([a, b]) = self.grids.as_mut() {
            rng.fill(&mut a[..GRID_CELLS]);
            b[..GRID_CELLS].copy_from_slice(&a[..GRID_CELLS]);
        }
        self.current = 0;
    }

    /// Advance one generation
    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        let Some([a, b]) = self.grids.as_mut() else {
            return;
        };
        let (src, dst) = if self.current == 0 {
            (&**a, &mut **b)
        } else {
            (&**b, &mut **a)
        };
        generation(&src[..GRID_CELLS], &mut dst[..GRID_CELLS]);

        if rng.gen_ratio(1, PERTURB_ODDS) {
            let half = PATCH / 2;
            let cx = rng.gen_range(4..GRID_WIDTH - 4);
            let cy = rng.gen_range(4..GRID_HEIGHT - 4);
            for y in cy - half..=cy + half {
                let row = y * GRID_WIDTH;
                rng.fill(&mut dst[row + cx - half..=row + cx + half]);
            }
        }
        self.current ^= 1;
    }
}

/// One weighted-average generation; border cells are left untouched
fn generation(src: &[u8], dst: &mut [u8]) {
    const W: usize = GRID_WIDTH;
    for y in 1..GRID_HEIGHT - 1 {
        let (up, mid, down) = ((y - 1) * W, y * W, (y + 1) * W);
        for x in 1..W - 1 {
            let s = |i: usize| src[i] as u32;
            let sum = s(up + x - 1) + 2 * s(up + x) + s(up + x + 1)
                + 2 * s(mid + x - 1) + 4 * s(mid + x) + 2 * s(mid + x + 1)
                + s(down + x - 1) + 2 * s(down + x) + s(down + x + 1);
            dst[mid + x] = contrast((sum >> 4) as i32);
        }
    }
}

/// Push a value away from 128 by a quarter of its distance
#[inline]
fn contrast(v: i32) -> u8 {
    let pushed = if v > 128 {
        v + ((v - 128) >> 2)
    } else {
        v - ((128 - v) >> 2)
    };
    pushed.clamp(0, 255) as u8
}

impl Effect for Cellular {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        self.seed(&mut *ctx.rng);
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        self.step(&mut *frame.rng);
        let palette = frame.palette;
        let (w, h) = (frame.width, frame.height);
        let Some(grid) = self.grid() else {
            frame.back.fill(0);
            return;
        };
        for (y, row) in frame.back.chunks_exact_mut(w).take(h).enumerate() {
            let cells = &grid[(y / 2).min(GRID_HEIGHT - 1) * GRID_WIDTH..][..GRID_WIDTH];
            for (x, px) in row.iter_mut().enumerate() {
                let cx = x / 2;
                *px = if cx < GRID_WIDTH && y / 2 < GRID_HEIGHT {
                    palette[cells[cx] as usize]
                } else {
                    0
                };
            }
        }
    }
}
