//! Falling glyph rain
//!
//! The canvas is divided into 6×8 character cells. Every column has a
//! falling head, a speed, a trail length and a ring of glyphs. The head is
//! drawn near-white and the trail fades with distance behind it. Glyphs
//! occasionally mutate in place.

use heapless::Vec;
use rand::Rng;

use super::{Effect, Frame, InitContext, Raster};
use crate::color::{self, BLACK};

const CELL_W: usize = 6;
const CELL_H: usize = 8;
const GLYPH_W: usize = 5;
const GLYPH_H: usize = 7;
/// Enough columns for a 384 px wide canvas
pub const MAX_COLUMNS: usize = 64;
/// Glyph ring length; at least the number of visible rows
const RING: usize = 32;
const TRAIL_MIN: u8 = 6;
const TRAIL_MAX: u8 = 22;
/// Chance per column per frame that one glyph mutates
const MUTATE_ODDS: u32 = 20;

const HEAD: u8 = color::pack(200, 255, 200);
const TRAIL: u8 = color::pack(0, 255, 0);

#[derive(Debug, Clone)]
struct Column {
    /// Head position in rows; negative while waiting to enter
    head: f32,
    /// Rows per frame
    speed: f32,
    trail: u8,
    glyphs: [u8; RING],
}

impl Column {
    fn spawn<R: Rng>(rng: &mut R, rows: usize) -> Self {
        let mut glyphs = [0u8; RING];
        rng.fill(&mut glyphs[..]);
        Self {
            head: -(rng.gen_range(0..rows.max(1)) as f32),
            speed: rng.gen_range(0.15..0.6),
            trail: rng.gen_range(TRAIL_MIN..TRAIL_MAX),
            glyphs,
        }
    }
}

/// 5×7 bitmap for a glyph code, one byte per row (low 5 bits)
///
/// Glyphs are hashed rather than taken from a font; they only need to look
/// like a dense alphabet, not spell anything.
pub fn glyph_rows(code: u8) -> [u8; GLYPH_H] {
    let mut h = (code as u32).wrapping_mul(0x9E37_79B9) ^ 0x5bd1_e995;
    let mut rows = [0u8; GLYPH_H];
    for row in rows.iter_mut() {
        h ^= h >> 13;
        h = h.wrapping_mul(0x85eb_ca6b);
        *row = (h >> 11) as u8 & 0x1F;
    }
    // Never blank: keep a spine down the middle
    rows[0] |= 0b00100;
    rows[GLYPH_H - 1] |= 0b00100;
    rows
}

fn draw_glyph(raster: &mut Raster<'_>, col: usize, row: usize, code: u8, c: u8) {
    let (x0, y0) = ((col * CELL_W) as i32, (row * CELL_H) as i32);
    for (dy, bits) in glyph_rows(code).iter().enumerate() {
        for dx in 0..GLYPH_W {
            if bits & (1 << dx) != 0 {
                raster.put(x0 + dx as i32, y0 + dy as i32, c);
            }
        }
    }
}

pub struct Matrix {
    columns: Vec<Column, MAX_COLUMNS>,
    rows: usize,
}

impl Matrix {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: 0,
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

/// Trail color `distance` rows behind the head
fn trail_color(distance: u8, trail: u8) -> u8 {
    if distance == 0 {
        return HEAD;
    }
    let level = 255 - (distance as u32 * 255 / (trail as u32 + 1)) as u8;
    color::dim(TRAIL, level)
}

impl Effect for Matrix {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        self.rows = ctx.height / CELL_H;
        let count = (ctx.width / CELL_W).min(MAX_COLUMNS);
        self.columns.clear();
        for _ in 0..count {
            // Capacity checked by the min() above
            let _ = self.columns.push(Column::spawn(&mut *ctx.rng, self.rows));
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let (w, h, rows) = (frame.width, frame.height, self.rows);
        let (back, rng) = (&mut *frame.back, &mut *frame.rng);
        let mut raster = Raster::new(back, w, h);
        raster.clear(BLACK);

        for (i, column) in self.columns.iter_mut().enumerate() {
            column.head += column.speed;
            if rng.gen_ratio(1, MUTATE_ODDS) {
                let slot = rng.gen_range(0..RING);
                column.glyphs[slot] = rng.gen();
            }

            let head = column.head as i32;
            for distance in 0..=column.trail {
                let row = head - distance as i32;
                if row < 0 || row as usize >= rows {
                    continue;
                }
                let code = column.glyphs[row as usize % RING];
                draw_glyph(&mut raster, i, row as usize, code, trail_color(distance, column.trail));
            }

            if head - column.trail as i32 >= rows as i32 {
                *column = Column::spawn(rng, rows);
            }
        }
    }
}
