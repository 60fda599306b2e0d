//! Growing pipes
//!
//! A few cursors crawl across the canvas in axis-aligned segments, each
//! drawing an 8 px wide shaded tube. At the end of a segment a cursor
//! turns 90° and a round joint is drawn.
//!
//! Pipes accumulate: every frame starts from the previously presented
//! buffer rather than a blank one. Once enough pixels are drawn the whole
//! canvas fades to black over a number of frames and growth restarts.

use rand::Rng;

use super::{Effect, Frame, InitContext, Raster};
use crate::color::{self, DimTable};

const CURSORS: usize = 4;
const THICKNESS: i32 = 8;
/// Pixels each cursor advances per frame
const SPEED: u32 = 3;
const SEGMENT_MIN: u32 = 16;
const SEGMENT_MAX: u32 = 96;
/// Frames spent fading out before the reset
const FADE_FRAMES: u8 = 40;
const FADE_LEVEL: u8 = 200;
const EDGE_LIGHT: u16 = 384;
const EDGE_DARK: u16 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Heading {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    fn from_index(i: u8) -> Self {
        match i & 3 {
            0 => Heading::Up,
            1 => Heading::Right,
            2 => Heading::Down,
            _ => Heading::Left,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Right => (1, 0),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Heading::Left | Heading::Right)
    }

    /// One of the two perpendicular headings
    fn turn(self, clockwise: bool) -> Self {
        let i = self as u8;
        Self::from_index(if clockwise { i + 1 } else { i + 3 })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    x: i32,
    y: i32,
    heading: Heading,
    remaining: u32,
    hue: u8,
}

pub struct Pipes {
    cursors: [Cursor; CURSORS],
    drawn: u32,
    threshold: u32,
    fading: u8,
    fade: DimTable,
}

impl Pipes {
    pub fn new() -> Self {
        Self {
            cursors: [Cursor::default(); CURSORS],
            drawn: 0,
            threshold: u32::MAX,
            fading: 0,
            fade: DimTable::new(FADE_LEVEL),
        }
    }

    fn spawn<R: Rng>(rng: &mut R, width: usize, height: usize) -> Cursor {
        Cursor {
            x: rng.gen_range(0..width as i32),
            y: rng.gen_range(0..height as i32),
            heading: Heading::from_index(rng.gen()),
            remaining: rng.gen_range(SEGMENT_MIN..SEGMENT_MAX),
            hue: rng.gen(),
        }
    }

    fn restart<R: Rng>(&mut self, rng: &mut R, width: usize, height: usize) {
        for c in self.cursors.iter_mut() {
            *c = Self::spawn(rng, width, height);
        }
        self.drawn = 0;
        self.fading = 0;
        // Fade once roughly 60 % of the canvas has been covered
        self.threshold = (width * height) as u32 / 10 * 6;
    }
}

impl Default for Pipes {
    fn default() -> Self {
        Self::new()
    }
}

/// Cross-section of a tube at `(x, y)`: light edge, body, dark edge
fn slice(raster: &mut Raster<'_>, x: i32, y: i32, heading: Heading, body: u8) -> u32 {
    let light = color::scale(body, EDGE_LIGHT);
    let dark = color::scale(body, EDGE_DARK);
    let half = THICKNESS / 2;
    for k in 0..THICKNESS {
        let c = match k {
            0 => light,
            k if k == THICKNESS - 1 => dark,
            _ => body,
        };
        if heading.is_horizontal() {
            raster.put(x, y - half + k, c);
        } else {
            raster.put(x - half + k, y, c);
        }
    }
    THICKNESS as u32
}

impl Effect for Pipes {
    fn init(&mut self, ctx: &mut InitContext<'_>) {
        self.restart(&mut *ctx.rng, ctx.width, ctx.height);
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let (w, h) = (frame.width, frame.height);
        let len = w * h;
        // Keep growing on top of what is on screen now
        frame.back[..len].copy_from_slice(&frame.front[..len]);

        if self.fading > 0 {
            let mut raster = frame.raster();
            raster.fade(&self.fade);
            self.fading -= 1;
            if self.fading == 0 {
                raster.clear(color::BLACK);
                self.restart(&mut *frame.rng, w, h);
                debug!("pipes: restart");
            }
            return;
        }

        let palette = frame.palette;
        let (back, rng) = (&mut *frame.back, &mut *frame.rng);
        let mut raster = Raster::new(back, w, h);
        for cursor in self.cursors.iter_mut() {
            let body = palette[cursor.hue as usize];
            for _ in 0..SPEED {
                self.drawn += slice(&mut raster, cursor.x, cursor.y, cursor.heading, body);
                let (dx, dy) = cursor.heading.delta();
                cursor.x += dx;
                cursor.y += dy;
                cursor.remaining = cursor.remaining.saturating_sub(1);

                if cursor.remaining == 0 {
                    raster.fill_circle(cursor.x, cursor.y, THICKNESS / 2, body);
                    cursor.heading = cursor.heading.turn(rng.gen());
                    cursor.remaining = rng.gen_range(SEGMENT_MIN..SEGMENT_MAX);
                }

                let off = cursor.x < 0 || cursor.y < 0 || cursor.x >= w as i32 || cursor.y >= h as i32;
                if off {
                    *cursor = Self::spawn(rng, w, h);
                    break;
                }
            }
        }

        if self.drawn > self.threshold {
            self.fading = FADE_FRAMES;
        }
    }
}
