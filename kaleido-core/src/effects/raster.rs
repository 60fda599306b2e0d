//! Clipped drawing primitives over an index buffer
//!
//! Generators draw with signed coordinates; anything outside the buffer is
//! silently dropped.

use crate::color::DimTable;

/// Mutable view of a `width * height` index buffer
pub struct Raster<'a> {
    buf: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Raster<'a> {
    pub fn new(buf: &'a mut [u8], width: usize, height: usize) -> Self {
        debug_assert!(buf.len() >= width * height);
        Self { buf, width, height }
    }

    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Set one pixel
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, c: u8) {
        if self.contains(x, y) {
            self.buf[y as usize * self.width + x as usize] = c;
        }
    }

    /// Read one pixel (0 outside the buffer)
    #[cfg(test)]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if self.contains(x, y) {
            self.buf[y as usize * self.width + x as usize]
        } else {
            0
        }
    }

    /// Horizontal span from `x0` to `x1` inclusive
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, c: u8) {
        if y < 0 || y as usize >= self.height {
            return;
        }
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let lo = lo.max(0);
        let hi = hi.min(self.width as i32 - 1);
        if lo > hi {
            return;
        }
        let row = y as usize * self.width;
        self.buf[row + lo as usize..=row + hi as usize].fill(c);
    }

    /// Bresenham line, endpoints inclusive
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: u8) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.put(x, y, c);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Filled circle from midpoint spans
    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, c: u8) {
        if radius <= 0 {
            if radius == 0 {
                self.put(cx, cy, c);
            }
            return;
        }
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            self.hline(cx - x, cx + x, cy + y, c);
            self.hline(cx - x, cx + x, cy - y, c);
            self.hline(cx - y, cx + y, cy + x, c);
            self.hline(cx - y, cx + y, cy - x, c);
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// Dim the whole buffer through a precomputed table
    pub fn fade(&mut self, table: &DimTable) {
        table.apply_all(&mut self.buf[..self.width * self.height]);
    }

    /// Fill the whole buffer
    pub fn clear(&mut self, c: u8) {
        self.buf[..self.width * self.height].fill(c);
    }
}
