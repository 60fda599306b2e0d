//! Precomputed lookup tables shared by the generators

use core::f32::consts::PI;

use kaleido_hal::MemoryPools;

/// One full sine period in 256 steps, scaled to `0..=255`
///
/// Entry `i` is `127 * sin(i * 2π / 256) + 128`.
pub struct SineTable {
    table: [u8; 256],
}

impl SineTable {
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let s = libm::sinf(i as f32 * 2.0 * PI / 256.0);
            *slot = (127.0 * s + 128.0) as u8;
        }
        Self { table }
    }

    /// Sine at a phase; the phase wraps every 256 steps
    #[inline]
    pub fn at(&self, phase: u32) -> u8 {
        self.table[(phase & 0xFF) as usize]
    }

    pub fn as_slice(&self) -> &[u8; 256] {
        &self.table
    }
}

impl Default for SineTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-pixel distance from the canvas center, truncated to a byte
///
/// Costs a full `width * height` region, so it is optional; callers that
/// cannot get the memory render without the radial term.
pub struct DistanceField {
    width: u16,
    cells: &'static mut [u8],
}

impl DistanceField {
    /// Reserve and fill the field, preferring the fallback pool
    pub fn allocate(width: u16, height: u16, pools: &mut MemoryPools<'_>) -> Option<Self> {
        let len = width as usize * height as usize;
        let cells = match pools.reserve_fallback(len) {
            Some(region) => region,
            None => pools.reserve(len).map(|(region, _)| region)?,
        };
        Some(Self::fill(width, height, cells))
    }

    /// Fill a caller-provided region of `width * height` bytes
    pub fn fill(width: u16, height: u16, cells: &'static mut [u8]) -> Self {
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        for (i, cell) in cells.iter_mut().enumerate() {
            let x = (i % width.max(1) as usize) as f32;
            let y = (i / width.max(1) as usize) as f32;
            let (dx, dy) = (x - cx, y - cy);
            *cell = (libm::sqrtf(dx * dx + dy * dy) as u32 & 0xFF) as u8;
        }
        Self { width, cells }
    }

    /// One row of the field
    pub fn row(&self, y: usize) -> &[u8] {
        let w = self.width as usize;
        &self.cells[y * w..(y + 1) * w]
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use kaleido_hal::{Arena, MemoryTier};
    use std::boxed::Box;
    use std::vec;

    #[test]
    fn test_sine_table_shape() {
        let sine = SineTable::new();
        assert_eq!(sine.at(0), 128);
        assert_eq!(sine.at(64), 255);
        assert_eq!(sine.at(192), 1);
        assert_eq!(sine.at(256), sine.at(0));
    }

    #[test]
    fn test_distance_field_center_and_corner() {
        let region = Box::leak(vec![0u8; 32 * 16].into_boxed_slice());
        let field = DistanceField::fill(32, 16, region);
        assert_eq!(field.row(8)[16], 0);
        // sqrt(16² + 8²) ≈ 17.9
        assert_eq!(field.row(0)[0], 17);
        assert_eq!(field.row(15).len(), 32);
    }

    #[test]
    fn test_distance_field_needs_memory() {
        let mut fast = Arena::empty(MemoryTier::Fast);
        let mut slow = Arena::empty(MemoryTier::Fallback);
        let mut pools = MemoryPools::new(&mut fast, &mut slow);
        assert!(DistanceField::allocate(8, 8, &mut pools).is_none());
    }
}
