//! Differential renderer
//!
//! Compares the freshly rendered buffer against the one on screen and
//! pushes only the horizontal runs that changed. Each row is scanned four
//! bytes at a time to skip equal regions quickly; run edges are then
//! trimmed byte by byte. A row whose width is not a multiple of four ends
//! in a partial word that is compared bytewise.
//!
//! Differing words that touch are merged into one run even if a few bytes
//! inside happen to match, trading a handful of redundant bytes for fewer
//! transfers.
//!
//! During a transition the panel shows a dimmed copy of the canvas; the
//! canvas itself always holds full-brightness pixels.

use kaleido_hal::{DisplayError, IndexedDisplay};

use crate::color::DimTable;

/// Pixels staged per transfer by [`present_dimmed`]
const DIM_CHUNK: usize = 320;

/// Horizontal span of changed pixels within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Run {
    pub start: usize,
    pub len: usize,
}

/// Counters for one presented frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PushStats {
    /// `push_image` calls issued
    pub runs: u32,
    /// Pixels transmitted
    pub pixels: u32,
}

impl PushStats {
    fn add(&mut self, len: usize) {
        self.runs += 1;
        self.pixels += len as u32;
    }
}

#[inline]
fn word(row: &[u8], unit: usize) -> u32 {
    let i = unit * 4;
    u32::from_ne_bytes([row[i], row[i + 1], row[i + 2], row[i + 3]])
}

/// Iterator over the changed runs of one row
pub struct RowRuns<'a> {
    back: &'a [u8],
    front: &'a [u8],
    /// Whole words in the row
    words: usize,
    /// Words plus the trailing partial word, if any
    units: usize,
    unit: usize,
}

impl<'a> RowRuns<'a> {
    /// Scan `back` against `front`; both must be the same length
    pub fn new(back: &'a [u8], front: &'a [u8]) -> Self {
        debug_assert_eq!(back.len(), front.len());
        let width = back.len().min(front.len());
        Self {
            back: &back[..width],
            front: &front[..width],
            words: width / 4,
            units: width.div_ceil(4),
            unit: 0,
        }
    }

    fn differs(&self, unit: usize) -> bool {
        if unit < self.words {
            word(self.back, unit) != word(self.front, unit)
        } else {
            let tail = self.words * 4;
            self.back[tail..] != self.front[tail..]
        }
    }
}

impl Iterator for RowRuns<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        while self.unit < self.units && !self.differs(self.unit) {
            self.unit += 1;
        }
        if self.unit == self.units {
            return None;
        }

        let mut start = self.unit * 4;
        while self.back[start] == self.front[start] {
            start += 1;
        }

        self.unit += 1;
        while self.unit < self.units && self.differs(self.unit) {
            self.unit += 1;
        }

        let mut end = (self.unit * 4).min(self.back.len()) - 1;
        while self.back[end] == self.front[end] {
            end -= 1;
        }

        Some(Run {
            start,
            len: end - start + 1,
        })
    }
}

/// Push every run where `back` differs from `front`, then commit
///
/// Rows without differences transmit nothing; the commit is issued even
/// when the frame is unchanged.
pub fn present_diff<D: IndexedDisplay + ?Sized>(
    display: &mut D,
    back: &[u8],
    front: &[u8],
    width: usize,
    height: usize,
) -> Result<PushStats, DisplayError> {
    if width == 0 || back.len() < width * height || front.len() < width * height {
        return Err(DisplayError::OutOfBounds);
    }
    let mut stats = PushStats::default();
    for (y, (b, f)) in back
        .chunks_exact(width)
        .zip(front.chunks_exact(width))
        .take(height)
        .enumerate()
    {
        for run in RowRuns::new(b, f) {
            display.push_image(
                run.start as u16,
                y as u16,
                run.len as u16,
                1,
                &b[run.start..run.start + run.len],
            )?;
            stats.add(run.len);
        }
    }
    display.display()?;
    Ok(stats)
}

/// Push the whole buffer in one transfer, then commit
pub fn present_full<D: IndexedDisplay + ?Sized>(
    display: &mut D,
    back: &[u8],
    width: usize,
    height: usize,
) -> Result<PushStats, DisplayError> {
    let len = width * height;
    if back.len() < len {
        return Err(DisplayError::OutOfBounds);
    }
    display.push_image(0, 0, width as u16, height as u16, &back[..len])?;
    display.display()?;
    let mut stats = PushStats::default();
    stats.add(len);
    Ok(stats)
}

/// Push the whole buffer scaled by `level`, then commit
///
/// `back` is not modified. Rows are staged through a small buffer, so a
/// row wider than [`DIM_CHUNK`] goes out in several transfers.
pub fn present_dimmed<D: IndexedDisplay + ?Sized>(
    display: &mut D,
    back: &[u8],
    width: usize,
    height: usize,
    level: u8,
) -> Result<PushStats, DisplayError> {
    let len = width * height;
    if width == 0 || back.len() < len {
        return Err(DisplayError::OutOfBounds);
    }
    let table = DimTable::new(level);
    let mut staged = [0u8; DIM_CHUNK];
    let mut stats = PushStats::default();
    for (y, row) in back[..len].chunks_exact(width).enumerate() {
        for (i, src) in row.chunks(DIM_CHUNK).enumerate() {
            let out = &mut staged[..src.len()];
            for (dst, &px) in out.iter_mut().zip(src) {
                *dst = table.apply(px);
            }
            display.push_image((i * DIM_CHUNK) as u16, y as u16, src.len() as u16, 1, out)?;
            stats.add(src.len());
        }
    }
    display.display()?;
    Ok(stats)
}
