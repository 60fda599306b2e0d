//! Double-buffered indexed canvas
//!
//! Two equally sized byte buffers; one is being rendered ("back"), the
//! other holds what the panel currently shows ("front"). [`Canvas::swap`]
//! exchanges the roles after every presented frame.

use kaleido_hal::{MemoryPools, MemoryTier};

/// Canvas errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanvasError {
    /// Neither memory pool could hold a buffer
    OutOfMemory { requested: usize },
    /// Width or height is zero
    ZeroSize,
    /// Supplied regions do not match `width * height`
    SizeMismatch,
}

/// Which of the two buffers to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Surface {
    /// Last presented frame
    Front,
    /// Frame being rendered
    Back,
}

/// Pair of `width * height` index buffers
pub struct Canvas {
    width: u16,
    height: u16,
    buffers: [&'static mut [u8]; 2],
    back: usize,
}

impl Canvas {
    /// Reserve both buffers, fast memory first
    pub fn allocate(width: u16, height: u16, pools: &mut MemoryPools<'_>) -> Result<Self, CanvasError> {
        let len = area(width, height)?;
        let mut reserve = |which: &str| -> Result<&'static mut [u8], CanvasError> {
            match pools.reserve(len) {
                Some((region, MemoryTier::Fast)) => Ok(region),
                Some((region, MemoryTier::Fallback)) => {
                    warn!("canvas: {} buffer in fallback memory ({} bytes)", which, len);
                    Ok(region)
                }
                None => {
                    error!("canvas: no memory for {} buffer ({} bytes)", which, len);
                    Err(CanvasError::OutOfMemory { requested: len })
                }
            }
        };
        let front = reserve("front")?;
        let back = reserve("back")?;
        Self::from_regions(width, height, front, back)
    }

    /// Build a canvas over caller-provided regions
    pub fn from_regions(
        width: u16,
        height: u16,
        front: &'static mut [u8],
        back: &'static mut [u8],
    ) -> Result<Self, CanvasError> {
        let len = area(width, height)?;
        if front.len() != len || back.len() != len {
            return Err(CanvasError::SizeMismatch);
        }
        Ok(Self {
            width,
            height,
            buffers: [front, back],
            back: 1,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Bytes per buffer
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(&self, surface: Surface) -> usize {
        match surface {
            Surface::Back => self.back,
            Surface::Front => self.back ^ 1,
        }
    }

    pub fn buffer(&self, surface: Surface) -> &[u8] {
        &*self.buffers[self.index(surface)]
    }

    pub fn buffer_mut(&mut self, surface: Surface) -> &mut [u8] {
        let i = self.index(surface);
        &mut *self.buffers[i]
    }

    /// Fill one buffer with `value`
    pub fn clear(&mut self, surface: Surface, value: u8) {
        self.buffer_mut(surface).fill(value);
    }

    /// Fill both buffers with `value`
    pub fn clear_all(&mut self, value: u8) {
        for buf in self.buffers.iter_mut() {
            buf.fill(value);
        }
    }

    /// Exchange front and back roles
    pub fn swap(&mut self) {
        self.back ^= 1;
    }

    /// Borrow `(back, front)` together
    pub fn split_mut(&mut self) -> (&mut [u8], &[u8]) {
        let [a, b] = &mut self.buffers;
        if self.back == 0 {
            (&mut **a, &**b)
        } else {
            (&mut **b, &**a)
        }
    }
}

fn area(width: u16, height: u16) -> Result<usize, CanvasError> {
    if width == 0 || height == 0 {
        return Err(CanvasError::ZeroSize);
    }
    Ok(width as usize * height as usize)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use kaleido_hal::{Arena, FrameMemory};
    use std::boxed::Box;
    use std::vec;

    fn region(len: usize) -> &'static mut [u8] {
        Box::leak(vec![0u8; len].into_boxed_slice())
    }

    #[test]
    fn test_allocate_prefers_fast_then_falls_back() {
        let mut fast = Arena::new(region(12), MemoryTier::Fast);
        let mut slow = Arena::new(region(12), MemoryTier::Fallback);
        {
            let mut pools = MemoryPools::new(&mut fast, &mut slow);
            let canvas = Canvas::allocate(4, 3, &mut pools).unwrap();
            assert_eq!(canvas.len(), 12);
        }
        assert_eq!(fast.available(), 0);
        assert_eq!(slow.available(), 0);
    }

    #[test]
    fn test_allocate_out_of_memory() {
        let mut fast = Arena::new(region(4), MemoryTier::Fast);
        let mut slow = Arena::empty(MemoryTier::Fallback);
        let mut pools = MemoryPools::new(&mut fast, &mut slow);
        assert_eq!(
            Canvas::allocate(4, 3, &mut pools).err(),
            Some(CanvasError::OutOfMemory { requested: 12 })
        );
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(
            Canvas::from_regions(0, 3, region(0), region(0)).err(),
            Some(CanvasError::ZeroSize)
        );
        assert_eq!(
            Canvas::from_regions(2, 2, region(4), region(3)).err(),
            Some(CanvasError::SizeMismatch)
        );
    }

    #[test]
    fn test_swap_exchanges_roles() {
        let mut canvas = Canvas::from_regions(2, 2, region(4), region(4)).unwrap();
        canvas.clear(Surface::Back, 7);
        assert_eq!(canvas.buffer(Surface::Front), &[0, 0, 0, 0]);
        canvas.swap();
        assert_eq!(canvas.buffer(Surface::Front), &[7, 7, 7, 7]);
        assert_eq!(canvas.buffer(Surface::Back), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_split_mut_reads_front_writes_back() {
        let mut canvas = Canvas::from_regions(2, 1, region(2), region(2)).unwrap();
        canvas.clear(Surface::Front, 9);
        let (back, front) = canvas.split_mut();
        back.copy_from_slice(front);
        back[0] = 1;
        assert_eq!(canvas.buffer(Surface::Back), &[1, 9]);
        assert_eq!(canvas.buffer(Surface::Front), &[9, 9]);
    }

    #[test]
    fn test_clear_all() {
        let mut canvas = Canvas::from_regions(1, 2, region(2), region(2)).unwrap();
        canvas.clear_all(3);
        assert_eq!(canvas.buffer(Surface::Front), &[3, 3]);
        assert_eq!(canvas.buffer(Surface::Back), &[3, 3]);
    }
}
