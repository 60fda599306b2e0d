//! Frame memory regions
//!
//! Large buffers (canvas pair, automaton grids, distance field) are carved
//! out of board memory once at boot. Boards usually have a small fast
//! region (internal SRAM) and a larger, slower one (PSRAM or a heap); the
//! engine asks the fast pool first and degrades to the fallback.

/// Which pool a reservation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryTier {
    /// Internal, single-cycle memory
    Fast,
    /// External or heap-backed memory
    Fallback,
}

/// Source of long-lived byte regions
///
/// Reservations are never returned; the engine holds them for the whole
/// runtime.
pub trait FrameMemory {
    /// Tier of every region handed out by this source
    fn tier(&self) -> MemoryTier;

    /// Bytes still available
    fn available(&self) -> usize;

    /// Reserve `len` zeroed bytes, or `None` if the source is exhausted
    fn reserve(&mut self, len: usize) -> Option<&'static mut [u8]>;
}

/// Bump allocator over a static region
pub struct Arena {
    free: &'static mut [u8],
    tier: MemoryTier,
}

impl Arena {
    /// Create an arena over `region`
    pub fn new(region: &'static mut [u8], tier: MemoryTier) -> Self {
        Self { free: region, tier }
    }

    /// An arena with nothing in it
    pub fn empty(tier: MemoryTier) -> Self {
        Self {
            free: Default::default(),
            tier,
        }
    }
}

impl FrameMemory for Arena {
    fn tier(&self) -> MemoryTier {
        self.tier
    }

    fn available(&self) -> usize {
        self.free.len()
    }

    fn reserve(&mut self, len: usize) -> Option<&'static mut [u8]> {
        if len > self.free.len() {
            return None;
        }
        let free = core::mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(len);
        self.free = tail;
        head.fill(0);
        Some(head)
    }
}

/// Fast pool with a slower fallback
pub struct MemoryPools<'a> {
    pub fast: &'a mut dyn FrameMemory,
    pub fallback: &'a mut dyn FrameMemory,
}

impl<'a> MemoryPools<'a> {
    /// Bundle two memory sources
    pub fn new(fast: &'a mut dyn FrameMemory, fallback: &'a mut dyn FrameMemory) -> Self {
        Self { fast, fallback }
    }

    /// Reserve from the fast pool, falling back when it is exhausted
    pub fn reserve(&mut self, len: usize) -> Option<(&'static mut [u8], MemoryTier)> {
        if let Some(region) = self.fast.reserve(len) {
            return Some((region, self.fast.tier()));
        }
        self.fallback
            .reserve(len)
            .map(|region| (region, self.fallback.tier()))
    }

    /// Reserve from the fallback pool only
    ///
    /// For tables that are read rarely enough that they should not take
    /// fast memory away from the framebuffers.
    pub fn reserve_fallback(&mut self, len: usize) -> Option<&'static mut [u8]> {
        self.fallback.reserve(len)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::boxed::Box;
    use std::vec;

    fn region(len: usize) -> &'static mut [u8] {
        Box::leak(vec![0xAAu8; len].into_boxed_slice())
    }

    #[test]
    fn test_arena_bumps_and_zeroes() {
        let mut arena = Arena::new(region(10), MemoryTier::Fast);
        let a = arena.reserve(4).unwrap();
        assert_eq!(a.len(), 4);
        assert!(a.iter().all(|&b| b == 0));
        assert_eq!(arena.available(), 6);
        assert!(arena.reserve(7).is_none());
        assert_eq!(arena.reserve(6).unwrap().len(), 6);
        assert_eq!(arena.available(), 0);
    }

    #[test]
    fn test_pools_fall_back_when_fast_exhausted() {
        let mut fast = Arena::new(region(8), MemoryTier::Fast);
        let mut slow = Arena::new(region(32), MemoryTier::Fallback);
        let mut pools = MemoryPools::new(&mut fast, &mut slow);

        let (_, tier) = pools.reserve(8).unwrap();
        assert_eq!(tier, MemoryTier::Fast);

        let (_, tier) = pools.reserve(8).unwrap();
        assert_eq!(tier, MemoryTier::Fallback);

        assert!(pools.reserve(64).is_none());
    }

    #[test]
    fn test_empty_arena_reserves_nothing_but_zero() {
        let mut arena = Arena::empty(MemoryTier::Fallback);
        assert!(arena.reserve(1).is_none());
        assert_eq!(arena.reserve(0).map(|r| r.len()), Some(0));
    }
}
