//! Button input

/// Turns a sampled "pressed" level into single press events
///
/// The frame loop samples the touch/button line once per frame; only the
/// frame on which it goes from released to pressed counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressLatch {
    held: bool,
}

impl PressLatch {
    pub const fn new() -> Self {
        Self { held: false }
    }

    /// Feed the current level; true on a rising edge
    pub fn update(&mut self, pressed: bool) -> bool {
        let edge = pressed && !self.held;
        self.held = pressed;
        edge
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sustained_press_fires_once() {
        let mut latch = PressLatch::new();
        let events: std::vec::Vec<bool> = [false, true, true, true, false, true]
            .iter()
            .map(|&p| latch.update(p))
            .collect();
        assert_eq!(events, [false, true, false, false, false, true]);
        assert!(latch.is_held());
    }
}
