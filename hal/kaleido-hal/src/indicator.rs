//! Indicator light abstractions
//!
//! Ambient LEDs around the frame (a WS2812 chain on most boards).

/// 8-bit per channel RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    /// All channels off
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color from channel values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `level / 256`
    pub const fn scaled(self, level: u8) -> Self {
        Self {
            r: ((self.r as u16 * level as u16) >> 8) as u8,
            g: ((self.g as u16 * level as u16) >> 8) as u8,
            b: ((self.b as u16 * level as u16) >> 8) as u8,
        }
    }
}

/// Indicator errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorError {
    /// Transport failure
    Bus,
    /// More colors supplied than the strip has lights
    TooManyColors,
}

/// Ordered chain of RGB indicator lights
pub trait IndicatorStrip {
    /// Number of lights in the chain
    fn len(&self) -> usize;

    /// Check if the chain has no lights
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latch one color per light, in chain order
    ///
    /// Supplying fewer colors than lights leaves the tail unchanged.
    fn show(&mut self, colors: &[Rgb8]) -> Result<(), IndicatorError>;
}
