//! WS2812 chain driven from an SPI MOSI line
//!
//! With SPI clocked at 3.2 MHz each WS2812 bit becomes one 4-bit nibble:
//! `1000` for a zero (312 ns high) and `1110` for a one (937 ns high).
//! A color byte therefore takes four SPI bytes and a light takes twelve,
//! sent green, red, blue. The frame ends with a run of zero bytes that
//! holds the line low long enough to latch.

use embedded_hal::spi::SpiBus;
use heapless::Vec;
use kaleido_hal::{IndicatorError, IndicatorStrip, Rgb8};

/// SPI clock the encoding assumes
pub const SPI_HZ: u32 = 3_200_000;

/// Longest supported chain
pub const MAX_LIGHTS: usize = 16;

/// SPI bytes per light
const BYTES_PER_LIGHT: usize = 12;

/// Low time after a frame (~300 µs at 3.2 MHz)
const RESET_BYTES: usize = 120;

const FRAME_CAPACITY: usize = MAX_LIGHTS * BYTES_PER_LIGHT + RESET_BYTES;

/// Global brightness ceiling, out of 255
pub const DEFAULT_BRIGHTNESS: u8 = 40;

const ZERO: u8 = 0b1000;
const ONE: u8 = 0b1110;

/// Encode one color byte as four SPI bytes, MSB first
pub fn encode_byte(value: u8) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        let hi = value >> (7 - 2 * i) & 1;
        let lo = value >> (6 - 2 * i) & 1;
        let nibble = |bit: u8| if bit == 1 { ONE } else { ZERO };
        *slot = nibble(hi) << 4 | nibble(lo);
    }
    out
}

/// WS2812 strip of `len` lights
pub struct Ws2812<SPI> {
    spi: SPI,
    /// Last latched colors (before brightness)
    colors: [Rgb8; MAX_LIGHTS],
    len: usize,
    brightness: u8,
    frame: Vec<u8, FRAME_CAPACITY>,
}

impl<SPI: SpiBus> Ws2812<SPI> {
    /// Create a strip; `len` is clamped to [`MAX_LIGHTS`]
    pub fn new(spi: SPI, len: usize) -> Self {
        Self {
            spi,
            colors: [Rgb8::BLACK; MAX_LIGHTS],
            len: len.min(MAX_LIGHTS),
            brightness: DEFAULT_BRIGHTNESS,
            frame: Vec::new(),
        }
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Last colors shown, before the brightness ceiling
    pub fn colors(&self) -> &[Rgb8] {
        &self.colors[..self.len]
    }

    fn encode(&mut self) {
        self.frame.clear();
        for c in self.colors[..self.len].iter() {
            let c = c.scaled(self.brightness);
            for byte in [c.g, c.r, c.b] {
                // Capacity covers MAX_LIGHTS plus the reset tail
                let _ = self.frame.extend_from_slice(&encode_byte(byte));
            }
        }
        for _ in 0..RESET_BYTES {
            let _ = self.frame.push(0);
        }
    }
}

impl<SPI: SpiBus> IndicatorStrip for Ws2812<SPI> {
    fn len(&self) -> usize {
        self.len
    }

    fn show(&mut self, colors: &[Rgb8]) -> Result<(), IndicatorError> {
        if colors.len() > self.len {
            return Err(IndicatorError::TooManyColors);
        }
        self.colors[..colors.len()].copy_from_slice(colors);
        self.encode();
        self.spi.write(&self.frame).map_err(|_| IndicatorError::Bus)?;
        self.spi.flush().map_err(|_| IndicatorError::Bus)
    }
}
