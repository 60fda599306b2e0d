//! Hardware driver implementations
//!
//! Concrete devices behind the traits in kaleido-hal, written against
//! blocking `embedded-hal` 1.0 buses:
//!
//! - Display: ILI9341 in 16-bit mode, fed 8-bit indexed runs
//! - Indicator: WS2812 chain clocked out of an SPI MOSI line

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display;
pub mod indicator;

pub use display::ili9341::{Ili9341, Ili9341Config, Orientation};
pub use indicator::ws2812::Ws2812;
