//! Indicator light drivers

pub mod ws2812;
