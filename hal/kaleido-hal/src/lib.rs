//! Kaleido Hardware Abstraction Layer
//!
//! This crate defines the hardware seams between the animation engine and
//! the board it runs on. The engine only ever talks to these traits, so the
//! same core runs against a real SPI panel, a host-side model display in
//! tests, or anything else that can accept horizontal pixel runs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (kaleido-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kaleido-core (engine, effects, diff)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kaleido-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │   ILI9341     │       │  WS2812 strip │
//! │ (kaleido-drv) │       │ (kaleido-drv) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`display::IndexedDisplay`] - 8-bit indexed panel with run pushes
//! - [`indicator::IndicatorStrip`] - Ambient indicator LEDs
//! - [`memory::FrameMemory`] - Fast / fallback memory regions for buffers

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod indicator;
pub mod memory;

// Re-export key traits at crate root for convenience
pub use display::{DisplayError, IndexedDisplay, WriteSession};
pub use indicator::{IndicatorError, IndicatorStrip, Rgb8};
pub use memory::{Arena, FrameMemory, MemoryPools, MemoryTier};
