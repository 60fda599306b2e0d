//! Board-agnostic animation engine for the Kaleido art frame
//!
//! This crate contains everything that runs between "a millisecond tick
//! arrived" and "these pixel runs go to the panel":
//!
//! - Double-buffered indexed canvas
//! - Palette generation and endless cross-fade
//! - Generative effects (plasma, flow field, moiré, automaton, pipes,
//!   starfield, matrix rain, mystify, flying toasters, bouncing logo)
//! - Mode scheduler with fade-out / fade-in transitions
//! - Differential renderer that pushes only changed runs
//! - Ambient indicator sampler
//!
//! All per-frame state lives in fixed-capacity containers; nothing here
//! allocates after [`engine::Engine::new`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod ambient;
pub mod canvas;
pub mod color;
pub mod config;
pub mod diff;
pub mod effects;
pub mod engine;
pub mod input;
pub mod lut;
pub mod noise;
pub mod palette;
pub mod scheduler;
pub mod time;

pub use engine::{Engine, FrameReport};
