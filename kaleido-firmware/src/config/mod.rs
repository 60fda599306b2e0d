//! Frame configuration
//!
//! `frame.toml` is embedded at build time (and validated by build.rs)
//! and parsed at boot by a small no_std parser.

pub mod toml;

use kaleido_core::config::EngineConfig;

pub use toml::{parse_config, ParseError};

/// Everything the firmware reads from `frame.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameConfig {
    pub engine: EngineConfig,
    /// Frame period in milliseconds
    pub frame_ms: u32,
    /// Rotate the panel by 180°
    pub flip: bool,
    /// Drive the ambient indicator strip
    pub lights: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            frame_ms: 33,
            flip: false,
            lights: true,
        }
    }
}
