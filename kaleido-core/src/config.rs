//! Engine configuration
//!
//! Plain data describing what to play and how. The firmware fills it from
//! `frame.toml`; anything missing keeps the defaults below.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::palette::DEFAULT_BLEND_STEPS;

/// Maximum playlist entries
pub const MAX_PLAYLIST: usize = 16;

/// Ordered list of effects the scheduler cycles through
pub type Playlist = Vec<EffectKind, MAX_PLAYLIST>;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Playlist has no entries
    EmptyPlaylist,
    /// More than [`MAX_PLAYLIST`] entries
    PlaylistTooLong,
    /// Effect name not recognized
    UnknownEffect,
    /// Palette name not in the catalog
    UnknownPalette,
    /// Minimum dwell exceeds maximum dwell
    DwellRange,
    /// A duration or count that must be positive is zero
    Zero,
}

/// Generative set: plasma, flow field, moiré, automaton
pub fn generative_playlist() -> Playlist {
    playlist_of(&[
        EffectKind::Plasma,
        EffectKind::FlowField,
        EffectKind::Moire,
        EffectKind::Cellular,
    ])
}

/// Classic screensaver set
pub fn screensaver_playlist() -> Playlist {
    playlist_of(&[
        EffectKind::Starfield,
        EffectKind::Matrix,
        EffectKind::Mystify,
        EffectKind::Pipes,
        EffectKind::Toasters,
        EffectKind::Logo,
        EffectKind::Plasma,
        EffectKind::FlowField,
    ])
}

fn playlist_of(kinds: &[EffectKind]) -> Playlist {
    kinds.iter().copied().take(MAX_PLAYLIST).collect()
}

/// Build a playlist from configuration names
pub fn playlist_from_names<'a, I>(names: I) -> Result<Playlist, ConfigError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut playlist = Playlist::new();
    for name in names {
        let kind = EffectKind::from_name(name).ok_or(ConfigError::UnknownEffect)?;
        playlist.push(kind).map_err(|_| ConfigError::PlaylistTooLong)?;
    }
    if playlist.is_empty() {
        return Err(ConfigError::EmptyPlaylist);
    }
    Ok(playlist)
}

/// How the panel transport is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BusPolicy {
    /// Open one write session at start and keep it
    #[default]
    Held,
    /// Open and close a session around every frame, so other devices
    /// (an SD card, say) can use the bus in between
    PerFrame,
}

impl BusPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "held" => Some(BusPolicy::Held),
            "per_frame" => Some(BusPolicy::PerFrame),
            _ => None,
        }
    }
}

/// Mode scheduling
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchedulerConfig {
    pub playlist: Playlist,
    /// Shortest time an effect stays on screen
    pub dwell_min_ms: u32,
    /// Longest time an effect stays on screen
    pub dwell_max_ms: u32,
    /// Length of each fade phase
    pub fade_ms: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            playlist: generative_playlist(),
            dwell_min_ms: 45_000,
            dwell_max_ms: 90_000,
            fade_ms: 1_000,
        }
    }
}

/// Palette cross-fade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PaletteConfig {
    /// Catalog index of the first palette; wraps modulo the catalog size
    pub first: u8,
    /// Frames per full cross-fade
    pub blend_steps: u16,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            first: 0,
            blend_steps: DEFAULT_BLEND_STEPS,
        }
    }
}

/// Ambient indicator sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AmbientConfig {
    /// Sample every Nth frame
    pub every: u8,
    /// Smoothing weight of a new sample, out of 256
    pub alpha: u8,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self { every: 3, alpha: 38 }
    }
}

/// Panel transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    pub bus: BusPolicy,
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub palette: PaletteConfig,
    pub ambient: AmbientConfig,
    pub display: DisplayConfig,
    /// Seed for the engine RNG
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            palette: PaletteConfig::default(),
            ambient: AmbientConfig::default(),
            display: DisplayConfig::default(),
            seed: 0x6b61_6c65_6964_6f00,
        }
    }
}

impl EngineConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scheduler;
        if s.playlist.is_empty() {
            return Err(ConfigError::EmptyPlaylist);
        }
        if s.dwell_min_ms > s.dwell_max_ms {
            return Err(ConfigError::DwellRange);
        }
        if s.fade_ms == 0 || self.palette.blend_steps == 0 || self.ambient.every == 0 {
            return Err(ConfigError::Zero);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.scheduler.playlist.len(), 4);
        assert_eq!(config.scheduler.playlist[0], EffectKind::Plasma);
    }

    #[test]
    fn test_screensaver_set_has_eight() {
        let set = screensaver_playlist();
        assert_eq!(set.len(), 8);
        assert_eq!(set[0], EffectKind::Starfield);
    }

    #[test]
    fn test_playlist_from_names() {
        let playlist = playlist_from_names(["pipes", "logo"]).unwrap();
        assert_eq!(&playlist[..], &[EffectKind::Pipes, EffectKind::Logo]);
        assert_eq!(playlist_from_names(["pipes", "lava"]), Err(ConfigError::UnknownEffect));
        assert_eq!(playlist_from_names([]), Err(ConfigError::EmptyPlaylist));
        let too_many = ["plasma"; MAX_PLAYLIST + 1];
        assert_eq!(playlist_from_names(too_many), Err(ConfigError::PlaylistTooLong));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = EngineConfig::default();
        config.scheduler.dwell_min_ms = 100_000;
        assert_eq!(config.validate(), Err(ConfigError::DwellRange));

        let mut config = EngineConfig::default();
        config.scheduler.fade_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero));

        let mut config = EngineConfig::default();
        config.scheduler.playlist.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPlaylist));
    }

    #[test]
    fn test_palette_ids_wrap_instead_of_failing() {
        let mut config = EngineConfig::default();
        config.palette.first = 6;
        assert_eq!(config.validate(), Ok(()));
        config.palette.first = u8::MAX;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_bus_policy_names() {
        assert_eq!(BusPolicy::from_name("held"), Some(BusPolicy::Held));
        assert_eq!(BusPolicy::from_name("per_frame"), Some(BusPolicy::PerFrame));
        assert_eq!(BusPolicy::from_name("shared"), None);
    }
}
