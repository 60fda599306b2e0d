//! Generative effects
//!
//! Each effect owns a fixed-size state block and renders one frame at a
//! time into the canvas back buffer. Effects are re-initialised whenever
//! the scheduler activates them; while inactive their state is left as is.
//!
//! Generators produce 8-bit values and map them through the active palette
//! ([`Frame::color`]); sprite and screensaver effects may also write RGB332
//! codes directly.

pub mod cellular;
pub mod flow;
pub mod logo;
pub mod matrix;
pub mod moire;
pub mod mystify;
pub mod pipes;
pub mod plasma;
pub mod raster;
pub mod sprite;
pub mod starfield;
pub mod toasters;

use rand::rngs::SmallRng;

use crate::lut::{DistanceField, SineTable};
use crate::palette::PaletteTable;

pub use cellular::Cellular;
pub use flow::FlowField;
pub use logo::Logo;
pub use matrix::Matrix;
pub use moire::Moire;
pub use mystify::Mystify;
pub use pipes::Pipes;
pub use plasma::Plasma;
pub use raster::Raster;
pub use starfield::Starfield;
pub use toasters::Toasters;

/// Everything a generator may touch while rendering one frame
pub struct Frame<'a> {
    /// Buffer being rendered
    pub back: &'a mut [u8],
    /// Last presented buffer
    pub front: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// Active palette for this frame
    pub palette: &'a PaletteTable,
    pub sine: &'a SineTable,
    /// Center-distance field, if memory allowed one
    pub distance: Option<&'a DistanceField>,
    /// Milliseconds since this effect was activated
    pub time_ms: u32,
    pub rng: &'a mut SmallRng,
}

impl Frame<'_> {
    /// Effect clock in seconds
    #[inline]
    pub fn time_s(&self) -> f32 {
        self.time_ms as f32 / 1000.0
    }

    /// Palette lookup
    #[inline]
    pub fn color(&self, value: u8) -> u8 {
        self.palette[value as usize]
    }

    /// Clipped drawing view of the back buffer
    pub fn raster(&mut self) -> Raster<'_> {
        Raster::new(self.back, self.width, self.height)
    }
}

/// Context handed to [`Effect::init`]
pub struct InitContext<'a> {
    pub width: usize,
    pub height: usize,
    pub rng: &'a mut SmallRng,
}

/// A frame generator
pub trait Effect {
    /// Reset state for a fresh activation
    fn init(&mut self, ctx: &mut InitContext<'_>);

    /// Draw the next frame into `frame.back`
    fn render(&mut self, frame: &mut Frame<'_>);
}

/// How a rendered frame reaches the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushStrategy {
    /// Push only runs that differ from the previous frame
    Diff,
    /// Push the whole buffer; cheaper when nearly every pixel changes
    Full,
}

/// Available effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectKind {
    Plasma,
    #[cfg_attr(feature = "serde", serde(rename = "flow"))]
    FlowField,
    Moire,
    Cellular,
    Pipes,
    Starfield,
    Matrix,
    Mystify,
    Toasters,
    Logo,
}

impl EffectKind {
    pub const ALL: [EffectKind; 10] = [
        EffectKind::Plasma,
        EffectKind::FlowField,
        EffectKind::Moire,
        EffectKind::Cellular,
        EffectKind::Pipes,
        EffectKind::Starfield,
        EffectKind::Matrix,
        EffectKind::Mystify,
        EffectKind::Toasters,
        EffectKind::Logo,
    ];

    /// Name used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Plasma => "plasma",
            EffectKind::FlowField => "flow",
            EffectKind::Moire => "moire",
            EffectKind::Cellular => "cellular",
            EffectKind::Pipes => "pipes",
            EffectKind::Starfield => "starfield",
            EffectKind::Matrix => "matrix",
            EffectKind::Mystify => "mystify",
            EffectKind::Toasters => "toasters",
            EffectKind::Logo => "logo",
        }
    }

    /// Parse a configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn push_strategy(self) -> PushStrategy {
        match self {
            EffectKind::Plasma | EffectKind::Moire => PushStrategy::Full,
            _ => PushStrategy::Diff,
        }
    }
}

/// State for every effect, dispatched by [`EffectKind`]
pub struct Effects {
    plasma: Plasma,
    flow: FlowField,
    moire: Moire,
    cellular: Cellular,
    pipes: Pipes,
    starfield: Starfield,
    matrix: Matrix,
    mystify: Mystify,
    toasters: Toasters,
    logo: Logo,
}

impl Effects {
    /// Build the set; the automaton brings its own (pool-backed) grids
    pub fn new(cellular: Cellular) -> Self {
        Self {
            plasma: Plasma::new(),
            flow: FlowField::new(),
            moire: Moire::new(),
            cellular,
            pipes: Pipes::new(),
            starfield: Starfield::new(),
            matrix: Matrix::new(),
            mystify: Mystify::new(),
            toasters: Toasters::new(),
            logo: Logo::new(),
        }
    }

    fn get_mut(&mut self, kind: EffectKind) -> &mut dyn Effect {
        match kind {
            EffectKind::Plasma => &mut self.plasma,
            EffectKind::FlowField => &mut self.flow,
            EffectKind::Moire => &mut self.moire,
            EffectKind::Cellular => &mut self.cellular,
            EffectKind::Pipes => &mut self.pipes,
            EffectKind::Starfield => &mut self.starfield,
            EffectKind::Matrix => &mut self.matrix,
            EffectKind::Mystify => &mut self.mystify,
            EffectKind::Toasters => &mut self.toasters,
            EffectKind::Logo => &mut self.logo,
        }
    }

    pub fn init(&mut self, kind: EffectKind, ctx: &mut InitContext<'_>) {
        debug!("effects: init {}", kind.name());
        self.get_mut(kind).init(ctx);
    }

    pub fn render(&mut self, kind: EffectKind, frame: &mut Frame<'_>) {
        self.get_mut(kind).render(frame);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Host harness for rendering effects without an engine

    use std::vec;
    use std::vec::Vec;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::{Effect, Frame, InitContext};
    use crate::lut::SineTable;
    use crate::palette::{generate, PaletteTable};

    pub struct Bench {
        pub width: usize,
        pub height: usize,
        pub back: Vec<u8>,
        pub front: Vec<u8>,
        pub palette: PaletteTable,
        pub sine: SineTable,
        pub rng: SmallRng,
    }

    impl Bench {
        pub fn new(width: usize, height: usize) -> Self {
            let mut palette = [0; 256];
            generate(&mut palette, 0);
            Self {
                width,
                height,
                back: vec![0; width * height],
                front: vec![0; width * height],
                palette,
                sine: SineTable::new(),
                rng: SmallRng::seed_from_u64(0x5EED),
            }
        }

        pub fn init(&mut self, effect: &mut dyn Effect) {
            let mut ctx = InitContext {
                width: self.width,
                height: self.height,
                rng: &mut self.rng,
            };
            effect.init(&mut ctx);
        }

        /// Render one frame and swap, like the engine does
        pub fn step(&mut self, effect: &mut dyn Effect, time_ms: u32) {
            let mut frame = Frame {
                back: &mut self.back,
                front: &self.front,
                width: self.width,
                height: self.height,
                palette: &self.palette,
                sine: &self.sine,
                distance: None,
                time_ms,
                rng: &mut self.rng,
            };
            effect.render(&mut frame);
            core::mem::swap(&mut self.back, &mut self.front);
        }

        /// Last rendered frame
        pub fn shown(&self) -> &[u8] {
            &self.front
        }

        pub fn lit(&self) -> usize {
            self.front.iter().filter(|&&b| b != 0).count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EffectKind::from_name("fire"), None);
    }

    #[test]
    fn test_push_strategies() {
        assert_eq!(EffectKind::Plasma.push_strategy(), PushStrategy::Full);
        assert_eq!(EffectKind::Moire.push_strategy(), PushStrategy::Full);
        assert_eq!(EffectKind::FlowField.push_strategy(), PushStrategy::Diff);
        assert_eq!(EffectKind::Cellular.push_strategy(), PushStrategy::Diff);
    }
}
