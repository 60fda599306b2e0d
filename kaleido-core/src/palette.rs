//! Palette generation and endless cross-fade
//!
//! Every generator produces 8-bit values and looks them up in the *active*
//! palette, a 256-entry table of RGB332 codes. The active palette is a
//! per-channel blend of two source palettes (A and B) drawn from a small
//! catalog of hue/saturation/value recipes. When the blend reaches B, B is
//! promoted to A and the next catalog entry becomes the new B.

use core::f32::consts::PI;

use crate::color;

/// A 256-entry table of RGB332 codes
pub type PaletteTable = [u8; 256];

/// Default number of frames for one full cross-fade (~30 s at 60 Hz)
pub const DEFAULT_BLEND_STEPS: u16 = 1800;

/// HSV recipe for one catalog palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteRecipe {
    pub name: &'static str,
    /// Hue center in degrees
    pub hue_base: f32,
    /// Hue swing in degrees
    pub hue_range: f32,
    pub sat_min: f32,
    pub sat_max: f32,
    pub val_min: f32,
    pub val_max: f32,
}

const fn recipe(
    name: &'static str,
    hue_base: f32,
    hue_range: f32,
    sat: (f32, f32),
    val: (f32, f32),
) -> PaletteRecipe {
    PaletteRecipe {
        name,
        hue_base,
        hue_range,
        sat_min: sat.0,
        sat_max: sat.1,
        val_min: val.0,
        val_max: val.1,
    }
}

/// Palette catalog, cycled in order
pub const CATALOG: [PaletteRecipe; 6] = [
    recipe("ember", 0.0, 40.0, (0.7, 1.0), (0.4, 1.0)),
    recipe("ocean", 160.0, 60.0, (0.5, 0.9), (0.3, 1.0)),
    recipe("aurora", 80.0, 120.0, (0.6, 1.0), (0.3, 1.0)),
    recipe("sunset", 10.0, 50.0, (0.7, 1.0), (0.5, 1.0)),
    recipe("neon", 200.0, 160.0, (0.8, 1.0), (0.5, 1.0)),
    recipe("moss", 100.0, 40.0, (0.4, 0.8), (0.3, 0.9)),
];

/// Look up a catalog entry by name
pub fn find(name: &str) -> Option<usize> {
    CATALOG.iter().position(|r| r.name == name)
}

/// Fill `out` from catalog entry `id` (wraps modulo the catalog size)
pub fn generate(out: &mut PaletteTable, id: usize) {
    let r = &CATALOG[id % CATALOG.len()];
    for (i, slot) in out.iter_mut().enumerate() {
        let t = i as f32 / 255.0;
        let mut h = libm::fmodf(r.hue_base + r.hue_range * libm::sinf(t * PI * 2.0), 360.0);
        if h < 0.0 {
            h += 360.0;
        }
        let s = r.sat_min + (r.sat_max - r.sat_min) * (0.5 + 0.5 * libm::sinf(t * PI * 3.0));
        let v = r.val_min + (r.val_max - r.val_min) * (0.5 + 0.5 * libm::cosf(t * PI * 2.5));
        let (red, green, blue) = hsv_to_rgb(h, s, v);
        *slot = color::pack(red, green, blue);
    }
}

/// HSV (degrees, 0..1, 0..1) to 8-bit RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - libm::fabsf(libm::fmodf(h / 60.0, 2.0) - 1.0));
    let m = v - c;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_byte = |f: f32| ((f + m) * 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

/// Cross-fading palette pair
pub struct PaletteEngine {
    a: PaletteTable,
    b: PaletteTable,
    active: PaletteTable,
    next_id: usize,
    step: u16,
    steps: u16,
}

impl PaletteEngine {
    /// Start with A = `first`, B = `first + 1`, blend at 0
    pub fn new(first: usize, steps: u16) -> Self {
        let mut a = [0; 256];
        let mut b = [0; 256];
        generate(&mut a, first);
        generate(&mut b, first + 1);
        Self {
            a,
            b,
            active: a,
            next_id: (first + 1) % CATALOG.len(),
            step: 0,
            steps: steps.max(1),
        }
    }

    /// Advance the blend one step and recompute the active palette
    pub fn crossfade(&mut self) {
        self.step += 1;
        if self.step >= self.steps {
            self.a = self.b;
            self.next_id = (self.next_id + 1) % CATALOG.len();
            generate(&mut self.b, self.next_id);
            self.step = 0;
            debug!("palette: now fading to {}", CATALOG[self.next_id].name);
        }
        self.active = self.mix(self.step);
    }

    /// Blend of A and B at `step` out of the configured step count
    ///
    /// Step 0 is exactly A and the final step is exactly B.
    pub fn mix(&self, step: u16) -> PaletteTable {
        let n = self.steps as u32;
        let t = step.min(self.steps) as u32;
        let mut out = [0u8; 256];
        for (slot, (&pa, &pb)) in out.iter_mut().zip(self.a.iter().zip(self.b.iter())) {
            let (ra, ga, ba) = color::unpack(pa);
            let (rb, gb, bb) = color::unpack(pb);
            let lerp = |x: u8, y: u8| ((x as u32 * (n - t) + y as u32 * t) / n) as u8;
            *slot = color::pack(lerp(ra, rb), lerp(ga, gb), lerp(ba, bb));
        }
        out
    }

    /// Palette every generator reads this frame
    pub fn active(&self) -> &PaletteTable {
        &self.active
    }

    pub fn source_a(&self) -> &PaletteTable {
        &self.a
    }

    pub fn source_b(&self) -> &PaletteTable {
        &self.b
    }

    /// Current step within the blend
    pub fn position(&self) -> u16 {
        self.step
    }

    pub fn steps(&self) -> u16 {
        self.steps
    }
}
