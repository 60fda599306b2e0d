//! RGB332 color helpers
//!
//! Canvas pixels are RGB332 codes: 3 bits red, 3 bits green, 2 bits blue.
//! The code doubles as an index into the panel's 256-entry true-color
//! table, which is the fixed expansion built by [`device_palette`].

/// Background / transparent code
pub const BLACK: u8 = 0x00;

/// Brightest code
pub const WHITE: u8 = 0xFF;

/// Pack 8-bit channels into an RGB332 code
#[inline]
pub const fn pack(r: u8, g: u8, b: u8) -> u8 {
    (r & 0xE0) | ((g >> 3) & 0x1C) | (b >> 6)
}

/// Unpack an RGB332 code into 8-bit channels (low bits zero)
#[inline]
pub const fn unpack(c: u8) -> (u8, u8, u8) {
    (c & 0xE0, (c & 0x1C) << 3, (c & 0x03) << 6)
}

/// Dim a code by `level / 255`
///
/// `level = 255` is the identity and `level = 0` is black; the result is
/// monotonic in `level` for every code.
#[inline]
pub const fn dim(c: u8, level: u8) -> u8 {
    let (r, g, b) = unpack(c);
    let k = level as u16 + 1;
    pack(
        ((r as u16 * k) >> 8) as u8,
        ((g as u16 * k) >> 8) as u8,
        ((b as u16 * k) >> 8) as u8,
    )
}

/// Scale a code by `gain / 256`, saturating each channel
///
/// Gains above 256 brighten; used for pipe edge highlights.
#[inline]
pub const fn scale(c: u8, gain: u16) -> u8 {
    let (r, g, b) = unpack(c);
    pack(
        sat((r as u32 * gain as u32) >> 8),
        sat((g as u32 * gain as u32) >> 8),
        sat((b as u32 * gain as u32) >> 8),
    )
}

#[inline]
const fn sat(v: u32) -> u8 {
    if v > 255 {
        255
    } else {
        v as u8
    }
}

/// Expand an RGB332 code to RGB565 with bit replication
pub const fn to_rgb565(c: u8) -> u16 {
    let r3 = (c >> 5) as u16;
    let g3 = ((c >> 2) & 0x07) as u16;
    let b2 = (c & 0x03) as u16;
    let r5 = (r3 << 2) | (r3 >> 1);
    let g6 = (g3 << 3) | g3;
    let b5 = (b2 << 3) | (b2 << 1) | (b2 >> 1);
    (r5 << 11) | (g6 << 5) | b5
}

/// Table the panel driver uses to translate codes to RGB565
pub const fn device_palette() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = to_rgb565(i as u8);
        i += 1;
    }
    table
}

/// Precomputed `dim` for one fixed level
///
/// Trail effects fade the whole canvas every frame; a table lookup per
/// pixel keeps that inside the frame budget.
#[derive(Clone)]
pub struct DimTable {
    table: [u8; 256],
}

impl DimTable {
    /// Build the table for `level`
    pub const fn new(level: u8) -> Self {
        let mut table = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            table[i] = dim(i as u8, level);
            i += 1;
        }
        Self { table }
    }

    /// Dim a single code
    #[inline]
    pub fn apply(&self, c: u8) -> u8 {
        self.table[c as usize]
    }

    /// Dim every pixel of a buffer in place
    pub fn apply_all(&self, buf: &mut [u8]) {
        for px in buf.iter_mut() {
            *px = self.table[*px as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        assert_eq!(pack(255, 255, 255), WHITE);
        assert_eq!(pack(0, 0, 0), BLACK);
        assert_eq!(unpack(WHITE), (0xE0, 0xE0, 0xC0));
        for c in 0..=255u8 {
            let (r, g, b) = unpack(c);
            assert_eq!(pack(r, g, b), c);
        }
    }

    #[test]
    fn test_dim_endpoints() {
        for c in 0..=255u8 {
            assert_eq!(dim(c, 255), c);
            assert_eq!(dim(c, 0), BLACK);
        }
    }

    #[test]
    fn test_dim_monotonic_in_level() {
        for c in 0..=255u8 {
            let mut prev = unpack(dim(c, 0));
            for level in 1..=255u8 {
                let cur = unpack(dim(c, level));
                assert!(cur.0 >= prev.0 && cur.1 >= prev.1 && cur.2 >= prev.2);
                prev = cur;
            }
        }
    }

    #[test]
    fn test_scale_saturates() {
        assert_eq!(scale(WHITE, 512), WHITE);
        assert_eq!(scale(pack(128, 0, 0), 512), pack(255, 0, 0));
        assert_eq!(scale(pack(128, 64, 128), 256), pack(128, 64, 128));
    }

    #[test]
    fn test_rgb565_expansion() {
        assert_eq!(to_rgb565(WHITE), 0xFFFF);
        assert_eq!(to_rgb565(BLACK), 0x0000);
        assert_eq!(to_rgb565(pack(255, 0, 0)), 0xF800);
        assert_eq!(device_palette()[0x1C], to_rgb565(0x1C));
    }
}
