//! Masked bitmap sprites
//!
//! Sprites are built at compile time from ASCII art. `.` is transparent;
//! every other character maps to an RGB332 ink. Each row carries a 1-bit
//! alpha mask, so sprites are at most 32 pixels wide.

use super::Raster;
use crate::color::{self, WHITE};

/// Ink table entry: art character and its color code
pub type Ink = (u8, u8);

const OUTLINE: Ink = (b'K', color::pack(64, 64, 64));
const SLOT: Ink = (b'B', color::pack(32, 32, 32));
const STEEL: Ink = (b'S', color::pack(192, 192, 224));
const WING: Ink = (b'W', WHITE);
const CRUST: Ink = (b'C', color::pack(160, 64, 0));
const CRUMB: Ink = (b'T', color::pack(224, 160, 64));

const INKS: &[Ink] = &[OUTLINE, SLOT, STEEL, WING, CRUST, CRUMB];

/// A `W × H` masked bitmap
pub struct Sprite<const W: usize, const H: usize> {
    pixels: [[u8; W]; H],
    mask: [u32; H],
}

impl<const W: usize, const H: usize> Sprite<W, H> {
    pub const WIDTH: i32 = W as i32;
    pub const HEIGHT: i32 = H as i32;

    /// Build from ASCII art rows; short rows are padded transparent
    pub const fn from_art(rows: [&str; H], inks: &[Ink]) -> Self {
        assert!(W <= 32, "sprite rows are masked with a u32");
        let mut pixels = [[0u8; W]; H];
        let mut mask = [0u32; H];
        let mut r = 0;
        while r < H {
            let bytes = rows[r].as_bytes();
            let mut c = 0;
            while c < W && c < bytes.len() {
                let ch = bytes[c];
                if ch != b'.' {
                    let mut k = 0;
                    while k < inks.len() {
                        if inks[k].0 == ch {
                            pixels[r][c] = inks[k].1;
                        }
                        k += 1;
                    }
                    mask[r] |= 1 << c;
                }
                c += 1;
            }
            r += 1;
        }
        Self { pixels, mask }
    }

    /// Whether `(x, y)` is opaque
    pub fn opaque(&self, x: usize, y: usize) -> bool {
        x < W && y < H && self.mask[y] & (1 << x) != 0
    }

    /// Draw at `(x, y)`; only opaque, non-zero pixels are written
    ///
    /// With a tint, white ink is replaced by the tint color.
    pub fn blit(&self, raster: &mut Raster<'_>, x: i32, y: i32, tint: Option<u8>) {
        for (row, (pixels, &mask)) in self.pixels.iter().zip(self.mask.iter()).enumerate() {
            if mask == 0 {
                continue;
            }
            for (col, &px) in pixels.iter().enumerate() {
                if mask & (1 << col) == 0 || px == 0 {
                    continue;
                }
                let px = match tint {
                    Some(t) if px == WHITE => t,
                    _ => px,
                };
                raster.put(x + col as i32, y + row as i32, px);
            }
        }
    }
}

pub const TOASTER_UP: Sprite<20, 14> = Sprite::from_art(
    [
        "WW..................",
        "WWWW................",
        ".WWWWW..............",
        "..WWWWWKKKKKKKKKKK..",
        "...WWWKSSSSSSSSSSSK.",
        "......KSBBBBSBBBBSK.",
        "......KSSSSSSSSSSSK.",
        "......KSSSSSSSSSSSKK",
        "......KSSSSSSSSSSSKS",
        "......KSSSSSSSSSSSK.",
        "......KSSSSSSSSSSSK.",
        "......KSSSSSSSSSSSK.",
        "......KKKKKKKKKKKKK.",
        "....................",
    ],
    INKS,
);

pub const TOASTER_DOWN: Sprite<20, 14> = Sprite::from_art(
    [
        "....................",
        "....................",
        "....................",
        ".......KKKKKKKKKKK..",
        "......KSSSSSSSSSSSK.",
        "......KSBBBBSBBBBSK.",
        "...WWWKSSSSSSSSSSSK.",
        "..WWWWKSSSSSSSSSSSKK",
        ".WWWWWKSSSSSSSSSSSKS",
        "WWWW..KSSSSSSSSSSSK.",
        "WW....KSSSSSSSSSSSK.",
        "......KSSSSSSSSSSSK.",
        "......KKKKKKKKKKKKK.",
        "....................",
    ],
    INKS,
);

pub const TOAST: Sprite<12, 10> = Sprite::from_art(
    [
        "..CCCCCCCC..",
        ".CTTTTTTTTC.",
        "CTTTTTTTTTTC",
        "CTTTTTTTTTTC",
        "CTTTTTTTTTTC",
        "CTTTTTTTTTTC",
        "CTTTTTTTTTTC",
        "CTTTTTTTTTTC",
        ".CTTTTTTTTC.",
        "..CCCCCCCC..",
    ],
    INKS,
);

pub const LOGO: Sprite<24, 16> = Sprite::from_art(
    [
        "........KKKKKKKK........",
        "......KKWWWWWWWWKK......",
        "....KKWWWWSSSSWWWWKK....",
        "..KKWWWWSSSSSSSSWWWWKK..",
        "KKWWWWSSSSWWWWSSSSWWWWKK",
        "KWWWWSSSWWWWWWWWSSSWWWWK",
        "KWWWSSSWWWWKKWWWWSSSWWWK",
        "KWWWSSWWWWKKKKWWWWSSWWWK",
        "KWWWSSWWWWKKKKWWWWSSWWWK",
        "KWWWSSSWWWWKKWWWWSSSWWWK",
        "KWWWWSSSWWWWWWWWSSSWWWWK",
        "KKWWWWSSSSWWWWSSSSWWWWKK",
        "..KKWWWWSSSSSSSSWWWWKK..",
        "....KKWWWWSSSSWWWWKK....",
        "......KKWWWWWWWWKK......",
        "........KKKKKKKK........",
    ],
    INKS,
);

#[cfg(test)]
mod tests {
    use super::*;

    const DOT: Sprite<3, 2> = Sprite::from_art(["W.K", ".W"], INKS);

    #[test]
    fn test_art_builds_mask() {
        assert!(DOT.opaque(0, 0));
        assert!(!DOT.opaque(1, 0));
        assert!(DOT.opaque(2, 0));
        assert!(!DOT.opaque(2, 1));
        assert!(!DOT.opaque(3, 0));
    }

    #[test]
    fn test_blit_skips_transparent_pixels() {
        let mut buf = [9u8; 6];
        let mut raster = Raster::new(&mut buf, 3, 2);
        DOT.blit(&mut raster, 0, 0, None);
        assert_eq!(buf, [WHITE, 9, OUTLINE.1, 9, WHITE, 9]);
    }

    #[test]
    fn test_blit_tints_white_and_clips() {
        let mut buf = [0u8; 6];
        let mut raster = Raster::new(&mut buf, 3, 2);
        DOT.blit(&mut raster, 1, 1, Some(0x1C));
        assert_eq!(buf, [0, 0, 0, 0, 0x1C, 0]);
    }

    #[test]
    fn test_builtin_sprites_have_ink() {
        assert!(TOASTER_UP.opaque(0, 0));
        assert!(TOASTER_DOWN.opaque(0, 10));
        assert!(TOAST.opaque(5, 5));
        assert!(LOGO.opaque(12, 0));
    }
}
