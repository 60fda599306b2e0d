//! Two-dimensional gradient noise
//!
//! Classic permutation-table gradient noise with a quintic fade curve and
//! four diagonal gradients. Output lies roughly in `-1.0..=1.0`; only the
//! flow field samples it, so precision beyond "smooth and repeatable" is
//! not a goal.

const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173, 186,
    3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206, 59,
    227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163, 70,
    221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243,
    141, 128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 3 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        _ => -x - y,
    }
}

#[inline]
fn hash(xi: usize, yi: usize) -> u8 {
    PERM[(PERM[xi & 255] as usize + yi) & 255]
}

/// Sample the noise field at `(x, y)`
pub fn noise2d(x: f32, y: f32) -> f32 {
    let fx = libm::floorf(x);
    let fy = libm::floorf(y);
    let xi = (fx as i32 & 255) as usize;
    let yi = (fy as i32 & 255) as usize;
    let xf = x - fx;
    let yf = y - fy;
    let u = fade(xf);
    let v = fade(yf);

    let aa = hash(xi, yi);
    let ab = hash(xi, yi + 1);
    let ba = hash(xi + 1, yi);
    let bb = hash(xi + 1, yi + 1);

    lerp(
        lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u),
        lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u),
        v,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_at_lattice_points() {
        for i in 0..8 {
            assert_eq!(noise2d(i as f32, (i * 3) as f32), 0.0);
        }
    }

    #[test]
    fn test_bounded_and_continuous() {
        let mut prev = noise2d(0.0, 0.37);
        for step in 1..2000 {
            let x = step as f32 * 0.01;
            let n = noise2d(x, 0.37);
            assert!((-2.0..=2.0).contains(&n));
            assert!(libm::fabsf(n - prev) < 0.1);
            prev = n;
        }
    }

    #[test]
    fn test_negative_coordinates_wrap() {
        assert_eq!(noise2d(-256.5, 1.25), noise2d(-0.5, 1.25));
    }
}
