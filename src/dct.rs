//! Forward DCT (Discrete Cosine Transform) implementation.
//!
//! Loeffler-Ligtenberg-Moschytz integer DCT as in the IJG `jfdctint.c`
//! ("slow integer" method): 12 multiplies and 32 adds per 1-D transform,
//! rows first, then columns.
//!
//! The output is scaled up by a factor of 8 compared to a true DCT. The
//! quantizer divides that back out.
//!
//! Reference: C. Loeffler, A. Ligtenberg and G. Moschytz,
//! "Practical Fast 1-D DCT Algorithms with 11 Multiplications",
//! Proc. ICASSP 1989, pp. 988-991.

use crate::consts::{DCTSIZE, DCTSIZE2};
use multiversion::multiversion;

const CONST_BITS: i32 = 13;
const PASS1_BITS: i32 = 2;

// FIX(x) = (x * (1 << CONST_BITS) + 0.5)
const FIX_0_298631336: i32 = 2446;
const FIX_0_390180644: i32 = 3196;
const FIX_0_541196100: i32 = 4433;
const FIX_0_765366865: i32 = 6270;
const FIX_0_899976223: i32 = 7373;
const FIX_1_175875602: i32 = 9633;
const FIX_1_501321110: i32 = 12299;
const FIX_1_847759065: i32 = 15137;
const FIX_1_961570560: i32 = 16069;
const FIX_2_053119869: i32 = 16819;
const FIX_2_562915447: i32 = 20995;
const FIX_3_072711026: i32 = 25172;

/// Right-shift with rounding.
#[inline(always)]
fn descale(x: i32, n: i32) -> i32 {
    (x + (1 << (n - 1))) >> n
}

/// One 1-D transform of eight values.
///
/// The row pass keeps `PASS1_BITS` of extra precision; the column pass
/// removes it again.
#[inline(always)]
fn fdct_1d(v: [i32; DCTSIZE], column_pass: bool) -> [i32; DCTSIZE] {
    let tmp0 = v[0] + v[7];
    let tmp7 = v[0] - v[7];
    let tmp1 = v[1] + v[6];
    let tmp6 = v[1] - v[6];
    let tmp2 = v[2] + v[5];
    let tmp5 = v[2] - v[5];
    let tmp3 = v[3] + v[4];
    let tmp4 = v[3] - v[4];

    let mult_shift = if column_pass {
        CONST_BITS + PASS1_BITS
    } else {
        CONST_BITS - PASS1_BITS
    };
    let dc_out = |x: i32| {
        if column_pass {
            descale(x, PASS1_BITS)
        } else {
            x << PASS1_BITS
        }
    };

    let mut out = [0i32; DCTSIZE];

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    out[0] = dc_out(tmp10 + tmp11);
    out[4] = dc_out(tmp10 - tmp11);

    let z1 = (tmp12 + tmp13) * FIX_0_541196100;
    out[2] = descale(z1 + tmp13 * FIX_0_765366865, mult_shift);
    out[6] = descale(z1 - tmp12 * FIX_1_847759065, mult_shift);

    // Odd part
    let z1 = tmp4 + tmp7;
    let z2 = tmp5 + tmp6;
    let z3 = tmp4 + tmp6;
    let z4 = tmp5 + tmp7;
    let z5 = (z3 + z4) * FIX_1_175875602;

    let tmp4 = tmp4 * FIX_0_298631336;
    let tmp5 = tmp5 * FIX_2_053119869;
    let tmp6 = tmp6 * FIX_3_072711026;
    let tmp7 = tmp7 * FIX_1_501321110;
    let z1 = -z1 * FIX_0_899976223;
    let z2 = -z2 * FIX_2_562915447;
    let z3 = z5 - z3 * FIX_1_961570560;
    let z4 = z5 - z4 * FIX_0_390180644;

    out[7] = descale(tmp4 + z1 + z3, mult_shift);
    out[5] = descale(tmp5 + z2 + z4, mult_shift);
    out[3] = descale(tmp6 + z2 + z3, mult_shift);
    out[1] = descale(tmp7 + z1 + z4, mult_shift);

    out
}

/// Forward DCT of one level-shifted 8x8 block.
///
/// Input and output are in natural (row-major) order. Output is scaled
/// up by 8.
#[multiversion(targets(
    "x86_64+avx2",
    "x86_64+sse4.1",
    "x86+avx2",
    "x86+sse4.1",
    "aarch64+neon",
))]
pub fn forward_dct_8x8(samples: &[i16; DCTSIZE2], coeffs: &mut [i32; DCTSIZE2]) {
    let mut data = [0i32; DCTSIZE2];

    for row in 0..DCTSIZE {
        let base = row * DCTSIZE;
        let mut v = [0i32; DCTSIZE];
        for (dst, &src) in v.iter_mut().zip(&samples[base..base + DCTSIZE]) {
            *dst = src as i32;
        }
        data[base..base + DCTSIZE].copy_from_slice(&fdct_1d(v, false));
    }

    for col in 0..DCTSIZE {
        let mut v = [0i32; DCTSIZE];
        for (k, dst) in v.iter_mut().enumerate() {
            *dst = data[k * DCTSIZE + col];
        }
        for (k, value) in fdct_1d(v, true).into_iter().enumerate() {
            coeffs[k * DCTSIZE + col] = value;
        }
    }
}

/// Center 8-bit samples around zero.
#[inline]
pub fn level_shift(samples: &[u8; DCTSIZE2], output: &mut [i16; DCTSIZE2]) {
    for (out, &s) in output.iter_mut().zip(samples.iter()) {
        *out = s as i16 - 128;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_shift() {
        let mut output = [0i16; DCTSIZE2];
        level_shift(&[128u8; DCTSIZE2], &mut output);
        assert!(output.iter().all(|&v| v == 0));

        let mut samples = [0u8; DCTSIZE2];
        samples[0] = 255;
        level_shift(&samples, &mut output);
        assert_eq!(output[0], 127);
        assert_eq!(output[1], -128);
    }

    #[test]
    fn test_dc_coefficient() {
        // Flat block: DC = 64 * value, AC = 0
        let samples = [100i16; DCTSIZE2];
        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&samples, &mut coeffs);

        assert_eq!(coeffs[0], 6400);
        for (i, &c) in coeffs.iter().enumerate().skip(1) {
            assert!(c.abs() <= 1, "AC[{}] should be ~0 for flat block, got {}", i, c);
        }
    }

    #[test]
    fn test_extreme_flat_blocks() {
        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&[-128i16; DCTSIZE2], &mut coeffs);
        assert_eq!(coeffs[0], -8192);
        forward_dct_8x8(&[127i16; DCTSIZE2], &mut coeffs);
        assert_eq!(coeffs[0], 8128);
    }

    #[test]
    fn test_zero_block() {
        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&[0i16; DCTSIZE2], &mut coeffs);
        assert!(coeffs.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_alternating_rows() {
        let mut samples = [0i16; DCTSIZE2];
        for row in 0..DCTSIZE {
            let val = if row % 2 == 0 { 100 } else { -100 };
            samples[row * DCTSIZE..(row + 1) * DCTSIZE].fill(val);
        }

        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&samples, &mut coeffs);

        assert!(coeffs[0].abs() <= 1);
        // Energy sits in the first column (vertical frequencies)
        let max_vertical = (1..DCTSIZE).map(|r| coeffs[r * DCTSIZE].abs()).max().unwrap();
        assert!(max_vertical > 50);
        // and nowhere else
        for row in 0..DCTSIZE {
            for col in 1..DCTSIZE {
                assert!(coeffs[row * DCTSIZE + col].abs() <= 1);
            }
        }
    }

    #[test]
    fn test_gradient() {
        let mut samples = [0i16; DCTSIZE2];
        for row in 0..DCTSIZE {
            for col in 0..DCTSIZE {
                samples[row * DCTSIZE + col] = (col as i16 - 4) * 20;
            }
        }

        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&samples, &mut coeffs);
        assert!(coeffs[1].abs() > 100);
    }

    #[test]
    fn test_matches_float_reference() {
        // Compare against a direct evaluation of the DCT-II definition (scaled by 8)
        let mut samples = [0i16; DCTSIZE2];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = ((i * 37 + 11) % 256) as i16 - 128;
        }
        let mut coeffs = [0i32; DCTSIZE2];
        forward_dct_8x8(&samples, &mut coeffs);

        let pi = std::f64::consts::PI;
        for u in 0..DCTSIZE {
            for v in 0..DCTSIZE {
                let cu = if u == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
                let cv = if v == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
                let mut sum = 0.0;
                for y in 0..DCTSIZE {
                    for x in 0..DCTSIZE {
                        sum += samples[y * DCTSIZE + x] as f64
                            * (((2 * x + 1) as f64 * v as f64 * pi) / 16.0).cos()
                            * (((2 * y + 1) as f64 * u as f64 * pi) / 16.0).cos();
                    }
                }
                let expected = 0.25 * cu * cv * sum * 8.0;
                let got = coeffs[u * DCTSIZE + v] as f64;
                assert!(
                    (got - expected).abs() <= 8.0,
                    "coef ({}, {}): got {}, expected {:.1}",
                    u,
                    v,
                    got,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_descale_rounding() {
        assert_eq!(descale(7, 2), 2);
        assert_eq!(descale(10, 2), 3);
        // Arithmetic shift rounds toward -infinity
        assert_eq!(descale(-9, 2), -2);
        assert_eq!(descale(-10, 2), -2);
    }
}
