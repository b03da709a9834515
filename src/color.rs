//! Color space conversion routines.
//!
//! RGB to YCbCr following CCIR 601-1 (BT.601) as used by JFIF, in 16-bit
//! fixed point:
//! ```text
//! Y  =  0.29900 * R + 0.58700 * G + 0.11400 * B
//! Cb = -0.16874 * R - 0.33126 * G + 0.50000 * B + 128
//! Cr =  0.50000 * R - 0.41869 * G - 0.08131 * B + 128
//! ```

/// Fixed-point precision bits
const SCALEBITS: i32 = 16;

/// Half unit for rounding during right shift
const ONE_HALF: i32 = 1 << (SCALEBITS - 1);

/// Center value for Cb/Cr, added after the shift
const CBCR_CENTER: i32 = 128;

/// FIX(x) = round(x * 2^SCALEBITS)
const fn fix(x: f64) -> i32 {
    (x * ((1i64 << SCALEBITS) as f64) + 0.5) as i32
}

const FIX_0_29900: i32 = fix(0.29900);
const FIX_0_58700: i32 = fix(0.58700);
const FIX_0_11400: i32 = fix(0.11400);
const FIX_0_16874: i32 = fix(0.16874);
const FIX_0_33126: i32 = fix(0.33126);
const FIX_0_50000: i32 = fix(0.50000);
const FIX_0_41869: i32 = fix(0.41869);
const FIX_0_08131: i32 = fix(0.08131);

/// Convert a single RGB pixel to YCbCr.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as i32;
    let g = g as i32;
    let b = b as i32;

    let y = (FIX_0_29900 * r + FIX_0_58700 * g + FIX_0_11400 * b + ONE_HALF) >> SCALEBITS;
    let cb = ((-FIX_0_16874 * r - FIX_0_33126 * g + FIX_0_50000 * b + ONE_HALF) >> SCALEBITS)
        + CBCR_CENTER;
    let cr = ((FIX_0_50000 * r - FIX_0_41869 * g - FIX_0_08131 * b + ONE_HALF) >> SCALEBITS)
        + CBCR_CENTER;

    (
        y.clamp(0, 255) as u8,
        cb.clamp(0, 255) as u8,
        cr.clamp(0, 255) as u8,
    )
}

/// Luminance of one row of interleaved RGB.
///
/// Writes `rgb.len() / 3` samples; the rest of `y_row` is left alone.
pub fn rgb_row_to_luma(rgb: &[u8], y_row: &mut [u8]) {
    debug_assert_eq!(rgb.len() % 3, 0);
    for (px, y) in rgb.chunks_exact(3).zip(y_row.iter_mut()) {
        *y = rgb_to_ycbcr(px[0], px[1], px[2]).0;
    }
}

/// Chrominance of one row of interleaved RGB, at full resolution.
pub fn rgb_row_to_chroma(rgb: &[u8], cb_row: &mut [u8], cr_row: &mut [u8]) {
    debug_assert_eq!(rgb.len() % 3, 0);
    for (px, (cb, cr)) in rgb
        .chunks_exact(3)
        .zip(cb_row.iter_mut().zip(cr_row.iter_mut()))
    {
        let (_, pcb, pcr) = rgb_to_ycbcr(px[0], px[1], px[2]);
        *cb = pcb;
        *cr = pcr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_ycbcr_black() {
        assert_eq!(rgb_to_ycbcr(0, 0, 0), (0, 128, 128));
    }

    #[test]
    fn test_rgb_to_ycbcr_white() {
        assert_eq!(rgb_to_ycbcr(255, 255, 255), (255, 128, 128));
    }

    #[test]
    fn test_rgb_to_ycbcr_gray() {
        assert_eq!(rgb_to_ycbcr(128, 128, 128), (128, 128, 128));
    }

    #[test]
    fn test_rgb_to_ycbcr_red() {
        let (y, cb, cr) = rgb_to_ycbcr(255, 0, 0);
        // 0.299 * 255 = 76.2
        assert_eq!(y, 76);
        assert!(cb < 128);
        // 127.5 + 128 saturates
        assert_eq!(cr, 255);
    }

    #[test]
    fn test_rgb_to_ycbcr_green() {
        let (y, cb, cr) = rgb_to_ycbcr(0, 255, 0);
        assert_eq!(y, 150);
        assert!(cb < 128);
        assert!(cr < 128);
    }

    #[test]
    fn test_rgb_to_ycbcr_blue() {
        let (y, cb, cr) = rgb_to_ycbcr(0, 0, 255);
        assert_eq!(y, 29);
        assert_eq!(cb, 255);
        assert!(cr < 128);
    }

    #[test]
    fn test_row_conversion() {
        let rgb = [0, 0, 0, 255, 255, 255, 255, 0, 0];
        let mut y = [0u8; 4];
        let mut cb = [0u8; 4];
        let mut cr = [0u8; 4];
        rgb_row_to_luma(&rgb, &mut y);
        rgb_row_to_chroma(&rgb, &mut cb, &mut cr);

        assert_eq!(&y[..3], &[0, 255, 76]);
        assert_eq!(&cb[..2], &[128, 128]);
        assert_eq!(cr[2], 255);
        // Padding entries are left alone
        assert_eq!((y[3], cb[3], cr[3]), (0, 0, 0));
    }

    #[test]
    fn test_fixed_point_constants() {
        let one = 1 << SCALEBITS;
        assert!((FIX_0_29900 + FIX_0_58700 + FIX_0_11400 - one).abs() <= 1);
        assert!((FIX_0_16874 + FIX_0_33126 - FIX_0_50000).abs() <= 1);
        assert!((FIX_0_41869 + FIX_0_08131 - FIX_0_50000).abs() <= 1);
    }
}
