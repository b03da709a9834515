//! Chroma downsampling and edge replication.
//!
//! Row-level routines so each output row can be produced independently:
//! - 4:2:2 (h2v1) - 2:1 horizontal
//! - 4:2:0 (h2v2) - 2:1 horizontal and vertical
//!
//! Downsampling is a box filter with alternating rounding bias so the
//! result does not drift toward larger values. Rows are padded to whole
//! MCUs by repeating the last valid sample.

/// Downsample a row with 2:1 horizontal ratio (4:2:2).
///
/// Averages pairs of samples with bias 0, 1, 0, 1... An odd trailing
/// sample is paired with itself.
pub fn downsample_h2v1_row(input: &[u8], output: &mut [u8]) {
    let output_len = input.len().div_ceil(2);
    debug_assert!(output.len() >= output_len, "output buffer too small");

    let mut bias = 0u16;
    for (i, out) in output.iter_mut().enumerate().take(output_len) {
        let idx = i * 2;
        let p0 = input[idx] as u16;
        let p1 = input.get(idx + 1).map_or(p0, |&p| p as u16);
        *out = ((p0 + p1 + bias) >> 1) as u8;
        bias ^= 1;
    }
}

/// Downsample two rows with 2:1 ratio in both directions (4:2:0).
///
/// Averages 2x2 groups with bias 1, 2, 1, 2... Pass the same row twice
/// at the bottom edge.
pub fn downsample_h2v2_rows(row0: &[u8], row1: &[u8], output: &mut [u8]) {
    debug_assert_eq!(row0.len(), row1.len(), "input rows must have same length");
    let output_len = row0.len().div_ceil(2);
    debug_assert!(output.len() >= output_len, "output buffer too small");

    let mut bias = 1u16;
    for (i, out) in output.iter_mut().enumerate().take(output_len) {
        let idx = i * 2;
        let p00 = row0[idx] as u16;
        let p10 = row1[idx] as u16;
        let (p01, p11) = if idx + 1 < row0.len() {
            (row0[idx + 1] as u16, row1[idx + 1] as u16)
        } else {
            (p00, p10)
        };
        *out = ((p00 + p01 + p10 + p11 + bias) >> 2) as u8;
        bias ^= 3;
    }
}

/// Fill `row[valid..]` with the last valid sample.
#[inline]
pub fn expand_right_edge(row: &mut [u8], valid: usize) {
    debug_assert!(valid > 0 && valid <= row.len());
    let edge = row[valid - 1];
    row[valid..].fill(edge);
}

/// Source rows feeding padded output row `row` at vertical ratio `v_ratio`.
///
/// Rows past the bottom of the image repeat the last valid row, so the
/// result is always in `0..src_height`.
#[inline]
pub fn source_rows(row: usize, v_ratio: usize, out_height: usize, src_height: usize) -> (usize, usize) {
    let row = row.min(out_height - 1);
    let first = (row * v_ratio).min(src_height - 1);
    let second = (row * v_ratio + v_ratio - 1).min(src_height - 1);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_h2v1_basic() {
        let input = [10u8, 20, 30, 40, 50, 60];
        let mut output = [0u8; 3];
        downsample_h2v1_row(&input, &mut output);
        // (10+20+0)/2, (30+40+1)/2, (50+60+0)/2
        assert_eq!(output, [15, 35, 55]);
    }

    #[test]
    fn test_downsample_h2v1_odd_width() {
        let input = [10u8, 20, 30, 40, 50];
        let mut output = [0u8; 3];
        downsample_h2v1_row(&input, &mut output);
        assert_eq!(output, [15, 35, 50]);
    }

    #[test]
    fn test_downsample_h2v2_basic() {
        let row0 = [10u8, 20, 30, 40];
        let row1 = [12u8, 22, 32, 42];
        let mut output = [0u8; 2];
        downsample_h2v2_rows(&row0, &row1, &mut output);
        // (64+1)/4 = 16, (144+2)/4 = 36
        assert_eq!(output, [16, 36]);
    }

    #[test]
    fn test_downsample_h2v2_uniform() {
        let row = [128u8; 4];
        let mut output = [0u8; 2];
        downsample_h2v2_rows(&row, &row, &mut output);
        assert_eq!(output, [128, 128]);
    }

    #[test]
    fn test_alternating_bias_h2v1() {
        let input = [127u8, 128, 127, 128, 127, 128, 127, 128];
        let mut output = [0u8; 4];
        downsample_h2v1_row(&input, &mut output);
        assert_eq!(output, [127, 128, 127, 128]);
    }

    #[test]
    fn test_alternating_bias_h2v2() {
        // Sum 510: bias 1 -> 127, bias 2 -> 128
        let row0 = [127u8, 128, 127, 128];
        let row1 = [127u8, 128, 127, 128];
        let mut output = [0u8; 2];
        downsample_h2v2_rows(&row0, &row1, &mut output);
        assert_eq!(output, [127, 128]);
    }

    #[test]
    fn test_expand_right_edge() {
        let mut row = [1u8, 2, 3, 0, 0, 0, 0, 0];
        expand_right_edge(&mut row, 3);
        assert_eq!(row, [1, 2, 3, 3, 3, 3, 3, 3]);

        let mut full = [5u8; 8];
        expand_right_edge(&mut full, 8);
        assert_eq!(full, [5; 8]);
    }

    #[test]
    fn test_source_rows() {
        // Full resolution, 3 valid rows padded to 8
        assert_eq!(source_rows(0, 1, 3, 3), (0, 0));
        assert_eq!(source_rows(2, 1, 3, 3), (2, 2));
        assert_eq!(source_rows(7, 1, 3, 3), (2, 2));

        // 2:1 vertical, 5 source rows -> 3 output rows
        assert_eq!(source_rows(0, 2, 3, 5), (0, 1));
        assert_eq!(source_rows(2, 2, 3, 5), (4, 4));
        assert_eq!(source_rows(6, 2, 3, 5), (4, 4));
    }
}
