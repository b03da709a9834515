//! Preprocess stage: color conversion, chroma subsampling and padding.
//!
//! Runs as row kernels on the [`Device`]. Every padded output row is
//! produced by one task that reads only the source rows it needs, so rows
//! can be computed in any order. Rows and columns past the image edge
//! repeat the last valid sample, which makes every 8x8 block complete.

use crate::color::{rgb_row_to_chroma, rgb_row_to_luma};
use crate::device::{Device, DeviceBuffer};
use crate::sample::{downsample_h2v1_row, downsample_h2v2_rows, expand_right_edge, source_rows};
use crate::types::{FrameLayout, ImageGeometry};

/// Full-resolution Cb/Cr rows for one or two source rows.
struct ChromaScratch {
    cb: [Vec<u8>; 2],
    cr: [Vec<u8>; 2],
}

impl ChromaScratch {
    fn new(width: usize) -> Self {
        Self {
            cb: [vec![0; width], vec![0; width]],
            cr: [vec![0; width], vec![0; width]],
        }
    }
}

/// Fill the preprocessed planes from interleaved source pixels.
///
/// `source` holds `geometry.source_len()` bytes; `planes` holds
/// `layout.total_samples()` bytes laid out plane by plane.
pub fn preprocess(
    device: &Device,
    geometry: &ImageGeometry,
    layout: &FrameLayout,
    source: &DeviceBuffer<u8>,
    planes: &mut DeviceBuffer<u8>,
) {
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    let components = geometry.components as usize;
    let stride = width * components;
    let src = source.as_slice();

    let luma = layout.planes[0];
    let (y_plane, chroma) = planes.as_mut_slice().split_at_mut(luma.sample_len());

    device.for_each_row(y_plane, luma.padded_width, |r, row| {
        let start = r.min(height - 1) * stride;
        let src_row = &src[start..start + stride];
        if components == 3 {
            rgb_row_to_luma(src_row, &mut row[..width]);
        } else {
            row[..width].copy_from_slice(src_row);
        }
        expand_right_edge(row, width);
    });

    if layout.planes.len() < 3 {
        return;
    }

    let cb_layout = layout.planes[1];
    let h_ratio = luma.padded_width / cb_layout.padded_width;
    let v_ratio = luma.padded_height / cb_layout.padded_height;
    let (cb_plane, cr_plane) = chroma.split_at_mut(cb_layout.sample_len());

    device.for_each_row_pair_init(
        cb_plane,
        cr_plane,
        cb_layout.padded_width,
        || ChromaScratch::new(width),
        |scratch, r, cb_row, cr_row| {
            let (s0, s1) = source_rows(r, v_ratio, cb_layout.height, height);
            let rows = if v_ratio == 2 { 2 } else { 1 };
            for (k, &s) in [s0, s1].iter().take(rows).enumerate() {
                let start = s * stride;
                rgb_row_to_chroma(
                    &src[start..start + stride],
                    &mut scratch.cb[k],
                    &mut scratch.cr[k],
                );
            }

            let valid = cb_layout.width;
            for (out, full) in [(cb_row, &scratch.cb), (cr_row, &scratch.cr)] {
                match (h_ratio, v_ratio) {
                    (1, 1) => out[..valid].copy_from_slice(&full[0][..valid]),
                    (2, 1) => downsample_h2v1_row(&full[0], &mut out[..valid]),
                    _ => downsample_h2v2_rows(&full[0], &full[1], &mut out[..valid]),
                }
                expand_right_edge(out, valid);
            }
        },
    );
}
