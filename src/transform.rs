//! Transform stage: forward DCT and quantization of every block.
//!
//! One kernel task per 8x8 block. A task reads its block from the
//! preprocessed planes and writes 64 quantized coefficients (natural
//! order) into its own slot of the coefficient buffer. Blocks are stored
//! plane by plane, each plane in raster block order.

use crate::consts::{DCTSIZE, DCTSIZE2};
use crate::dct::{forward_dct_8x8, level_shift};
use crate::device::{Device, DeviceBuffer};
use crate::quant::{quantize_block, QuantTable, QuantTables};
use crate::types::{DctBlock, FrameLayout, PlaneLayout};

/// Copy block `local` of a plane out of the sample buffer.
fn extract_block(samples: &[u8], plane: &PlaneLayout, local: usize, out: &mut [u8; DCTSIZE2]) {
    let bw = plane.blocks_wide();
    let (by, bx) = (local / bw, local % bw);
    let origin = plane.sample_offset + by * DCTSIZE * plane.padded_width + bx * DCTSIZE;
    for (row, dst) in out.chunks_exact_mut(DCTSIZE).enumerate() {
        let start = origin + row * plane.padded_width;
        dst.copy_from_slice(&samples[start..start + DCTSIZE]);
    }
}

/// DCT and quantize one block of samples.
pub fn transform_block(samples: &[u8; DCTSIZE2], table: &QuantTable, out: &mut DctBlock) {
    let mut shifted = [0i16; DCTSIZE2];
    let mut raw = [0i32; DCTSIZE2];
    level_shift(samples, &mut shifted);
    forward_dct_8x8(&shifted, &mut raw);
    quantize_block(&raw, table, out);
}

/// Fill the coefficient buffer from the preprocessed planes.
///
/// Each plane owns the contiguous run of block slots starting at its
/// `block_offset`; one kernel launch covers one plane.
pub fn transform(
    device: &Device,
    layout: &FrameLayout,
    tables: &QuantTables,
    planes: &DeviceBuffer<u8>,
    coefficients: &mut DeviceBuffer<i16>,
) {
    let samples = planes.as_slice();
    let mut rest = coefficients.as_mut_slice();
    let mut consumed = 0;

    for (comp, plane) in layout.components.iter().zip(&layout.planes) {
        debug_assert_eq!(plane.block_offset, consumed, "planes out of order");
        let (plane_coefs, tail) =
            std::mem::take(&mut rest).split_at_mut(plane.block_count() * DCTSIZE2);
        rest = tail;
        consumed += plane.block_count();

        let table = tables.get(comp.role);
        device.for_each_row(plane_coefs, DCTSIZE2, |local, out| {
            let mut block = [0u8; DCTSIZE2];
            let mut quantized: DctBlock = [0; DCTSIZE2];
            extract_block(samples, plane, local, &mut block);
            transform_block(&block, table, &mut quantized);
            out.copy_from_slice(&quantized);
        });
    }

    debug_assert!(rest.is_empty(), "coefficient slots left unwritten");
}
