//! Quantization table construction and block quantization.
//!
//! Tables are the Annex K reference matrices scaled by the IJG quality
//! curve. Entries are clamped to `1..=255` so they always fit an 8-bit
//! baseline DQT entry.

use crate::consts::{DCTSIZE2, STD_CHROMA_QUANT, STD_LUMA_QUANT};
use crate::types::{ComponentRole, DctBlock};

/// Convert a 1-100 quality into a percentage scale factor.
///
/// Quality must already be validated; out-of-range input is clamped.
pub fn quality_scale_factor(quality: u8) -> u32 {
    let quality = quality.clamp(1, 100) as u32;
    if quality < 50 {
        5000 / quality
    } else {
        200 - 2 * quality
    }
}

/// A quantization table with 64 divisors in natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values in natural (row-major) order
    pub values: [u16; DCTSIZE2],
}

impl QuantTable {
    /// Scale a base table to the given quality.
    pub fn scaled(base: &[u16; DCTSIZE2], quality: u8) -> Self {
        let scale = quality_scale_factor(quality);
        let mut values = [0u16; DCTSIZE2];
        for (out, &b) in values.iter_mut().zip(base.iter()) {
            let temp = (b as u32 * scale + 50) / 100;
            *out = temp.clamp(1, 255) as u16;
        }
        Self { values }
    }
}

/// The luminance and chrominance tables used by one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantTables {
    luma: QuantTable,
    chroma: QuantTable,
}

impl QuantTables {
    /// Build both tables from the Annex K matrices.
    pub fn for_quality(quality: u8) -> Self {
        Self {
            luma: QuantTable::scaled(&STD_LUMA_QUANT, quality),
            chroma: QuantTable::scaled(&STD_CHROMA_QUANT, quality),
        }
    }

    /// Table for a component role.
    pub fn get(&self, role: ComponentRole) -> &QuantTable {
        match role {
            ComponentRole::Luminance => &self.luma,
            ComponentRole::Chrominance => &self.chroma,
        }
    }
}

/// Quantize a raw DCT block.
///
/// `raw` is the output of [`crate::dct::forward_dct_8x8`], which is scaled
/// up by 8, so each coefficient is divided by `8 * q`. Rounds half away
/// from zero.
#[inline]
pub fn quantize_block(raw: &[i32; DCTSIZE2], table: &QuantTable, out: &mut DctBlock) {
    for i in 0..DCTSIZE2 {
        let divisor = (table.values[i] as i32) << 3;
        let coef = raw[i];
        let q = (coef.abs() + (divisor >> 1)) / divisor;
        out[i] = (if coef < 0 { -q } else { q }) as i16;
    }
}
