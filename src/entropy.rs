//! Huffman entropy encoder for JPEG.
//!
//! This module implements baseline Huffman encoding for DCT coefficients:
//! - DC coefficient encoding with differential coding
//! - AC coefficient encoding with run-length coding
//! - EOB (End of Block) and ZRL (Zero Run Length) symbols
//! - Interleaved MCU traversal of the quantized coefficient buffer
//! - Symbol counting for optimized Huffman tables
//!
//! Reference: ITU-T T.81 Section F.1.2

use std::io::Write;

use crate::bitstream::BitWriter;
use crate::consts::{DCTSIZE2, JPEG_NATURAL_ORDER};
use crate::error::{Error, Result};
use crate::huffman::{DerivedTable, DerivedTableSet, FrequencyCounter, HuffTableSet};
use crate::types::{DctBlock, FrameLayout};

/// Maximum number of components in a scan.
const MAX_COMPS_IN_SCAN: usize = 4;

/// EOB (End of Block) symbol - encodes as run=0, size=0
const EOB: u8 = 0x00;

/// ZRL (Zero Run Length 16) symbol - encodes 16 consecutive zeros
const ZRL: u8 = 0xF0;

/// Calculate the number of bits needed to represent a value.
///
/// This is the "category" in JPEG terminology:
/// - 0 → 0 bits (value must be 0)
/// - 1 → 1 bit (values -1, 1)
/// - 2 → 2 bits (values -3..-2, 2..3)
/// - etc.
#[inline]
pub fn jpeg_nbits(value: i16) -> u8 {
    if value == 0 {
        return 0;
    }
    16 - value.unsigned_abs().leading_zeros() as u8
}

/// Category and value bits for a coefficient or DC difference.
///
/// Negative values are sent as `value - 1` masked to the category width.
#[inline]
fn magnitude_bits(value: i16) -> (u8, u16) {
    let nbits = jpeg_nbits(value);
    if value < 0 {
        let mask = ((1u32 << nbits) - 1) as u16;
        (nbits, (value as u16).wrapping_sub(1) & mask)
    } else {
        (nbits, value as u16)
    }
}

/// Entropy encoder state for a single scan.
pub struct EntropyEncoder<'a, W: Write> {
    /// Bitstream writer
    writer: &'a mut BitWriter<W>,
    /// Last DC value for each component (for differential coding)
    last_dc_val: [i16; MAX_COMPS_IN_SCAN],
}

impl<'a, W: Write> EntropyEncoder<'a, W> {
    /// Create a new entropy encoder.
    pub fn new(writer: &'a mut BitWriter<W>) -> Self {
        Self {
            writer,
            last_dc_val: [0; MAX_COMPS_IN_SCAN],
        }
    }

    /// Encode a single 8x8 block of quantized coefficients.
    ///
    /// # Arguments
    /// * `block` - 64 quantized DCT coefficients in natural (row-major) order
    /// * `component` - Component index (for DC prediction tracking)
    /// * `dc_table` - Derived Huffman table for DC coefficients
    /// * `ac_table` - Derived Huffman table for AC coefficients
    pub fn encode_block(
        &mut self,
        block: &DctBlock,
        component: usize,
        dc_table: &DerivedTable,
        ac_table: &DerivedTable,
    ) -> std::io::Result<()> {
        self.encode_dc(block[0], component, dc_table)?;
        self.encode_ac(block, ac_table)
    }

    fn encode_dc(
        &mut self,
        dc: i16,
        component: usize,
        dc_table: &DerivedTable,
    ) -> std::io::Result<()> {
        let diff = dc.wrapping_sub(self.last_dc_val[component]);
        self.last_dc_val[component] = dc;

        let (nbits, value) = magnitude_bits(diff);
        let (code, size) = dc_table.get_code(nbits);
        self.writer.put_bits(code, size)?;
        if nbits > 0 {
            self.writer.put_bits(value as u32, nbits)?;
        }
        Ok(())
    }

    fn encode_ac(&mut self, block: &DctBlock, ac_table: &DerivedTable) -> std::io::Result<()> {
        let mut run = 0u8;

        for &natural in JPEG_NATURAL_ORDER[1..].iter() {
            let coef = block[natural];
            if coef == 0 {
                run += 1;
                continue;
            }

            while run >= 16 {
                let (code, size) = ac_table.get_code(ZRL);
                self.writer.put_bits(code, size)?;
                run -= 16;
            }

            let (nbits, value) = magnitude_bits(coef);
            let (code, size) = ac_table.get_code((run << 4) | nbits);
            self.writer.put_bits(code, size)?;
            self.writer.put_bits(value as u32, nbits)?;
            run = 0;
        }

        if run > 0 {
            let (code, size) = ac_table.get_code(EOB);
            self.writer.put_bits(code, size)?;
        }
        Ok(())
    }
}

// =============================================================================
// Symbol Frequency Counting (for Huffman optimization)
// =============================================================================

/// Counts the symbols [`EntropyEncoder`] would emit, without writing.
pub struct SymbolCounter {
    last_dc_val: [i16; MAX_COMPS_IN_SCAN],
}

impl Default for SymbolCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolCounter {
    /// Create a new symbol counter.
    pub fn new() -> Self {
        Self {
            last_dc_val: [0; MAX_COMPS_IN_SCAN],
        }
    }

    /// Count the DC category and AC run/size symbols of one block.
    pub fn count_block(
        &mut self,
        block: &DctBlock,
        component: usize,
        dc_counter: &mut FrequencyCounter,
        ac_counter: &mut FrequencyCounter,
    ) {
        let dc = block[0];
        let diff = dc.wrapping_sub(self.last_dc_val[component]);
        self.last_dc_val[component] = dc;
        dc_counter.count(jpeg_nbits(diff));

        let mut run = 0u8;
        for &natural in JPEG_NATURAL_ORDER[1..].iter() {
            let coef = block[natural];
            if coef == 0 {
                run += 1;
                continue;
            }
            while run >= 16 {
                ac_counter.count(ZRL);
                run -= 16;
            }
            ac_counter.count((run << 4) | jpeg_nbits(coef));
            run = 0;
        }

        if run > 0 {
            ac_counter.count(EOB);
        }
    }
}

// =============================================================================
// Scan traversal
// =============================================================================

/// Visit every block in interleaved MCU order.
///
/// Within an MCU each component contributes `h * v` blocks in raster
/// order, components in frame order. `visit` receives the component index
/// and the block index in the coefficient buffer.
pub fn for_each_mcu_block<F>(layout: &FrameLayout, mut visit: F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<()>,
{
    for mcu_row in 0..layout.mcus_high {
        for mcu_col in 0..layout.mcus_wide {
            for (ci, (comp, plane)) in layout.components.iter().zip(&layout.planes).enumerate() {
                let h = comp.h_samp_factor as usize;
                let v = comp.v_samp_factor as usize;
                for by in 0..v {
                    for bx in 0..h {
                        let row = mcu_row * v + by;
                        let col = mcu_col * h + bx;
                        visit(ci, plane.block_offset + row * plane.blocks_wide() + col)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Borrow block `index` of a coefficient buffer.
fn block_at(coefficients: &[i16], index: usize) -> Result<&DctBlock> {
    let start = index * DCTSIZE2;
    coefficients
        .get(start..start + DCTSIZE2)
        .and_then(|s| <&DctBlock>::try_from(s).ok())
        .ok_or(Error::BufferSizeMismatch {
            expected: start + DCTSIZE2,
            actual: coefficients.len(),
        })
}

/// Entropy-code the whole frame as one interleaved scan.
///
/// DC predictors start at zero. Pending bits are left in the writer.
pub fn encode_scan<W: Write>(
    writer: &mut BitWriter<W>,
    layout: &FrameLayout,
    coefficients: &[i16],
    tables: &DerivedTableSet,
) -> Result<()> {
    let mut encoder = EntropyEncoder::new(writer);
    for_each_mcu_block(layout, |ci, index| {
        let role = layout.components[ci].role;
        let block = block_at(coefficients, index)?;
        encoder.encode_block(block, ci, tables.dc(role), tables.ac(role))?;
        Ok(())
    })
}

/// Build optimal DC/AC tables for both roles from the quantized frame.
///
/// Roles without any blocks (the chroma slots of a grayscale frame) keep
/// the standard tables.
pub fn optimal_tables(layout: &FrameLayout, coefficients: &[i16]) -> Result<HuffTableSet> {
    let mut dc = [FrequencyCounter::new(), FrequencyCounter::new()];
    let mut ac = [FrequencyCounter::new(), FrequencyCounter::new()];
    let mut used = [false; 2];
    let mut counter = SymbolCounter::new();

    for_each_mcu_block(layout, |ci, index| {
        let slot = layout.components[ci].role.table_index() as usize;
        let block = block_at(coefficients, index)?;
        counter.count_block(block, ci, &mut dc[slot], &mut ac[slot]);
        used[slot] = true;
        Ok(())
    })?;

    let mut tables = HuffTableSet::standard();
    for slot in 0..2 {
        if used[slot] {
            tables.dc[slot] = dc[slot].generate_table()?;
            tables.ac[slot] = ac[slot].generate_table()?;
        }
    }
    Ok(tables)
}
