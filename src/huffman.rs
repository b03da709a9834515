//! Huffman table construction for JPEG encoding.
//!
//! This module implements:
//! - The four Annex K reference tables
//! - Derived encoding tables (Figures C.1-C.3 of ITU-T T.81)
//! - Optimal tables from symbol frequency counts (Section K.2)
//!
//! Derived tables are indexed by symbol value for O(1) lookup while coding.

use crate::consts::{
    AC_CHROMINANCE_BITS, AC_CHROMINANCE_VALUES, AC_LUMINANCE_BITS, AC_LUMINANCE_VALUES,
    DC_CHROMINANCE_BITS, DC_CHROMINANCE_VALUES, DC_LUMINANCE_BITS, DC_LUMINANCE_VALUES,
};
use crate::error::{Error, Result};
use crate::types::ComponentRole;

/// Maximum code length allowed by JPEG (16 bits)
pub const MAX_CODE_LENGTH: usize = 16;

/// Maximum code length during Huffman tree construction
const MAX_CLEN: usize = 32;

/// A Huffman table in the DHT format (bits + values).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffTable {
    /// Number of codes of each length (`bits[0]` is unused)
    pub bits: [u8; 17],
    /// Symbol values in order of increasing code length
    pub huffval: [u8; 256],
}

impl Default for HuffTable {
    fn default() -> Self {
        Self {
            bits: [0; 17],
            huffval: [0; 256],
        }
    }
}

impl HuffTable {
    /// Build a table from a bits array and its symbol list.
    pub fn from_bits_and_values(bits: &[u8; 17], values: &[u8]) -> Self {
        let mut htbl = HuffTable {
            bits: *bits,
            ..Default::default()
        };
        htbl.huffval[..values.len()].copy_from_slice(values);
        htbl
    }

    /// Number of symbols with a code.
    pub fn num_symbols(&self) -> usize {
        self.bits[1..].iter().map(|&b| b as usize).sum()
    }

    /// The symbols that have codes, in code order.
    pub fn symbols(&self) -> &[u8] {
        &self.huffval[..self.num_symbols().min(256)]
    }
}

/// Derived Huffman table optimized for encoding.
#[derive(Clone, Debug)]
pub struct DerivedTable {
    /// Huffman code for each symbol (indexed by symbol value)
    pub ehufco: [u32; 256],
    /// Code length for each symbol (0 means no code assigned)
    pub ehufsi: [u8; 256],
}

impl Default for DerivedTable {
    fn default() -> Self {
        Self {
            ehufco: [0; 256],
            ehufsi: [0; 256],
        }
    }
}

impl DerivedTable {
    /// Build a derived table from a DHT-format table.
    ///
    /// DC tables may only contain symbols 0-15.
    pub fn from_huff_table(htbl: &HuffTable, is_dc: bool) -> Result<Self> {
        let mut dtbl = Self::default();

        // Figure C.1: code length of each symbol position
        let mut huffsize = [0u8; 257];
        let mut lastp = 0usize;
        for len in 1..=MAX_CODE_LENGTH {
            let count = htbl.bits[len] as usize;
            if lastp + count > 256 {
                return Err(Error::InvalidHuffmanTable);
            }
            huffsize[lastp..lastp + count].fill(len as u8);
            lastp += count;
        }

        // Figure C.2: canonical codes
        let mut huffcode = [0u32; 257];
        let mut code = 0u32;
        let mut si = huffsize[0] as u32;
        let mut p = 0usize;
        while p < lastp {
            while p < lastp && huffsize[p] as u32 == si {
                huffcode[p] = code;
                code += 1;
                p += 1;
            }
            // Codes of this length must fit in si bits
            if code >= (1 << si) {
                return Err(Error::InvalidHuffmanTable);
            }
            code <<= 1;
            si += 1;
        }

        // Figure C.3: index by symbol
        let max_symbol = if is_dc { 15 } else { 255 };
        for i in 0..lastp {
            let symbol = htbl.huffval[i] as usize;
            if symbol > max_symbol || dtbl.ehufsi[symbol] != 0 {
                return Err(Error::InvalidHuffmanTable);
            }
            dtbl.ehufco[symbol] = huffcode[i];
            dtbl.ehufsi[symbol] = huffsize[i];
        }

        Ok(dtbl)
    }

    /// Get the code and length for a symbol; length 0 means no code.
    #[inline]
    pub fn get_code(&self, symbol: u8) -> (u32, u8) {
        let idx = symbol as usize;
        (self.ehufco[idx], self.ehufsi[idx])
    }
}

/// Generate an optimal Huffman table from symbol frequency counts.
///
/// Section K.2: build a Huffman tree, then rebalance so no code is longer
/// than 16 bits. Slot 256 is a pseudo-symbol that keeps real symbols away
/// from the all-ones code; its count is forced to 1.
pub fn generate_optimal_table(counts: &[u64; 257]) -> Result<HuffTable> {
    let mut freq = *counts;
    freq[256] = 1;

    let mut codesize = [0usize; 257];
    let mut others: [Option<usize>; 257] = [None; 257];

    // Repeatedly merge the two smallest nonzero counts; ties go to the larger index
    loop {
        let Some(c1) = smallest_nonzero(&freq, None) else {
            break;
        };
        let Some(c2) = smallest_nonzero(&freq, Some(c1)) else {
            break;
        };

        freq[c1] += freq[c2];
        freq[c2] = 0;

        codesize[c1] += 1;
        let mut node = c1;
        while let Some(next) = others[node] {
            node = next;
            codesize[node] += 1;
        }
        others[node] = Some(c2);

        codesize[c2] += 1;
        let mut node = c2;
        while let Some(next) = others[node] {
            node = next;
            codesize[node] += 1;
        }
    }

    let mut bits = [0u32; MAX_CLEN + 1];
    for &size in codesize.iter().filter(|&&s| s > 0) {
        if size > MAX_CLEN {
            return Err(Error::HuffmanCodeLengthOverflow);
        }
        bits[size] += 1;
    }

    // Move over-long codes up the tree two at a time
    for i in (MAX_CODE_LENGTH + 1..=MAX_CLEN).rev() {
        while bits[i] > 0 {
            let mut j = i - 2;
            while j > 0 && bits[j] == 0 {
                j -= 1;
            }
            if j == 0 {
                return Err(Error::HuffmanCodeLengthOverflow);
            }
            bits[i] -= 2;
            bits[i - 1] += 1;
            bits[j + 1] += 2;
            bits[j] -= 1;
        }
    }

    // Drop the pseudo-symbol from the longest code length
    if let Some(longest) = (1..=MAX_CODE_LENGTH).rev().find(|&i| bits[i] > 0) {
        bits[longest] -= 1;
    }

    let mut htbl = HuffTable::default();
    for len in 1..=MAX_CODE_LENGTH {
        htbl.bits[len] = bits[len] as u8;
    }

    // Symbols in order of tree depth, then value
    let mut p = 0;
    for len in 1..=MAX_CLEN {
        for (symbol, _) in codesize[..256].iter().enumerate().filter(|(_, &s)| s == len) {
            htbl.huffval[p] = symbol as u8;
            p += 1;
        }
    }

    Ok(htbl)
}

fn smallest_nonzero(freq: &[u64; 257], skip: Option<usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_val = u64::MAX;
    for (i, &f) in freq.iter().enumerate() {
        if f > 0 && f <= best_val && Some(i) != skip {
            best_val = f;
            best = Some(i);
        }
    }
    best
}

/// Symbol frequency counts for one Huffman table.
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Count per symbol; slot 256 is reserved for the pseudo-symbol
    pub counts: [u64; 257],
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self { counts: [0; 257] }
    }
}

impl FrequencyCounter {
    /// Create a new frequency counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for a symbol.
    #[inline]
    pub fn count(&mut self, symbol: u8) {
        self.counts[symbol as usize] += 1;
    }

    /// Generate an optimal Huffman table from the collected frequencies.
    pub fn generate_table(&self) -> Result<HuffTable> {
        generate_optimal_table(&self.counts)
    }
}

/// The DC and AC tables for both component roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffTableSet {
    /// DC tables indexed by role slot
    pub dc: [HuffTable; 2],
    /// AC tables indexed by role slot
    pub ac: [HuffTable; 2],
}

impl HuffTableSet {
    /// The Annex K reference tables.
    pub fn standard() -> Self {
        Self {
            dc: [
                HuffTable::from_bits_and_values(&DC_LUMINANCE_BITS, &DC_LUMINANCE_VALUES),
                HuffTable::from_bits_and_values(&DC_CHROMINANCE_BITS, &DC_CHROMINANCE_VALUES),
            ],
            ac: [
                HuffTable::from_bits_and_values(&AC_LUMINANCE_BITS, &AC_LUMINANCE_VALUES),
                HuffTable::from_bits_and_values(&AC_CHROMINANCE_BITS, &AC_CHROMINANCE_VALUES),
            ],
        }
    }

    /// Build encoding tables for every slot.
    pub fn derive(&self) -> Result<DerivedTableSet> {
        Ok(DerivedTableSet {
            dc: [
                DerivedTable::from_huff_table(&self.dc[0], true)?,
                DerivedTable::from_huff_table(&self.dc[1], true)?,
            ],
            ac: [
                DerivedTable::from_huff_table(&self.ac[0], false)?,
                DerivedTable::from_huff_table(&self.ac[1], false)?,
            ],
        })
    }
}

/// Encoding tables for both component roles.
#[derive(Clone, Debug)]
pub struct DerivedTableSet {
    dc: [DerivedTable; 2],
    ac: [DerivedTable; 2],
}

impl DerivedTableSet {
    /// DC table for a role.
    pub fn dc(&self, role: ComponentRole) -> &DerivedTable {
        &self.dc[role.table_index() as usize]
    }

    /// AC table for a role.
    pub fn ac(&self, role: ComponentRole) -> &DerivedTable {
        &self.ac[role.table_index() as usize]
    }
}
