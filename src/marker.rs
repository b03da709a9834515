//! JPEG marker emission for encoding.
//!
//! This module handles writing JPEG file format markers:
//! - SOI (Start of Image)
//! - APP0 (JFIF header)
//! - COM (Comment)
//! - DQT (Define Quantization Table)
//! - SOF0 (Start of Frame, baseline)
//! - DHT (Define Huffman Table)
//! - SOS (Start of Scan)
//!
//! EOI is appended by [`BitWriter::finish`]. Segment payloads are built in
//! memory and written with [`BitWriter::write_segment`], which fills in the
//! length field.
//!
//! Reference: ITU-T T.81 Section B

use std::io::Write;

use crate::bitstream::BitWriter;
use crate::consts::{
    DCTSIZE2, JPEG_APP0, JPEG_COM, JPEG_DHT, JPEG_DQT, JPEG_NATURAL_ORDER, JPEG_SOF0, JPEG_SOI,
    JPEG_SOS,
};
use crate::error::Result;
use crate::huffman::{HuffTable, HuffTableSet};
use crate::quant::QuantTable;
use crate::types::{ComponentInfo, ImageGeometry, PixelDensity};

/// JFIF version string
const JFIF_ID: [u8; 5] = *b"JFIF\0";

/// JFIF version 1.01
const JFIF_VERSION: [u8; 2] = [1, 1];

/// Sample precision of baseline frames
const BASELINE_PRECISION: u8 = 8;

/// Marker writer over a bitstream.
pub struct MarkerWriter<'a, W: Write> {
    writer: &'a mut BitWriter<W>,
}

impl<'a, W: Write> MarkerWriter<'a, W> {
    /// Create a new marker writer.
    pub fn new(writer: &'a mut BitWriter<W>) -> Self {
        Self { writer }
    }

    /// Write Start of Image marker.
    pub fn write_soi(&mut self) -> Result<()> {
        self.writer.write_marker(JPEG_SOI)?;
        Ok(())
    }

    /// Write APP0 (JFIF) marker with no thumbnail.
    pub fn write_jfif_app0(&mut self, density: &PixelDensity) -> Result<()> {
        let mut payload = Vec::with_capacity(14);
        payload.extend_from_slice(&JFIF_ID);
        payload.extend_from_slice(&JFIF_VERSION);
        payload.push(density.unit as u8);
        payload.extend_from_slice(&density.x.to_be_bytes());
        payload.extend_from_slice(&density.y.to_be_bytes());
        // Thumbnail width and height
        payload.extend_from_slice(&[0, 0]);
        self.writer.write_segment(JPEG_APP0, &payload)
    }

    /// Write a comment marker.
    ///
    /// Text longer than one segment is rejected rather than truncated.
    pub fn write_com(&mut self, comment: &str) -> Result<()> {
        self.writer.write_segment(JPEG_COM, comment.as_bytes())
    }

    /// Write all quantization tables in one DQT segment.
    ///
    /// `tables` pairs a table slot with its table; values go out in zigzag
    /// order with 8-bit precision.
    pub fn write_dqt(&mut self, tables: &[(u8, &QuantTable)]) -> Result<()> {
        let mut payload = Vec::with_capacity(tables.len() * (1 + DCTSIZE2));
        for (slot, table) in tables {
            // Pq = 0 (8-bit) in the high nibble
            payload.push(slot & 0x0F);
            for &natural in JPEG_NATURAL_ORDER.iter() {
                payload.push(table.values[natural].min(255) as u8);
            }
        }
        self.writer.write_segment(JPEG_DQT, &payload)
    }

    /// Write a baseline Start of Frame marker.
    pub fn write_sof0(
        &mut self,
        geometry: &ImageGeometry,
        components: &[ComponentInfo],
    ) -> Result<()> {
        let mut payload = Vec::with_capacity(6 + 3 * components.len());
        payload.push(BASELINE_PRECISION);
        payload.extend_from_slice(&(geometry.height as u16).to_be_bytes());
        payload.extend_from_slice(&(geometry.width as u16).to_be_bytes());
        payload.push(components.len() as u8);
        for comp in components {
            payload.push(comp.component_id);
            payload.push((comp.h_samp_factor << 4) | comp.v_samp_factor);
            payload.push(comp.quant_tbl_no());
        }
        self.writer.write_segment(JPEG_SOF0, &payload)
    }

    /// Write all four Huffman tables in one DHT segment.
    ///
    /// Order: DC 0, AC 0, DC 1, AC 1.
    pub fn write_dht(&mut self, tables: &HuffTableSet) -> Result<()> {
        let mut payload = Vec::new();
        for slot in 0..2u8 {
            push_huff_table(&mut payload, slot, &tables.dc[slot as usize]);
            push_huff_table(&mut payload, 0x10 | slot, &tables.ac[slot as usize]);
        }
        self.writer.write_segment(JPEG_DHT, &payload)
    }

    /// Write Start of Scan for one interleaved sequential scan.
    pub fn write_sos(&mut self, components: &[ComponentInfo]) -> Result<()> {
        let mut payload = Vec::with_capacity(4 + 2 * components.len());
        payload.push(components.len() as u8);
        for comp in components {
            let slot = comp.role.table_index();
            payload.push(comp.component_id);
            // DC table in high nibble, AC table in low nibble
            payload.push((slot << 4) | slot);
        }
        // Ss = 0, Se = 63, Ah/Al = 0
        payload.extend_from_slice(&[0, 63, 0]);
        self.writer.write_segment(JPEG_SOS, &payload)
    }
}

/// Append Tc/Th, the 16 code-length counts and the symbols of one table.
fn push_huff_table(payload: &mut Vec<u8>, tc_th: u8, table: &HuffTable) {
    payload.push(tc_th);
    payload.extend_from_slice(&table.bits[1..=16]);
    payload.extend_from_slice(table.symbols());
}
