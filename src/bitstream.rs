//! Bitstream writer for the JPEG output stream.
//!
//! One writer carries a whole image: raw marker segments and the
//! entropy-coded scan go through the same output, so the stream can be
//! finalized in a single step.
//!
//! - Bits accumulate MSB-first in a 64-bit buffer
//! - Entropy-coded bytes equal to 0xFF are followed by a stuffed 0x00
//! - Raw bytes (markers, segment payloads) are never stuffed
//! - `flush` pads the last partial byte with 1-bits

use std::io::Write;

use crate::consts::{JPEG_EOI, MAX_SEGMENT_PAYLOAD};
use crate::error::{Error, Result};

/// Size of the bit buffer in bits
const BIT_BUF_SIZE: i32 = 64;

/// Bitstream writer for JPEG encoding.
pub struct BitWriter<W: Write> {
    /// Output destination
    output: W,
    /// Bit accumulation buffer
    put_buffer: u64,
    /// Number of free bits remaining in the buffer
    free_bits: i32,
    /// Total bytes written, stuffing included
    bytes_written: usize,
}

impl<W: Write> BitWriter<W> {
    /// Create a new bitstream writer.
    pub fn new(output: W) -> Self {
        Self {
            output,
            put_buffer: 0,
            free_bits: BIT_BUF_SIZE,
            bytes_written: 0,
        }
    }

    /// Write the low `size` bits of `code`, most significant first.
    ///
    /// `size` must be at most 16.
    #[inline]
    pub fn put_bits(&mut self, code: u32, size: u8) -> std::io::Result<()> {
        debug_assert!(size <= 16, "Size must be <= 16 bits");
        debug_assert!(code < (1 << size), "Code exceeds size bits");

        let size = size as i32;
        self.free_bits -= size;

        if self.free_bits < 0 {
            // Split the code: the high part fills the buffer, the rest carries over
            let overflow_bits = (-self.free_bits) as u32;
            self.put_buffer = (self.put_buffer << (size + self.free_bits))
                | ((code as u64) >> overflow_bits);
            self.flush_buffer()?;

            self.free_bits += BIT_BUF_SIZE;
            self.put_buffer = (code as u64) & ((1u64 << overflow_bits) - 1);
        } else {
            self.put_buffer = (self.put_buffer << size) | (code as u64);
        }

        Ok(())
    }

    /// Write out a full 64-bit buffer.
    fn flush_buffer(&mut self) -> std::io::Result<()> {
        let buffer = self.put_buffer;

        // SWAR test: nonzero iff some byte might be 0xFF
        if buffer & 0x8080808080808080 & !(buffer.wrapping_add(0x0101010101010101)) != 0 {
            for byte in buffer.to_be_bytes() {
                self.emit_byte_stuffed(byte)?;
            }
        } else {
            self.output.write_all(&buffer.to_be_bytes())?;
            self.bytes_written += 8;
        }

        Ok(())
    }

    #[inline]
    fn emit_byte_stuffed(&mut self, byte: u8) -> std::io::Result<()> {
        if byte == 0xFF {
            self.output.write_all(&[0xFF, 0x00])?;
            self.bytes_written += 2;
        } else {
            self.output.write_all(&[byte])?;
            self.bytes_written += 1;
        }
        Ok(())
    }

    /// Flush pending bits, padding with 1-bits to a byte boundary.
    pub fn flush(&mut self) -> std::io::Result<()> {
        let bits_in_buffer = BIT_BUF_SIZE - self.free_bits;
        if bits_in_buffer == 0 {
            return Ok(());
        }

        let padding_bits = (8 - (bits_in_buffer % 8)) % 8;
        let total_bits = bits_in_buffer + padding_bits;

        // Left-align the pending bits, then fill the gap below them with ones
        let mut buffer = self.put_buffer << (BIT_BUF_SIZE - bits_in_buffer);
        if padding_bits > 0 {
            buffer |= ((1u64 << padding_bits) - 1) << (BIT_BUF_SIZE - total_bits);
        }

        for &byte in buffer.to_be_bytes().iter().take((total_bits / 8) as usize) {
            self.emit_byte_stuffed(byte)?;
        }

        self.put_buffer = 0;
        self.free_bits = BIT_BUF_SIZE;
        Ok(())
    }

    /// True when no partial bits are pending.
    pub fn is_aligned(&self) -> bool {
        self.free_bits == BIT_BUF_SIZE
    }

    /// Write raw bytes (not stuffed). The writer must be byte-aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        debug_assert!(
            self.is_aligned(),
            "Buffer must be flushed before writing raw bytes"
        );
        self.output.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    /// Write a bare marker: `0xFF code`.
    pub fn write_marker(&mut self, code: u8) -> std::io::Result<()> {
        self.write_bytes(&[0xFF, code])
    }

    /// Write a marker segment: marker, big-endian length, payload.
    ///
    /// The length field counts itself, so payloads are limited to 65533 bytes.
    pub fn write_segment(&mut self, code: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_SEGMENT_PAYLOAD {
            return Err(Error::SegmentTooLarge(payload.len()));
        }
        let len = (payload.len() + 2) as u16;
        self.write_marker(code)?;
        self.write_bytes(&len.to_be_bytes())?;
        self.write_bytes(payload)?;
        Ok(())
    }

    /// Flush pending bits, append EOI and hand back the output.
    ///
    /// Consumes the writer, so a stream is finalized exactly once.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        self.write_marker(JPEG_EOI)?;
        self.output.flush()?;
        Ok(self.output)
    }

    /// Get the number of bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// An in-memory bitstream.
pub type VecBitWriter = BitWriter<Vec<u8>>;

impl VecBitWriter {
    /// Create a new bitstream writer backed by a Vec.
    pub fn new_vec() -> Self {
        Self::new(Vec::new())
    }

    /// Reuse an existing buffer, keeping its capacity.
    pub fn reuse(mut buffer: Vec<u8>) -> Self {
        buffer.clear();
        Self::new(buffer)
    }

    /// Get the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_bits() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0b10101010, 8).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_bytes(), vec![0b10101010]);
    }

    #[test]
    fn test_multiple_small_writes() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0b11, 2).unwrap();
        writer.put_bits(0b00, 2).unwrap();
        writer.put_bits(0b1111, 4).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_bytes(), vec![0b11001111]);
    }

    #[test]
    fn test_cross_byte_boundary() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0b111100001111, 12).unwrap();
        writer.flush().unwrap();
        // 11110000 1111 + 1111 padding = 0xF0 0xFF, stuffed
        assert_eq!(writer.into_bytes(), vec![0xF0, 0xFF, 0x00]);
    }

    #[test]
    fn test_byte_stuffing() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0xFF, 8).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_bytes(), vec![0xFF, 0x00]);
    }

    #[test]
    fn test_no_stuffing_for_non_ff() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0xFE, 8).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_bytes(), vec![0xFE]);
    }

    #[test]
    fn test_padding_with_ones() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0b10101, 5).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_bytes(), vec![0b10101111]);
    }

    #[test]
    fn test_flush_when_empty_is_noop() {
        let mut writer = VecBitWriter::new_vec();
        writer.flush().unwrap();
        assert!(writer.into_bytes().is_empty());
    }

    #[test]
    fn test_full_buffer_spill() {
        let mut writer = VecBitWriter::new_vec();
        // 5 * 13 = 65 bits forces a spill of one bit into the next buffer
        for _ in 0..5 {
            writer.put_bits(0x0AAA, 13).unwrap();
        }
        writer.flush().unwrap();
        let bytes = writer.into_bytes();
        // 65 bits + 7 padding = 9 bytes, none of them 0xFF
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 0b0101_0101);
        assert_eq!(bytes[8], 0b0111_1111);
    }

    #[test]
    fn test_bytes_written_count() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0xAB, 8).unwrap();
        writer.put_bits(0xFF, 8).unwrap();
        writer.put_bits(0xCD, 8).unwrap();
        writer.flush().unwrap();
        // AB, FF, 00 (stuffing), CD
        assert_eq!(writer.bytes_written(), 4);
    }

    #[test]
    fn test_write_raw_bytes() {
        let mut writer = VecBitWriter::new_vec();
        writer.write_marker(0xD8).unwrap();
        writer.write_bytes(&[0xFF, 0xFF]).unwrap();
        assert_eq!(writer.into_bytes(), vec![0xFF, 0xD8, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_segment() {
        let mut writer = VecBitWriter::new_vec();
        writer.write_segment(0xFE, b"hi").unwrap();
        assert_eq!(writer.into_bytes(), vec![0xFF, 0xFE, 0x00, 0x04, b'h', b'i']);
    }

    #[test]
    fn test_write_segment_too_large() {
        let mut writer = VecBitWriter::new_vec();
        let payload = vec![0u8; MAX_SEGMENT_PAYLOAD + 1];
        assert_eq!(
            writer.write_segment(0xFE, &payload),
            Err(Error::SegmentTooLarge(MAX_SEGMENT_PAYLOAD + 1))
        );
    }

    #[test]
    fn test_finish_pads_and_appends_eoi() {
        let mut writer = VecBitWriter::new_vec();
        writer.put_bits(0b0, 1).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b0111_1111, 0xFF, 0xD9]);
    }

    #[test]
    fn test_reuse_keeps_capacity() {
        let mut buf = Vec::with_capacity(1024);
        buf.extend_from_slice(&[1, 2, 3]);
        let writer = VecBitWriter::reuse(buf);
        assert_eq!(writer.bytes_written(), 0);
        let bytes = writer.into_bytes();
        assert!(bytes.is_empty());
        assert!(bytes.capacity() >= 1024);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_ff_is_followed_by_zero(
                codes in proptest::collection::vec((any::<u16>(), 1u8..=16), 0..200)
            ) {
                let mut writer = VecBitWriter::new_vec();
                for (code, size) in codes {
                    let mask = if size == 16 { 0xFFFF } else { (1u32 << size) - 1 };
                    writer.put_bits(code as u32 & mask, size).unwrap();
                }
                writer.flush().unwrap();
                let bytes = writer.into_bytes();
                let mut i = 0;
                while i < bytes.len() {
                    if bytes[i] == 0xFF {
                        prop_assert_eq!(bytes.get(i + 1), Some(&0x00));
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }
        }
    }
}
