//! Error types for the encoder.

use crate::device::BufferRole;

/// Result type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for encoder operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid image dimensions (zero, or too large for a SOF0 header)
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// Image buffer size doesn't match the encoder geometry
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected buffer size in bytes
        expected: usize,
        /// Actual buffer size in bytes
        actual: usize,
    },
    /// Invalid quality value (must be 1-100)
    #[error("Invalid quality value: {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// Only grayscale (1) and RGB (3) sources are supported
    #[error("Unsupported component count: {0} (must be 1 or 3)")]
    UnsupportedComponentCount(u8),
    /// Host and device buffers disagree on the size of a transfer
    #[error("Transfer of {role:?} buffer failed: expected {expected} elements, got {actual}")]
    TransferFailed {
        /// Buffer the transfer targeted
        role: BufferRole,
        /// Elements the device buffer holds
        expected: usize,
        /// Elements the host side offered or accepted
        actual: usize,
    },
    /// The worker pool could not be started
    #[error("Device pool error: {0}")]
    DevicePool(String),
    /// Invalid Huffman table structure
    #[error("Invalid Huffman table structure")]
    InvalidHuffmanTable,
    /// Huffman code length overflow (exceeds max allowed)
    #[error("Huffman code length overflow (exceeds 16 bits)")]
    HuffmanCodeLengthOverflow,
    /// Marker segment payload does not fit the 16-bit length field
    #[error("Marker segment too large: {0} bytes")]
    SegmentTooLarge(usize),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Memory allocation failed
    #[error("Memory allocation failed")]
    AllocationFailed,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = [
            (
                Error::InvalidDimensions {
                    width: 0,
                    height: 100,
                },
                "Invalid image dimensions: 0x100",
            ),
            (
                Error::BufferSizeMismatch {
                    expected: 1000,
                    actual: 500,
                },
                "Buffer size mismatch: expected 1000, got 500",
            ),
            (
                Error::InvalidQuality(0),
                "Invalid quality value: 0 (must be 1-100)",
            ),
            (
                Error::UnsupportedComponentCount(4),
                "Unsupported component count: 4 (must be 1 or 3)",
            ),
            (
                Error::TransferFailed {
                    role: BufferRole::Source,
                    expected: 48,
                    actual: 47,
                },
                "Transfer of Source buffer failed: expected 48 elements, got 47",
            ),
            (
                Error::SegmentTooLarge(70000),
                "Marker segment too large: 70000 bytes",
            ),
            (Error::AllocationFailed, "Memory allocation failed"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::WriteZero, "sink full");
        let err: Error = io.into();
        assert_eq!(err, Error::IoError("sink full".to_string()));
    }

    #[test]
    fn test_from_try_reserve_error() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(Error::from(err), Error::AllocationFailed);
    }
}
