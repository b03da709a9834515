//! # parajpeg
//!
//! Baseline JPEG encoder whose heavy stages run as data-parallel kernels.
//!
//! Color conversion, chroma subsampling and edge padding run one row per
//! task; the forward DCT and quantization run one 8x8 block per task. Both
//! stages execute on a worker pool owned by the encoder. Entropy coding
//! and stream assembly then run sequentially on the calling thread.
//!
//! Output is a single-scan sequential (SOF0) JFIF stream with 8-bit
//! samples, readable by any JPEG decoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use parajpeg::Encoder;
//!
//! # fn main() -> Result<(), parajpeg::Error> {
//! // RGB pixel data (3 bytes per pixel, row-major order)
//! let rgb_pixels: Vec<u8> = vec![0; 640 * 480 * 3];
//!
//! // One context per geometry, reused for every frame
//! let mut encoder = Encoder::create(640, 480, 85)?;
//! let jpeg_data = encoder.encode(&rgb_pixels)?;
//! encoder.destroy()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```no_run
//! use parajpeg::{Encoder, EncoderConfig, PixelDensity, Subsampling};
//!
//! # fn main() -> Result<(), parajpeg::Error> {
//! # let gray_pixels: Vec<u8> = vec![128; 100 * 100];
//! let config = EncoderConfig::default()
//!     .quality(90)
//!     .components(1)                          // grayscale source
//!     .subsampling(Subsampling::S444)
//!     .optimize_huffman(true)                 // per-image Huffman tables
//!     .pixel_density(PixelDensity::dpi(300, 300))
//!     .comment("scanned page")
//!     .threads(4);                            // device worker threads
//! let mut encoder = Encoder::with_config(100, 100, config)?;
//! let jpeg_data = encoder.encode(&gray_pixels)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): run kernels on a `rayon` pool. Without it the
//!   same kernels run inline on the calling thread.
//!
//! ## Logging
//!
//! The crate logs through the `log` facade: `debug` when a context is
//! created or an image finishes, `trace` for each pipeline stage.

#![deny(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Internal modules - hidden from public docs but accessible for tests
// ============================================================================
// These modules contain the pipeline stages. They are exposed for tests and
// benchmarks but are not part of the stable API.

/// Bitstream writing utilities (internal).
#[doc(hidden)]
pub mod bitstream;

/// Color conversion utilities (internal).
#[doc(hidden)]
pub mod color;

/// Constants and reference tables (internal).
#[doc(hidden)]
pub mod consts;

/// DCT transform (internal).
#[doc(hidden)]
pub mod dct;

/// Execution device and staging buffers (internal).
#[doc(hidden)]
pub mod device;

/// Entropy encoding (internal).
#[doc(hidden)]
pub mod entropy;

/// Huffman table utilities (internal).
#[doc(hidden)]
pub mod huffman;

/// JPEG marker writing (internal).
#[doc(hidden)]
pub mod marker;

/// Preprocess stage kernels (internal).
#[doc(hidden)]
pub mod preprocess;

/// Quantization utilities (internal).
#[doc(hidden)]
pub mod quant;

/// Chroma subsampling (internal).
#[doc(hidden)]
pub mod sample;

/// Transform stage kernels (internal).
#[doc(hidden)]
pub mod transform;

/// Type definitions (internal).
#[doc(hidden)]
pub mod types;

// Main encoder module (not hidden)
mod encoder;
mod error;

// ============================================================================
// Public API
// ============================================================================

/// Reusable encoding context for one image geometry.
///
/// Create it once with [`Encoder::create`] or [`Encoder::with_config`],
/// call [`encode`](Encoder::encode) for every image, then release it with
/// [`destroy`](Encoder::destroy).
///
/// # Example
///
/// ```no_run
/// use parajpeg::Encoder;
///
/// # fn main() -> Result<(), parajpeg::Error> {
/// let frames: Vec<Vec<u8>> = vec![vec![0; 320 * 240 * 3]; 10];
///
/// let mut encoder = Encoder::create(320, 240, 75)?;
/// for frame in &frames {
///     let jpeg = encoder.encode(frame)?;
///     println!("{} bytes", jpeg.len());
/// }
/// encoder.destroy()?;
/// # Ok(())
/// # }
/// ```
pub use encoder::Encoder;

/// Settings for [`Encoder::with_config`].
pub use encoder::EncoderConfig;

/// Clamp an unchecked integer quality into `1..=100`.
pub use encoder::clamp_quality;

/// Error type for encoding operations.
///
/// # Example
///
/// ```no_run
/// use parajpeg::{Encoder, Error};
///
/// # fn example() {
/// match Encoder::create(0, 0, 75) {
///     Ok(_) => println!("created"),
///     Err(Error::InvalidDimensions { width, height }) => {
///         eprintln!("Invalid dimensions: {}x{}", width, height);
///     }
///     Err(e) => eprintln!("Creation failed: {}", e),
/// }
/// # }
/// ```
pub use error::Error;

/// Result type alias for encoding operations.
///
/// Equivalent to `std::result::Result<T, parajpeg::Error>`.
pub use error::Result;

/// Chroma subsampling mode.
///
/// | Mode | Ratio | Description |
/// |------|-------|-------------|
/// | [`S444`](Subsampling::S444) | 4:4:4 | No subsampling (highest quality) |
/// | [`S422`](Subsampling::S422) | 4:2:2 | Horizontal subsampling |
/// | [`S420`](Subsampling::S420) | 4:2:0 | Both directions (default) |
///
/// Grayscale encoders ignore this setting.
pub use types::Subsampling;

/// Pixel density for JFIF metadata.
pub use types::{DensityUnit, PixelDensity};

/// Pipeline stage a staging buffer belongs to, reported by
/// [`Error::TransferFailed`].
pub use device::BufferRole;
