//! Encoder context and pipeline.
//!
//! An [`Encoder`] is created once for a fixed geometry and then encodes any
//! number of images of that geometry. Creation validates the geometry and
//! quality, builds the quantization and Huffman tables, starts the device
//! and allocates every staging buffer. Each [`Encoder::encode`] call then
//! runs the same pipeline:
//!
//! 1. upload the interleaved pixels
//! 2. preprocess (color conversion, subsampling, padding) on the device
//! 3. transform and quantize every block on the device
//! 4. download the coefficients
//! 5. entropy-code on the calling thread and finalize the stream
//!
//! # Examples
//!
//! ```
//! use parajpeg::{Encoder, EncoderConfig, Subsampling};
//!
//! # fn main() -> Result<(), parajpeg::Error> {
//! let pixels = vec![128u8; 64 * 48 * 3];
//!
//! let mut encoder = Encoder::create(64, 48, 85)?;
//! let jpeg = encoder.encode(&pixels)?;
//! assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
//!
//! let config = EncoderConfig::default()
//!     .quality(90)
//!     .subsampling(Subsampling::S444)
//!     .optimize_huffman(true);
//! let mut encoder = Encoder::with_config(64, 48, config)?;
//! let jpeg = encoder.encode(&pixels)?;
//! assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
//! encoder.destroy()?;
//! # Ok(())
//! # }
//! ```

use crate::bitstream::VecBitWriter;
use crate::consts::MAX_SEGMENT_PAYLOAD;
use crate::device::{BufferRole, Device, DeviceBuffer};
use crate::entropy::{encode_scan, optimal_tables};
use crate::error::{Error, Result};
use crate::huffman::{DerivedTableSet, HuffTableSet};
use crate::marker::MarkerWriter;
use crate::preprocess::preprocess;
use crate::quant::QuantTables;
use crate::transform::transform;
use crate::types::{ComponentRole, FrameLayout, ImageGeometry, PixelDensity, Subsampling};

/// Clamp an unchecked integer quality into `1..=100`.
///
/// For callers that accept quality from loosely typed input. The encoder
/// itself rejects out-of-range values instead of clamping them.
pub fn clamp_quality(quality: i32) -> u8 {
    quality.clamp(1, 100) as u8
}

/// Settings fixed for the lifetime of an [`Encoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Quality level (1-100)
    pub quality: u8,
    /// Interleaved components per source pixel (1 = grayscale, 3 = RGB)
    pub components: u8,
    /// Chroma subsampling mode (ignored for grayscale)
    pub subsampling: Subsampling,
    /// Build image-specific Huffman tables with an extra counting pass
    pub optimize_huffman: bool,
    /// Pixel density for the JFIF APP0 marker
    pub pixel_density: PixelDensity,
    /// Optional COM marker text
    pub comment: Option<String>,
    /// Device worker threads (0 = pool default)
    pub threads: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            components: 3,
            subsampling: Subsampling::S420,
            optimize_huffman: false,
            pixel_density: PixelDensity::default(),
            comment: None,
            threads: 0,
        }
    }
}

impl EncoderConfig {
    /// Set quality level (1-100).
    ///
    /// Out-of-range values are reported when the encoder is created.
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the number of interleaved source components (1 or 3).
    pub fn components(mut self, components: u8) -> Self {
        self.components = components;
        self
    }

    /// Set chroma subsampling mode.
    pub fn subsampling(mut self, mode: Subsampling) -> Self {
        self.subsampling = mode;
        self
    }

    /// Enable Huffman table optimization.
    ///
    /// Each image is coded with tables built from its own symbol counts,
    /// which usually saves a few percent at the cost of a second pass over
    /// the coefficients.
    pub fn optimize_huffman(mut self, enable: bool) -> Self {
        self.optimize_huffman = enable;
        self
    }

    /// Set the JFIF pixel density.
    pub fn pixel_density(mut self, density: PixelDensity) -> Self {
        self.pixel_density = density;
        self
    }

    /// Add a COM marker with the given text.
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    /// Set the number of device worker threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Reusable encoding context for one image geometry.
///
/// Every staging buffer is allocated at creation; encoding only overwrites
/// them. `encode` takes `&mut self`, so one context encodes one image at a
/// time. Contexts are `Send` and can be moved to worker threads.
#[derive(Debug)]
pub struct Encoder {
    geometry: ImageGeometry,
    config: EncoderConfig,
    layout: FrameLayout,
    quant: QuantTables,
    huffman: HuffTableSet,
    derived: DerivedTableSet,
    device: Device,
    source: DeviceBuffer<u8>,
    planes: DeviceBuffer<u8>,
    coefficients: DeviceBuffer<i16>,
    /// Host copy of the quantized coefficients
    host_coefficients: Vec<i16>,
    /// Output stream buffer, kept for its capacity
    output: Vec<u8>,
}

impl Encoder {
    /// Create an RGB, 4:2:0 encoder with standard Huffman tables.
    ///
    /// # Errors
    /// - [`Error::InvalidDimensions`] for a zero dimension or one above 65535
    /// - [`Error::InvalidQuality`] for quality outside 1-100
    /// - [`Error::AllocationFailed`] if a staging buffer cannot be reserved
    pub fn create(width: u32, height: u32, quality: u8) -> Result<Self> {
        Self::with_config(width, height, EncoderConfig::default().quality(quality))
    }

    /// Create an encoder with explicit settings.
    pub fn with_config(width: u32, height: u32, config: EncoderConfig) -> Result<Self> {
        let geometry = ImageGeometry::new(width, height, config.components)?;
        if !(1..=100).contains(&config.quality) {
            return Err(Error::InvalidQuality(config.quality));
        }
        if let Some(text) = &config.comment {
            if text.len() > MAX_SEGMENT_PAYLOAD {
                return Err(Error::SegmentTooLarge(text.len()));
            }
        }

        let layout = FrameLayout::new(&geometry, config.subsampling);
        let quant = QuantTables::for_quality(config.quality);
        let huffman = HuffTableSet::standard();
        let derived = huffman.derive()?;
        let device = Device::new(config.threads)?;

        let source = DeviceBuffer::alloc(BufferRole::Source, geometry.source_len()?)?;
        let planes = DeviceBuffer::alloc(BufferRole::Preprocessed, layout.total_samples())?;
        let coefficients = DeviceBuffer::alloc(BufferRole::Quantized, layout.total_coefficients())?;

        let mut host_coefficients = Vec::new();
        host_coefficients.try_reserve_exact(layout.total_coefficients())?;
        host_coefficients.resize(layout.total_coefficients(), 0);

        log::debug!(
            "encoder created: {}x{}x{} q{} {:?} optimize={} threads={}",
            width,
            height,
            geometry.components,
            config.quality,
            config.subsampling,
            config.optimize_huffman,
            device.threads()
        );

        Ok(Self {
            geometry,
            config,
            layout,
            quant,
            huffman,
            derived,
            device,
            source,
            planes,
            coefficients,
            host_coefficients,
            output: Vec::new(),
        })
    }

    /// Geometry this encoder accepts.
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    /// Settings this encoder was created with.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode one image and return the complete JPEG stream.
    ///
    /// `pixels` is row-major and interleaved with `components` bytes per
    /// pixel. On error no output is produced and the context stays usable.
    pub fn encode(&mut self, pixels: &[u8]) -> Result<Vec<u8>> {
        let expected = self.geometry.source_len()?;
        if pixels.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        self.device.upload(&mut self.source, pixels)?;

        preprocess(
            &self.device,
            &self.geometry,
            &self.layout,
            &self.source,
            &mut self.planes,
        );
        log::trace!("preprocess: {} samples", self.planes.len());

        transform(
            &self.device,
            &self.layout,
            &self.quant,
            &self.planes,
            &mut self.coefficients,
        );
        log::trace!("transform: {} blocks", self.layout.total_blocks());

        self.device
            .download(&self.coefficients, &mut self.host_coefficients)?;

        let optimized;
        let (huffman, derived) = if self.config.optimize_huffman {
            let tables = optimal_tables(&self.layout, &self.host_coefficients)?;
            let derived = tables.derive()?;
            optimized = (tables, derived);
            (&optimized.0, &optimized.1)
        } else {
            (&self.huffman, &self.derived)
        };

        let mut writer = VecBitWriter::reuse(std::mem::take(&mut self.output));
        if let Err(e) = self.write_stream(&mut writer, huffman, derived) {
            self.output = writer.into_bytes();
            return Err(e);
        }

        let stream = writer.finish()?;
        let jpeg = stream.clone();
        self.output = stream;

        log::debug!(
            "encoded {}x{} image: {} bytes",
            self.geometry.width,
            self.geometry.height,
            jpeg.len()
        );
        Ok(jpeg)
    }

    /// Write the headers and the entropy-coded scan for the downloaded
    /// coefficients.
    fn write_stream(
        &self,
        writer: &mut VecBitWriter,
        huffman: &HuffTableSet,
        derived: &DerivedTableSet,
    ) -> Result<()> {
        {
            let mut markers = MarkerWriter::new(writer);
            markers.write_soi()?;
            markers.write_jfif_app0(&self.config.pixel_density)?;
            if let Some(text) = &self.config.comment {
                markers.write_com(text)?;
            }
            markers.write_dqt(&[
                (
                    ComponentRole::Luminance.table_index(),
                    self.quant.get(ComponentRole::Luminance),
                ),
                (
                    ComponentRole::Chrominance.table_index(),
                    self.quant.get(ComponentRole::Chrominance),
                ),
            ])?;
            markers.write_sof0(&self.geometry, &self.layout.components)?;
            markers.write_dht(huffman)?;
            markers.write_sos(&self.layout.components)?;
        }
        let header_len = writer.bytes_written();

        encode_scan(writer, &self.layout, &self.host_coefficients, derived)?;
        log::trace!("entropy: {} bytes", writer.bytes_written() - header_len);
        Ok(())
    }

    /// Release the context and all staging memory.
    pub fn destroy(self) -> Result<()> {
        log::debug!(
            "encoder destroyed: {}x{}",
            self.geometry.width,
            self.geometry.height
        );
        drop(self);
        Ok(())
    }
}
