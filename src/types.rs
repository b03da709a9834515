//! Core type definitions for the encoder.
//!
//! Geometry, component roles, sampling layout and JFIF metadata shared by
//! the pipeline stages.

use crate::consts::{DCTSIZE, DCTSIZE2, MAX_DIMENSION};
use crate::error::{Error, Result};

// =============================================================================
// Image Geometry
// =============================================================================

/// Dimensions and component count of the images an encoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Interleaved components per pixel (1 = grayscale, 3 = RGB)
    pub components: u8,
}

impl ImageGeometry {
    /// Validate and build a geometry.
    pub fn new(width: u32, height: u32, components: u8) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidDimensions { width, height });
        }
        if components != 1 && components != 3 {
            return Err(Error::UnsupportedComponentCount(components));
        }
        Ok(Self {
            width,
            height,
            components,
        })
    }

    /// Size in bytes of one interleaved source image.
    pub fn source_len(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(self.components as usize))
            .ok_or(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }
}

// =============================================================================
// Component Roles
// =============================================================================

/// Which quantization and Huffman table family a component uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRole {
    /// Y (or the single grayscale channel)
    Luminance,
    /// Cb and Cr
    Chrominance,
}

impl ComponentRole {
    /// Table slot used in DQT/DHT and referenced from SOF/SOS.
    pub const fn table_index(self) -> u8 {
        match self {
            ComponentRole::Luminance => 0,
            ComponentRole::Chrominance => 1,
        }
    }

    /// Role of the frame component at `index`.
    pub const fn for_component(index: usize) -> Self {
        if index == 0 {
            ComponentRole::Luminance
        } else {
            ComponentRole::Chrominance
        }
    }
}

// =============================================================================
// Sampling Factor / Subsampling
// =============================================================================

/// Chroma subsampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// 4:4:4 - No subsampling (highest quality)
    S444,
    /// 4:2:2 - Horizontal subsampling
    S422,
    /// 4:2:0 - Horizontal and vertical subsampling (most common)
    #[default]
    S420,
}

impl Subsampling {
    /// Returns (h_samp_factor, v_samp_factor) for luminance component.
    pub const fn luma_factors(self) -> (u8, u8) {
        match self {
            Subsampling::S444 => (1, 1),
            Subsampling::S422 => (2, 1),
            Subsampling::S420 => (2, 2),
        }
    }
}

// =============================================================================
// Component Info
// =============================================================================

/// Information about a single frame component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component identifier (1=Y, 2=Cb, 3=Cr)
    pub component_id: u8,
    /// Horizontal sampling factor (1-2)
    pub h_samp_factor: u8,
    /// Vertical sampling factor (1-2)
    pub v_samp_factor: u8,
    /// Table family for quantization and entropy coding
    pub role: ComponentRole,
}

impl ComponentInfo {
    /// Frame components for `num_components` channels at the given subsampling.
    ///
    /// Grayscale frames always use 1x1 sampling.
    pub fn for_frame(num_components: u8, subsampling: Subsampling) -> Vec<ComponentInfo> {
        let (luma_h, luma_v) = if num_components == 1 {
            (1, 1)
        } else {
            subsampling.luma_factors()
        };
        (0..num_components)
            .map(|i| {
                let (h, v) = if i == 0 { (luma_h, luma_v) } else { (1, 1) };
                ComponentInfo {
                    component_id: i + 1,
                    h_samp_factor: h,
                    v_samp_factor: v,
                    role: ComponentRole::for_component(i as usize),
                }
            })
            .collect()
    }

    /// Quantization table slot referenced from SOF.
    pub const fn quant_tbl_no(&self) -> u8 {
        self.role.table_index()
    }
}

// =============================================================================
// Plane Layout
// =============================================================================

/// Padded geometry of one component plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Width after subsampling, before padding
    pub width: usize,
    /// Height after subsampling, before padding
    pub height: usize,
    /// Width padded to whole MCUs
    pub padded_width: usize,
    /// Height padded to whole MCUs
    pub padded_height: usize,
    /// Offset of this plane in the preprocessed buffer
    pub sample_offset: usize,
    /// Offset of this plane's first block in the coefficient buffer
    pub block_offset: usize,
}

impl PlaneLayout {
    /// Blocks per row of this plane.
    pub const fn blocks_wide(&self) -> usize {
        self.padded_width / DCTSIZE
    }

    /// Block rows of this plane.
    pub const fn blocks_high(&self) -> usize {
        self.padded_height / DCTSIZE
    }

    /// Number of padded samples.
    pub const fn sample_len(&self) -> usize {
        self.padded_width * self.padded_height
    }

    /// Number of blocks.
    pub const fn block_count(&self) -> usize {
        self.blocks_wide() * self.blocks_high()
    }
}

/// Layout of every plane plus MCU counts for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    /// Frame components in SOF order
    pub components: Vec<ComponentInfo>,
    /// Per-component plane layout, parallel to `components`
    pub planes: Vec<PlaneLayout>,
    /// MCUs per row
    pub mcus_wide: usize,
    /// MCU rows
    pub mcus_high: usize,
}

impl FrameLayout {
    /// Compute the layout for a geometry and subsampling mode.
    pub fn new(geometry: &ImageGeometry, subsampling: Subsampling) -> Self {
        let components = ComponentInfo::for_frame(geometry.components, subsampling);
        let max_h = components.iter().map(|c| c.h_samp_factor).max().unwrap_or(1) as usize;
        let max_v = components.iter().map(|c| c.v_samp_factor).max().unwrap_or(1) as usize;

        let width = geometry.width as usize;
        let height = geometry.height as usize;
        let mcu_w = max_h * DCTSIZE;
        let mcu_h = max_v * DCTSIZE;
        let mcus_wide = width.div_ceil(mcu_w);
        let mcus_high = height.div_ceil(mcu_h);

        let mut sample_offset = 0;
        let mut block_offset = 0;
        let planes = components
            .iter()
            .map(|c| {
                let h = c.h_samp_factor as usize;
                let v = c.v_samp_factor as usize;
                let plane = PlaneLayout {
                    width: (width * h).div_ceil(max_h),
                    height: (height * v).div_ceil(max_v),
                    padded_width: mcus_wide * h * DCTSIZE,
                    padded_height: mcus_high * v * DCTSIZE,
                    sample_offset,
                    block_offset,
                };
                sample_offset += plane.sample_len();
                block_offset += plane.block_count();
                plane
            })
            .collect();

        Self {
            components,
            planes,
            mcus_wide,
            mcus_high,
        }
    }

    /// Total padded samples across all planes.
    pub fn total_samples(&self) -> usize {
        self.planes.iter().map(PlaneLayout::sample_len).sum()
    }

    /// Total blocks across all planes.
    pub fn total_blocks(&self) -> usize {
        self.planes.iter().map(PlaneLayout::block_count).sum()
    }

    /// Total quantized coefficients across all planes.
    pub fn total_coefficients(&self) -> usize {
        self.total_blocks() * DCTSIZE2
    }
}

// =============================================================================
// JFIF Density
// =============================================================================

/// Units for the JFIF APP0 density fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DensityUnit {
    /// Aspect ratio only
    #[default]
    None = 0,
    /// Dots per inch
    DotsPerInch = 1,
    /// Dots per centimeter
    DotsPerCm = 2,
}

/// Pixel density written into the JFIF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDensity {
    /// Unit of `x` and `y`
    pub unit: DensityUnit,
    /// Horizontal density
    pub x: u16,
    /// Vertical density
    pub y: u16,
}

impl PixelDensity {
    /// Density in dots per inch.
    pub const fn dpi(x: u16, y: u16) -> Self {
        Self {
            unit: DensityUnit::DotsPerInch,
            x,
            y,
        }
    }

    /// Pixel aspect ratio with no absolute unit.
    pub const fn aspect_ratio(x: u16, y: u16) -> Self {
        Self {
            unit: DensityUnit::None,
            x,
            y,
        }
    }
}

impl Default for PixelDensity {
    fn default() -> Self {
        Self::aspect_ratio(1, 1)
    }
}

// =============================================================================
// DCT Block Types
// =============================================================================

/// A single 8x8 block of DCT coefficients.
pub type DctBlock = [i16; DCTSIZE2];
