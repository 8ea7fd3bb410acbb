/// Sampler state descriptor - per-texture-unit filtering and addressing
use crate::pipeline::CompareFunction;

/// Texture filtering option for one filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOptions {
    /// No filtering (mip filter only: disable mipmapping)
    None,
    /// Nearest sample
    Point,
    /// Linear interpolation
    Linear,
    /// Anisotropic filtering (min/mag only)
    Anisotropic,
}

/// Which filter of a sampler is being set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Minification,
    Magnification,
    Mip,
}

/// Texture addressing mode for one coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAddressingMode {
    /// Repeat the texture
    Wrap,
    /// Repeat with mirroring
    Mirror,
    /// Clamp to the edge texel
    Clamp,
    /// Use the border color outside [0,1]
    Border,
}

/// Addressing mode per texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvwAddressingMode {
    pub u: TextureAddressingMode,
    pub v: TextureAddressingMode,
    pub w: TextureAddressingMode,
}

impl Default for UvwAddressingMode {
    fn default() -> Self {
        Self {
            u: TextureAddressingMode::Wrap,
            v: TextureAddressingMode::Wrap,
            w: TextureAddressingMode::Wrap,
        }
    }
}

/// Engine-level sampler state descriptor
///
/// One per texture unit per stage; persists across texture rebinds so that
/// filtering set before a texture arrives is not lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerStateDesc {
    /// Minification filter
    pub min_filter: FilterOptions,
    /// Magnification filter
    pub mag_filter: FilterOptions,
    /// Mip filter
    pub mip_filter: FilterOptions,
    /// Addressing mode per coordinate
    pub addressing: UvwAddressingMode,
    /// Border color for `TextureAddressingMode::Border`
    pub border_color: [f32; 4],
    /// Mip LOD bias
    pub mip_lod_bias: f32,
    /// Max anisotropy when an anisotropic filter is selected
    pub max_anisotropy: u32,
    /// Enable depth-compare sampling
    pub compare_enabled: bool,
    /// Comparison function for depth-compare sampling
    pub compare_function: CompareFunction,
    /// Lowest mip level to sample
    pub min_lod: f32,
    /// Highest mip level to sample
    pub max_lod: f32,
}

impl Default for SamplerStateDesc {
    fn default() -> Self {
        Self {
            min_filter: FilterOptions::None,
            mag_filter: FilterOptions::None,
            mip_filter: FilterOptions::None,
            addressing: UvwAddressingMode::default(),
            border_color: [0.0, 0.0, 0.0, 1.0],
            mip_lod_bias: 0.0,
            max_anisotropy: 1,
            compare_enabled: false,
            compare_function: CompareFunction::AlwaysFail,
            min_lod: f32::MIN,
            max_lod: f32::MAX,
        }
    }
}

impl SamplerStateDesc {
    /// The descriptor actually handed to the device at resolve time
    ///
    /// The LOD bias is shifted by -0.5 and clamped to the range the driver
    /// accepts, and the LOD window is opened fully; both match how the
    /// original backend prepares sampler descriptors right before creating
    /// the native object.
    pub fn resolved(&self) -> SamplerStateDesc {
        let mut desc = *self;
        desc.mip_lod_bias = (desc.mip_lod_bias - 0.5).clamp(-16.0, 15.99);
        desc.min_lod = f32::MIN;
        desc.max_lod = f32::MAX;
        desc
    }
}
