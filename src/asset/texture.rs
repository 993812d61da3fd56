/// Raw texture description produced by a decoding collaborator.
///
/// `image` is an index into the decoder's image list, resolved through
/// [`ModelDecoder::image`](super::loader::ModelDecoder::image) when the
/// texture is uploaded.
#[derive(Debug, Clone)]
pub struct TextureRecord {
    pub kind: TextureKind,
    pub image: usize,
    pub sampler: SamplerRecord,
}

/// Only two-dimensional textures can be uploaded; everything else is
/// skipped with a warning at cache-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    TwoDim,
    Other,
}

#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub size: (u32, u32),
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    R16,
    Rg16,
    Rgb16,
    Rgba16,
}

impl ImageFormat {
    /// Formats the upload path accepts. RGB data is padded to RGBA by the
    /// backend; everything else degrades to an empty texture slot.
    pub fn supported(self) -> bool {
        matches!(self, ImageFormat::Rgb8 | ImageFormat::Rgba8)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum MinFilter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum MipmapFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

#[derive(Debug, Clone, Default)]
pub struct SamplerRecord {
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub mipmap_filter: MipmapFilter,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
}
