//! `ImageSamplerBits`: the bit-packed `uint32` image sampling descriptor.
//!
//! A newtype over `u32` with pack/unpack accessor methods, never raw shifts
//! at call sites.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
    Cubic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipmapMode {
    None,
    Nearest,
    Ceiling,
    Chosen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    Clamp,
    Repeat,
    Mirror,
    Decal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSampleMode {
    Direct,
    Invert,
    AlphaAsRgba,
    MaskChannelSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Srgb,
}

const FILTER_SHIFT: u32 = 0;
const MIPMAP_SHIFT: u32 = 2;
const MAX_LOD_SHIFT: u32 = 4;
const TILE_X_SHIFT: u32 = 8;
const TILE_Y_SHIFT: u32 = 10;
const COLORSPACE_SHIFT: u32 = 12;
const POST_SAMPLE_SHIFT: u32 = 13;
const PRE_PADDING_SHIFT: u32 = 15;

const TWO_BITS: u32 = 0b11;
const FOUR_BITS: u32 = 0b1111;

fn pack_filter(m: FilterMode) -> u32 {
    match m {
        FilterMode::Nearest => 0,
        FilterMode::Linear => 1,
        FilterMode::Cubic => 2,
    }
}
fn unpack_filter(bits: u32) -> FilterMode {
    match bits {
        0 => FilterMode::Nearest,
        1 => FilterMode::Linear,
        _ => FilterMode::Cubic,
    }
}

fn pack_mipmap(m: MipmapMode) -> u32 {
    match m {
        MipmapMode::None => 0,
        MipmapMode::Nearest => 1,
        MipmapMode::Ceiling => 2,
        MipmapMode::Chosen => 3,
    }
}
fn unpack_mipmap(bits: u32) -> MipmapMode {
    match bits {
        0 => MipmapMode::None,
        1 => MipmapMode::Nearest,
        2 => MipmapMode::Ceiling,
        _ => MipmapMode::Chosen,
    }
}

fn pack_tile(m: TileMode) -> u32 {
    match m {
        TileMode::Clamp => 0,
        TileMode::Repeat => 1,
        TileMode::Mirror => 2,
        TileMode::Decal => 3,
    }
}
fn unpack_tile(bits: u32) -> TileMode {
    match bits {
        0 => TileMode::Clamp,
        1 => TileMode::Repeat,
        2 => TileMode::Mirror,
        _ => TileMode::Decal,
    }
}

fn pack_post_sample(m: PostSampleMode) -> u32 {
    match m {
        PostSampleMode::Direct => 0,
        PostSampleMode::Invert => 1,
        PostSampleMode::AlphaAsRgba => 2,
        PostSampleMode::MaskChannelSelect => 3,
    }
}
fn unpack_post_sample(bits: u32) -> PostSampleMode {
    match bits {
        0 => PostSampleMode::Direct,
        1 => PostSampleMode::Invert,
        2 => PostSampleMode::AlphaAsRgba,
        _ => PostSampleMode::MaskChannelSelect,
    }
}

/// A packed `uint32` sampler descriptor: filter (2b), mipmap mode (2b),
/// max-LOD (4b), tile mode x/y (2b each), colorspace (1b), post-sample mode
/// (2b), pre-padding texel count (remaining bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSamplerBits(u32);

impl ImageSamplerBits {
    #[allow(clippy::too_many_arguments)]
    pub fn pack(
        filter: FilterMode,
        mipmap: MipmapMode,
        max_lod: u8,
        tile_x: TileMode,
        tile_y: TileMode,
        colorspace: ColorSpace,
        post_sample: PostSampleMode,
        pre_padding: u32,
    ) -> Self {
        debug_assert!(max_lod <= FOUR_BITS as u8, "max_lod must fit 4 bits");
        let colorspace_bit = match colorspace {
            ColorSpace::Linear => 0,
            ColorSpace::Srgb => 1,
        };
        let bits = (pack_filter(filter) << FILTER_SHIFT)
            | (pack_mipmap(mipmap) << MIPMAP_SHIFT)
            | ((max_lod as u32 & FOUR_BITS) << MAX_LOD_SHIFT)
            | (pack_tile(tile_x) << TILE_X_SHIFT)
            | (pack_tile(tile_y) << TILE_Y_SHIFT)
            | (colorspace_bit << COLORSPACE_SHIFT)
            | (pack_post_sample(post_sample) << POST_SAMPLE_SHIFT)
            | (pre_padding << PRE_PADDING_SHIFT);
        ImageSamplerBits(bits)
    }

    pub fn from_raw(bits: u32) -> Self {
        ImageSamplerBits(bits)
    }
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn filter(self) -> FilterMode {
        unpack_filter((self.0 >> FILTER_SHIFT) & TWO_BITS)
    }
    pub fn mipmap(self) -> MipmapMode {
        unpack_mipmap((self.0 >> MIPMAP_SHIFT) & TWO_BITS)
    }
    pub fn max_lod(self) -> u8 {
        ((self.0 >> MAX_LOD_SHIFT) & FOUR_BITS) as u8
    }
    pub fn tile_x(self) -> TileMode {
        unpack_tile((self.0 >> TILE_X_SHIFT) & TWO_BITS)
    }
    pub fn tile_y(self) -> TileMode {
        unpack_tile((self.0 >> TILE_Y_SHIFT) & TWO_BITS)
    }
    pub fn colorspace(self) -> ColorSpace {
        if (self.0 >> COLORSPACE_SHIFT) & 1 == 1 {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        }
    }
    pub fn post_sample(self) -> PostSampleMode {
        unpack_post_sample((self.0 >> POST_SAMPLE_SHIFT) & TWO_BITS)
    }
    pub fn pre_padding(self) -> u32 {
        self.0 >> PRE_PADDING_SHIFT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_round_trips_every_field() {
        let bits = ImageSamplerBits::pack(
            FilterMode::Cubic,
            MipmapMode::Chosen,
            9,
            TileMode::Mirror,
            TileMode::Repeat,
            ColorSpace::Srgb,
            PostSampleMode::AlphaAsRgba,
            2,
        );
        assert_eq!(bits.filter(), FilterMode::Cubic);
        assert_eq!(bits.mipmap(), MipmapMode::Chosen);
        assert_eq!(bits.max_lod(), 9);
        assert_eq!(bits.tile_x(), TileMode::Mirror);
        assert_eq!(bits.tile_y(), TileMode::Repeat);
        assert_eq!(bits.colorspace(), ColorSpace::Srgb);
        assert_eq!(bits.post_sample(), PostSampleMode::AlphaAsRgba);
        assert_eq!(bits.pre_padding(), 2);
    }
}
