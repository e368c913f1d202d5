use std::fmt;
use std::hash::Hash;

/// Identifies an [`crate::image_atlas::Image`] registered with an
/// [`crate::image_atlas::ImageAtlas`]. Stable for the lifetime of the image;
/// looking one up after the image has been dropped returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a glyph within a [`crate::glyph::Typeface`], distinct from a
/// character code. Character codes are mapped to `GlyphIndex` by the
/// typeface's generator-supplied cmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphIndex(pub u32);

impl fmt::Display for GlyphIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable worker-thread slot index, used to pick which `GlyphGenerator`
/// face handle a thread owns while fetching glyphs in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadSlot(pub usize);
