//! Glyph cache: per-glyph lazy generation, parallel prefetch, and GPU-data
//! materialisation, backed by an external `GlyphGenerator` (a FreeType
//! bridge or equivalent — font parsing itself is the caller's job).

pub mod typeface;

use crate::color::Color;
use crate::id::{GlyphIndex, ThreadSlot};
use crate::path::Path;

pub use typeface::{Glyph, Typeface};

/// Per-glyph, per-strike metrics shared by scalable and fixed glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    pub advance: f32,
    pub bearing: [f32; 2],
    pub size: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

/// One palette's worth of per-layer colors for a COLR-style colored glyph.
#[derive(Debug, Clone, Default)]
pub struct GlyphColors {
    pub layers: Vec<Color>,
}

/// A generated scalable (outline) glyph's raw data, as the generator hands
/// it back.
#[derive(Debug, Clone, Default)]
pub struct ScalableGlyphInfo {
    pub metrics: GlyphMetrics,
    pub paths: Vec<Path>,
    pub fill_rules: Vec<FillRule>,
    pub palettes: Vec<GlyphColors>,
}

/// A generated fixed-size (bitmap) glyph strike's raw data.
#[derive(Debug, Clone)]
pub struct FixedGlyphInfo {
    pub metrics: GlyphMetrics,
    pub image_size: (u32, u32),
    pub pixels: Vec<u8>,
    pub has_color: bool,
}

/// The external collaborator surface a font backend (FreeType or
/// equivalent) implements. One face handle exists per worker thread slot;
/// `fetch_glyphs_parallel` calls into this only from the thread that owns
/// `slot`.
pub trait GlyphGenerator: Send + Sync {
    fn number_glyphs(&self) -> u32;
    fn number_threads(&self) -> usize;
    fn is_scalable(&self) -> bool;

    /// Fills `out` with this thread slot's character-code -> glyph-index
    /// mapping contribution (implementations may split the cmap across
    /// slots, or have every slot contribute the same map).
    fn fill_character_mapping(&self, slot: ThreadSlot, out: &mut std::collections::HashMap<u32, GlyphIndex>);

    fn scalable_glyph_info(&self, slot: ThreadSlot, index: GlyphIndex) -> Option<ScalableGlyphInfo>;

    fn fixed_glyph_info(&self, slot: ThreadSlot, index: GlyphIndex, strike: u32) -> Option<FixedGlyphInfo>;
}
