//! Recoverable error types at module boundaries.
//!
//! Contract violations (calling `line_to` before `move_to`, mixing closed
//! with non-closed animated contours, `allocate(0)`) are not represented
//! here: they are `debug_assert!`s at the call site, matching the
//! originating engine's `ASTRALassert` discipline. Resource exhaustion
//! (allocator full) is a plain `None`, not an error enum, so that the hot
//! allocation path never pays for a `Result`.

use thiserror::Error;

use crate::id::ImageId;

/// Errors returned by [`crate::image_atlas::ImageAtlas`] operations that can
/// genuinely fail for reasons other than "allocator full" (which is `None`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageAtlasError {
    #[error("image {0} is not registered with this atlas")]
    UnknownImage(ImageId),
    #[error("shared tile source out of bounds: ({tile_x}, {tile_y}) in a {width}x{height} element")]
    SharedTileOutOfBounds {
        tile_x: u32,
        tile_y: u32,
        width: u32,
        height: u32,
    },
    #[error("color backing already at its layer limit ({max_layers})")]
    ColorBackingExhausted { max_layers: u32 },
    #[error("index backing already at its layer limit ({max_layers})")]
    IndexBackingExhausted { max_layers: u32 },
}

/// Errors from the stroke item-data packer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrokePackError {
    #[error("dash pattern has no intervals but a non-`NoLengthAdjust` adjustment mode was requested")]
    EmptyDashPattern,
    #[error("packed static-data block count {0} exceeds the GPU block-index range")]
    BlockCountOverflow(usize),
}

/// Errors surfaced while materialising a glyph's GPU-side payload.
#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("glyph generator reported an unrecoverable fault for glyph {0}")]
    GeneratorFault(crate::id::GlyphIndex),
    #[error("worker thread fetching glyphs panicked: {0}")]
    WorkerPanicked(String),
}
