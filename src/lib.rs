//! # Astral
//!
//! Astral is a 2D vector-graphics engine's core offline data subsystems: a
//! tiled image atlas allocator, path/curve geometry with animated-path curve
//! matching, a stencil-then-cover (STC) fill data builder, and a glyph
//! cache. These are the subsystems that sit between "the user described some
//! paths and glyphs" and "the GPU has vertex/static-data buffers to draw" —
//! the GPU backend itself, shader compilation, and font-outline extraction
//! are external collaborators reached through the [`RenderEngine`] trait and
//! the [`glyph::GlyphGenerator`] trait, respectively.
//!
//! ## Modules
//!
//! - [`util`]: the [`util::IntervalAllocator`] (1-D) and
//!   [`util::TileAllocator`] (2-D) packing primitives the image atlas is
//!   built on.
//! - [`image_atlas`]: [`image_atlas::ImageAtlas`] owns the color and index
//!   tile backings and builds padding-aware, mip-chained [`image_atlas::Image`]s
//!   with empty/full/shared tile reuse and a deferred-release lock.
//! - [`contour`]: [`contour::ContourCurve`]/[`contour::ContourData`], the
//!   curve primitives and sanitisation rules paths are built from.
//! - [`path`]: [`path::Path`], the contour-sequence builder with point
//!   queries and bounding boxes.
//! - [`animated`]: matches two source contours (or two paths) into
//!   equivalent curve sequences so per-vertex data can interpolate between
//!   them.
//! - [`fill_stc`]: turns a contour into the stencil/conic/fuzz geometry the
//!   stencil-then-cover fill algorithm consumes.
//! - [`glyph`]: the per-glyph lazy-generation, parallel-prefetch cache and
//!   its [`glyph::GlyphGenerator`] collaborator trait.
//! - [`stroke`]: packs stroke parameters and dash patterns into compact
//!   GPU buffer layouts.
//! - [`layer`]: an interface-level draw-tree layer stack
//!   ([`layer::RenderEncoder`]) so [`fill_stc`]/[`glyph`] consumers have a
//!   realistic caller; not a rendering engine in its own right.
//! - [`render_engine`]: the [`render_engine::RenderEngine`] trait seam the
//!   GPU binding layer implements, plus a `wgpu`-backed implementation
//!   behind the `wgpu-backend` feature.
//!
//! ## Getting started
//!
//! ```rust
//! use astral::contour::{ContourCurve, ContourData};
//! use astral::fill_stc;
//! use lyon::math::point;
//!
//! let mut contour = ContourData::new(point(0.0, 0.0));
//! contour.add_curve(ContourCurve::line(point(0.0, 0.0), point(10.0, 0.0)));
//! contour.add_curve(ContourCurve::line(point(10.0, 0.0), point(5.0, 10.0)));
//! contour.add_curve(ContourCurve::line(point(5.0, 10.0), point(0.0, 0.0)));
//! contour.close();
//!
//! let data = fill_stc::Data::build(&contour);
//! let requirement = data.storage_requirement(
//!     fill_stc::PassSet::CONTOUR_STENCIL | fill_stc::PassSet::CONTOUR_FUZZ,
//! );
//! assert_eq!(requirement.contour_stencil_vertices, 3);
//! ```

pub use lyon;

pub mod animated;
pub mod color;
pub mod contour;
pub mod error;
pub mod fill_stc;
pub mod glyph;
pub mod id;
pub mod image_atlas;
pub mod layer;
pub mod path;
pub mod render_engine;
pub mod stroke;
pub mod util;
pub mod vertex;

pub use animated::{AnimatedContour, AnimatedPath};
pub use color::Color;
pub use contour::{Contour, ContourCurve, ContourData, Continuation, CurveType};
pub use glyph::{Glyph, GlyphGenerator, Typeface};
pub use id::{GlyphIndex, ImageId, ThreadSlot};
pub use image_atlas::{Image, ImageAtlas, ImageMipElement};
pub use path::Path;
pub use render_engine::RenderEngine;
