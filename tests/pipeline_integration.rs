//! End-to-end dataflow: build a `Path`, register backing storage with an
//! `ImageAtlas`, fetch glyphs from a `Typeface`, draw both through a
//! `RenderEncoder`, and pack the fill geometry with `FillSTC`, without any
//! GPU backend attached.

use std::collections::HashMap;

use astral::fill_stc::{Data, PassSet};
use astral::glyph::{FixedGlyphInfo, GlyphGenerator, ScalableGlyphInfo};
use astral::image_atlas::{ColorSpace, MipElementPlan, DEFAULT_LOG2_TILE_SIZE, DEFAULT_TILE_PADDING};
use astral::render_engine::NullRenderEngine;
use astral::{AnimatedPath, GlyphIndex, Image, ImageAtlas, Path, RenderEngine, ThreadSlot, Typeface};
use lyon::math::{point, Box2D};

struct StubGenerator;

impl GlyphGenerator for StubGenerator {
    fn number_glyphs(&self) -> u32 {
        4
    }
    fn number_threads(&self) -> usize {
        2
    }
    fn is_scalable(&self) -> bool {
        true
    }
    fn fill_character_mapping(&self, _slot: ThreadSlot, out: &mut HashMap<u32, GlyphIndex>) {
        out.insert(b'A' as u32, GlyphIndex(0));
        out.insert(b'B' as u32, GlyphIndex(1));
    }
    fn scalable_glyph_info(&self, _slot: ThreadSlot, _index: GlyphIndex) -> Option<ScalableGlyphInfo> {
        Some(ScalableGlyphInfo::default())
    }
    fn fixed_glyph_info(&self, _slot: ThreadSlot, _index: GlyphIndex, _strike: u32) -> Option<FixedGlyphInfo> {
        None
    }
}

#[test]
fn glyph_and_path_geometry_flow_through_a_render_encoder() {
    let typeface = Typeface::new(Box::new(StubGenerator));
    let glyph_a = typeface.fetch_glyph(typeface.glyph_index_for_char(b'A' as u32).unwrap());

    let mut path = Path::new();
    path.add_rect(Box2D::new(point(0.0, 0.0), point(20.0, 10.0)));

    let mut encoder = astral::layer::RenderEncoder::new();
    let root = encoder.push_layer(true);
    let fill_node = encoder.draw_fill(&path.contours()[0]);
    let glyph_node = encoder.draw_glyph(&glyph_a);
    encoder.pop_layer();

    assert!(encoder.children(root).contains(&fill_node));
    assert!(encoder.children(root).contains(&glyph_node));

    let stc_data = Data::build(&path.contours()[0].with_data(|d| d.clone()));
    let requirement = stc_data.storage_requirement(PassSet::CONTOUR_STENCIL | PassSet::CONTOUR_FUZZ);
    assert_eq!(requirement.contour_stencil_vertices, 4);

    let mut engine = NullRenderEngine::new(64);
    let mut packed = astral::fill_stc::PackedRenderData::default();
    stc_data.pack_render_data(PassSet::CONTOUR_STENCIL, &mut packed);
    let bytes: &[u8] = bytemuck::cast_slice(&packed.line_stencil);
    let handle = engine.allocate_vertex_data(bytes);
    assert_eq!(handle.0, 0);
}

#[test]
fn image_atlas_round_trips_an_image_created_from_a_path_bounding_box() {
    let mut path = Path::new();
    path.add_oval(Box2D::new(point(0.0, 0.0), point(40.0, 40.0)));
    let bbox = path.bounding_box();
    let width = bbox.width().ceil().max(1.0) as u32;
    let height = bbox.height().ceil().max(1.0) as u32;

    let mut atlas = ImageAtlas::new(DEFAULT_LOG2_TILE_SIZE, DEFAULT_TILE_PADDING, 4, 4, 2, 2);
    let id = atlas
        .create_image(&[(width, height)], &[MipElementPlan::default()], ColorSpace::Srgb, false)
        .unwrap();

    let image: std::rc::Rc<Image> = atlas.fetch_image(id).unwrap();
    assert_eq!(image.width(), width);
    assert_eq!(image.height(), height);

    atlas.destroy_image(id);
    assert!(atlas.fetch_image(id).is_none());
}

#[test]
fn animated_path_matches_two_paths_with_different_contour_shapes() {
    let mut start = Path::new();
    start.add_rect(Box2D::new(point(0.0, 0.0), point(10.0, 10.0)));

    let mut end = Path::new();
    end.add_oval(Box2D::new(point(0.0, 0.0), point(10.0, 10.0)));

    let animated = AnimatedPath::create(&start, &end);
    assert_eq!(animated.contours().len(), 1);
    let contour = &animated.contours()[0];
    assert_eq!(contour.start().curves().len(), contour.end().curves().len());
    for (a, b) in contour.start().curves().iter().zip(contour.end().curves().iter()) {
        assert_eq!(a.curve_type(), b.curve_type());
    }
}
