//! Stencil-then-cover (STC) fill data builder: turns a contour into the
//! geometry three GPU passes consume — a flat-fill triangle fan, per-curve
//! conic-coverage triangles, and anti-alias fuzz quads along every edge.
//!
//! The conic triangle's texture-coordinate layout `(0,0), (0.5,0), (1,1)`
//! reduces the fragment interior test to `x^2 - y < 0`, which is only exact
//! for a plain (conic-weight 1.0) quadratic. Curves that aren't already in
//! that shape — conics/conic arcs with a non-unit weight, and cubics — are
//! flattened into a run of such triangles by `flatten_curve`, a recursive
//! split bounded by a flatness tolerance and a weight-closeness tolerance,
//! with a depth cap as a defensive backstop. Vertex/static-data counts are a
//! pure function of contour shape so the caller can size GPU buffers from
//! `storage_requirement` before calling `pack_render_data`.

use lyon::math::Point;

use crate::contour::{ContourCurve, ContourData, CurveType};
use crate::vertex::{
    ConicFuzzVertex, ConicStencilVertex, LineFuzzVertex, LineStencilVertex, StaticDataBlock,
};

bitflags::bitflags! {
    /// Which of the four STC passes to size/emit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PassSet: u8 {
        const CONTOUR_STENCIL        = 0b0001;
        const CONIC_TRIANGLES_STENCIL = 0b0010;
        const CONTOUR_FUZZ           = 0b0100;
        const CONIC_TRIANGLE_FUZZ    = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicTriangle {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Point,
    pub b: Point,
}

/// Default flatness tolerance (in the contour's own units) for flattening
/// non-unit-weight conics and cubics into plain-quadratic conic triangles.
pub const DEFAULT_FLATTEN_TOLERANCE: f32 = 0.25;

/// A conic within this distance of weight 1.0 is treated as a plain
/// quadratic rather than split further on weight grounds alone.
const CONIC_WEIGHT_TOLERANCE: f32 = 0.02;

/// Defensive recursion bound; a well-formed curve flattens in well under
/// this many halvings, this just stops runaway recursion on a degenerate one.
const MAX_FLATTEN_DEPTH: u32 = 24;

/// Per-contour STC source geometry, in the four collections whose counts
/// must match 1:1 between the start/end side of an animated pair.
#[derive(Debug, Clone, Default)]
pub struct Data {
    pub line_contour: Vec<Point>,
    pub conic_triangles: Vec<(ConicTriangle, bool)>,
    pub aa_line_segments_explicit: Vec<LineSegment>,
    pub aa_line_segments_implicit: Vec<LineSegment>,
}

impl Data {
    /// Builds STC source geometry from a contour, flattening non-unit-weight
    /// conics and cubics with `DEFAULT_FLATTEN_TOLERANCE`. Non-closed
    /// contours are closed with an implicit edge from the last point to the
    /// first; that edge's AA fuzz lands in `aa_line_segments_implicit`
    /// rather than `aa_line_segments_explicit`.
    pub fn build(contour: &ContourData) -> Data {
        Data::build_with_tolerance(contour, DEFAULT_FLATTEN_TOLERANCE)
    }

    /// Same as `build`, but with a caller-chosen flatness tolerance for
    /// splitting non-unit-weight conics and cubics into conic triangles.
    pub fn build_with_tolerance(contour: &ContourData, tolerance: f32) -> Data {
        let mut data = Data::default();
        let curves = contour.curves();
        if curves.is_empty() {
            data.line_contour.push(contour.start_point());
            return data;
        }

        data.line_contour.push(contour.start_point());
        for curve in curves {
            data.line_contour.push(curve.end());
            match curve.curve_type() {
                CurveType::Line => {
                    data.aa_line_segments_explicit.push(LineSegment {
                        a: curve.start(),
                        b: curve.end(),
                    });
                }
                CurveType::Quadratic | CurveType::Conic | CurveType::ConicArc | CurveType::Cubic => {
                    flatten_curve(curve, tolerance, MAX_FLATTEN_DEPTH, &mut data.conic_triangles);
                }
            }
        }

        if contour.is_closed() {
            // The contour's own closing edge already made the last point
            // coincide with the first; the triangle-fan stencil needs each
            // distinct corner once, not the duplicate closing vertex.
            if data.line_contour.len() > 1 && data.line_contour.last() == data.line_contour.first() {
                data.line_contour.pop();
            }
        } else {
            let last = *data.line_contour.last().unwrap();
            let first = data.line_contour[0];
            if last != first {
                data.aa_line_segments_implicit.push(LineSegment { a: last, b: first });
            }
        }

        data
    }

    pub fn storage_requirement(&self, passes: PassSet) -> StorageRequirement {
        let mut req = StorageRequirement::default();

        if passes.contains(PassSet::CONTOUR_STENCIL) {
            req.contour_stencil_vertices = self.line_contour.len() as u32;
        }
        if passes.contains(PassSet::CONIC_TRIANGLES_STENCIL) {
            req.conic_stencil_vertices = self.conic_triangles.len() as u32 * 3;
            req.block3 = self.conic_triangles.len() as u32 * 3;
        }
        if passes.contains(PassSet::CONTOUR_FUZZ) {
            let edges = self.aa_line_segments_explicit.len() + self.aa_line_segments_implicit.len();
            req.contour_fuzz_vertices = edges as u32 * 6;
            req.block2 = edges as u32 * 2;
        }
        if passes.contains(PassSet::CONIC_TRIANGLE_FUZZ) {
            req.conic_fuzz_vertices = self.conic_triangles.len() as u32 * 6;
        }

        req
    }

    /// Writes vertex/static-data for the requested passes. Returns the
    /// number of vertices written per pass (in the same order as
    /// `storage_requirement`'s fields), so the caller can confirm the
    /// query and the write agree.
    pub fn pack_render_data(&self, passes: PassSet, out: &mut PackedRenderData) {
        if passes.contains(PassSet::CONTOUR_STENCIL) {
            // One vertex per contour point; `path_b` is the next point
            // (wrapping around) so the fan shader can reconstruct each
            // wedge triangle without a separate pivot attribute.
            let n = self.line_contour.len();
            for i in 0..n {
                let a = self.line_contour[i];
                let b = self.line_contour[(i + 1) % n.max(1)];
                out.line_stencil.push(LineStencilVertex {
                    path_a: [a.x, a.y],
                    path_b: [b.x, b.y],
                });
            }
        }

        if passes.contains(PassSet::CONIC_TRIANGLES_STENCIL) {
            for (triangle, _) in &self.conic_triangles {
                let base = out.static_data_block3.len() as u32;
                out.static_data_block3.push(StaticDataBlock::endpoint([triangle.start.x, triangle.start.y]));
                out.static_data_block3.push(StaticDataBlock::endpoint([triangle.control.x, triangle.control.y]));
                out.static_data_block3.push(StaticDataBlock::endpoint([triangle.end.x, triangle.end.y]));

                const TEX_COORDS: [[f32; 2]; 3] = [[0.0, 0.0], [0.5, 0.0], [1.0, 1.0]];
                for (i, tex_coord) in TEX_COORDS.into_iter().enumerate() {
                    out.conic_stencil.push(ConicStencilVertex {
                        static_data_index: base + i as u32,
                        tex_coord,
                        triangle_v0_static_data_index: base,
                    });
                }
            }
        }

        if passes.contains(PassSet::CONTOUR_FUZZ) {
            for segment in self.aa_line_segments_explicit.iter().chain(self.aa_line_segments_implicit.iter()) {
                let base = out.static_data_block2.len() as u32;
                out.static_data_block2.push(StaticDataBlock::endpoint([segment.a.x, segment.a.y]));
                out.static_data_block2.push(StaticDataBlock::endpoint([segment.b.x, segment.b.y]));
                push_quad_as_two_triangles(&mut out.line_fuzz, base);
            }
        }

        if passes.contains(PassSet::CONIC_TRIANGLE_FUZZ) {
            for (index, _) in self.conic_triangles.iter().enumerate() {
                let base = index as u32; // indexes into static_data_block3, 3 per triangle
                const CORNERS: [u32; 4] = [0b00, 0b01, 0b10, 0b11];
                let quad: [u32; 6] = [CORNERS[0], CORNERS[1], CORNERS[2], CORNERS[0], CORNERS[2], CORNERS[3]];
                for corner in quad {
                    out.conic_fuzz.push(ConicFuzzVertex {
                        static_data_index: base * 3,
                        _pad0: 0,
                        _pad1: 0,
                        corner,
                    });
                }
            }
        }
    }
}

fn push_quad_as_two_triangles(out: &mut Vec<LineFuzzVertex>, static_data_index: u32) {
    // Corners: (endpoint_selector, normal_sign) in {0,1} x {-1,+1}; emitted
    // as two unindexed triangles sharing an edge, per the vertex layout's
    // "no index buffer" discipline (see scenario 5's 6-verts-per-edge count).
    let corners = [(0u32, -1.0f32), (1, -1.0), (1, 1.0), (0, -1.0), (1, 1.0), (0, 1.0)];
    for (endpoint_selector, normal_sign) in corners {
        out.push(LineFuzzVertex {
            static_data_index,
            endpoint_selector,
            normal_sign,
            _pad: 0,
        });
    }
}

/// Flattens a curve into plain (weight-1) conic triangles, splitting
/// recursively until each piece is within `tolerance` of flat and, for
/// conics, within `CONIC_WEIGHT_TOLERANCE` of weight 1.0. `depth` is a
/// defensive recursion bound, not expected to be hit by well-formed input.
fn flatten_curve(curve: &ContourCurve, tolerance: f32, depth: u32, out: &mut Vec<(ConicTriangle, bool)>) {
    match curve.curve_type() {
        CurveType::Line => {}
        CurveType::Quadratic => {
            out.push((
                ConicTriangle {
                    start: curve.start(),
                    control: curve.control_points()[0],
                    end: curve.end(),
                },
                true,
            ));
        }
        CurveType::Conic | CurveType::ConicArc => {
            let weight = curve.conic_weight().unwrap_or(1.0);
            let near_unit_weight = (weight - 1.0).abs() <= CONIC_WEIGHT_TOLERANCE;
            if depth == 0 || (near_unit_weight && curve.is_flat(tolerance)) {
                out.push((
                    ConicTriangle {
                        start: curve.start(),
                        control: curve.control_points()[0],
                        end: curve.end(),
                    },
                    true,
                ));
            } else {
                let (a, b) = curve.split(0.5);
                flatten_curve(&a, tolerance, depth - 1, out);
                flatten_curve(&b, tolerance, depth - 1, out);
            }
        }
        CurveType::Cubic => {
            if depth == 0 || curve.is_flat(tolerance) {
                let p0 = curve.start();
                let p3 = curve.end();
                let c1 = curve.control_points()[0];
                let c2 = curve.control_points()[1];
                // Midpoint of the two cubic control points approximates the
                // single quadratic control point once the piece is flat
                // enough that the degree-reduction error is below tolerance.
                let control = ((c1.to_vector() + c2.to_vector()) * 0.5).to_point();
                out.push((ConicTriangle { start: p0, control, end: p3 }, true));
            } else {
                let (a, b) = curve.split(0.5);
                flatten_curve(&a, tolerance, depth - 1, out);
                flatten_curve(&b, tolerance, depth - 1, out);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageRequirement {
    pub contour_stencil_vertices: u32,
    pub conic_stencil_vertices: u32,
    pub contour_fuzz_vertices: u32,
    pub conic_fuzz_vertices: u32,
    /// Count of size-2 `gvec4` static-data blocks (AA line segments).
    pub block2: u32,
    /// Count of size-3 `gvec4` static-data blocks (conic triangles).
    pub block3: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PackedRenderData {
    pub line_stencil: Vec<LineStencilVertex>,
    pub conic_stencil: Vec<ConicStencilVertex>,
    pub line_fuzz: Vec<LineFuzzVertex>,
    pub conic_fuzz: Vec<ConicFuzzVertex>,
    pub static_data_block2: Vec<StaticDataBlock>,
    pub static_data_block3: Vec<StaticDataBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn triangle_contour() -> ContourData {
        let mut d = ContourData::new(point(0.0, 0.0));
        d.add_curve(ContourCurve::line(point(0.0, 0.0), point(10.0, 0.0)));
        d.add_curve(ContourCurve::line(point(10.0, 0.0), point(5.0, 10.0)));
        d.add_curve(ContourCurve::line(point(5.0, 10.0), point(0.0, 0.0)));
        d.close();
        d
    }

    #[test]
    fn fill_stc_sizing_matches_scenario() {
        let contour = triangle_contour();
        let data = Data::build(&contour);
        let req = data.storage_requirement(PassSet::CONTOUR_STENCIL | PassSet::CONTOUR_FUZZ);
        assert_eq!(req.contour_stencil_vertices, 3);
        assert_eq!(req.contour_fuzz_vertices, 18);
        assert_eq!(req.block2, 6);
        assert_eq!(req.block3, 0);
    }

    #[test]
    fn pack_matches_storage_requirement() {
        let contour = triangle_contour();
        let data = Data::build(&contour);
        let passes = PassSet::CONTOUR_STENCIL | PassSet::CONTOUR_FUZZ | PassSet::CONIC_TRIANGLES_STENCIL;
        let req = data.storage_requirement(passes);
        let mut out = PackedRenderData::default();
        data.pack_render_data(passes, &mut out);
        assert_eq!(out.line_stencil.len() as u32, req.contour_stencil_vertices);
        assert_eq!(out.line_fuzz.len() as u32, req.contour_fuzz_vertices);
        assert_eq!(out.conic_stencil.len() as u32, req.conic_stencil_vertices);
        assert_eq!(out.static_data_block2.len() as u32, req.block2);
        assert_eq!(out.static_data_block3.len() as u32, req.block3);
    }
}
