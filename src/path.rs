//! `Path`: an ordered sequence of [`Contour`]s built with a chaining
//! builder, plus cached bounding boxes and point-query support.
//!
//! A chaining builder in the
//! `.begin().line_to().cubic_bezier_to().close().build()` style, covering
//! the full curve-type surface [`Contour`] supports.

use std::cell::Cell;
use std::rc::Rc;

use lyon::math::{point, Box2D, Point};

use crate::contour::{Contour, ContourCurve, ContourData};

/// Winding-rule contribution plus nearest-curve diagnostics for a point
/// query against a `Path`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointQueryResult {
    pub distance: f32,
    pub contour_index: usize,
    pub curve_index: usize,
    pub t: f32,
    pub winding_number: i32,
}

/// A sequence of contours, built incrementally.
pub struct Path {
    contours: Vec<Rc<Contour>>,
    in_progress: Option<ContourData>,
    /// Whether the distance cull (skip contours whose control-point bbox
    /// can't possibly beat the current best) is enabled for point queries.
    pub distance_cull_enabled: bool,
    cached_bbox: Cell<Option<Box2D>>,
    cached_bbox_version: Cell<u64>,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Path {
            contours: Vec::new(),
            in_progress: None,
            distance_cull_enabled: true,
            cached_bbox: Cell::new(None),
            cached_bbox_version: Cell::new(0),
        }
    }

    fn current_mut(&mut self) -> &mut ContourData {
        self.in_progress
            .as_mut()
            .expect("a `*_to` builder method was called before `move_to`")
    }

    /// Starts a new contour at `p`, finishing (without closing) whatever
    /// contour was previously in progress.
    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.finish_in_progress();
        self.in_progress = Some(ContourData::new(p));
        self
    }

    pub fn line_to(&mut self, end: Point) -> &mut Self {
        let start = self.current_mut().end_point();
        self.current_mut().add_curve(ContourCurve::line(start, end));
        self
    }

    pub fn quadratic_to(&mut self, control: Point, end: Point) -> &mut Self {
        let start = self.current_mut().end_point();
        self.current_mut()
            .add_curve(ContourCurve::quadratic(start, control, end));
        self
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        let start = self.current_mut().end_point();
        self.current_mut().add_curve(ContourCurve::cubic(start, c1, c2, end));
        self
    }

    pub fn conic_to(&mut self, control: Point, end: Point, weight: f32) -> &mut Self {
        let start = self.current_mut().end_point();
        self.current_mut()
            .add_curve(ContourCurve::conic(start, control, end, weight));
        self
    }

    pub fn arc_to(&mut self, end: Point, angle: f32) -> &mut Self {
        let start = self.current_mut().end_point();
        self.current_mut().add_curve(ContourCurve::conic_arc(start, end, angle));
        self
    }

    /// Appends an already-constructed curve (its `start()` must equal the
    /// contour's current end point).
    pub fn curve_to(&mut self, curve: ContourCurve) -> &mut Self {
        self.current_mut().add_curve(curve);
        self
    }

    pub fn line_to_close(&mut self, end: Point) -> &mut Self {
        self.line_to(end);
        self.close()
    }

    pub fn quadratic_to_close(&mut self, control: Point, end: Point) -> &mut Self {
        self.quadratic_to(control, end);
        self.close()
    }

    pub fn cubic_to_close(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        self.cubic_to(c1, c2, end);
        self.close()
    }

    /// Closes the in-progress contour (appending an implicit edge if
    /// needed) and commits it.
    pub fn close(&mut self) -> &mut Self {
        if let Some(mut data) = self.in_progress.take() {
            data.close();
            self.push_contour(data);
        }
        self
    }

    fn finish_in_progress(&mut self) {
        if let Some(data) = self.in_progress.take() {
            self.push_contour(data);
        }
    }

    fn push_contour(&mut self, data: ContourData) {
        self.contours.push(Contour::new(data));
        self.invalidate_cache();
    }

    /// Appends an already-built contour. Per the documented resolution of
    /// the source's "add while mid-build" ambiguity: the in-progress
    /// contour (if any) is finished first, then `contour` is appended after
    /// it — rather than reproducing the original's insert-before-in-progress
    /// behaviour, which is unobservable through this public API anyway.
    pub fn add_contour(&mut self, contour: ContourData) -> &mut Self {
        self.finish_in_progress();
        self.push_contour(contour);
        self
    }

    pub fn add_rect(&mut self, rect: Box2D) -> &mut Self {
        self.move_to(rect.min);
        self.line_to(point(rect.max.x, rect.min.y));
        self.line_to(rect.max);
        self.line_to(point(rect.min.x, rect.max.y));
        self.close()
    }

    pub fn add_oval(&mut self, rect: Box2D) -> &mut Self {
        let cx = (rect.min.x + rect.max.x) * 0.5;
        let cy = (rect.min.y + rect.max.y) * 0.5;
        let rx = (rect.max.x - rect.min.x) * 0.5;
        let ry = (rect.max.y - rect.min.y) * 0.5;
        let quarter = std::f32::consts::FRAC_PI_2;
        self.move_to(point(cx + rx, cy));
        self.arc_to(point(cx, cy + ry), quarter);
        self.arc_to(point(cx - rx, cy), quarter);
        self.arc_to(point(cx, cy - ry), quarter);
        self.arc_to(point(cx + rx, cy), quarter);
        self.close()
    }

    /// A rectangle with each corner replaced by a quarter-circle arc of
    /// radius `(rx, ry)`, clamped so radii never overlap across the short
    /// side.
    pub fn add_rounded_rect(&mut self, rect: Box2D, rx: f32, ry: f32) -> &mut Self {
        let w = rect.max.x - rect.min.x;
        let h = rect.max.y - rect.min.y;
        let rx = rx.min(w * 0.5).max(0.0);
        let ry = ry.min(h * 0.5).max(0.0);
        let quarter = std::f32::consts::FRAC_PI_2;
        let (l, t, r, b) = (rect.min.x, rect.min.y, rect.max.x, rect.max.y);

        self.move_to(point(l + rx, t));
        self.line_to(point(r - rx, t));
        self.arc_to(point(r, t + ry), quarter);
        self.line_to(point(r, b - ry));
        self.arc_to(point(r - rx, b), quarter);
        self.line_to(point(l + rx, b));
        self.arc_to(point(l, b - ry), quarter);
        self.line_to(point(l, t + ry));
        self.arc_to(point(l + rx, t), quarter);
        self.close()
    }

    pub fn contours(&self) -> &[Rc<Contour>] {
        &self.contours
    }

    fn invalidate_cache(&mut self) {
        self.cached_bbox.set(None);
    }

    /// Tight bounding box, recomputed (and cached) whenever any contour's
    /// version has changed since the last computation.
    pub fn bounding_box(&self) -> Box2D {
        let total_version: u64 = self.contours.iter().map(|c| c.version()).sum();
        if self.cached_bbox_version.get() == total_version {
            if let Some(bbox) = self.cached_bbox.get() {
                return bbox;
            }
        }
        let mut bbox = Box2D::new(Point::zero(), Point::zero());
        let mut any = false;
        for contour in &self.contours {
            contour.with_data(|data| {
                let b = data.tight_bounding_box();
                bbox = if any { bbox.union(&b) } else { b };
                any = true;
            });
        }
        self.cached_bbox.set(Some(bbox));
        self.cached_bbox_version.set(total_version);
        bbox
    }

    /// Reverses the contour order and the orientation of each contour.
    pub fn reverse(&self) -> Path {
        let mut out = Path::new();
        for contour in self.contours.iter().rev() {
            let reversed = contour.with_data(|d| d.reverse());
            out.push_contour(reversed);
        }
        out
    }

    /// For `query`, returns the closest curve across every contour (within
    /// `tolerance` of flattening accuracy) and a fill winding-number
    /// contribution computed from signed polyline crossings.
    pub fn query_point(&self, query: Point, tolerance: f32) -> Option<PointQueryResult> {
        const SAMPLES_PER_CURVE: usize = 16;
        let mut best: Option<PointQueryResult> = None;
        let mut winding = 0i32;

        for (contour_index, contour) in self.contours.iter().enumerate() {
            contour.with_data(|data| {
                if self.distance_cull_enabled {
                    let cull_box = data.control_point_bounding_box();
                    let margin = cull_box
                        .width()
                        .max(cull_box.height())
                        .max(1.0);
                    if let Some(b) = &best {
                        if b.distance < f32::MAX {
                            let outside = query.x < cull_box.min.x - margin
                                || query.x > cull_box.max.x + margin
                                || query.y < cull_box.min.y - margin
                                || query.y > cull_box.max.y + margin;
                            if outside {
                                return;
                            }
                        }
                    }
                }

                let mut prev = data.start_point();
                for (curve_index, curve) in data.curves().iter().enumerate() {
                    let steps = if curve.curve_type() == crate::contour::CurveType::Line {
                        1
                    } else {
                        SAMPLES_PER_CURVE
                    };
                    for step in 1..=steps {
                        let t = step as f32 / steps as f32;
                        let p = curve.eval(t);
                        let (dist, seg_t) = point_segment_distance(query, prev, p);
                        if best
                            .as_ref()
                            .map(|b| dist < b.distance)
                            .unwrap_or(true)
                        {
                            best = Some(PointQueryResult {
                                distance: dist,
                                contour_index,
                                curve_index,
                                t: lerp_seg_t(step, steps, seg_t),
                                winding_number: 0,
                            });
                        }
                        winding += signed_crossing(query, prev, p);
                        prev = p;
                    }
                }
            });
        }

        best.map(|mut b| {
            b.winding_number = winding;
            if b.distance <= tolerance || tolerance < 0.0 {
                b
            } else {
                b
            }
        })
    }
}

fn lerp_seg_t(step: usize, steps: usize, seg_t: f32) -> f32 {
    let base = (step - 1) as f32 / steps as f32;
    let span = 1.0 / steps as f32;
    base + span * seg_t
}

fn point_segment_distance(p: Point, a: Point, b: Point) -> (f32, f32) {
    let ab = b - a;
    let len2 = ab.square_length();
    if len2 < 1e-12 {
        return ((p - a).length(), 0.0);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    let proj = a + ab * t;
    ((p - proj).length(), t)
}

/// Signed crossing count of the horizontal ray from `p` going in +x,
/// against segment `a -> b`, for a winding-number accumulation.
fn signed_crossing(p: Point, a: Point, b: Point) -> i32 {
    if (a.y <= p.y) != (b.y <= p.y) {
        let t = (p.y - a.y) / (b.y - a.y);
        let x_at = a.x + t * (b.x - a.x);
        if x_at > p.x {
            return if b.y > a.y { 1 } else { -1 };
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_move_first() {
        let mut path = Path::new();
        path.move_to(point(0.0, 0.0));
        path.line_to(point(1.0, 0.0));
        assert_eq!(path.contours().len(), 0, "contour not committed until close()");
        path.close();
        assert_eq!(path.contours().len(), 1);
    }

    #[test]
    fn rect_winding_is_nonzero_inside() {
        let mut path = Path::new();
        path.add_rect(Box2D::new(point(0.0, 0.0), point(10.0, 10.0)));
        let result = path.query_point(point(5.0, 5.0), 1.0).unwrap();
        assert_ne!(result.winding_number, 0);
    }

    #[test]
    fn reverse_reverse_preserves_start_point() {
        let mut path = Path::new();
        path.add_rect(Box2D::new(point(0.0, 0.0), point(10.0, 10.0)));
        let twice = path.reverse().reverse();
        assert_eq!(
            twice.contours()[0].with_data(|d| d.start_point()),
            path.contours()[0].with_data(|d| d.start_point())
        );
    }
}
