//! `ContourCurve`: a tagged curve segment supporting evaluation, tangents,
//! tight bounding boxes, flatness, splitting, and reversal.
//!
//! A plain `Copy` value type: curves are small and immutable once built, so
//! there's no need for a ref-counted handle. The tight bounding box is
//! computed from each curve's critical points rather than sampled.

use lyon::math::{point, Box2D, Point, Vector};
use smallvec::SmallVec;

/// The curve's underlying geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    Line,
    Quadratic,
    Cubic,
    Conic,
    ConicArc,
}

impl CurveType {
    pub fn control_point_count(self) -> usize {
        match self {
            CurveType::Line => 0,
            CurveType::Quadratic | CurveType::Conic | CurveType::ConicArc => 1,
            CurveType::Cubic => 2,
        }
    }
}

/// How a curve joins the previous curve in a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    #[default]
    NotContinuation,
    Continuation,
    ContinuationCusp,
}

/// A single curve segment of a contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourCurve {
    curve_type: CurveType,
    start: Point,
    end: Point,
    controls: [Point; 2],
    /// Only meaningful for `Conic`/`ConicArc` (and, transiently,
    /// `Quadratic` before sanitisation folds weight 1.0 away).
    conic_weight: Option<f32>,
    continuation: Continuation,
    generation: u32,
}

impl ContourCurve {
    pub fn line(start: Point, end: Point) -> Self {
        ContourCurve {
            curve_type: CurveType::Line,
            start,
            end,
            controls: [Point::zero(); 2],
            conic_weight: None,
            continuation: Continuation::NotContinuation,
            generation: 0,
        }
    }

    pub fn quadratic(start: Point, control: Point, end: Point) -> Self {
        ContourCurve {
            curve_type: CurveType::Quadratic,
            start,
            end,
            controls: [control, Point::zero()],
            conic_weight: None,
            continuation: Continuation::NotContinuation,
            generation: 0,
        }
    }

    pub fn cubic(start: Point, c1: Point, c2: Point, end: Point) -> Self {
        ContourCurve {
            curve_type: CurveType::Cubic,
            start,
            end,
            controls: [c1, c2],
            conic_weight: None,
            continuation: Continuation::NotContinuation,
            generation: 0,
        }
    }

    /// A rational-quadratic (conic) curve with weight `w > 0`. `w == 1.0`
    /// degenerates to a plain quadratic.
    pub fn conic(start: Point, control: Point, end: Point, w: f32) -> Self {
        debug_assert!(w > 0.0, "conic weight must be positive");
        ContourCurve {
            curve_type: CurveType::Conic,
            start,
            end,
            controls: [control, Point::zero()],
            conic_weight: Some(w),
            continuation: Continuation::NotContinuation,
            generation: 0,
        }
    }

    /// A circular-arc curve specified by its two endpoints and the signed
    /// sweep `angle` (radians); the control point, weight, center and
    /// radius are derived.
    pub fn conic_arc(start: Point, end: Point, angle: f32) -> Self {
        let half = angle * 0.5;
        let w = half.cos();
        let chord = end - start;
        let mid = start + chord * 0.5;
        let chord_len = chord.length();
        let normal = Vector::new(-chord.y, chord.x).normalize();
        // Distance from chord midpoint to the control point for the given
        // sweep angle of a conic representing a circular arc.
        let sagitta_like = if half.abs() > 1e-6 {
            chord_len * 0.5 * half.tan()
        } else {
            0.0
        };
        let control = mid + normal * sagitta_like;
        ContourCurve {
            curve_type: CurveType::ConicArc,
            start,
            end,
            controls: [control, Point::zero()],
            conic_weight: Some(w),
            continuation: Continuation::NotContinuation,
            generation: 0,
        }
    }

    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = continuation;
        self
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn continuation(&self) -> Continuation {
        self.continuation
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn conic_weight(&self) -> Option<f32> {
        self.conic_weight
    }

    /// Control points actually used by this curve's type (0, 1, or 2 of
    /// them).
    pub fn control_points(&self) -> &[Point] {
        &self.controls[..self.curve_type.control_point_count()]
    }

    /// Center of the circle this curve traces, valid only for `ConicArc`.
    pub fn arc_center(&self) -> Option<Point> {
        if self.curve_type != CurveType::ConicArc {
            return None;
        }
        let r = self.arc_radius()?;
        let chord = self.end - self.start;
        let mid = self.start + chord * 0.5;
        let half_len = chord.length() * 0.5;
        if half_len >= r {
            return Some(mid);
        }
        let h = (r * r - half_len * half_len).sqrt();
        let normal = Vector::new(-chord.y, chord.x).normalize();
        let control = self.controls[0];
        // The control point and the center lie on opposite sides of the
        // chord when the sweep is reflex; pick the side the control point
        // is NOT on to recover the arc's true center.
        let towards_control = (control - mid).dot(normal) >= 0.0;
        let sign = if towards_control { -1.0 } else { 1.0 };
        Some(mid + normal * (h * sign))
    }

    /// Radius of the circle this curve traces, valid only for `ConicArc`.
    pub fn arc_radius(&self) -> Option<f32> {
        if self.curve_type != CurveType::ConicArc {
            return None;
        }
        let w = self.conic_weight?;
        let chord_len = (self.end - self.start).length();
        let half_angle = w.acos();
        if half_angle.abs() < 1e-6 {
            return None;
        }
        Some(chord_len * 0.5 / half_angle.sin())
    }

    /// Evaluates the curve at parameter `t` in `[0, 1]`.
    pub fn eval(&self, t: f32) -> Point {
        match self.curve_type {
            CurveType::Line => self.start.lerp(self.end, t),
            CurveType::Quadratic => {
                let p0 = self.start.to_vector();
                let p1 = self.controls[0].to_vector();
                let p2 = self.end.to_vector();
                let mt = 1.0 - t;
                (p0 * (mt * mt) + p1 * (2.0 * mt * t) + p2 * (t * t)).to_point()
            }
            CurveType::Cubic => {
                let p0 = self.start.to_vector();
                let p1 = self.controls[0].to_vector();
                let p2 = self.controls[1].to_vector();
                let p3 = self.end.to_vector();
                let mt = 1.0 - t;
                (p0 * (mt * mt * mt)
                    + p1 * (3.0 * mt * mt * t)
                    + p2 * (3.0 * mt * t * t)
                    + p3 * (t * t * t))
                    .to_point()
            }
            CurveType::Conic | CurveType::ConicArc => {
                let w = self.conic_weight.unwrap_or(1.0);
                let p0 = self.start.to_vector();
                let p1 = self.controls[0].to_vector();
                let p2 = self.end.to_vector();
                let mt = 1.0 - t;
                let b0 = mt * mt;
                let b1 = 2.0 * mt * t * w;
                let b2 = t * t;
                let denom = b0 + b1 + b2;
                ((p0 * b0 + p1 * b1 + p2 * b2) / denom).to_point()
            }
        }
    }

    pub fn start_tangent(&self) -> Vector {
        match self.curve_type {
            CurveType::Line => self.end - self.start,
            CurveType::Quadratic | CurveType::Conic | CurveType::ConicArc => {
                self.controls[0] - self.start
            }
            CurveType::Cubic => {
                let d = self.controls[0] - self.start;
                if d.square_length() > 1e-12 {
                    d
                } else {
                    self.controls[1] - self.start
                }
            }
        }
    }

    pub fn end_tangent(&self) -> Vector {
        match self.curve_type {
            CurveType::Line => self.end - self.start,
            CurveType::Quadratic | CurveType::Conic | CurveType::ConicArc => {
                self.end - self.controls[0]
            }
            CurveType::Cubic => {
                let d = self.end - self.controls[1];
                if d.square_length() > 1e-12 {
                    d
                } else {
                    self.end - self.controls[0]
                }
            }
        }
    }

    /// Chord length, used as the cheap flatness metric and as a fallback
    /// parameter-length estimate for animated-contour matching.
    pub fn chord_length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Max perpendicular distance of the control polygon from the chord;
    /// zero for a line by construction.
    pub fn flatness(&self) -> f32 {
        let chord = self.end - self.start;
        let len = chord.length();
        if len < 1e-12 {
            return self
                .control_points()
                .iter()
                .map(|&c| (c - self.start).length())
                .fold(0.0, f32::max);
        }
        let normal = Vector::new(-chord.y, chord.x) / len;
        self.control_points()
            .iter()
            .map(|&c| (c - self.start).dot(normal).abs())
            .fold(0.0_f32, f32::max)
    }

    pub fn is_flat(&self, tolerance: f32) -> bool {
        self.flatness() <= tolerance
    }

    /// A quadratic/conic/cubic whose controls coincide with an endpoint can
    /// degenerate to a lower-order curve or a cusp; this flags that case
    /// for the sanitiser.
    pub fn control_pt_is_degenerate(&self) -> bool {
        self.control_points()
            .iter()
            .any(|&c| (c - self.start).square_length() < 1e-14 || (c - self.end).square_length() < 1e-14)
    }

    pub fn is_degenerate(&self) -> bool {
        (self.end - self.start).square_length() < 1e-14 && self.control_pt_is_degenerate()
    }

    pub fn max_number_critical_points(&self) -> usize {
        match self.curve_type {
            CurveType::Line => 0,
            CurveType::Quadratic => 2,
            CurveType::Cubic => 4,
            CurveType::Conic | CurveType::ConicArc => 2,
        }
    }

    /// Parameter values in `(0, 1)` where a coordinate derivative vanishes;
    /// feeds `tight_bounding_box`.
    pub fn compute_critical_points(&self) -> SmallVec<[f32; 4]> {
        let mut out = SmallVec::new();
        match self.curve_type {
            CurveType::Line => {}
            CurveType::Quadratic => {
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.end;
                for axis in 0..2 {
                    let (a0, a1, a2) = (coord(p0, axis), coord(p1, axis), coord(p2, axis));
                    let denom = a0 - 2.0 * a1 + a2;
                    if denom.abs() > 1e-9 {
                        let t = (a0 - a1) / denom;
                        push_if_interior(&mut out, t);
                    }
                }
            }
            CurveType::Cubic => {
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.controls[1];
                let p3 = self.end;
                for axis in 0..2 {
                    let (a0, a1, a2, a3) =
                        (coord(p0, axis), coord(p1, axis), coord(p2, axis), coord(p3, axis));
                    // Derivative of a cubic Bezier is quadratic in t; solve
                    // its roots.
                    let a = -a0 + 3.0 * a1 - 3.0 * a2 + a3;
                    let b = 2.0 * (a0 - 2.0 * a1 + a2);
                    let c = a1 - a0;
                    for t in solve_quadratic(a, b, c) {
                        push_if_interior(&mut out, t);
                    }
                }
            }
            CurveType::Conic | CurveType::ConicArc => {
                // Sample-based fallback: rational curves' critical points
                // don't have as clean a closed form; a fine parametric
                // sweep is exact enough for bounding-box purposes given the
                // curve is always a single convex arc.
                let w = self.conic_weight.unwrap_or(1.0);
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.end;
                for axis in 0..2 {
                    let (a0, a1, a2) = (coord(p0, axis), coord(p1, axis), coord(p2, axis));
                    // d/dt of the rational quadratic numerator/denominator;
                    // numerator of the derivative after clearing the
                    // (always positive) denominator squared.
                    let k0 = a1 * w - a0;
                    let k1 = a2 - a1 * w;
                    // N(t) = (1-t)^2 a0 + 2t(1-t)w a1 + t^2 a2, D(t) likewise
                    // with 1 in place of a_i. N'(t)D(t) - N(t)D'(t) = 0 is
                    // quadratic in t for a conic.
                    let a = 2.0 * (k1 - k0) * (w - 1.0) - 2.0 * (a2 - a0) * (w - 1.0);
                    let b = 2.0 * (k0 + k1);
                    let c = -2.0 * k0;
                    if a.abs() > 1e-9 {
                        for t in solve_quadratic(a, b, c) {
                            push_if_interior(&mut out, t);
                        }
                    } else if b.abs() > 1e-9 {
                        push_if_interior(&mut out, -c / b);
                    }
                }
            }
        }
        out
    }

    /// Tight bounding box computed from the endpoints plus any interior
    /// critical points (exact for the curve types above; a superset for
    /// the conic fallback).
    pub fn tight_bounding_box(&self) -> Box2D {
        let mut min = point(self.start.x.min(self.end.x), self.start.y.min(self.end.y));
        let mut max = point(self.start.x.max(self.end.x), self.start.y.max(self.end.y));
        for t in self.compute_critical_points() {
            let p = self.eval(t);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Box2D::new(min, max)
    }

    /// Bounding box of the control polygon (start, controls, end); always
    /// contains `tight_bounding_box`, cheaper to compute.
    pub fn control_point_bounding_box(&self) -> Box2D {
        let mut min = self.start;
        let mut max = self.start;
        for &p in std::iter::once(&self.end).chain(self.control_points()) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Box2D::new(min, max)
    }

    /// Splits the curve at `t`, producing two curves whose generation is
    /// one more than this curve's.
    pub fn split(&self, t: f32) -> (ContourCurve, ContourCurve) {
        debug_assert!((0.0..=1.0).contains(&t));
        let gen = self.generation + 1;
        let (mut a, mut b) = match self.curve_type {
            CurveType::Line => {
                let mid = self.start.lerp(self.end, t);
                (ContourCurve::line(self.start, mid), ContourCurve::line(mid, self.end))
            }
            CurveType::Quadratic => {
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.end;
                let q0 = p0.lerp(p1, t);
                let q1 = p1.lerp(p2, t);
                let mid = q0.lerp(q1, t);
                (
                    ContourCurve::quadratic(p0, q0, mid),
                    ContourCurve::quadratic(mid, q1, p2),
                )
            }
            CurveType::Cubic => {
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.controls[1];
                let p3 = self.end;
                let q0 = p0.lerp(p1, t);
                let q1 = p1.lerp(p2, t);
                let q2 = p2.lerp(p3, t);
                let r0 = q0.lerp(q1, t);
                let r1 = q1.lerp(q2, t);
                let mid = r0.lerp(r1, t);
                (
                    ContourCurve::cubic(p0, q0, r0, mid),
                    ContourCurve::cubic(mid, r1, q2, p3),
                )
            }
            CurveType::Conic | CurveType::ConicArc => {
                // Standard rational de Casteljau split for a conic.
                let w = self.conic_weight.unwrap_or(1.0);
                let p0 = self.start;
                let p1 = self.controls[0];
                let p2 = self.end;
                let w0 = 1.0;
                let w1 = w;
                let w2 = 1.0;
                let q0 = weighted_lerp(p0, w0, p1, w1, t);
                let q1 = weighted_lerp(p1, w1, p2, w2, t);
                let wm0 = lerp_scalar(w0, w1, t);
                let wm1 = lerp_scalar(w1, w2, t);
                let mid = weighted_lerp(q0.0, q0.1, q1.0, q1.1, t);
                let wm = lerp_scalar(wm0, wm1, t);
                let left_w = normalize_conic_weight(w0, q0.1, wm);
                let right_w = normalize_conic_weight(wm, q1.1, w2);
                (
                    ContourCurve::conic(p0, q0.0, mid.0, left_w),
                    ContourCurve::conic(mid.0, q1.0, p2, right_w),
                )
            }
        };
        a.generation = gen;
        b.generation = gen;
        a.continuation = self.continuation;
        b.continuation = if self.continuation == Continuation::NotContinuation {
            Continuation::Continuation
        } else {
            self.continuation
        };
        (a, b)
    }

    /// Reverses the curve's direction (`start`/`end` swapped, control
    /// points reordered).
    pub fn reverse(&self) -> ContourCurve {
        let mut out = *self;
        out.start = self.end;
        out.end = self.start;
        match self.curve_type {
            CurveType::Cubic => out.controls = [self.controls[1], self.controls[0]],
            _ => {}
        }
        out
    }
}

fn coord(p: Point, axis: usize) -> f32 {
    if axis == 0 {
        p.x
    } else {
        p.y
    }
}

fn push_if_interior(out: &mut SmallVec<[f32; 4]>, t: f32) {
    if t > 1e-6 && t < 1.0 - 1e-6 {
        out.push(t);
    }
}

fn solve_quadratic(a: f32, b: f32, c: f32) -> SmallVec<[f32; 2]> {
    let mut out = SmallVec::new();
    if a.abs() < 1e-9 {
        if b.abs() > 1e-9 {
            out.push(-c / b);
        }
        return out;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return out;
    }
    let sqrt_disc = disc.sqrt();
    out.push((-b + sqrt_disc) / (2.0 * a));
    out.push((-b - sqrt_disc) / (2.0 * a));
    out
}

fn lerp_scalar(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn weighted_lerp(p0: Point, w0: f32, p1: Point, w1: f32, t: f32) -> (Point, f32) {
    let mt = 1.0 - t;
    let a = mt * w0;
    let b = t * w1;
    let w = a + b;
    let p = ((p0.to_vector() * a + p1.to_vector() * b) / w).to_point();
    (p, w)
}

fn normalize_conic_weight(w0: f32, wm: f32, w1: f32) -> f32 {
    // After a rational split the endpoint weights are not generally 1;
    // renormalise so the stored weight is relative to endpoint weights of 1.
    wm / (w0.sqrt() * w1.sqrt()).max(1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_eval_is_linear() {
        let c = ContourCurve::line(point(0.0, 0.0), point(10.0, 0.0));
        assert_eq!(c.eval(0.5), point(5.0, 0.0));
        assert_eq!(c.flatness(), 0.0);
    }

    #[test]
    fn quadratic_split_preserves_endpoints_and_bumps_generation() {
        let c = ContourCurve::quadratic(point(0.0, 0.0), point(5.0, 10.0), point(10.0, 0.0));
        let (a, b) = c.split(0.5);
        assert_eq!(a.start(), c.start());
        assert_eq!(b.end(), c.end());
        assert_eq!(a.end(), b.start());
        assert_eq!(a.generation(), 1);
        assert_eq!(b.generation(), 1);
    }

    #[test]
    fn quadratic_tight_bbox_includes_peak() {
        let c = ContourCurve::quadratic(point(0.0, 0.0), point(5.0, 10.0), point(10.0, 0.0));
        let bbox = c.tight_bounding_box();
        assert!(bbox.max.y > 4.0 && bbox.max.y <= 5.0 + 1e-3);
    }

    #[test]
    fn reverse_swaps_endpoints() {
        let c = ContourCurve::line(point(0.0, 0.0), point(1.0, 1.0));
        let r = c.reverse();
        assert_eq!(r.start(), c.end());
        assert_eq!(r.end(), c.start());
    }
}
