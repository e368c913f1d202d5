//! Matches two source contours into equivalent curve sequences — same
//! length, same per-index curve type — so that vertex data for curve `i`
//! can interpolate between the start and end representations.
//!
//! Matching is arc-length-proportional, with caller-overridable per-curve
//! lengths, simpler-to-richer curve-type promotion on mismatch, and
//! `create_raw` for sequences that are already matched.

use lyon::math::Point;

use crate::contour::{ContourCurve, ContourData, CurveType};

/// A length assigned to each curve of a contour for matching purposes;
/// defaults to the curve's chord length but can be overridden by the
/// caller (e.g. with an arc-length estimate).
pub type CurveLengths = Vec<f32>;

pub fn chord_lengths(data: &ContourData) -> CurveLengths {
    data.curves().iter().map(ContourCurve::chord_length).collect()
}

/// Two equal-length, type-aligned curve sequences ready for per-vertex
/// interpolation.
#[derive(Debug, Clone)]
pub struct AnimatedContour {
    start: ContourData,
    end: ContourData,
}

impl AnimatedContour {
    /// Matches `start` and `end`, producing an `AnimatedContour` whose two
    /// sides have identical length and per-index curve type. Caller-supplied
    /// lengths (`start_lengths`/`end_lengths`) override the default chord
    /// estimate; pass `None` to use chord lengths.
    pub fn create(
        start: &ContourData,
        end: &ContourData,
        start_lengths: Option<&CurveLengths>,
        end_lengths: Option<&CurveLengths>,
    ) -> AnimatedContour {
        debug_assert!(
            !(start.curves().is_empty() && end.curves().is_empty()),
            "matching two empty contours is a programming error"
        );
        debug_assert_eq!(
            start.is_closed(),
            end.is_closed(),
            "AnimatedContour requires matching closure state"
        );

        if start.curves().is_empty() {
            return Self::from_point_collapse(end, start.start_point(), true);
        }
        if end.curves().is_empty() {
            return Self::from_point_collapse(start, end.start_point(), false);
        }

        let default_start_lengths;
        let default_end_lengths;
        let start_lengths = match start_lengths {
            Some(l) => l,
            None => {
                default_start_lengths = chord_lengths(start);
                &default_start_lengths
            }
        };
        let end_lengths = match end_lengths {
            Some(l) => l,
            None => {
                default_end_lengths = chord_lengths(end);
                &default_end_lengths
            }
        };

        let (mut a, mut b) = walk_and_split(start, start_lengths, end, end_lengths);
        promote_mismatched_types(&mut a, &mut b);

        debug_assert_eq!(a.curves().len(), b.curves().len());
        AnimatedContour { start: a, end: b }
    }

    /// Builds an `AnimatedContour` from already-matched sequences, skipping
    /// the matching algorithm. Still requires per-index type equality.
    pub fn create_raw(start: ContourData, end: ContourData) -> AnimatedContour {
        debug_assert_eq!(start.curves().len(), end.curves().len());
        for (a, b) in start.curves().iter().zip(end.curves().iter()) {
            debug_assert_eq!(a.curve_type(), b.curve_type());
        }
        debug_assert_eq!(start.is_closed(), end.is_closed());
        AnimatedContour { start, end }
    }

    fn from_point_collapse(side: &ContourData, collapse_point: Point, point_is_start: bool) -> AnimatedContour {
        let degenerate: Vec<ContourCurve> = side
            .curves()
            .iter()
            .map(|c| {
                let _ = c;
                ContourCurve::line(collapse_point, collapse_point)
            })
            .collect();
        let mut collapsed = ContourData::new(collapse_point);
        for curve in degenerate {
            // `ContourData::add_curve` asserts chaining; degenerate curves
            // all sit at the same point so chaining holds trivially.
            collapsed.add_curve(curve);
        }
        if point_is_start {
            AnimatedContour {
                start: collapsed,
                end: side.clone(),
            }
        } else {
            AnimatedContour {
                start: side.clone(),
                end: collapsed,
            }
        }
    }

    pub fn start(&self) -> &ContourData {
        &self.start
    }

    pub fn end(&self) -> &ContourData {
        &self.end
    }

    pub fn len(&self) -> usize {
        self.start.curves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walks both normalised cumulative-length sequences together, splitting
/// whichever side is "ahead" at the parameter corresponding to the other
/// side's next breakpoint, until both have identical curve counts with
/// matching running lengths.
fn walk_and_split(
    start: &ContourData,
    start_lengths: &CurveLengths,
    end: &ContourData,
    end_lengths: &CurveLengths,
) -> (ContourData, ContourData) {
    let total_start: f32 = start_lengths.iter().sum::<f32>().max(1e-6);
    let total_end: f32 = end_lengths.iter().sum::<f32>().max(1e-6);

    let mut a_curves: Vec<ContourCurve> = start.curves().to_vec();
    let mut b_curves: Vec<ContourCurve> = end.curves().to_vec();
    let mut a_lengths: Vec<f32> = start_lengths.iter().map(|l| l / total_start).collect();
    let mut b_lengths: Vec<f32> = end_lengths.iter().map(|l| l / total_end).collect();

    let mut ai = 0usize;
    let mut bi = 0usize;
    let mut a_consumed = 0.0f32;
    let mut b_consumed = 0.0f32;

    // Cap iterations defensively; each iteration strictly advances one
    // cursor by one whole curve, so this terminates well before the bound.
    let max_iters = (a_curves.len() + b_curves.len()) * 8 + 16;
    for _ in 0..max_iters {
        if ai >= a_curves.len() || bi >= b_curves.len() {
            break;
        }
        let a_remaining = a_lengths[ai];
        let b_remaining = b_lengths[bi];

        if (a_remaining - b_remaining).abs() < 1e-6 {
            ai += 1;
            bi += 1;
            a_consumed = 0.0;
            b_consumed = 0.0;
            continue;
        }

        if a_remaining < b_remaining {
            // Split b at the point matching a's full remaining length.
            let split_t = a_remaining / b_remaining;
            let (b0, b1) = b_curves[bi].split(split_t.clamp(0.0, 1.0));
            b_curves.splice(bi..=bi, [b0, b1]);
            let full_b = b_lengths[bi];
            b_lengths.splice(bi..=bi, [full_b * split_t, full_b * (1.0 - split_t)]);
            ai += 1;
            bi += 1;
            a_consumed = 0.0;
            b_consumed = 0.0;
        } else {
            let split_t = b_remaining / a_remaining;
            let (a0, a1) = a_curves[ai].split(split_t.clamp(0.0, 1.0));
            a_curves.splice(ai..=ai, [a0, a1]);
            let full_a = a_lengths[ai];
            a_lengths.splice(ai..=ai, [full_a * split_t, full_a * (1.0 - split_t)]);
            ai += 1;
            bi += 1;
            a_consumed = 0.0;
            b_consumed = 0.0;
        }
        let _ = (a_consumed, b_consumed);
    }

    let start_out = rebuild(start, a_curves);
    let end_out = rebuild(end, b_curves);
    (start_out, end_out)
}

fn rebuild(template: &ContourData, curves: Vec<ContourCurve>) -> ContourData {
    let mut out = ContourData::new(template.start_point());
    for curve in curves {
        out.add_curve(curve);
    }
    if template.is_closed() {
        out.close();
    }
    out
}

/// Where matched curves differ in type, promotes the simpler side to the
/// richer one (line -> quadratic with a midpoint control, etc.) so both
/// sides share a type at every index.
fn promote_mismatched_types(a: &mut ContourData, b: &mut ContourData) {
    let mut a_curves = a.curves().to_vec();
    let mut b_curves = b.curves().to_vec();
    debug_assert_eq!(a_curves.len(), b_curves.len());

    for i in 0..a_curves.len() {
        let ta = a_curves[i].curve_type();
        let tb = b_curves[i].curve_type();
        if ta == tb {
            continue;
        }
        let target = richer_of(ta, tb);
        if ta != target {
            a_curves[i] = promote(&a_curves[i], target);
        }
        if tb != target {
            b_curves[i] = promote(&b_curves[i], target);
        }
    }

    *a = rebuild(a, a_curves);
    *b = rebuild(b, b_curves);
}

fn rank(t: CurveType) -> u8 {
    match t {
        CurveType::Line => 0,
        CurveType::Quadratic | CurveType::Conic | CurveType::ConicArc => 1,
        CurveType::Cubic => 2,
    }
}

fn richer_of(a: CurveType, b: CurveType) -> CurveType {
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

fn promote(curve: &ContourCurve, target: CurveType) -> ContourCurve {
    if curve.curve_type() == target {
        return *curve;
    }
    match (curve.curve_type(), target) {
        (CurveType::Line, CurveType::Quadratic) => {
            let mid = curve.start().lerp(curve.end(), 0.5);
            ContourCurve::quadratic(curve.start(), mid, curve.end())
        }
        (CurveType::Line, CurveType::Cubic) => {
            let c1 = curve.start().lerp(curve.end(), 1.0 / 3.0);
            let c2 = curve.start().lerp(curve.end(), 2.0 / 3.0);
            ContourCurve::cubic(curve.start(), c1, c2, curve.end())
        }
        (CurveType::Quadratic, CurveType::Cubic) => {
            let p0 = curve.start();
            let p1 = curve.control_points()[0];
            let p2 = curve.end();
            let c1 = p0.lerp(p1, 2.0 / 3.0);
            let c2 = p2.lerp(p1, 2.0 / 3.0);
            ContourCurve::cubic(p0, c1, c2, p2)
        }
        (CurveType::Conic | CurveType::ConicArc, CurveType::Cubic) => {
            // Degree-raise the conic's underlying quadratic shape; the
            // rational weight is dropped, which is exact only for weight
            // 1.0 but is a reasonable, visually continuous approximation
            // otherwise (animated matching between unlike curve families
            // is inherently approximate).
            let p0 = curve.start();
            let p1 = curve.control_points()[0];
            let p2 = curve.end();
            let c1 = p0.lerp(p1, 2.0 / 3.0);
            let c2 = p2.lerp(p1, 2.0 / 3.0);
            ContourCurve::cubic(p0, c1, c2, p2)
        }
        _ => *curve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn line_quad_contour() -> ContourData {
        let mut d = ContourData::new(point(0.0, 0.0));
        d.add_curve(ContourCurve::line(point(0.0, 0.0), point(1.0, 0.0)));
        d.add_curve(ContourCurve::quadratic(
            point(1.0, 0.0),
            point(2.0, 1.0),
            point(3.0, 0.0),
        ));
        d
    }

    fn single_cubic_contour() -> ContourData {
        let mut d = ContourData::new(point(0.0, 0.0));
        d.add_curve(ContourCurve::cubic(
            point(0.0, 0.0),
            point(1.0, 1.0),
            point(2.0, 1.0),
            point(4.0, 0.0),
        ));
        d
    }

    #[test]
    fn matching_yields_equal_length_and_types() {
        let start = line_quad_contour();
        let end = single_cubic_contour();
        let animated = AnimatedContour::create(&start, &end, None, None);
        assert_eq!(animated.start().curves().len(), animated.end().curves().len());
        for (a, b) in animated.start().curves().iter().zip(animated.end().curves().iter()) {
            assert_eq!(a.curve_type(), b.curve_type());
        }
    }

    #[test]
    fn create_raw_requires_equal_type_sequences() {
        let start = single_cubic_contour();
        let end = single_cubic_contour();
        let animated = AnimatedContour::create_raw(start, end);
        assert_eq!(animated.len(), 1);
    }
}
