//! `AnimatedPath`: an ordered sequence of `AnimatedContour`s, one per
//! contour pair of two source `Path`s, plus cached bounding boxes.

use lyon::math::Box2D;

use crate::animated::contour::AnimatedContour;
use crate::path::Path;

pub struct AnimatedPath {
    contours: Vec<AnimatedContour>,
}

impl AnimatedPath {
    /// Matches `start` and `end` contour-by-contour (by index); the two
    /// paths must have the same contour count.
    pub fn create(start: &Path, end: &Path) -> AnimatedPath {
        debug_assert_eq!(
            start.contours().len(),
            end.contours().len(),
            "AnimatedPath requires both paths to have the same contour count"
        );
        let contours = start
            .contours()
            .iter()
            .zip(end.contours().iter())
            .map(|(a, b)| {
                a.with_data(|a_data| b.with_data(|b_data| AnimatedContour::create(a_data, b_data, None, None)))
            })
            .collect();
        AnimatedPath { contours }
    }

    pub fn contours(&self) -> &[AnimatedContour] {
        &self.contours
    }

    pub fn bounding_box(&self) -> Box2D {
        let mut bbox: Option<Box2D> = None;
        for contour in &self.contours {
            for data in [contour.start(), contour.end()] {
                let b = data.tight_bounding_box();
                bbox = Some(match bbox {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        bbox.unwrap_or_else(|| Box2D::new(lyon::math::Point::zero(), lyon::math::Point::zero()))
    }
}
