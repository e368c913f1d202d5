//! Curve primitives, contour assembly, and sanitisation.

pub mod curve;
pub mod data;

pub use curve::{ContourCurve, Continuation, CurveType};
pub use data::{Contour, ContourData};
