//! Curve geometry: sample points, poly-lines, and segment math.

mod curve;
mod sample;

pub use curve::{closest_point_on_segment, Curve, CurveKind, CurveParams};
pub use sample::Sample;
