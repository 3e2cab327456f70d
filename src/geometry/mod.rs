pub mod curve;
pub mod surface;

pub use curve::{BezierCurve, BezierLoop, Curve, CurveDomain};
pub use surface::{BezierPatch, Plane, Surface, SurfaceDomain};
