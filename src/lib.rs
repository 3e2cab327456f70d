pub mod config;
pub mod error;
pub mod geometry;
pub mod group;
pub mod identity;
pub mod loops;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod sketch;
pub mod solid;
pub mod tessellation;
pub mod topology;

pub use config::EvalConfig;
pub use error::{GroupSolidError, Result};
pub use group::{Group, GroupChain, GroupHandle, GroupIssue, GroupKind, Subtype};
pub use identity::{FaceTag, RemapKey};
pub use loops::PolygonError;
pub use operations::boolean::BooleanOp;
pub use solid::{RepresentationKind, Solid};
